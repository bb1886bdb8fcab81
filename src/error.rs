use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum MascotFastaError {
    #[error("can't find specified file {0}")]
    #[diagnostic(help("check the path given with -i / -s / -m"))]
    InputNotFound(PathBuf),

    #[error("failed to read {path}: {message}")]
    InputRead { path: PathBuf, message: String },

    #[error("failed to write {path}: {message}")]
    OutputWrite { path: PathBuf, message: String },

    #[error("output file {0} must already exist before running replace_duplicates")]
    #[diagnostic(help("create the file first; its content will be replaced"))]
    ReplaceTargetMissing(PathBuf),

    #[error("failed to read status file {0}")]
    StatusFileRead(PathBuf),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid accession separator: {0:?}")]
    InvalidSeparator(String),

    #[error("invalid taxonomy mnemonic: {0:?}")]
    InvalidMnemonic(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
