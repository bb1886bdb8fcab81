use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::MascotFastaError;

pub const DEFAULT_CONFIG_FILE: &str = "mascot-fasta.json";
pub const CONFIG_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_ACCESSION_MAX_LEN: usize = 50;
pub const DEFAULT_MONITOR_USER_PREFIX: &str = "Monitor Test DB";
pub const DEFAULT_SHORTEN_SEPARATOR: &str = "_";
pub const DEFAULT_ENTRY_SEPARATOR: &str = " ";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub accession_max_len: Option<usize>,
    #[serde(default)]
    pub monitor_user_prefix: Option<String>,
    #[serde(default)]
    pub shorten_separator: Option<String>,
    #[serde(default)]
    pub entry_separator: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub accession_max_len: usize,
    pub monitor_user_prefix: String,
    pub shorten_separator: String,
    pub entry_separator: String,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            accession_max_len: DEFAULT_ACCESSION_MAX_LEN,
            monitor_user_prefix: DEFAULT_MONITOR_USER_PREFIX.to_string(),
            shorten_separator: DEFAULT_SHORTEN_SEPARATOR.to_string(),
            entry_separator: DEFAULT_ENTRY_SEPARATOR.to_string(),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path` when given, otherwise `mascot-fasta.json` from the working
    /// directory if it exists. Without either, built-in defaults are used.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, MascotFastaError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(ResolvedConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| MascotFastaError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| MascotFastaError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, MascotFastaError> {
        let defaults = ResolvedConfig::default();

        if let Some(version) = config.schema_version {
            if version != CONFIG_SCHEMA_VERSION {
                return Err(MascotFastaError::ConfigParse(format!(
                    "unsupported schema_version {version}, expected {CONFIG_SCHEMA_VERSION}"
                )));
            }
        }

        let accession_max_len = config
            .accession_max_len
            .unwrap_or(defaults.accession_max_len);
        if accession_max_len == 0 {
            return Err(MascotFastaError::ConfigParse(
                "accession_max_len must be greater than 0".to_string(),
            ));
        }

        let shorten_separator = non_empty_separator(config.shorten_separator)?
            .unwrap_or(defaults.shorten_separator);
        let entry_separator =
            non_empty_separator(config.entry_separator)?.unwrap_or(defaults.entry_separator);

        Ok(ResolvedConfig {
            accession_max_len,
            monitor_user_prefix: config
                .monitor_user_prefix
                .unwrap_or(defaults.monitor_user_prefix),
            shorten_separator,
            entry_separator,
        })
    }
}

fn non_empty_separator(value: Option<String>) -> Result<Option<String>, MascotFastaError> {
    match value {
        Some(separator) if separator.is_empty() => {
            Err(MascotFastaError::InvalidSeparator(separator))
        }
        other => Ok(other),
    }
}
