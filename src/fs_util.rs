use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::MascotFastaError;

/// `dir/base.fasta` + `short` gives `dir/base_short.fasta`. A trailing `.gz`
/// is dropped first since outputs are always written uncompressed.
pub fn sibling_with_suffix(input: &Utf8Path, suffix: &str) -> Utf8PathBuf {
    let plain = if is_gzip(input.as_std_path()) {
        input.with_extension("")
    } else {
        input.to_path_buf()
    };
    let stem = plain.file_stem().unwrap_or_default();
    let file_name = match plain.extension() {
        Some(ext) => format!("{stem}_{suffix}.{ext}"),
        None => format!("{stem}_{suffix}"),
    };
    input.with_file_name(file_name)
}

/// Resolves a bare output name against the directory holding `input`.
pub fn resolve_beside(input: &Utf8Path, name: &str) -> Utf8PathBuf {
    let candidate = Utf8Path::new(name);
    if candidate.is_absolute() {
        return candidate.to_path_buf();
    }
    match input.parent() {
        Some(parent) => parent.join(candidate),
        None => candidate.to_path_buf(),
    }
}

pub fn require_input(path: &Path) -> Result<(), MascotFastaError> {
    if !path.is_file() {
        return Err(MascotFastaError::InputNotFound(path.to_path_buf()));
    }
    Ok(())
}

pub fn is_gzip(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}
