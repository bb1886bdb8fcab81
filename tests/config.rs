use std::fs;

use assert_matches::assert_matches;

use mascot_fasta::config::{Config, ConfigLoader, ResolvedConfig};
use mascot_fasta::error::MascotFastaError;

#[test]
fn partial_config_keeps_other_defaults() {
    let config = Config {
        schema_version: None,
        accession_max_len: Some(30),
        monitor_user_prefix: None,
        shorten_separator: Some("|".to_string()),
        entry_separator: None,
    };

    let resolved = ConfigLoader::resolve_config(config).unwrap();
    assert_eq!(resolved.accession_max_len, 30);
    assert_eq!(resolved.shorten_separator, "|");
    assert_eq!(resolved.entry_separator, " ");
    assert_eq!(resolved.monitor_user_prefix, "Monitor Test DB");
}

#[test]
fn explicit_config_file_is_read() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("mascot-fasta.json");
    fs::write(
        &path,
        r#"{ "schema_version": 1, "monitor_user_prefix": "Probe", "accession_max_len": 40 }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.monitor_user_prefix, "Probe");
    assert_eq!(resolved.accession_max_len, 40);
    assert_eq!(resolved.shorten_separator, ResolvedConfig::default().shorten_separator);
}

#[test]
fn explicit_missing_config_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");

    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, MascotFastaError::ConfigRead(_));
}

#[test]
fn malformed_config_is_reported() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();

    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, MascotFastaError::ConfigParse(_));
}
