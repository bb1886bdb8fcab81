use std::fs;

use camino::Utf8PathBuf;

use mascot_fasta::app::{App, ProgressEvent, ProgressSink};
use mascot_fasta::config::ResolvedConfig;
use mascot_fasta::domain::TaxonomyMnemonic;

struct NoopSink;

impl ProgressSink for NoopSink {
    fn event(&self, _event: ProgressEvent) {}
}

const BANK: &str = "\
>sp|P69905|HBA_HUMAN Hemoglobin subunit alpha OS=Homo sapiens
MVLSPADKTNVKAAWGKVGA
HAGEYGAEALERMFLSFPTT
>sp|P01942|HBA_MOUSE Hemoglobin subunit alpha OS=Mus musculus
MVLSGEDKSNIKAAWGKIGG
>sp|P68871|HBB_HUMAN Hemoglobin subunit beta OS=Homo sapiens
MVHLTPEEKSAVTALWGKVN
>sp|Q9XHUMAN|X_HUMANX decoy
MK
";

#[test]
fn keeps_matching_entries_in_order() {
    let temp = tempfile::tempdir().unwrap();
    let input = Utf8PathBuf::from_path_buf(temp.path().join("sprot.fasta")).unwrap();
    fs::write(&input, BANK).unwrap();
    let mnemonic: TaxonomyMnemonic = "HUMAN".parse().unwrap();

    let app = App::new(ResolvedConfig::default());
    let report = app
        .extract_taxonomy(&input, &mnemonic, None, None, &NoopSink)
        .unwrap();

    assert_eq!(report.output, input.with_file_name("sprot_HUMAN.fasta"));
    assert_eq!(report.entries, 4);
    assert_eq!(report.extracted, 2);
    let written = fs::read_to_string(&report.output).unwrap();
    assert_eq!(
        written,
        "\
>sp|P69905|HBA_HUMAN Hemoglobin subunit alpha OS=Homo sapiens
MVLSPADKTNVKAAWGKVGA
HAGEYGAEALERMFLSFPTT
>sp|P68871|HBB_HUMAN Hemoglobin subunit beta OS=Homo sapiens
MVHLTPEEKSAVTALWGKVN
"
    );
}

#[test]
fn suffix_match_is_case_sensitive() {
    let temp = tempfile::tempdir().unwrap();
    let input = Utf8PathBuf::from_path_buf(temp.path().join("sprot.fasta")).unwrap();
    fs::write(&input, BANK).unwrap();
    let mnemonic: TaxonomyMnemonic = "human".parse().unwrap();

    let app = App::new(ResolvedConfig::default());
    let report = app
        .extract_taxonomy(&input, &mnemonic, None, None, &NoopSink)
        .unwrap();

    assert_eq!(report.extracted, 0);
    assert_eq!(fs::read_to_string(&report.output).unwrap(), "");
}

#[test]
fn output_name_is_relative_to_input_directory() {
    let temp = tempfile::tempdir().unwrap();
    let input = Utf8PathBuf::from_path_buf(temp.path().join("sprot.fasta")).unwrap();
    fs::write(&input, BANK).unwrap();
    let mnemonic: TaxonomyMnemonic = "MOUSE".parse().unwrap();

    let app = App::new(ResolvedConfig::default());
    let report = app
        .extract_taxonomy(&input, &mnemonic, Some("mouse.fasta"), None, &NoopSink)
        .unwrap();

    assert_eq!(report.output, input.with_file_name("mouse.fasta"));
    let written = fs::read_to_string(&report.output).unwrap();
    assert!(written.starts_with(">sp|P01942|HBA_MOUSE"));
    assert_eq!(written.lines().count(), 2);
}
