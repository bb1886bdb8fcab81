use std::collections::HashSet;
use std::fs;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use mascot_fasta::app::{App, ProgressEvent, ProgressSink};
use mascot_fasta::config::ResolvedConfig;
use mascot_fasta::error::MascotFastaError;

struct NoopSink;

impl ProgressSink for NoopSink {
    fn event(&self, _event: ProgressEvent) {}
}

fn utf8(path: std::path::PathBuf) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(path).unwrap()
}

fn accessions(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| line.strip_prefix('>'))
        .map(|header| header.split(' ').next().unwrap_or_default().to_string())
        .collect()
}

const WITH_DUPLICATES: &str = "\
>P1 first
MKV
LL
>P2 other
AAA
>P1 again
MKVLL
>P1 third
MKX
>P1_1 clash
CC
";

#[test]
fn compare_reports_same_and_different_sequences() {
    let temp = tempfile::tempdir().unwrap();
    let input = utf8(temp.path().join("bank.fasta"));
    fs::write(&input, WITH_DUPLICATES).unwrap();

    let app = App::new(ResolvedConfig::default());
    let report = app.compare_duplicates(&input, None, &NoopSink).unwrap();

    assert_eq!(report.entries, 5);
    assert_eq!(report.duplicates, 2);
    assert_eq!(report.different, 1);
    assert_eq!(report.comparisons[0].accession, "P1");
    assert!(report.comparisons[0].same_sequence);
    assert!(!report.comparisons[1].same_sequence);
}

#[test]
fn compare_checks_against_first_occurrence_only() {
    let temp = tempfile::tempdir().unwrap();
    let input = utf8(temp.path().join("bank.fasta"));
    fs::write(&input, ">A\nXX\n>A\nYY\n>A\nYY\n").unwrap();

    let app = App::new(ResolvedConfig::default());
    let report = app.compare_duplicates(&input, None, &NoopSink).unwrap();

    assert_eq!(report.duplicates, 2);
    assert_eq!(report.different, 2);
}

#[test]
fn compare_includes_last_entry() {
    let temp = tempfile::tempdir().unwrap();
    let input = utf8(temp.path().join("bank.fasta"));
    fs::write(&input, ">A\nXX\n>A\nXX").unwrap();

    let app = App::new(ResolvedConfig::default());
    let report = app.compare_duplicates(&input, None, &NoopSink).unwrap();

    assert_eq!(report.duplicates, 1);
    assert_eq!(report.different, 0);
}

#[test]
fn replace_renames_later_occurrences() {
    let temp = tempfile::tempdir().unwrap();
    let input = utf8(temp.path().join("bank.fasta"));
    let output = utf8(temp.path().join("bank_nodup.fasta"));
    fs::write(&input, WITH_DUPLICATES).unwrap();
    fs::write(&output, "").unwrap();

    let app = App::new(ResolvedConfig::default());
    let report = app
        .replace_duplicates(&input, &output, None, &NoopSink)
        .unwrap();

    let written = fs::read_to_string(&output).unwrap();
    assert_eq!(
        accessions(&written),
        vec!["P1", "P2", "P1_1", "P1_2", "P1_1_1"]
    );
    assert!(written.contains(">P1 first\n"));
    assert!(written.contains(">P1_1 again\nMKVLL\n"));
    assert!(written.contains(">P1_2 third\n"));
    assert_eq!(report.renamed.len(), 3);
    assert_eq!(report.renamed[2].from, "P1_1");
    assert_eq!(report.renamed[2].to, "P1_1_1");
    assert_eq!(
        written.lines().count(),
        WITH_DUPLICATES.lines().count()
    );

    let unique: HashSet<String> = accessions(&written).into_iter().collect();
    assert_eq!(unique.len(), accessions(&written).len());
}

#[test]
fn replace_twice_is_a_no_op() {
    let temp = tempfile::tempdir().unwrap();
    let input = utf8(temp.path().join("bank.fasta"));
    let first = utf8(temp.path().join("first.fasta"));
    let second = utf8(temp.path().join("second.fasta"));
    fs::write(&input, WITH_DUPLICATES).unwrap();
    fs::write(&first, "").unwrap();
    fs::write(&second, "").unwrap();

    let app = App::new(ResolvedConfig::default());
    app.replace_duplicates(&input, &first, None, &NoopSink)
        .unwrap();
    let report = app
        .replace_duplicates(&first, &second, None, &NoopSink)
        .unwrap();

    assert!(report.renamed.is_empty());
    assert_eq!(
        fs::read_to_string(&first).unwrap(),
        fs::read_to_string(&second).unwrap()
    );
}

#[test]
fn replace_requires_existing_output() {
    let temp = tempfile::tempdir().unwrap();
    let input = utf8(temp.path().join("bank.fasta"));
    let output = utf8(temp.path().join("missing.fasta"));
    fs::write(&input, WITH_DUPLICATES).unwrap();

    let app = App::new(ResolvedConfig::default());
    let err = app
        .replace_duplicates(&input, &output, None, &NoopSink)
        .unwrap_err();

    assert_matches!(err, MascotFastaError::ReplaceTargetMissing(_));
    assert!(!output.exists());
}
