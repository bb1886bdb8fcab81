use std::collections::{HashMap, HashSet};
use std::time::Instant;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::app::{ProgressEvent, ProgressSink};
use crate::domain::FastaHeader;
use crate::error::MascotFastaError;
use crate::fasta::{AtomicLineWriter, TextLines};

#[derive(Debug, Clone, Serialize)]
pub struct DuplicateComparison {
    pub accession: String,
    pub same_sequence: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompareReport {
    pub input: Utf8PathBuf,
    pub entries: usize,
    pub duplicates: usize,
    pub different: usize,
    pub comparisons: Vec<DuplicateComparison>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenamedAccession {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplaceReport {
    pub input: Utf8PathBuf,
    pub output: Utf8PathBuf,
    pub entries: usize,
    pub renamed: Vec<RenamedAccession>,
}

struct OpenEntry {
    accession: String,
    sequence: String,
}

/// Compares the sequence of every repeated accession with the one stored for
/// its first occurrence. Later duplicates are never compared with each other.
pub fn compare_duplicates(
    input: &Utf8Path,
    separator: &str,
    sink: &dyn ProgressSink,
) -> Result<CompareReport, MascotFastaError> {
    let started = Instant::now();
    sink.event(ProgressEvent::phase(format!(
        "phase=Compare; searching duplicates in {input} using separator {separator:?}"
    )));

    let mut first_sequences: HashMap<String, String> = HashMap::new();
    let mut report = CompareReport {
        input: input.to_path_buf(),
        entries: 0,
        duplicates: 0,
        different: 0,
        comparisons: Vec::new(),
    };
    let mut current: Option<OpenEntry> = None;

    for line in TextLines::open(input.as_std_path())? {
        let line = line?;
        match FastaHeader::parse(&line, separator) {
            Some(header) => {
                if let Some(entry) = current.take() {
                    close_entry(entry, &mut first_sequences, &mut report);
                }
                if header.accession.is_empty() {
                    warn!(header = %line, "header without accession");
                }
                current = Some(OpenEntry {
                    accession: header.accession.to_string(),
                    sequence: String::new(),
                });
            }
            None => {
                if let Some(entry) = current.as_mut() {
                    entry.sequence.push_str(&line);
                }
            }
        }
    }
    if let Some(entry) = current.take() {
        close_entry(entry, &mut first_sequences, &mut report);
    }

    info!(
        "found {} duplicate entries with {} with different sequences",
        report.duplicates, report.different
    );
    sink.event(ProgressEvent::done(
        format!(
            "phase=Done; {} entries, {} duplicates",
            report.entries, report.duplicates
        ),
        started,
    ));
    Ok(report)
}

fn close_entry(
    entry: OpenEntry,
    first_sequences: &mut HashMap<String, String>,
    report: &mut CompareReport,
) {
    report.entries += 1;
    match first_sequences.get(&entry.accession) {
        Some(first) => {
            let same_sequence = *first == entry.sequence;
            report.duplicates += 1;
            if same_sequence {
                info!("duplicate\t{}\tsame sequences", entry.accession);
            } else {
                report.different += 1;
                warn!("duplicate\t{}\tDIFFERENT sequences", entry.accession);
            }
            report.comparisons.push(DuplicateComparison {
                accession: entry.accession,
                same_sequence,
            });
        }
        None => {
            first_sequences.insert(entry.accession, entry.sequence);
        }
    }
}

/// First unused `accession_N`, counting from 1.
pub fn next_free_accession(accession: &str, taken: &HashSet<String>) -> String {
    (1..)
        .map(|index| format!("{accession}_{index}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| accession.to_string())
}

/// Streams `input` to `output`, renaming every repeated accession with the
/// first free numeric suffix. First occurrences keep their name.
pub fn replace_duplicates(
    input: &Utf8Path,
    output: &Utf8Path,
    separator: &str,
    sink: &dyn ProgressSink,
) -> Result<ReplaceReport, MascotFastaError> {
    let started = Instant::now();
    sink.event(ProgressEvent::phase(format!(
        "phase=Replace; renaming duplicates of {input} into {output} using separator {separator:?}"
    )));

    let lines = TextLines::open(input.as_std_path())?;
    let mut writer = AtomicLineWriter::create(output.as_std_path())?;
    let mut taken: HashSet<String> = HashSet::new();
    let mut report = ReplaceReport {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        entries: 0,
        renamed: Vec::new(),
    };

    for line in lines {
        let line = line?;
        let Some(header) = FastaHeader::parse(&line, separator) else {
            writer.write_line(&line)?;
            continue;
        };
        report.entries += 1;

        if taken.contains(header.accession) {
            debug!(accession = header.accession, "found duplicate");
            let renamed = next_free_accession(header.accession, &taken);
            info!("renamed {} to {}", header.accession, renamed);
            writer.write_line(&format!(">{renamed}{}", header.description))?;
            report.renamed.push(RenamedAccession {
                from: header.accession.to_string(),
                to: renamed.clone(),
            });
            taken.insert(renamed);
        } else {
            if header.accession.is_empty() {
                warn!(header = %line, "header without accession");
            }
            taken.insert(header.accession.to_string());
            writer.write_line(&line)?;
        }
    }

    writer.finish()?;
    info!("found {} duplicate entries", report.renamed.len());
    sink.event(ProgressEvent::done(
        format!("phase=Done; {} accessions renamed", report.renamed.len()),
        started,
    ));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_free_skips_taken_suffixes() {
        let taken: HashSet<String> = ["P1", "P1_1", "P1_2"]
            .into_iter()
            .map(str::to_string)
            .collect();
        assert_eq!(next_free_accession("P1", &taken), "P1_3");
    }

    #[test]
    fn next_free_starts_at_one() {
        let taken: HashSet<String> = ["P1".to_string()].into_iter().collect();
        assert_eq!(next_free_accession("P1", &taken), "P1_1");
    }
}
