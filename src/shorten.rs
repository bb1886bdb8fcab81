use std::collections::HashSet;
use std::time::Instant;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::app::{ProgressEvent, ProgressSink};
use crate::domain::is_header;
use crate::error::MascotFastaError;
use crate::fasta::{AtomicLineWriter, TextLines};

#[derive(Debug, Clone)]
pub struct ShortenOptions<'a> {
    pub separator: &'a str,
    pub max_len: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShortenReport {
    pub input: Utf8PathBuf,
    pub output: Utf8PathBuf,
    pub lines: usize,
    pub headers: usize,
    pub rewritten: usize,
    pub too_long: Vec<String>,
    pub duplicates: Vec<String>,
}

/// Result of cutting one accession candidate down to size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncated<'a> {
    pub accession: &'a str,
    pub too_long: bool,
}

/// Cuts at the first `/`, or else at the last `_`, once the candidate is
/// longer than `max_len` characters.
pub fn truncate_accession(candidate: &str, max_len: usize) -> Truncated<'_> {
    let too_long = |value: &str| value.chars().count() > max_len;
    if !too_long(candidate) {
        return Truncated {
            accession: candidate,
            too_long: false,
        };
    }

    let cut = candidate.find('/').or_else(|| candidate.rfind('_'));
    let accession = match cut {
        Some(index) => &candidate[..index],
        None => candidate,
    };
    Truncated {
        accession,
        too_long: too_long(accession),
    }
}

/// Mascot chokes on quotes and commas in accessions.
pub fn sanitize_accession(accession: &str) -> String {
    accession.replace([',', '"', '\''], "_")
}

pub fn shorten_accessions(
    input: &Utf8Path,
    output: &Utf8Path,
    options: &ShortenOptions<'_>,
    sink: &dyn ProgressSink,
) -> Result<ShortenReport, MascotFastaError> {
    let started = Instant::now();
    sink.event(ProgressEvent::phase(format!(
        "phase=Shorten; {input} -> {output} (separator {:?}, max {})",
        options.separator, options.max_len
    )));

    let lines = TextLines::open(input.as_std_path())?;
    let mut writer = AtomicLineWriter::create(output.as_std_path())?;
    let mut seen = HashSet::new();
    let mut report = ShortenReport {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        lines: 0,
        headers: 0,
        rewritten: 0,
        too_long: Vec::new(),
        duplicates: Vec::new(),
    };

    for line in lines {
        let line = line?;
        report.lines += 1;

        if !is_header(&line) {
            writer.write_line(&line)?;
            continue;
        }
        report.headers += 1;

        let Some(index) = line.find(options.separator) else {
            writer.write_line(&line)?;
            continue;
        };

        let candidate = &line[index + options.separator.len()..];
        let truncated = truncate_accession(candidate, options.max_len);
        if truncated.too_long {
            error!(accession = truncated.accession, "accession still too long");
            report.too_long.push(truncated.accession.to_string());
        }
        if !seen.insert(truncated.accession.to_string()) {
            warn!(accession = truncated.accession, "duplicate accession");
            report.duplicates.push(truncated.accession.to_string());
        }

        let accession = sanitize_accession(truncated.accession);
        writer.write_line(&format!(">{accession} {}", &line[1..]))?;
        report.rewritten += 1;
    }

    writer.finish()?;
    info!(
        headers = report.headers,
        rewritten = report.rewritten,
        too_long = report.too_long.len(),
        duplicates = report.duplicates.len(),
        "shortened accessions written to {output}"
    );
    sink.event(ProgressEvent::done(
        format!("phase=Done; {} headers rewritten", report.rewritten),
        started,
    ));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_candidate_is_untouched() {
        let truncated = truncate_accession("P69905", 50);
        assert_eq!(truncated.accession, "P69905");
        assert!(!truncated.too_long);
    }

    #[test]
    fn slash_wins_over_underscore() {
        let candidate = format!("{}/tail_end", "A".repeat(55));
        let truncated = truncate_accession(&candidate, 50);
        assert_eq!(truncated.accession.len(), 55);
        assert!(truncated.too_long);
    }

    #[test]
    fn cut_at_last_underscore() {
        let candidate = format!("{}_{}", "A".repeat(30), "B".repeat(30));
        let truncated = truncate_accession(&candidate, 50);
        assert_eq!(truncated.accession, "A".repeat(30));
        assert!(!truncated.too_long);
    }

    #[test]
    fn no_split_point_keeps_value() {
        let candidate = "X".repeat(60);
        let truncated = truncate_accession(&candidate, 50);
        assert_eq!(truncated.accession, candidate);
        assert!(truncated.too_long);
    }

    #[test]
    fn sanitize_replaces_quotes_and_commas() {
        assert_eq!(sanitize_accession(r#"a,b"c'd"#), "a_b_c_d");
    }
}
