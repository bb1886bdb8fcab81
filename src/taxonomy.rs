use std::time::Instant;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::{debug, info};

use crate::app::{ProgressEvent, ProgressSink};
use crate::domain::{FastaHeader, TaxonomyMnemonic};
use crate::error::MascotFastaError;
use crate::fasta::{AtomicLineWriter, TextLines};

#[derive(Debug, Clone, Serialize)]
pub struct ExtractReport {
    pub input: Utf8PathBuf,
    pub output: Utf8PathBuf,
    pub mnemonic: String,
    pub entries: usize,
    pub extracted: usize,
}

/// Copies, unchanged, every entry whose accession ends with `mnemonic`
/// (e.g. `HUMAN` for UniProt `XXX_HUMAN` entries).
pub fn extract_taxonomy(
    input: &Utf8Path,
    output: &Utf8Path,
    separator: &str,
    mnemonic: &TaxonomyMnemonic,
    sink: &dyn ProgressSink,
) -> Result<ExtractReport, MascotFastaError> {
    let started = Instant::now();
    info!("extract taxonomy {mnemonic} from {input} to {output}");
    sink.event(ProgressEvent::phase(format!(
        "phase=Extract; selecting *{mnemonic} entries of {input}"
    )));

    let lines = TextLines::open(input.as_std_path())?;
    let mut writer = AtomicLineWriter::create(output.as_std_path())?;
    let mut report = ExtractReport {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        mnemonic: mnemonic.to_string(),
        entries: 0,
        extracted: 0,
    };
    let mut keep = false;

    for line in lines {
        let line = line?;
        if let Some(header) = FastaHeader::parse(&line, separator) {
            report.entries += 1;
            keep = header.accession.ends_with(mnemonic.as_str());
            if keep {
                debug!(accession = header.accession, "taxonomy found");
                report.extracted += 1;
            }
        }
        if keep {
            writer.write_line(&line)?;
        }
    }

    writer.finish()?;
    info!(
        "found {} entries for taxonomy {mnemonic}",
        report.extracted
    );
    sink.event(ProgressEvent::done(
        format!(
            "phase=Done; {} of {} entries extracted",
            report.extracted, report.entries
        ),
        started,
    ));
    Ok(report)
}
