use std::time::Instant;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::{debug, info};

use crate::app::{ProgressEvent, ProgressSink};
use crate::domain::is_header;
use crate::error::MascotFastaError;
use crate::fasta::{AtomicLineWriter, TextLines};

#[derive(Debug, Clone, Serialize)]
pub struct EmptyFilterReport {
    pub input: Utf8PathBuf,
    pub output: Utf8PathBuf,
    pub entries: usize,
    pub kept: usize,
    pub dropped: usize,
}

enum EntryState {
    /// Header read, first sequence line not seen yet.
    Pending(String),
    Keep,
    Drop,
}

/// Drops entries whose first sequence line is empty (or missing), together
/// with the rest of their lines. Lines before the first header are dropped.
pub fn remove_empty_entries(
    input: &Utf8Path,
    output: &Utf8Path,
    sink: &dyn ProgressSink,
) -> Result<EmptyFilterReport, MascotFastaError> {
    let started = Instant::now();
    sink.event(ProgressEvent::phase(format!(
        "phase=Filter; removing empty entries of {input} into {output}"
    )));

    let lines = TextLines::open(input.as_std_path())?;
    let mut writer = AtomicLineWriter::create(output.as_std_path())?;
    let mut report = EmptyFilterReport {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        entries: 0,
        kept: 0,
        dropped: 0,
    };
    let mut state = EntryState::Drop;

    for line in lines {
        let line = line?;
        if is_header(&line) {
            if let EntryState::Pending(header) = &state {
                debug!(header = %header, "entry without sequence dropped");
                report.dropped += 1;
            }
            report.entries += 1;
            state = EntryState::Pending(line);
            continue;
        }

        state = match state {
            EntryState::Pending(header) if line.is_empty() => {
                debug!(header = %header, "entry with empty sequence dropped");
                report.dropped += 1;
                EntryState::Drop
            }
            EntryState::Pending(header) => {
                writer.write_line(&header)?;
                writer.write_line(&line)?;
                report.kept += 1;
                EntryState::Keep
            }
            EntryState::Keep => {
                writer.write_line(&line)?;
                EntryState::Keep
            }
            EntryState::Drop => EntryState::Drop,
        };
    }
    if let EntryState::Pending(header) = &state {
        debug!(header = %header, "entry without sequence dropped");
        report.dropped += 1;
    }

    writer.finish()?;
    info!(
        kept = report.kept,
        dropped = report.dropped,
        "cleaned fasta written to {output}"
    );
    sink.event(ProgressEvent::done(
        format!(
            "phase=Done; {} entries kept, {} dropped",
            report.kept, report.dropped
        ),
        started,
    ));
    Ok(report)
}
