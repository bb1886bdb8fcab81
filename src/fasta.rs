use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use tempfile::{Builder, NamedTempFile};
use tracing::warn;

use crate::error::MascotFastaError;
use crate::fs_util::{is_gzip, require_input};

/// Line iterator over a text file, transparently gunzipping `.gz` inputs.
/// Line terminators (`\n` or `\r\n`) are stripped. Bytes that are not valid
/// UTF-8 are replaced with U+FFFD instead of failing the whole read.
pub struct TextLines {
    reader: Box<dyn BufRead>,
    path: PathBuf,
    buffer: Vec<u8>,
    line_no: usize,
}

impl TextLines {
    pub fn open(path: &Path) -> Result<Self, MascotFastaError> {
        require_input(path)?;
        let file = File::open(path).map_err(|err| MascotFastaError::InputRead {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let reader: Box<dyn BufRead> = if is_gzip(path) {
            Box::new(BufReader::new(MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };
        Ok(Self {
            reader,
            path: path.to_path_buf(),
            buffer: Vec::new(),
            line_no: 0,
        })
    }

    /// Number of lines returned so far.
    pub fn line_no(&self) -> usize {
        self.line_no
    }
}

impl Iterator for TextLines {
    type Item = Result<String, MascotFastaError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buffer.clear();
        match self.reader.read_until(b'\n', &mut self.buffer) {
            Ok(0) => None,
            Ok(_) => {
                self.line_no += 1;
                let end = self
                    .buffer
                    .iter()
                    .rposition(|byte| !matches!(byte, b'\n' | b'\r'))
                    .map_or(0, |last| last + 1);
                let bytes = &self.buffer[..end];
                let line = match std::str::from_utf8(bytes) {
                    Ok(line) => line.to_string(),
                    Err(_) => {
                        warn!(
                            path = %self.path.display(),
                            line = self.line_no,
                            "invalid UTF-8 replaced"
                        );
                        String::from_utf8_lossy(bytes).into_owned()
                    }
                };
                Some(Ok(line))
            }
            Err(err) => Some(Err(MascotFastaError::InputRead {
                path: self.path.clone(),
                message: format!("line {}: {err}", self.line_no + 1),
            })),
        }
    }
}

/// Buffered writer into a temporary file beside `destination`; the result only
/// replaces `destination` once [`AtomicLineWriter::finish`] succeeds.
pub struct AtomicLineWriter {
    writer: BufWriter<NamedTempFile>,
    destination: PathBuf,
    lines: usize,
}

impl AtomicLineWriter {
    pub fn create(destination: &Path) -> Result<Self, MascotFastaError> {
        let dir = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let temp = Builder::new()
            .prefix(".mascot-fasta-")
            .tempfile_in(&dir)
            .map_err(|err| write_error(destination, err))?;
        Ok(Self {
            writer: BufWriter::new(temp),
            destination: destination.to_path_buf(),
            lines: 0,
        })
    }

    pub fn write_line(&mut self, line: &str) -> Result<(), MascotFastaError> {
        self.writer
            .write_all(line.as_bytes())
            .and_then(|_| self.writer.write_all(b"\n"))
            .map_err(|err| write_error(&self.destination, err))?;
        self.lines += 1;
        Ok(())
    }

    /// Flushes and moves the temporary file onto the destination. Returns the
    /// number of lines written.
    pub fn finish(self) -> Result<usize, MascotFastaError> {
        let destination = self.destination;
        let temp = self
            .writer
            .into_inner()
            .map_err(|err| write_error(&destination, err.into_error()))?;
        if destination.exists() {
            fs::remove_file(&destination).map_err(|err| write_error(&destination, err))?;
        }
        temp.persist(&destination)
            .map_err(|err| write_error(&destination, err.error))?;
        Ok(self.lines)
    }
}

fn write_error(path: &Path, err: std::io::Error) -> MascotFastaError {
    MascotFastaError::OutputWrite {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
