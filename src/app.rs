use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};

use crate::config::ResolvedConfig;
use crate::domain::TaxonomyMnemonic;
use crate::duplicates::{self, CompareReport, ReplaceReport};
use crate::empty::{self, EmptyFilterReport};
use crate::error::MascotFastaError;
use crate::fs_util::{require_input, resolve_beside, sibling_with_suffix};
use crate::shorten::{self, ShortenOptions, ShortenReport};
use crate::taxonomy::{self, ExtractReport};
use crate::usage::{self, StatusTable, UsageOptions, UsageReport};

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

impl ProgressEvent {
    pub fn phase(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            elapsed: None,
        }
    }

    pub fn done(message: impl Into<String>, started: Instant) -> Self {
        Self {
            message: message.into(),
            elapsed: Some(started.elapsed()),
        }
    }
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone)]
pub struct UsageRequest {
    pub searches_log: Utf8PathBuf,
    pub database: Option<String>,
    pub status_file: Option<Utf8PathBuf>,
    pub output: Option<Utf8PathBuf>,
    pub all_status: bool,
}

/// Entry point for every command. Built once per invocation from the
/// resolved configuration; separators given on the command line win over the
/// configured ones.
#[derive(Debug, Clone)]
pub struct App {
    config: ResolvedConfig,
}

impl App {
    pub fn new(config: ResolvedConfig) -> Self {
        Self { config }
    }

    pub fn shorten(
        &self,
        input: &Utf8Path,
        separator: Option<&str>,
        sink: &dyn ProgressSink,
    ) -> Result<ShortenReport, MascotFastaError> {
        require_input(input.as_std_path())?;
        let output = sibling_with_suffix(input, "short");
        let options = ShortenOptions {
            separator: self.separator_or(separator, &self.config.shorten_separator)?,
            max_len: self.config.accession_max_len,
        };
        shorten::shorten_accessions(input, &output, &options, sink)
    }

    pub fn compare_duplicates(
        &self,
        input: &Utf8Path,
        separator: Option<&str>,
        sink: &dyn ProgressSink,
    ) -> Result<CompareReport, MascotFastaError> {
        require_input(input.as_std_path())?;
        let separator = self.separator_or(separator, &self.config.entry_separator)?;
        duplicates::compare_duplicates(input, separator, sink)
    }

    /// The output file has to exist beforehand; it is then overwritten.
    pub fn replace_duplicates(
        &self,
        input: &Utf8Path,
        output: &Utf8Path,
        separator: Option<&str>,
        sink: &dyn ProgressSink,
    ) -> Result<ReplaceReport, MascotFastaError> {
        require_input(input.as_std_path())?;
        if !output.as_std_path().exists() {
            return Err(MascotFastaError::ReplaceTargetMissing(
                output.as_std_path().to_path_buf(),
            ));
        }
        let separator = self.separator_or(separator, &self.config.entry_separator)?;
        duplicates::replace_duplicates(input, output, separator, sink)
    }

    pub fn extract_taxonomy(
        &self,
        input: &Utf8Path,
        mnemonic: &TaxonomyMnemonic,
        output_name: Option<&str>,
        separator: Option<&str>,
        sink: &dyn ProgressSink,
    ) -> Result<ExtractReport, MascotFastaError> {
        require_input(input.as_std_path())?;
        let output = match output_name {
            Some(name) if !name.trim().is_empty() => resolve_beside(input, name),
            _ => sibling_with_suffix(input, mnemonic.as_str()),
        };
        let separator = self.separator_or(separator, &self.config.entry_separator)?;
        taxonomy::extract_taxonomy(input, &output, separator, mnemonic, sink)
    }

    pub fn remove_empty(
        &self,
        input: &Utf8Path,
        sink: &dyn ProgressSink,
    ) -> Result<EmptyFilterReport, MascotFastaError> {
        require_input(input.as_std_path())?;
        let output = sibling_with_suffix(input, "clean");
        empty::remove_empty_entries(input, &output, sink)
    }

    /// Scans the searches log and, when an output path is requested, writes
    /// the TSV table there.
    pub fn db_usage(
        &self,
        request: &UsageRequest,
        sink: &dyn ProgressSink,
    ) -> Result<UsageReport, MascotFastaError> {
        require_input(request.searches_log.as_std_path())?;
        if request.all_status && request.status_file.is_none() {
            return Err(MascotFastaError::InvalidArgument(
                "-a needs a status file (-m)".to_string(),
            ));
        }

        let status = match &request.status_file {
            Some(path) => {
                sink.event(ProgressEvent::phase(format!(
                    "phase=Status; reading databases section of {path}"
                )));
                Some(StatusTable::load(path)?)
            }
            None => None,
        };

        let options = UsageOptions {
            target: request.database.as_deref(),
            status: status.as_ref(),
            seed_from_status: request.all_status,
            monitor_prefix: &self.config.monitor_user_prefix,
        };
        let report = usage::report_usage(&request.searches_log, &options, sink)?;

        if let Some(output) = &request.output {
            report.write_tsv(output)?;
            sink.event(ProgressEvent::phase(format!(
                "phase=Write; {} databases written to {output}",
                report.databases.len()
            )));
        }
        Ok(report)
    }

    fn separator_or<'a>(
        &self,
        requested: Option<&'a str>,
        configured: &'a str,
    ) -> Result<&'a str, MascotFastaError> {
        match requested {
            Some("") => Err(MascotFastaError::InvalidSeparator(String::new())),
            Some(separator) => Ok(separator),
            None => Ok(configured),
        }
    }
}
