//! Database usage report built from the Mascot `searches.log`.
//!
//! Each log line goes through an ordered pipeline over its columns
//! (database names, user, start time). Any stage can drop the rest of the
//! line; records created by an earlier stage of that line are kept.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;
use std::time::Instant;

use camino::Utf8Path;
use chrono::{NaiveDate, NaiveDateTime, Weekday};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use crate::app::{ProgressEvent, ProgressSink};
use crate::domain::DbStatus;
use crate::error::MascotFastaError;
use crate::fasta::{AtomicLineWriter, TextLines};

/// Column layout of `searches.log`.
pub mod column {
    pub const JOB_ID: usize = 0;
    pub const PROCESS_ID: usize = 1;
    pub const DB_NAMES: usize = 2;
    pub const USER: usize = 3;
    pub const USER_MAIL: usize = 4;
    pub const TITLE: usize = 5;
    pub const DAT_PATH: usize = 6;
    pub const START_TIME: usize = 7;
    pub const DURATION: usize = 8;
    pub const STATUS: usize = 9;
    pub const PR: usize = 10;
    pub const TYPE: usize = 11;
    pub const ENZYME: usize = 12;
    pub const IP_ADDRESS: usize = 13;
    pub const USER_ID: usize = 14;
    pub const PEAKLIST_FILE: usize = 15;

    pub const COUNT: usize = PEAKLIST_FILE + 1;
}

pub const TSV_HEADER: &str = "Name\tLastUsageDate\tStatus";
pub const NOT_FOUND_DATE: &str = "-";

const STATUS_SECTION_START: &str = "Databases";
const STATUS_SECTION_END: &str = "end";

static SPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" {2,}").expect("static regex is valid"));

pub fn epoch_sentinel() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Active/inactive flag per database, read from the `Databases` section of
/// `mascot.dat`.
#[derive(Debug, Clone, Default)]
pub struct StatusTable {
    active_by_name: HashMap<String, bool>,
}

impl StatusTable {
    pub fn load(path: &Utf8Path) -> Result<Self, MascotFastaError> {
        let lines = TextLines::open(path.as_std_path())?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| MascotFastaError::StatusFileRead(path.as_std_path().to_path_buf()))?;
        let table = Self::parse(lines.iter().map(String::as_str));
        info!(databases = table.len(), "status file {path} read");
        Ok(table)
    }

    pub fn parse<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut active_by_name = HashMap::new();
        let mut in_section = false;

        for line in lines {
            let trimmed = line.trim();
            if in_section && trimmed == STATUS_SECTION_END {
                break;
            }
            if trimmed == STATUS_SECTION_START {
                debug!("start of Databases section");
                in_section = true;
                continue;
            }
            if !in_section {
                continue;
            }

            let mut tokens = trimmed.split_whitespace();
            let Some(first) = tokens.next() else {
                continue;
            };
            let entry = if first == "#" {
                tokens.next().map(|name| (name, false))
            } else if let Some(name) = first.strip_prefix('#') {
                Some((name, false))
            } else {
                Some((first, true))
            };
            if let Some((name, active)) = entry {
                active_by_name.insert(name.to_string(), active);
            }
        }

        Self { active_by_name }
    }

    pub fn status_of(&self, name: &str) -> DbStatus {
        match self.active_by_name.get(name) {
            None => DbStatus::Deleted,
            Some(true) => DbStatus::Active,
            Some(false) => DbStatus::Inactive,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.active_by_name.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.active_by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active_by_name.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbUsageRecord {
    pub name: String,
    pub last_usage: NaiveDate,
    pub found: bool,
    pub status: DbStatus,
}

impl DbUsageRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last_usage: epoch_sentinel(),
            found: false,
            status: DbStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UsageOptions<'a> {
    /// Only lines listing this database are considered.
    pub target: Option<&'a str>,
    pub status: Option<&'a StatusTable>,
    /// Seed a record for every database of the status table.
    pub seed_from_status: bool,
    pub monitor_prefix: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoDatabases,
    TargetAbsent,
    MonitorUser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Skipped(SkipReason),
    /// The line ended before the start time column.
    Truncated,
    Dated(NaiveDate),
    Undated,
}

enum Step<T> {
    Continue(T),
    Skip(SkipReason),
}

/// Parses a `searches.log` start time such as `Tue Jan  2 10:00:00 2020`.
/// The weekday must be an English day name but is not checked against the
/// date itself.
pub fn parse_start_time(value: &str) -> Option<NaiveDate> {
    let normalized = SPACE_RUNS.replace_all(value.trim(), " ");
    let (weekday, rest) = normalized.split_once(' ')?;
    weekday.parse::<Weekday>().ok()?;
    NaiveDateTime::parse_from_str(rest, "%b %d %H:%M:%S %Y")
        .ok()
        .map(|timestamp| timestamp.date())
}

pub struct UsageScanner<'a> {
    options: UsageOptions<'a>,
    records: HashMap<String, DbUsageRecord>,
    lines_read: usize,
    skipped: usize,
    unparsed_dates: usize,
}

impl<'a> UsageScanner<'a> {
    pub fn new(options: UsageOptions<'a>) -> Self {
        let mut records = HashMap::new();
        if let Some(target) = options.target {
            records.insert(target.to_string(), DbUsageRecord::new(target));
        }
        if options.seed_from_status {
            if let Some(table) = options.status {
                for name in table.names() {
                    if options.target.is_some_and(|target| target != name) {
                        continue;
                    }
                    let record = records
                        .entry(name.to_string())
                        .or_insert_with(|| DbUsageRecord::new(name));
                    record.status = table.status_of(name);
                }
            }
        }
        Self {
            options,
            records,
            lines_read: 0,
            skipped: 0,
            unparsed_dates: 0,
        }
    }

    pub fn scan_line(&mut self, line: &str) -> LineOutcome {
        self.lines_read += 1;
        let columns: Vec<&str> = line.split('\t').take(column::COUNT).collect();

        let Some(db_names) = columns.get(column::DB_NAMES) else {
            return LineOutcome::Truncated;
        };
        let touched = match self.select_databases(db_names) {
            Step::Continue(touched) => touched,
            Step::Skip(reason) => return self.skip(reason),
        };

        let Some(user) = columns.get(column::USER) else {
            return LineOutcome::Truncated;
        };
        if let Step::Skip(reason) = self.check_user(user, &touched) {
            return self.skip(reason);
        }

        let Some(start_time) = columns.get(column::START_TIME) else {
            return LineOutcome::Truncated;
        };
        self.apply_start_time(start_time, &touched)
    }

    pub fn records(&self) -> impl Iterator<Item = &DbUsageRecord> {
        self.records.values()
    }

    pub fn finish(self) -> UsageReport {
        let sorted: BTreeMap<String, DbUsageRecord> = self.records.into_iter().collect();
        UsageReport {
            target: self.options.target.map(str::to_string),
            lines_read: self.lines_read,
            skipped_lines: self.skipped,
            unparsed_dates: self.unparsed_dates,
            databases: sorted.into_values().map(DbUsageEntry::from).collect(),
        }
    }

    fn skip(&mut self, reason: SkipReason) -> LineOutcome {
        self.skipped += 1;
        LineOutcome::Skipped(reason)
    }

    fn select_databases(&mut self, value: &str) -> Step<Vec<String>> {
        if value.trim().is_empty() {
            return Step::Skip(SkipReason::NoDatabases);
        }
        let names: Vec<&str> = value
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect();

        let selected: Vec<&str> = match self.options.target {
            Some(target) if names.contains(&target) => vec![target],
            Some(_) => return Step::Skip(SkipReason::TargetAbsent),
            None => names,
        };

        let status = self.options.status;
        let touched: Vec<String> = selected
            .into_iter()
            .map(|name| {
                let record = self
                    .records
                    .entry(name.to_string())
                    .or_insert_with(|| DbUsageRecord::new(name));
                if let Some(table) = status {
                    if record.status == DbStatus::Unknown {
                        record.status = table.status_of(name);
                    }
                }
                name.to_string()
            })
            .collect();
        Step::Continue(touched)
    }

    fn check_user(&mut self, user: &str, touched: &[String]) -> Step<()> {
        if user.starts_with(self.options.monitor_prefix) {
            return Step::Skip(SkipReason::MonitorUser);
        }
        for name in touched {
            if let Some(record) = self.records.get_mut(name) {
                record.found = true;
            }
        }
        Step::Continue(())
    }

    fn apply_start_time(&mut self, value: &str, touched: &[String]) -> LineOutcome {
        let Some(date) = parse_start_time(value) else {
            self.unparsed_dates += 1;
            debug!(
                line = self.lines_read,
                value,
                databases = %touched.join(","),
                "unparsable start time; date skipped"
            );
            return LineOutcome::Undated;
        };
        for name in touched {
            if let Some(record) = self.records.get_mut(name) {
                if record.last_usage < date {
                    record.last_usage = date;
                }
            }
        }
        LineOutcome::Dated(date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DbUsageEntry {
    pub name: String,
    /// `None` when no genuine search referenced the database.
    pub last_usage: Option<String>,
    pub found: bool,
    pub status: DbStatus,
}

impl From<DbUsageRecord> for DbUsageEntry {
    fn from(record: DbUsageRecord) -> Self {
        Self {
            last_usage: record.found.then(|| record.last_usage.to_string()),
            name: record.name,
            found: record.found,
            status: record.status,
        }
    }
}

impl DbUsageEntry {
    pub fn date_column(&self) -> &str {
        self.last_usage.as_deref().unwrap_or(NOT_FOUND_DATE)
    }

    pub fn tsv_row(&self) -> String {
        format!("{}\t{}\t{}", self.name, self.date_column(), self.status)
    }

    pub fn human_line(&self) -> String {
        match &self.last_usage {
            Some(date) => format!(
                "DB Fasta\t{}\tLast search done on:\t{date}\tactive ?\t{}",
                self.name, self.status
            ),
            None => format!(
                "DB Fasta\t{}\twas NOT Found in searches log.\t \tactive ?\t{}",
                self.name, self.status
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    pub target: Option<String>,
    pub lines_read: usize,
    pub skipped_lines: usize,
    pub unparsed_dates: usize,
    /// Sorted by name.
    pub databases: Vec<DbUsageEntry>,
}

impl UsageReport {
    pub fn database(&self, name: &str) -> Option<&DbUsageEntry> {
        self.databases.iter().find(|entry| entry.name == name)
    }

    pub fn write_tsv(&self, path: &Utf8Path) -> Result<(), MascotFastaError> {
        let mut writer = AtomicLineWriter::create(path.as_std_path())?;
        writer.write_line(TSV_HEADER)?;
        for entry in &self.databases {
            writer.write_line(&entry.tsv_row())?;
        }
        writer.finish()?;
        Ok(())
    }
}

pub fn report_usage(
    searches_log: &Utf8Path,
    options: &UsageOptions<'_>,
    sink: &dyn ProgressSink,
) -> Result<UsageReport, MascotFastaError> {
    let started = Instant::now();
    let scope = match options.target {
        Some(target) => format!("for {target}"),
        None => "for all databases".to_string(),
    };
    info!("start reading searches log {searches_log} {scope}");
    sink.event(ProgressEvent::phase(format!(
        "phase=Scan; reading {searches_log} {scope}"
    )));

    let mut scanner = UsageScanner::new(*options);
    let mut lines = TextLines::open(searches_log.as_std_path())?;
    while let Some(line) = lines.next() {
        if scanner.scan_line(&line?) == LineOutcome::Truncated {
            debug!(line = lines.line_no(), "log line ends before the start time");
        }
    }

    let report = scanner.finish();
    info!(
        skipped = report.skipped_lines,
        unparsed_dates = report.unparsed_dates,
        "read {} lines",
        report.lines_read
    );
    sink.event(ProgressEvent::done(
        format!(
            "phase=Done; {} databases from {} lines",
            report.databases.len(),
            report.lines_read
        ),
        started,
    ));
    Ok(report)
}
