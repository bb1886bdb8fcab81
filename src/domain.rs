use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MascotFastaError;

/// Borrowed view of a FASTA header line split into accession and description.
///
/// The description keeps its leading separator so that
/// `>` + accession + description reproduces the original line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FastaHeader<'a> {
    pub accession: &'a str,
    pub description: &'a str,
}

impl<'a> FastaHeader<'a> {
    pub fn parse(line: &'a str, separator: &str) -> Option<Self> {
        let body = line.strip_prefix('>')?;
        let (accession, description) = match body.find(separator) {
            Some(index) => body.split_at(index),
            None => (body, ""),
        };
        Some(Self {
            accession,
            description,
        })
    }
}

pub fn is_header(line: &str) -> bool {
    line.starts_with('>')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbStatus {
    Active,
    Inactive,
    Deleted,
    Unknown,
}

impl DbStatus {
    pub fn code(self) -> &'static str {
        match self {
            DbStatus::Active => "A",
            DbStatus::Inactive => "I",
            DbStatus::Deleted => "D",
            DbStatus::Unknown => "-",
        }
    }
}

impl fmt::Display for DbStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaxonomyMnemonic(String);

impl TaxonomyMnemonic {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaxonomyMnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaxonomyMnemonic {
    type Err = MascotFastaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(MascotFastaError::InvalidMnemonic(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}
