pub mod app;
pub mod config;
pub mod domain;
pub mod duplicates;
pub mod empty;
pub mod error;
pub mod fasta;
pub mod fs_util;
pub mod output;
pub mod shorten;
pub mod taxonomy;
pub mod usage;
