use std::ffi::OsString;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, CommandFactory, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mascot_fasta::app::{App, ProgressSink, UsageRequest};
use mascot_fasta::config::ConfigLoader;
use mascot_fasta::domain::TaxonomyMnemonic;
use mascot_fasta::error::MascotFastaError;
use mascot_fasta::output::{HumanOutput, JsonOutput, LogSink, OutputMode};

/// Multi-letter flags historically written with a single dash (`-db=name`).
const LEGACY_LONG_FLAGS: &[&str] = &["db"];

#[derive(Parser)]
#[command(name = "mascot-fasta")]
#[command(about = "Utilities for Mascot FASTA databases and searches log")]
#[command(version)]
struct Cli {
    /// Print command results as JSON on stdout.
    #[arg(long, global = true)]
    json: bool,

    /// JSON config file (defaults to ./mascot-fasta.json when present).
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "db_usage",
        about = "Get information (last date...) on the usage of fasta databases"
    )]
    DbUsage(DbUsageArgs),
    #[command(
        name = "shorten",
        about = "Try to shorten fasta accessions using '/' or '_' to split"
    )]
    Shorten(ShortenArgs),
    #[command(
        name = "cmp_duplicates",
        about = "Search for duplicates in a fasta file and compare their sequences"
    )]
    CmpDuplicates(CompareArgs),
    #[command(
        name = "replace_duplicates",
        about = "Search for duplicates in a fasta file and rename them using an index"
    )]
    ReplaceDuplicates(ReplaceArgs),
    #[command(
        name = "extract_taxo",
        about = "Extract entries whose accession ends with a taxonomy mnemonic"
    )]
    ExtractTaxo(ExtractArgs),
    #[command(
        name = "rem_empty",
        about = "Remove entries without sequence. A file with _clean suffix is created"
    )]
    RemEmpty(RemoveEmptyArgs),
}

#[derive(Args)]
struct DbUsageArgs {
    /// Only report this database. All databases are processed otherwise.
    #[arg(long = "db")]
    db: Option<String>,

    /// Path to the Mascot searches log file.
    #[arg(short = 's', required = true)]
    searches_log: String,

    /// Path to mascot.dat to read database status from.
    #[arg(short = 'm')]
    mascot_dat: Option<String>,

    /// TSV file to save the result to. Standard output is used otherwise.
    #[arg(short = 'o')]
    output: Option<String>,

    /// Also list databases of mascot.dat never seen in the log.
    #[arg(short = 'a', requires = "mascot_dat")]
    all: bool,
}

#[derive(Args)]
struct ShortenArgs {
    /// Input fasta file. The same file with a _short suffix is created.
    #[arg(short = 'i', required = true)]
    input: String,

    #[arg(long)]
    separator: Option<String>,
}

#[derive(Args)]
struct CompareArgs {
    /// Input fasta file.
    #[arg(short = 'i', required = true)]
    input: String,

    #[arg(long)]
    separator: Option<String>,
}

#[derive(Args)]
struct ReplaceArgs {
    /// Input fasta file.
    #[arg(short = 'i', required = true)]
    input: String,

    /// Resulting fasta file. Must already exist; it is overwritten.
    #[arg(short = 'o', required = true)]
    output: String,

    #[arg(long)]
    separator: Option<String>,
}

#[derive(Args)]
struct ExtractArgs {
    /// Input fasta file.
    #[arg(short = 'i', required = true)]
    input: String,

    /// Taxonomy mnemonic, e.g. HUMAN.
    #[arg(short = 't', required = true)]
    taxonomy: String,

    /// Output file name, relative to the input directory.
    #[arg(short = 'o')]
    output: Option<String>,

    #[arg(long)]
    separator: Option<String>,
}

#[derive(Args)]
struct RemoveEmptyArgs {
    /// Input fasta file. The same file with a _clean suffix is created.
    #[arg(short = 'i', required = true)]
    input: String,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_from(normalize_legacy_flags(std::env::args_os()));

    if let Err(report) = run(cli) {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<MascotFastaError>() {
            if matches!(error, MascotFastaError::InputNotFound(_)) {
                eprintln!("{}", Cli::command().render_help());
            }
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &MascotFastaError) -> u8 {
    match error {
        MascotFastaError::InputNotFound(_)
        | MascotFastaError::InvalidSeparator(_)
        | MascotFastaError::InvalidMnemonic(_)
        | MascotFastaError::InvalidArgument(_) => 2,
        MascotFastaError::ReplaceTargetMissing(_) => 3,
        _ => 1,
    }
}

fn normalize_legacy_flags(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| {
            let rewritten = arg.to_str().and_then(rewrite_legacy_flag);
            rewritten.map(OsString::from).unwrap_or(arg)
        })
        .collect()
}

fn rewrite_legacy_flag(arg: &str) -> Option<String> {
    let flag = arg.strip_prefix('-')?;
    let name = flag.split_once('=').map_or(flag, |(name, _)| name);
    LEGACY_LONG_FLAGS
        .contains(&name)
        .then(|| format!("--{flag}"))
}

fn run(cli: Cli) -> miette::Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help().into_diagnostic()?;
        return Err(miette::Report::msg("command required"));
    };

    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let app = App::new(config);
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    dispatch(&app, command, output_mode)
}

fn dispatch(app: &App, command: Commands, output_mode: OutputMode) -> miette::Result<()> {
    let sink: &dyn ProgressSink = match output_mode {
        OutputMode::Json => &JsonOutput,
        OutputMode::Human => &LogSink,
    };

    match command {
        Commands::DbUsage(args) => {
            let request = UsageRequest {
                searches_log: Utf8PathBuf::from(args.searches_log),
                database: args.db,
                status_file: args.mascot_dat.map(Utf8PathBuf::from),
                output: args.output.map(Utf8PathBuf::from),
                all_status: args.all,
            };
            info!("running db_usage command ...");
            let report = app.db_usage(&request, sink)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print(&report).into_diagnostic(),
                OutputMode::Human if request.output.is_none() => {
                    HumanOutput::print_usage(&report).into_diagnostic()
                }
                OutputMode::Human => Ok(()),
            }
        }
        Commands::Shorten(args) => {
            info!("running shorten command ...");
            let input = Utf8PathBuf::from(args.input);
            let report = app.shorten(&input, args.separator.as_deref(), sink)?;
            print_json(output_mode, &report)
        }
        Commands::CmpDuplicates(args) => {
            info!("running cmp_duplicates command ...");
            let input = Utf8PathBuf::from(args.input);
            let report = app.compare_duplicates(&input, args.separator.as_deref(), sink)?;
            print_json(output_mode, &report)
        }
        Commands::ReplaceDuplicates(args) => {
            info!("running replace_duplicates command ...");
            let input = Utf8PathBuf::from(args.input);
            let output = Utf8PathBuf::from(args.output);
            let report =
                app.replace_duplicates(&input, &output, args.separator.as_deref(), sink)?;
            print_json(output_mode, &report)
        }
        Commands::ExtractTaxo(args) => {
            info!("running extract_taxo command ...");
            let input = Utf8PathBuf::from(args.input);
            let mnemonic = args.taxonomy.parse::<TaxonomyMnemonic>()?;
            let report = app.extract_taxonomy(
                &input,
                &mnemonic,
                args.output.as_deref(),
                args.separator.as_deref(),
                sink,
            )?;
            print_json(output_mode, &report)
        }
        Commands::RemEmpty(args) => {
            info!("running rem_empty command ...");
            let input = Utf8PathBuf::from(args.input);
            let report = app.remove_empty(&input, sink)?;
            print_json(output_mode, &report)
        }
    }
}

fn print_json<T: serde::Serialize>(output_mode: OutputMode, report: &T) -> miette::Result<()> {
    if output_mode == OutputMode::Json {
        JsonOutput::print(report).into_diagnostic()?;
    }
    Ok(())
}
