//! CLI argument definitions for care-link.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use care_normalize::{TimestampValue, normalize_timestamp};

#[derive(Parser)]
#[command(
    name = "care-link",
    version,
    about = "Resolve patient identities in intake exports",
    long_about = "Group intake rows that describe the same patient and roll up their admissions.\n\n\
                  Reads CSV (UTF-8 or GB18030) and JSON exports. Rows are matched by identity\n\
                  number first, then by name backed by address and parent-contact evidence."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow patient names and identifiers in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Resolve an export into patient groups and print their summaries.
    Resolve(ResolveArgs),

    /// Show how an export's headers map onto record fields.
    Inspect(InspectArgs),
}

/// Options shared by every command that reads an export.
#[derive(Args, Clone)]
pub struct InputArgs {
    /// CSV or JSON export to read.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Rows forming the CSV header block; the last one names the columns.
    #[arg(long = "header-rows", value_name = "N", default_value_t = 1)]
    pub header_rows: usize,

    /// CSV field delimiter.
    #[arg(long = "delimiter", value_name = "CHAR", default_value_t = ',')]
    pub delimiter: char,

    /// Only accept exact header aliases.
    #[arg(long = "no-fuzzy-headers")]
    pub no_fuzzy_headers: bool,
}

#[derive(Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Sort records by identity number, record key and name before resolving.
    ///
    /// Without identity numbers, grouping depends on row order. Presorting
    /// makes the result independent of how the export happened to be sorted.
    #[arg(long = "presort")]
    pub presort: bool,

    /// Evidence categories that must match for a name-only merge (1-3).
    #[arg(
        long = "min-evidence",
        value_name = "N",
        value_parser = clap::value_parser!(u8).range(1..=3),
        conflicts_with = "strict"
    )]
    pub min_evidence: Option<u8>,

    /// Require every available evidence category to match.
    #[arg(long = "strict")]
    pub strict: bool,

    /// Import time stamped on rows that carry none (date, date-time or epoch ms).
    ///
    /// Only used for rows without an admission date. Undated rows are not
    /// counted as admissions when this is omitted.
    #[arg(
        long = "import-timestamp",
        value_name = "WHEN",
        value_parser = parse_import_timestamp
    )]
    pub import_timestamp: Option<i64>,

    /// Output format for the summaries.
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormatArg,

    /// Write summaries to a file instead of stdout.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct InspectArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    Table,
    Json,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

fn parse_import_timestamp(value: &str) -> Result<i64, String> {
    normalize_timestamp(TimestampValue::Text(value))
        .ok_or_else(|| format!("unrecognized timestamp: {value}"))
}
