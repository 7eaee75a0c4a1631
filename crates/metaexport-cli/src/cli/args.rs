use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "metaexport",
    version,
    about = "Replay a test run's lifecycle events and write a JSON metadata report"
)]
pub struct Cli {
    /// Event stream to replay (reads stdin when omitted)
    pub events: Option<PathBuf>,

    /// Input format: native (metaexport JSONL) or libtest (`--format json` output)
    #[arg(long, value_enum, default_value_t)]
    pub format: InputFormat,

    /// YAML config file (default: ./metaexport.yaml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Path to output JSON metadata report
    #[arg(long = "metaexport-json", env = "METAEXPORT_JSON")]
    pub metaexport_json: Option<PathBuf>,

    /// Write the report even when every collected test succeeded
    #[arg(long)]
    pub always_emit: bool,

    /// Treat the session as collection-only (never writes a report)
    #[arg(long)]
    pub collect_only: bool,

    /// Write compact single-line JSON
    #[arg(long)]
    pub compact: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputFormat {
    #[default]
    Native,
    Libtest,
}
