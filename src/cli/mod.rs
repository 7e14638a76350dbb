pub mod init;
pub mod report;
pub mod rules;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::settings::{shellexpand_path, Settings};

/// Rules file from `--rules`, else the one named in settings.
pub(crate) fn rules_path_opt(rules: &Option<String>, settings: &Settings) -> PathBuf {
    let raw = rules.as_deref().unwrap_or(&settings.rules_path);
    PathBuf::from(shellexpand_path(raw))
}

#[derive(Parser)]
#[command(
    name = "wallet",
    about = "Parse an Italian bank statement export and summarize spending by category."
)]
pub struct Cli {
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a CSV/XLSX statement and print income, expenses and categories.
    Report {
        /// Path to the statement (.csv, or any spreadsheet)
        file: String,
        /// Category configuration (default: from settings)
        #[arg(long)]
        rules: Option<String>,
        /// Force the input format instead of sniffing the extension: csv, xlsx
        #[arg(long)]
        format: Option<String>,
        /// Fixed CSV column separator instead of detection
        #[arg(long)]
        separator: Option<char>,
        /// Reference budget for category budget checks
        #[arg(long)]
        budget: Option<f64>,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
        /// Show at most this many transactions
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List category rules and check their budget shares.
    Rules {
        /// Category configuration (default: from settings)
        #[arg(long)]
        rules: Option<String>,
    },
    /// Write default settings and a starter categories.json.
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
}
