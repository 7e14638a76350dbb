use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wallet_parser::cli::{self, Cli, Commands};

fn main() {
    let cli = Cli::parse();

    // RUST_LOG > --verbose > warnings only
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("wallet_parser=debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr).compact())
        .init();

    let result = match cli.command {
        Commands::Report {
            file,
            rules,
            format,
            separator,
            budget,
            json,
            limit,
        } => cli::report::run(cli::report::ReportArgs {
            file,
            rules,
            format,
            separator,
            budget,
            json,
            limit,
        }),
        Commands::Rules { rules } => cli::rules::list(rules),
        Commands::Init { force } => cli::init::run(force),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
