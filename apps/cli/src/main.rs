//! bookpipe CLI: PDF book → translated, narrated website.
//!
//! Drives the external extract, preprocess, translate, summarize, audio and
//! website stage scripts in order, stopping at the first failure.

mod commands;

use std::process::ExitCode;

use clap::Parser;

use commands::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = color_eyre::install() {
        eprintln!("warning: could not install error reporter: {e}");
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return commands::parse_failure(&err),
    };

    commands::init_tracing(&cli);

    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => commands::run_failure(&report),
    }
}
