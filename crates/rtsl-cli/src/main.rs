use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use rtsl_sdk::SdkError;

mod cli;
mod commands;
mod demo;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match commands::run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            if let Some(sdk) = err.downcast_ref::<SdkError>() {
                eprintln!("  kind: {}", sdk.kind().to_string().yellow());
            }
            ExitCode::FAILURE
        }
    }
}
