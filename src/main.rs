//! floodprep CLI entrypoint.
//!
//! Thin wrapper over the `cli` module: parse args, dispatch the subcommand and
//! exit non-zero when it fails or any file of a batch failed.
//! For programmatic use, prefer the library API (`floodprep::api`).

use std::process::ExitCode;

use clap::Parser;

mod cli;

fn main() -> ExitCode {
    let args = cli::CliArgs::parse();
    match cli::run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
