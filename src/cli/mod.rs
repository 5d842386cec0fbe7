//! Command Line Interface (CLI) layer for floodprep.
//!
//! Argument parsing (`args`), error types (`errors`) and the orchestration
//! logic (`runner`) that maps each subcommand onto a batch entry point of
//! `floodprep::api`. Embedders should call `floodprep::api` directly.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
