//! cemgen CLI application entry point.
//!
//! This binary handles command dispatch for the cemgen manifest generator.

use std::process::ExitCode;

use cemgen::cli::{Arguments, ExitStatus};
use clap::Parser;

fn main() -> ExitCode {
    let args = Arguments::parse();

    match cemgen::cli::run_cli(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitStatus::Error.into()
        }
    }
}
