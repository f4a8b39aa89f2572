/// Main entry point for the cemgen CLI.
///
/// Dispatches to the appropriate command handler based on the parsed
/// arguments.
use super::{
    args::{Arguments, Command},
    commands::{generate::generate, init::init},
    exit_status::ExitStatus,
};
use anyhow::Result;

pub fn run(Arguments { command }: Arguments) -> Result<ExitStatus> {
    match command {
        Some(Command::Generate(cmd)) => generate(cmd),
        Some(Command::Init) => init(),
        None => {
            anyhow::bail!("No command provided. Use --help to see available commands.")
        }
    }
}
