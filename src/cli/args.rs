//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `generate`: Analyze the workspace and emit the Custom Elements Manifest
//! - `init`: Initialize a cemgen configuration file

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }
}

/// Common arguments shared by all commands.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Source code root directory (overrides config file)
    #[arg(long)]
    pub source_root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Args)]
pub struct GenerateCommand {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Where to write the manifest; `-` means stdout (overrides config file)
    #[arg(long)]
    pub output: Option<String>,

    /// Globs selecting source files (overrides config file).
    /// Can be specified multiple times: --files "src/**/*.ts" --files "lib/**/*.js"
    #[arg(long)]
    pub files: Vec<String>,

    /// Globs subtracted from the input set (overrides config file)
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Keep running and regenerate the manifest on file changes
    #[arg(long)]
    pub watch: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate the Custom Elements Manifest
    Generate(GenerateCommand),
    /// Initialize a new .cemgenrc.json configuration file
    Init,
}
