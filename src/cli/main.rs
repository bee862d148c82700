use std::path::PathBuf;

use clap::Parser;

use crate::{Commands, PathOverrides};

/// Main CLI application arguments and command structure
#[derive(Parser)]
#[clap(
    version,
    about = "Personal assistant for contacts and notes",
    long_about = "Personal assistant for contacts and notes.\n\n\
                  Run without a command to start the interactive shell."
)]
pub struct Cli {
    /// Path to the configuration file
    #[clap(short = 'c', long, value_parser)]
    pub config: Option<PathBuf>,

    /// Path to the contacts file (overrides the configuration)
    #[clap(long, value_parser)]
    pub contacts_file: Option<PathBuf>,

    /// Path to the notes file (overrides the configuration)
    #[clap(long, value_parser)]
    pub notes_file: Option<PathBuf>,

    /// Verbose output mode
    #[clap(short, long)]
    pub verbose: bool,

    /// Command to run once; omit it to start the interactive shell
    #[clap(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    pub fn path_overrides(&self) -> PathOverrides {
        PathOverrides {
            contacts_file: self.contacts_file.clone(),
            notes_file: self.notes_file.clone(),
        }
    }
}

/// One line typed into the interactive shell
#[derive(Parser, Debug)]
#[clap(
    name = "pabook",
    no_binary_name = true,
    disable_version_flag = true,
    disable_help_subcommand = true
)]
pub struct ShellLine {
    #[clap(subcommand)]
    pub command: Commands,
}
