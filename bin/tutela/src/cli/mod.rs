use clap::{value_parser, Parser, Subcommand};

pub mod args;
pub mod commands;

/// The main Tutela CLI interface
#[derive(Debug, Parser)]
#[command(author, version, about = "Tutela", long_about = None)]
pub struct Cli {
    /// The command to execute
    #[clap(subcommand)]
    command: Commands,

    /// The verbosity level
    #[clap(long, short, global = true, default_value_t = 2, value_parser = value_parser!(u8).range(..=4))]
    verbosity: u8,
}

impl Cli {
    /// Get the log level based on the verbosity level
    pub fn get_log_level(&self) -> String {
        match self.verbosity {
            0 => "error",
            1 => "warn",
            2 => "info",
            3 => "debug",
            _ => "trace",
        }
        .into()
    }

    pub async fn run(self) -> eyre::Result<()> {
        match self.command {
            Commands::Send(command) => command.execute().await,
            Commands::Status(command) => command.execute().await,
        }
    }
}

/// Commands to be executed
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build, authorize, and submit a user operation, then wait for finality
    #[command(name = "send")]
    Send(commands::SendCommand),

    /// Query the status of a submitted user operation
    #[command(name = "status")]
    Status(commands::StatusCommand),
}
