//! CLI command implementations

mod convert;
mod rules;
mod verify;

#[cfg(test)]
mod tests;

use crate::cli::LogLevel;
use crate::config::{Cli, Command};
use crate::Result;

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<()> {
    let log_level = LogLevel::from_flags(cli.verbose, cli.quiet);

    match cli.command {
        Command::Convert(args) => convert::run_convert(args, log_level),
        Command::Verify(args) => verify::run_verify(args, log_level),
        Command::Rules(args) => rules::run_rules(args, log_level),
    }
}
