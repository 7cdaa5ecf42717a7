//! Renombrar CLI
//!
//! # Usage
//!
//! ```bash
//! # Convert to v1 names
//! renombrar convert --checkpoint-from-path bert_model.ckpt --checkpoint-to-path converted
//!
//! # v2 names, per-head attention weights, drop optimizer slots
//! renombrar convert --checkpoint-from-path bert_model.ckpt --checkpoint-to-path converted \
//!     --use-v2-names --num-heads 12 --exclude-patterns adam_m,adam_v
//!
//! # Check the result
//! renombrar verify bert_model.ckpt converted --use-v2-names --num-heads 12
//! ```

use clap::Parser;
use renombrar::cli::{init_tracing, run_command, Cli, LogLevel};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(LogLevel::from_flags(cli.verbose, cli.quiet));

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
