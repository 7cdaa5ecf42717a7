//! CLI argument parsing
//!
//! # Usage
//!
//! ```bash
//! renombrar convert --checkpoint-from-path bert_model.ckpt --checkpoint-to-path out/converted
//! renombrar convert --config convert.yaml --num-heads 12 --use-v2-names
//! renombrar convert --config convert.yaml --dry-run
//! renombrar verify bert_model.ckpt out/converted --num-heads 12
//! renombrar rules --use-v2-names
//! ```

mod core;
mod types;

pub use core::{
    apply_overrides, apply_rule_overrides, parse_args, Cli, Command, ConvertArgs, RuleArgs,
    RulesArgs, VerifyArgs,
};
pub use types::OutputFormat;

#[cfg(test)]
mod property_tests;
