//! Command-line and YAML configuration.

pub mod cli;
mod spec;

pub use cli::{
    apply_overrides, apply_rule_overrides, parse_args, Cli, Command, ConvertArgs, OutputFormat,
    RuleArgs, RulesArgs, VerifyArgs,
};
pub use spec::{load_spec, CheckpointPaths, ConvertSpec};
