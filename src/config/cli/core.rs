//! Core CLI types - Cli, Command, and argument structs

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use super::types::OutputFormat;
use crate::config::ConvertSpec;

/// Renombrar: BERT checkpoint name converter
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "renombrar")]
#[command(author = "PAIML")]
#[command(version)]
#[command(about = "Rewrite BERT checkpoint variable names and attention-head shapes")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Convert a checkpoint to the new naming convention
    Convert(ConvertArgs),

    /// Check a converted checkpoint against its source
    Verify(VerifyArgs),

    /// Print the active rewrite rule table
    Rules(RulesArgs),
}

/// Rewrite settings shared by `convert` and `verify`
#[derive(Args, Debug, Clone, PartialEq, Default)]
pub struct RuleArgs {
    /// Comma-delimited substrings; matching variables are dropped
    #[arg(long, value_name = "PATTERNS")]
    pub exclude_patterns: Option<String>,

    /// Attention heads for reshaping projection weights (<= 0 disables)
    #[arg(long, allow_negative_numbers = true, value_name = "N")]
    pub num_heads: Option<i64>,

    /// Use the prefix-less v2 naming convention
    #[arg(long)]
    pub use_v2_names: bool,

    /// Use the v1 naming convention even if the config file selects v2
    #[arg(long, conflicts_with = "use_v2_names")]
    pub no_use_v2_names: bool,
}

/// Arguments for the convert command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ConvertArgs {
    /// Source checkpoint path or prefix
    #[arg(long, value_name = "PATH")]
    pub checkpoint_from_path: Option<PathBuf>,

    /// Destination checkpoint path or prefix
    #[arg(long, value_name = "PATH")]
    pub checkpoint_to_path: Option<PathBuf>,

    #[command(flatten)]
    pub rules: RuleArgs,

    /// YAML file with conversion settings (flags take precedence)
    #[arg(short, long, value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the planned names and shapes without reading or writing tensors
    #[arg(long)]
    pub dry_run: bool,

    /// Fail when two variables rewrite to the same name
    #[arg(long)]
    pub strict: bool,

    /// Allow the destination to replace the source checkpoint file
    #[arg(long)]
    pub overwrite_source: bool,

    /// Write the rename audit as JSON (the plan, under --dry-run)
    #[arg(long, value_name = "PATH")]
    pub audit_json: Option<PathBuf>,

    /// Summary format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the verify command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct VerifyArgs {
    /// Source checkpoint path or prefix
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Converted checkpoint path or prefix
    #[arg(value_name = "CONVERTED")]
    pub converted: PathBuf,

    #[command(flatten)]
    pub rules: RuleArgs,

    /// YAML file with conversion settings (flags take precedence)
    #[arg(short, long, value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Report format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the rules command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct RulesArgs {
    /// Show the v2 table instead of v1
    #[arg(long)]
    pub use_v2_names: bool,
}

/// Parse CLI arguments from an iterator (for testing)
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Apply shared rewrite flags to a ConvertSpec
pub fn apply_rule_overrides(spec: &mut ConvertSpec, args: &RuleArgs) {
    if let Some(patterns) = &args.exclude_patterns {
        spec.exclude_patterns = crate::filter::ExclusionFilter::from_comma_list(patterns);
    }
    if let Some(num_heads) = args.num_heads {
        spec.num_heads = num_heads.into();
    }
    if args.use_v2_names {
        spec.use_v2_names = true;
    } else if args.no_use_v2_names {
        spec.use_v2_names = false;
    }
}

/// Apply command-line overrides to a ConvertSpec
pub fn apply_overrides(spec: &mut ConvertSpec, args: &ConvertArgs) {
    if let Some(from) = &args.checkpoint_from_path {
        spec.checkpoint_from_path = Some(from.clone());
    }
    if let Some(to) = &args.checkpoint_to_path {
        spec.checkpoint_to_path = Some(to.clone());
    }
    apply_rule_overrides(spec, &args.rules);
    if args.strict {
        spec.strict = true;
    }
    if args.overwrite_source {
        spec.overwrite_source = true;
    }
}
