//! Rules command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::RulesArgs;
use crate::rules::RuleSet;
use crate::Result;

/// Format a rule table as a string
pub fn format_rules(rule_set: RuleSet) -> String {
    let rules = rule_set.rules();
    let mut lines = vec![format!("Rule set {rule_set} ({} rules, applied in order):", rules.len())];
    for (i, rule) in rules.iter().enumerate() {
        lines.push(format!("  {:>2}. {rule}", i + 1));
    }
    lines.join("\n")
}

pub fn run_rules(args: RulesArgs, level: LogLevel) -> Result<()> {
    log(level, LogLevel::Normal, &format_rules(RuleSet::from_v2_flag(args.use_v2_names)));
    Ok(())
}
