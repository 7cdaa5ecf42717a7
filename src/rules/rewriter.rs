//! Ordered name rewriting.

use super::{RewriteRule, RuleSet};

/// Outcome of rewriting one variable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// Final name after every matching rule was applied
    pub name: String,
    /// `(before, after)` for each rule that matched, in application order
    pub steps: Vec<(String, String)>,
}

impl Rewrite {
    /// Whether any rule changed the name.
    pub fn is_renamed(&self) -> bool {
        !self.steps.is_empty()
    }
}

/// Applies a [`RuleSet`] to variable names.
///
/// Every rule is visited once, in table order. A rule whose source pattern
/// occurs in the current name replaces all of its occurrences; the next rule
/// sees the updated name, so rules compound.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameRewriter {
    rule_set: RuleSet,
}

impl NameRewriter {
    /// Create a rewriter for the given rule set.
    pub fn new(rule_set: RuleSet) -> Self {
        Self { rule_set }
    }

    /// Active rule set.
    pub fn rule_set(&self) -> RuleSet {
        self.rule_set
    }

    /// Active rules in application order.
    pub fn rules(&self) -> &'static [RewriteRule] {
        self.rule_set.rules()
    }

    /// Rewrite `name`, keeping the trail of intermediate names.
    pub fn rewrite(&self, name: &str) -> Rewrite {
        let mut current = name.to_string();
        let mut steps = Vec::new();

        for rule in self.rules() {
            if current.contains(rule.source_pattern) {
                let next = current.replace(rule.source_pattern, rule.target_pattern);
                tracing::debug!("Converted: {} --> {}", current, next);
                steps.push((current, next.clone()));
                current = next;
            }
        }

        Rewrite { name: current, steps }
    }

    /// Rewrite `name` and return only the final name.
    pub fn rename(&self, name: &str) -> String {
        self.rewrite(name).name
    }
}
