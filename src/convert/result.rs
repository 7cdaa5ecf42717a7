//! Conversion outcomes and their serializable summaries.

use crate::checkpoint::Tensor;
use crate::reshape::HeadCount;
use crate::rules::RuleSet;
use serde::Serialize;
use std::collections::BTreeMap;

/// One destination variable as computed from the source index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedVariable {
    /// Name in the source checkpoint
    pub source: String,
    /// Name in the destination checkpoint
    pub target: String,
    /// Source shape
    pub shape: Vec<usize>,
    /// Destination shape, when it differs from `shape`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_shape: Option<Vec<usize>>,
}

impl PlannedVariable {
    /// Shape the variable will have after conversion.
    pub fn target_shape(&self) -> &[usize] {
        self.new_shape.as_deref().unwrap_or(&self.shape)
    }
}

/// Two source variables that rewrote to the same destination name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collision {
    /// Shared destination name
    pub target: String,
    /// Source variable that was dropped
    pub overwritten: String,
    /// Source variable that was written
    pub kept: String,
}

/// A reshape applied to one variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReshapeRecord {
    /// Source variable name
    pub name: String,
    /// Shape before
    pub from: Vec<usize>,
    /// Shape after
    pub to: Vec<usize>,
}

/// Names and shapes of a conversion, computed without reading tensor data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionPlan {
    /// Destination variables keyed by destination name
    pub variables: BTreeMap<String, PlannedVariable>,
    /// Old name to new name, changed names only
    pub renamed: BTreeMap<String, String>,
    /// Source names dropped by the exclusion filter
    pub excluded: Vec<String>,
    /// Destination name collisions resolved by overwriting
    pub collisions: Vec<Collision>,
}

impl ConversionPlan {
    /// Number of variables whose shape will change.
    pub fn reshape_count(&self) -> usize {
        self.variables.values().filter(|v| v.new_shape.is_some()).count()
    }
}

/// In-memory result of a conversion.
#[derive(Debug, Clone, Default)]
pub struct ConversionResult {
    /// Destination checkpoint contents
    pub variables: BTreeMap<String, Tensor>,
    /// Old name to new name, changed names only
    pub renamed: BTreeMap<String, String>,
    /// Reshapes applied, in enumeration order of the destination
    pub reshaped: Vec<ReshapeRecord>,
    /// Source names dropped by the exclusion filter
    pub excluded: Vec<String>,
    /// Destination name collisions resolved by overwriting
    pub collisions: Vec<Collision>,
}

impl ConversionResult {
    /// Summarize this result for reporting.
    pub fn summary(&self, rule_set: RuleSet, num_heads: HeadCount) -> ConversionSummary {
        ConversionSummary {
            converted: self.variables.len(),
            rule_set,
            num_heads,
            renamed: self.renamed.clone(),
            reshaped: self.reshaped.clone(),
            excluded: self.excluded.clone(),
            collisions: self.collisions.clone(),
        }
    }
}

/// Audit record written by `--audit-json` and printed by `--format json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionSummary {
    /// Number of variables written
    pub converted: usize,
    /// Rule set used
    pub rule_set: RuleSet,
    /// Head count used (-1 when reshaping was off)
    pub num_heads: HeadCount,
    /// Old name to new name, changed names only
    pub renamed: BTreeMap<String, String>,
    /// Reshapes applied
    pub reshaped: Vec<ReshapeRecord>,
    /// Source names dropped by the exclusion filter
    pub excluded: Vec<String>,
    /// Destination name collisions
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub collisions: Vec<Collision>,
}

impl ConversionSummary {
    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Render the human-readable summary.
    pub fn to_text(&self, verbose: bool) -> String {
        let mut out = format!("Converted {} variable name(s).\n", self.converted);
        for (old, new) in &self.renamed {
            out.push_str(&format!("  {old} --> {new}\n"));
        }
        if verbose {
            for record in &self.reshaped {
                out.push_str(&format!("  reshaped {}: {:?} -> {:?}\n", record.name, record.from, record.to));
            }
            for name in &self.excluded {
                out.push_str(&format!("  excluded {name}\n"));
            }
        }
        for c in &self.collisions {
            out.push_str(&format!("  ⚠ {} overwritten by {} at {}\n", c.overwritten, c.kept, c.target));
        }
        out
    }
}
