//! Checkpoint conversion: filter, rename, reshape, persist.
//!
//! A run is a single synchronous pass. Every variable name is checked
//! against the [`ExclusionFilter`], rewritten by the [`NameRewriter`], and
//! (when a head count is set) given a per-head shape by the
//! [`ShapeTransformer`]. Names are enumerated in lexicographic order, which
//! is the only ordering that affects the result: when two variables rewrite
//! to the same name, the one enumerated later wins under
//! [`CollisionPolicy::Overwrite`].

mod result;
mod verify;

pub use result::{Collision, ConversionPlan, ConversionResult, ConversionSummary, PlannedVariable, ReshapeRecord};
pub use verify::{VerificationIssue, VerificationReport};

use crate::checkpoint::{CheckpointReader, CheckpointWriter};
use crate::filter::ExclusionFilter;
use crate::reshape::{HeadCount, ShapeTransformer};
use crate::rules::{NameRewriter, RuleSet};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What to do when two source variables rewrite to the same name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Keep the variable enumerated last and log a warning
    #[default]
    Overwrite,
    /// Abort the run with [`Error::NameCollision`]
    Error,
}

/// Settings for one conversion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Naming convention to rewrite into
    pub rule_set: RuleSet,
    /// Variables to drop entirely
    pub exclude: ExclusionFilter,
    /// Attention head count for reshaping
    pub num_heads: HeadCount,
    /// Destination name collision handling
    pub collisions: CollisionPolicy,
}

impl ConvertOptions {
    /// Default options: v1 names, nothing excluded, no reshaping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rule set.
    pub fn with_rule_set(mut self, rule_set: RuleSet) -> Self {
        self.rule_set = rule_set;
        self
    }

    /// Set the exclusion filter.
    pub fn with_exclude(mut self, exclude: ExclusionFilter) -> Self {
        self.exclude = exclude;
        self
    }

    /// Set the head count.
    pub fn with_num_heads(mut self, num_heads: HeadCount) -> Self {
        self.num_heads = num_heads;
        self
    }

    /// Set the collision policy.
    pub fn with_collisions(mut self, collisions: CollisionPolicy) -> Self {
        self.collisions = collisions;
        self
    }
}

/// Converts checkpoints between BERT naming conventions.
#[derive(Debug, Clone)]
pub struct Converter {
    rewriter: NameRewriter,
    exclude: ExclusionFilter,
    num_heads: HeadCount,
    shapes: Option<ShapeTransformer>,
    collisions: CollisionPolicy,
}

impl Converter {
    /// Create a converter from options.
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            rewriter: NameRewriter::new(options.rule_set),
            exclude: options.exclude,
            num_heads: options.num_heads,
            shapes: options.num_heads.transformer(),
            collisions: options.collisions,
        }
    }

    /// Active rule set.
    pub fn rule_set(&self) -> RuleSet {
        self.rewriter.rule_set()
    }

    /// Head count used for reshaping.
    pub fn num_heads(&self) -> HeadCount {
        self.num_heads
    }

    /// Work out every destination name and shape from the source index alone.
    ///
    /// No tensor data is read.
    ///
    /// # Errors
    ///
    /// [`Error::ShapeMismatch`] for tensors that cannot be split per head and
    /// [`Error::NameCollision`] under [`CollisionPolicy::Error`].
    pub fn plan<R: CheckpointReader + ?Sized>(&self, reader: &R) -> Result<ConversionPlan> {
        let shapes = reader.list_names_and_shapes()?;
        let mut plan = ConversionPlan::default();

        for (name, shape) in shapes {
            if self.exclude.is_excluded(&name) {
                tracing::debug!("Excluded: {}", name);
                plan.excluded.push(name);
                continue;
            }

            let target = self.rewriter.rewrite(&name).name;
            let new_shape = match &self.shapes {
                Some(transformer) => transformer.new_shape(&name, &shape)?,
                None => None,
            };

            if let Some(previous) = plan.variables.get(&target) {
                match self.collisions {
                    CollisionPolicy::Error => {
                        return Err(Error::NameCollision {
                            target,
                            first: previous.source.clone(),
                            second: name,
                        });
                    }
                    CollisionPolicy::Overwrite => {
                        tracing::warn!(
                            "{} and {} both rewrite to {}; keeping {}",
                            previous.source,
                            name,
                            target,
                            name
                        );
                        plan.collisions.push(Collision {
                            target: target.clone(),
                            overwritten: previous.source.clone(),
                            kept: name.clone(),
                        });
                    }
                }
            }

            if target != name {
                plan.renamed.insert(name.clone(), target.clone());
            }
            plan.variables.insert(
                target.clone(),
                PlannedVariable { source: name, target, shape, new_shape },
            );
        }

        Ok(plan)
    }

    /// Convert every eligible variable of `reader` in memory.
    ///
    /// Excluded variables are never read.
    pub fn convert<R: CheckpointReader + ?Sized>(&self, reader: &R) -> Result<ConversionResult> {
        let plan = self.plan(reader)?;
        let mut variables = BTreeMap::new();
        let mut reshaped = Vec::new();

        for planned in plan.variables.values() {
            let mut tensor = reader.read_tensor(&planned.source)?;
            if let Some(new_shape) = &planned.new_shape {
                tracing::info!(
                    "Variable {} has a shape change from {:?} to {:?}",
                    planned.source,
                    tensor.shape(),
                    new_shape
                );
                let from = tensor.shape().to_vec();
                tensor.reshape(&planned.source, new_shape)?;
                reshaped.push(ReshapeRecord {
                    name: planned.source.clone(),
                    from,
                    to: new_shape.clone(),
                });
            }
            variables.insert(planned.target.clone(), tensor);
        }

        Ok(ConversionResult {
            variables,
            renamed: plan.renamed,
            reshaped,
            excluded: plan.excluded,
            collisions: plan.collisions,
        })
    }

    /// Convert `reader` and persist the result through `writer`.
    ///
    /// Nothing is written unless the whole in-memory conversion succeeded.
    pub fn run<R, W>(&self, reader: &R, writer: &mut W) -> Result<ConversionSummary>
    where
        R: CheckpointReader + ?Sized,
        W: CheckpointWriter + ?Sized,
    {
        let result = self.convert(reader)?;
        writer.write_all(&result.variables)?;

        let summary = result.summary(self.rule_set(), self.num_heads);
        tracing::info!("Converted {} variable name(s).", summary.converted);
        Ok(summary)
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ConvertOptions::default())
    }
}
