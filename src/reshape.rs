//! Head-aware reshaping of attention projection weights.
//!
//! Fused projection matrices are split so a head-aware consumer can index
//! them by head:
//!
//! | variable                              | source shape | target shape          |
//! |---------------------------------------|--------------|-----------------------|
//! | `attention/output/dense/kernel`       | `[d, m]`     | `[h, d / h, m]`       |
//! | `attention/output/dense/bias`         | `[m]`        | unchanged             |
//! | `attention/self/{query,key,value}` kernel | `[m, d]` | `[m, h, d / h]`       |
//! | `attention/self/{query,key,value}` bias   | `[d]`    | `[h, d / h]`          |
//!
//! Matching is by substring on the original (pre-rename) variable name.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

const ATTENTION_OUTPUT_KERNEL: &str = "attention/output/dense/kernel";
const ATTENTION_OUTPUT_BIAS: &str = "attention/output/dense/bias";
const PROJECTION_PATTERNS: [&str; 3] =
    ["attention/self/query", "attention/self/value", "attention/self/key"];

/// Number of attention heads, or disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub struct HeadCount(Option<NonZeroUsize>);

impl HeadCount {
    /// Reshaping turned off for the whole run.
    pub const DISABLED: Self = Self(None);

    /// Interpret the `num_heads` flag: any value `<= 0` disables reshaping.
    pub fn from_flag(num_heads: i64) -> Self {
        Self(usize::try_from(num_heads).ok().and_then(NonZeroUsize::new))
    }

    /// Head count when enabled.
    pub fn get(self) -> Option<NonZeroUsize> {
        self.0
    }

    /// Whether reshaping is enabled.
    pub fn is_enabled(self) -> bool {
        self.0.is_some()
    }

    /// Transformer for this head count, if enabled.
    pub fn transformer(self) -> Option<ShapeTransformer> {
        self.0.map(ShapeTransformer::new)
    }
}

impl From<i64> for HeadCount {
    fn from(num_heads: i64) -> Self {
        Self::from_flag(num_heads)
    }
}

impl From<HeadCount> for i64 {
    fn from(heads: HeadCount) -> Self {
        heads.0.map_or(-1, |h| h.get() as i64)
    }
}

/// Which reshape rule a variable name falls under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionKind {
    /// Attention output projection weight matrix
    OutputKernel,
    /// Attention output projection bias (never reshaped)
    OutputBias,
    /// Query/key/value projection weight matrix
    ProjectionKernel,
    /// Query/key/value projection bias
    ProjectionBias,
}

impl ProjectionKind {
    /// Classify a variable name, in rule precedence order.
    pub fn classify(name: &str) -> Option<Self> {
        if name.contains(ATTENTION_OUTPUT_KERNEL) {
            return Some(Self::OutputKernel);
        }
        if name.contains(ATTENTION_OUTPUT_BIAS) {
            return Some(Self::OutputBias);
        }
        if PROJECTION_PATTERNS.iter().any(|p| name.contains(p)) {
            if name.contains("kernel") {
                return Some(Self::ProjectionKernel);
            }
            if name.contains("bias") {
                return Some(Self::ProjectionBias);
            }
        }
        None
    }
}

/// Computes per-head target shapes for a fixed head count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeTransformer {
    heads: NonZeroUsize,
}

impl ShapeTransformer {
    /// Create a transformer for `heads` attention heads.
    pub fn new(heads: NonZeroUsize) -> Self {
        Self { heads }
    }

    /// Configured head count.
    pub fn heads(&self) -> usize {
        self.heads.get()
    }

    /// Target shape for `name`, or `None` when the tensor keeps its shape.
    ///
    /// # Errors
    ///
    /// [`Error::ShapeMismatch`] when the tensor has the wrong rank for its
    /// rule or the split dimension is not divisible by the head count.
    pub fn new_shape(&self, name: &str, shape: &[usize]) -> Result<Option<Vec<usize>>> {
        let h = self.heads();
        let target = match ProjectionKind::classify(name) {
            None | Some(ProjectionKind::OutputBias) => return Ok(None),
            Some(ProjectionKind::OutputKernel) => {
                let [rows, cols] = matrix(name, shape, h)?;
                split(name, shape, rows, h, vec![h, rows / h, cols])?
            }
            Some(ProjectionKind::ProjectionKernel) => {
                let [rows, cols] = matrix(name, shape, h)?;
                split(name, shape, cols, h, vec![rows, h, cols / h])?
            }
            Some(ProjectionKind::ProjectionBias) => {
                let [dim] = shape else {
                    return Err(Error::shape_mismatch(name, shape, &[h, 0]));
                };
                split(name, shape, *dim, h, vec![h, dim / h])?
            }
        };

        if target == shape {
            Ok(None)
        } else {
            Ok(Some(target))
        }
    }
}

fn matrix(name: &str, shape: &[usize], heads: usize) -> Result<[usize; 2]> {
    match shape {
        [rows, cols] => Ok([*rows, *cols]),
        _ => Err(Error::shape_mismatch(name, shape, &[heads, 0, 0])),
    }
}

fn split(name: &str, shape: &[usize], dim: usize, heads: usize, target: Vec<usize>) -> Result<Vec<usize>> {
    if dim % heads == 0 {
        Ok(target)
    } else {
        Err(Error::shape_mismatch(name, shape, &target))
    }
}
