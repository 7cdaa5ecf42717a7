//! Post-conversion verification.

use super::Converter;
use crate::checkpoint::{CheckpointReader, Tensor};
use crate::Result;
use ndarray::IxDyn;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Something a converted checkpoint got wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VerificationIssue {
    /// Expected destination variable is absent
    Missing { name: String, source: String },
    /// Destination holds a variable the conversion would not produce
    Unexpected { name: String },
    /// Destination variable has the wrong shape
    ShapeMismatch { name: String, expected: Vec<usize>, actual: Vec<usize> },
    /// Destination variable has the wrong element type
    DtypeMismatch { name: String, expected: String, actual: String },
    /// Destination payload differs from the reshaped source payload
    ValueMismatch { name: String, source: String },
}

impl VerificationIssue {
    /// Issue code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Missing { .. } => "V001",
            Self::Unexpected { .. } => "V002",
            Self::ShapeMismatch { .. } => "V003",
            Self::DtypeMismatch { .. } => "V004",
            Self::ValueMismatch { .. } => "V005",
        }
    }

    /// Destination variable name the issue refers to.
    pub fn name(&self) -> &str {
        match self {
            Self::Missing { name, .. }
            | Self::Unexpected { name }
            | Self::ShapeMismatch { name, .. }
            | Self::DtypeMismatch { name, .. }
            | Self::ValueMismatch { name, .. } => name,
        }
    }
}

impl fmt::Display for VerificationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { name, source } => write!(f, "{name} missing (from {source})"),
            Self::Unexpected { name } => write!(f, "{name} not produced by this conversion"),
            Self::ShapeMismatch { name, expected, actual } => {
                write!(f, "{name} has shape {actual:?}, expected {expected:?}")
            }
            Self::DtypeMismatch { name, expected, actual } => {
                write!(f, "{name} has dtype {actual}, expected {expected}")
            }
            Self::ValueMismatch { name, source } => write!(f, "{name} values differ from {source}"),
        }
    }
}

/// Outcome of [`Converter::verify`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerificationReport {
    /// Number of destination variables checked
    pub checked: usize,
    /// Problems found
    pub issues: Vec<VerificationIssue>,
}

impl VerificationReport {
    /// Whether the destination matches the expected conversion.
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }

    /// Format as human-readable report.
    pub fn to_report(&self) -> String {
        let mut report = format!(
            "Verification Result: {}\n\n",
            if self.passed() { "PASS" } else { "FAIL" }
        );

        if !self.issues.is_empty() {
            report.push_str("Issues:\n");
            for issue in &self.issues {
                report.push_str(&format!("  ✗ {}: {}\n", issue.code(), issue));
            }
            report.push('\n');
        }

        report.push_str(&format!("Variables checked: {}\n", self.checked));
        report
    }
}

impl Converter {
    /// Check that `converted` is exactly what converting `source` produces.
    ///
    /// Names, shapes and dtypes come from the plan; F32 payloads are compared
    /// element-wise against the source reshaped row-major, other dtypes byte
    /// for byte.
    pub fn verify<S, C>(&self, source: &S, converted: &C) -> Result<VerificationReport>
    where
        S: CheckpointReader + ?Sized,
        C: CheckpointReader + ?Sized,
    {
        let plan = self.plan(source)?;
        let actual = converted.list_names_and_shapes()?;
        let mut report = VerificationReport::default();

        for (name, planned) in &plan.variables {
            let Some(actual_shape) = actual.get(name) else {
                report.issues.push(VerificationIssue::Missing {
                    name: name.clone(),
                    source: planned.source.clone(),
                });
                continue;
            };
            report.checked += 1;

            let expected_shape = planned.target_shape();
            if actual_shape.as_slice() != expected_shape {
                report.issues.push(VerificationIssue::ShapeMismatch {
                    name: name.clone(),
                    expected: expected_shape.to_vec(),
                    actual: actual_shape.clone(),
                });
                continue;
            }

            let original = source.read_tensor(&planned.source)?;
            let written = converted.read_tensor(name)?;
            if original.dtype() != written.dtype() {
                report.issues.push(VerificationIssue::DtypeMismatch {
                    name: name.clone(),
                    expected: format!("{:?}", original.dtype()),
                    actual: format!("{:?}", written.dtype()),
                });
                continue;
            }

            if !same_values(&original, &written, expected_shape) {
                report.issues.push(VerificationIssue::ValueMismatch {
                    name: name.clone(),
                    source: planned.source.clone(),
                });
            }
        }

        let expected: BTreeSet<&String> = plan.variables.keys().collect();
        for name in actual.keys().filter(|n| !expected.contains(n)) {
            report.issues.push(VerificationIssue::Unexpected { name: name.clone() });
        }

        tracing::info!(
            "Verified {} variable(s), {} issue(s)",
            report.checked,
            report.issues.len()
        );
        Ok(report)
    }
}

fn same_values(original: &Tensor, written: &Tensor, shape: &[usize]) -> bool {
    match (original.to_f32_array(), written.to_f32_array()) {
        (Some(original), Some(written)) => original
            .into_shape_with_order(IxDyn(shape))
            .map(|expected| {
                expected.shape() == written.shape()
                    && expected.iter().zip(written.iter()).all(|(a, b)| a.to_bits() == b.to_bits())
            })
            .unwrap_or(false),
        _ => original.data() == written.data(),
    }
}
