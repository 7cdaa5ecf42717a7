//! Error types with actionable diagnostics.
//!
//! Every fatal condition of a conversion run maps to one variant. Messages
//! name the offending path or tensor and, where a user can fix the problem,
//! say how.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for renombrar operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting a checkpoint.
#[derive(Error, Debug)]
pub enum Error {
    /// A required setting was supplied neither on the command line nor in the config file.
    #[error("Missing required argument: {field}\n  → Pass --{flag} or set '{field}' in the config file", flag = .field.replace('_', "-"))]
    MissingArgument { field: String },

    /// Configuration file could not be parsed.
    #[error("Invalid configuration syntax in {path}:\n  {message}\n  → Check YAML syntax at the indicated line")]
    ConfigParsing { path: PathBuf, message: String },

    /// Configuration value is invalid.
    #[error("Invalid configuration value for '{field}': {message}\n  → {suggestion}")]
    ConfigValue { field: String, message: String, suggestion: String },

    /// Source checkpoint does not exist.
    #[error("Checkpoint not found: {path}\n  → Check the path (a '.safetensors' suffix is tried automatically)")]
    CheckpointNotFound { path: PathBuf },

    /// Source checkpoint exists but cannot be read or parsed.
    #[error("Failed to read checkpoint {path}: {message}")]
    CheckpointRead { path: PathBuf, message: String },

    /// A tensor listed by the reader could not be fetched.
    #[error("Tensor not found in checkpoint: {name}")]
    TensorNotFound { name: String },

    /// Requested reshape does not preserve the element count.
    #[error("Shape mismatch for {name}: cannot reshape {from:?} into {to:?}\n  → Check that --num-heads evenly divides the projection dimensions")]
    ShapeMismatch { name: String, from: Vec<usize>, to: Vec<usize> },

    /// Two source variables rewrite to the same destination name (strict mode).
    #[error("Name collision: '{first}' and '{second}' both rewrite to '{target}'\n  → Exclude one of them with --exclude-patterns or drop --strict")]
    NameCollision { target: String, first: String, second: String },

    /// Destination checkpoint could not be written.
    #[error("Failed to write checkpoint {path}: {message}")]
    CheckpointWrite { path: PathBuf, message: String },

    /// IO error with context.
    #[error("IO error: {context}\n  Cause: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Destination checkpoint does not match the expected conversion.
    #[error("Verification failed with {failures} issue(s)")]
    VerificationFailed { failures: usize },
}

impl Error {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }

    /// Create a shape mismatch error.
    pub fn shape_mismatch(name: impl Into<String>, from: &[usize], to: &[usize]) -> Self {
        Self::ShapeMismatch { name: name.into(), from: from.to_vec(), to: to.to_vec() }
    }

    /// Check if this error is something the user can fix by changing inputs.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::MissingArgument { .. }
                | Self::ConfigParsing { .. }
                | Self::ConfigValue { .. }
                | Self::CheckpointNotFound { .. }
                | Self::ShapeMismatch { .. }
                | Self::NameCollision { .. }
        )
    }

    /// Get the error code for structured output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingArgument { .. } => "E001",
            Self::ConfigParsing { .. } => "E002",
            Self::ConfigValue { .. } => "E003",
            Self::CheckpointNotFound { .. } => "E010",
            Self::CheckpointRead { .. } => "E011",
            Self::TensorNotFound { .. } => "E012",
            Self::ShapeMismatch { .. } => "E040",
            Self::NameCollision { .. } => "E041",
            Self::CheckpointWrite { .. } => "E050",
            Self::Io { .. } => "E051",
            Self::VerificationFailed { .. } => "E060",
        }
    }
}
