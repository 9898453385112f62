//! Error types for load generation.

use thiserror::Error;

use crate::config::ConfigError;

/// Any failure that aborts a generation run.
///
/// Generation is deterministic for a given seed and inputs, so none of
/// these are transient: callers that want another attempt must change the
/// inputs or the seed.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Missing or out-of-range forecast / mesh parameters.
    #[error("{0}")]
    Configuration(#[from] ConfigError),

    /// A mesh axis has fewer than two points.
    #[error("degenerate mesh: axis {axis} has extent {extent}, need at least 2")]
    DegenerateMesh {
        /// Axis name (`"x"`, `"y"`, `"t"` or `"h"`).
        axis: &'static str,
        /// Offending cardinality.
        extent: usize,
    },

    /// Input tables that cannot be used (empty, mismatched lengths, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// File access failures in the import/export helpers.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing or writing failures.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, GenerationError>;

impl GenerationError {
    /// Shorthand for a configuration error on a dotted field path.
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration(ConfigError {
            field: field.into(),
            message: message.into(),
        })
    }
}
