//! Error types for the datawash pipeline.
//!
//! Per-unit failures inside the pipeline (a single column profile, a single
//! detector run) are recovered locally and never reach the caller. The
//! variants below cover the failures that do surface: invalid input tables,
//! invalid configuration, and integration errors at the transformer boundary.

use thiserror::Error;

/// Main error type for datawash operations.
#[derive(Debug, Error)]
pub enum DataWashError {
    /// Configuration or validation error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Input table is structurally invalid
    #[error("Invalid table: {message}")]
    InvalidTable { message: String },

    /// A column lookup referenced a name the table does not contain
    #[error("Column not found: '{column}'")]
    ColumnNotFound { column: String },

    /// A detector failed while analysing a table
    #[error("Detector '{detector}' failed: {context}")]
    Detection { detector: String, context: String },

    /// A suggestion referenced a transformer key nobody registered
    #[error("Unknown transformer: {name}. Available: [{}]", available.join(", "))]
    UnknownTransformer {
        name: String,
        available: Vec<String>,
    },

    /// A transformer rejected its parameters or failed to apply
    #[error("Transformation '{transformer}' failed: {context}")]
    Transformation {
        transformer: String,
        context: String,
    },

    /// Serialization or deserialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results with `DataWashError`
pub type Result<T> = std::result::Result<T, DataWashError>;

impl DataWashError {
    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an invalid table error
    pub fn invalid_table(message: impl Into<String>) -> Self {
        Self::InvalidTable {
            message: message.into(),
        }
    }

    /// Creates a column lookup error
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }

    /// Creates a detector failure with context
    pub fn detection_failed(detector: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Detection {
            detector: detector.into(),
            context: context.into(),
        }
    }

    /// Creates a transformer failure with context
    pub fn transformation_failed(
        transformer: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self::Transformation {
            transformer: transformer.into(),
            context: context.into(),
        }
    }

    /// Creates a serialization error with context
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }
}
