//! Error types for the cancelseries crate.
//!
//! The series itself never fails; these errors come from configuration
//! loading and the collaborator modules.

use thiserror::Error;

/// The main error type for cancelseries operations.
#[derive(Debug, Error)]
pub enum CancelSeriesError {
    /// A configuration value was rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A required message field was absent.
    #[error("Message field '{field}' on resource with name '{resource}' cannot be null.")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
        /// Name of the resource the message describes.
        resource: String,
    },

    /// A resource message listed the same property twice.
    #[error("Duplicate property '{property}' on resource with name '{resource}'.")]
    DuplicateProperty {
        /// The repeated property name.
        property: String,
        /// Name of the resource the message describes.
        resource: String,
    },

    /// A process exited with a non-zero code.
    #[error("Process exited with code {0}")]
    NonZeroExit(i32),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias.
pub type Result<T, E = CancelSeriesError> = std::result::Result<T, E>;
