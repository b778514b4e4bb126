use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Failed to read schema file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON schema: {0}")]
    InvalidSchema(String),

    #[error("Schema validation failed for subject '{subject}': {}", .violations.join("; "))]
    Validation {
        subject: String,
        violations: Vec<String>,
    },

    #[error("Schema registry unavailable: {0}")]
    RegistryUnavailable(String),

    #[error("Schema registry returned status {status}: {message}")]
    Registry { status: u16, message: String },

    #[error("Subject '{0}' was not resolved when the serializer was configured")]
    UnknownSubject(String),

    #[error("JSON encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Schema id mismatch: expected {expected}, got {actual}")]
    SchemaIdMismatch { expected: i32, actual: i32 },
}

impl SchemaError {
    /// Whether this is a per-record validation failure (as opposed to a setup
    /// or transport problem).
    pub fn is_validation(&self) -> bool {
        matches!(self, SchemaError::Validation { .. })
    }

    pub fn is_registry_unavailable(&self) -> bool {
        matches!(self, SchemaError::RegistryUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, SchemaError>;
