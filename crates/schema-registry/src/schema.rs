//! JSON Schema documents.

use crate::error::{Result, SchemaError};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A parsed and compiled JSON Schema document.
///
/// The document is canonicalised to compact JSON text, which is the form sent
/// to the registry. Cloning is cheap; the compiled validator is shared.
#[derive(Clone)]
pub struct SchemaDescriptor {
    document: Value,
    canonical: String,
    validator: Arc<jsonschema::Validator>,
}

impl SchemaDescriptor {
    /// Load a schema from a file on disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let schema = Self::from_json_str(&content)?;
        tracing::debug!("Loaded JSON schema from {:?}", path);
        Ok(schema)
    }

    /// Parse a schema from JSON text.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(content)
            .map_err(|e| SchemaError::InvalidSchema(format!("not valid JSON: {e}")))?;
        Self::from_value(document)
    }

    /// Compile an already parsed schema document.
    pub fn from_value(document: Value) -> Result<Self> {
        if !document.is_object() {
            return Err(SchemaError::InvalidSchema(
                "schema document must be a JSON object".to_string(),
            ));
        }

        let validator = jsonschema::validator_for(&document)
            .map_err(|e| SchemaError::InvalidSchema(e.to_string()))?;
        let canonical = serde_json::to_string(&document)?;

        Ok(Self {
            document,
            canonical,
            validator: Arc::new(validator),
        })
    }

    /// The schema document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Compact JSON text of the schema, as registered.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// The schema's `title`, if any.
    pub fn title(&self) -> Option<&str> {
        self.document.get("title").and_then(Value::as_str)
    }

    /// Validate an instance, returning every violated constraint.
    pub fn validate(&self, instance: &Value) -> std::result::Result<(), Vec<String>> {
        let violations: Vec<String> = self
            .validator
            .iter_errors(instance)
            .map(|e| e.to_string())
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

impl fmt::Debug for SchemaDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaDescriptor")
            .field("canonical", &self.canonical)
            .finish_non_exhaustive()
    }
}
