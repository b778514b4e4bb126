//! Decoding of schema-framed JSON payloads.

use crate::error::{Result, SchemaError};
use crate::schema::SchemaDescriptor;
use crate::wire;
use serde::de::DeserializeOwned;

/// Decodes payloads produced by [`crate::JsonSchemaSerializer`], validating
/// them against the same schema.
#[derive(Debug, Clone)]
pub struct JsonSchemaDeserializer {
    schema: SchemaDescriptor,
    expected_schema_id: Option<i32>,
}

impl JsonSchemaDeserializer {
    pub fn new(schema: SchemaDescriptor) -> Self {
        Self {
            schema,
            expected_schema_id: None,
        }
    }

    /// Reject payloads framed with any other schema id.
    pub fn with_schema_id(mut self, schema_id: i32) -> Self {
        self.expected_schema_id = Some(schema_id);
        self
    }

    /// Decode a payload into `T`, returning the schema id it was framed with.
    pub fn deserialize<T: DeserializeOwned>(&self, payload: &[u8]) -> Result<(i32, T)> {
        let (schema_id, body) = wire::decode(payload)?;

        if let Some(expected) = self.expected_schema_id {
            if expected != schema_id {
                return Err(SchemaError::SchemaIdMismatch {
                    expected,
                    actual: schema_id,
                });
            }
        }

        let instance: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| SchemaError::MalformedPayload(format!("body is not valid JSON: {e}")))?;

        self.schema
            .validate(&instance)
            .map_err(|violations| SchemaError::Validation {
                subject: format!("schema id {schema_id}"),
                violations,
            })?;

        let value = serde_json::from_value(instance)?;
        Ok((schema_id, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tests::EVENT_SCHEMA;
    use crate::serializer::{JsonSchemaSerializer, SerializerConfig};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Event {
        field1: String,
        field2: String,
        field3: String,
    }

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::from_json_str(EVENT_SCHEMA).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let serializer = JsonSchemaSerializer::with_schema_ids(
            schema(),
            SerializerConfig::default(),
            [("input_topic-value".to_string(), 7)],
        );
        let event = Event {
            field1: "RETURN".to_string(),
            field2: "linda.moore@clark-partners.org".to_string(),
            field3: "9b2e4a6c-1d3f-4e5a-8b7c-0d1e2f3a4b5c".to_string(),
        };

        let bytes = serializer.serialize_value(&event, "input_topic").unwrap();
        let deserializer = JsonSchemaDeserializer::new(schema()).with_schema_id(7);
        let (id, decoded): (i32, Event) = deserializer.deserialize(&bytes).unwrap();

        assert_eq!(id, 7);
        assert_eq!(decoded, event);
    }

    #[test]
    fn test_schema_id_mismatch() {
        let payload = wire::encode(8, br#"{"field1":"SALE","field2":"a@b.com","field3":"x"}"#);
        let deserializer = JsonSchemaDeserializer::new(schema()).with_schema_id(7);
        let result: Result<(i32, Event)> = deserializer.deserialize(&payload);
        assert!(matches!(
            result,
            Err(SchemaError::SchemaIdMismatch {
                expected: 7,
                actual: 8
            })
        ));
    }

    #[test]
    fn test_rejects_non_conforming_payload() {
        let payload = wire::encode(
            7,
            br#"{"field1":"UNKNOWN","field2":"a@b.com","field3":"9b2e4a6c-1d3f-4e5a-8b7c-0d1e2f3a4b5c"}"#,
        );
        let result: Result<(i32, Event)> = JsonSchemaDeserializer::new(schema()).deserialize(&payload);
        assert!(matches!(result, Err(SchemaError::Validation { .. })));
    }

    #[test]
    fn test_rejects_garbage_body() {
        let payload = wire::encode(7, b"not json");
        let result: Result<(i32, Event)> = JsonSchemaDeserializer::new(schema()).deserialize(&payload);
        assert!(matches!(result, Err(SchemaError::MalformedPayload(_))));
    }
}
