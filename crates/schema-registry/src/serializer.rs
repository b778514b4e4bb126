//! Validating JSON serializer bound to a registered schema.

use crate::client::SchemaRegistryClient;
use crate::error::{Result, SchemaError};
use crate::schema::SchemaDescriptor;
use crate::wire;
use bytes::Bytes;
use serde::Serialize;
use std::collections::HashMap;

/// Which part of a Kafka message is being serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageField {
    Key,
    Value,
}

impl MessageField {
    fn suffix(&self) -> &'static str {
        match self {
            MessageField::Key => "key",
            MessageField::Value => "value",
        }
    }
}

/// Where a serialized payload is headed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializationContext<'a> {
    pub topic: &'a str,
    pub field: MessageField,
}

impl<'a> SerializationContext<'a> {
    pub fn value(topic: &'a str) -> Self {
        Self {
            topic,
            field: MessageField::Value,
        }
    }

    pub fn key(topic: &'a str) -> Self {
        Self {
            topic,
            field: MessageField::Key,
        }
    }
}

/// How registry subject names are derived.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubjectNameStrategy {
    /// `<topic>-value` / `<topic>-key`
    #[default]
    TopicName,
    /// The record name, independent of topic
    RecordName(String),
    /// `<topic>-<record name>`
    TopicRecordName(String),
}

impl SubjectNameStrategy {
    pub fn subject(&self, ctx: &SerializationContext<'_>) -> String {
        match self {
            SubjectNameStrategy::TopicName => format!("{}-{}", ctx.topic, ctx.field.suffix()),
            SubjectNameStrategy::RecordName(name) => name.clone(),
            SubjectNameStrategy::TopicRecordName(name) => format!("{}-{}", ctx.topic, name),
        }
    }
}

/// Serializer behaviour towards the registry.
#[derive(Debug, Clone)]
pub struct SerializerConfig {
    /// Register the schema under the subject if it is not there yet
    pub auto_register_schemas: bool,
    /// Use the latest version registered under the subject instead of
    /// registering or looking up the local schema
    pub use_latest_version: bool,
    pub subject_name_strategy: SubjectNameStrategy,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            auto_register_schemas: true,
            use_latest_version: false,
            subject_name_strategy: SubjectNameStrategy::TopicName,
        }
    }
}

/// Serializes values as schema-validated JSON framed with a schema id.
///
/// All registry interaction happens in [`JsonSchemaSerializer::configure`];
/// `serialize` is a pure, synchronous function of the value.
#[derive(Debug, Clone)]
pub struct JsonSchemaSerializer {
    schema: SchemaDescriptor,
    config: SerializerConfig,
    schema_ids: HashMap<String, i32>,
}

impl JsonSchemaSerializer {
    /// Resolve the schema id for every context the serializer will write to.
    ///
    /// Fails with `RegistryUnavailable` if the registry cannot be reached, and
    /// with `Configuration` if the schema is not registered and auto
    /// registration is disabled.
    pub async fn configure(
        schema: SchemaDescriptor,
        client: &SchemaRegistryClient,
        config: SerializerConfig,
        contexts: &[SerializationContext<'_>],
    ) -> Result<Self> {
        if config.auto_register_schemas && config.use_latest_version {
            return Err(SchemaError::Configuration(
                "cannot enable both auto schema registration and use of the latest version"
                    .to_string(),
            ));
        }

        let mut schema_ids = HashMap::new();
        for ctx in contexts {
            let subject = config.subject_name_strategy.subject(ctx);
            if schema_ids.contains_key(&subject) {
                continue;
            }

            let id = if config.use_latest_version {
                client.latest_version(&subject).await?.id
            } else if config.auto_register_schemas {
                client.register_schema(&subject, &schema).await?
            } else {
                client
                    .lookup_schema(&subject, &schema)
                    .await?
                    .ok_or_else(|| {
                        SchemaError::Configuration(format!(
                            "schema is not registered under subject '{subject}' and auto registration is disabled"
                        ))
                    })?
                    .id
            };

            tracing::info!(subject = %subject, schema_id = id, "Resolved schema id");
            schema_ids.insert(subject, id);
        }

        Ok(Self {
            schema,
            config,
            schema_ids,
        })
    }

    /// Build a serializer from subject ids that are already known, without
    /// contacting a registry.
    pub fn with_schema_ids(
        schema: SchemaDescriptor,
        config: SerializerConfig,
        schema_ids: impl IntoIterator<Item = (String, i32)>,
    ) -> Self {
        Self {
            schema,
            config,
            schema_ids: schema_ids.into_iter().collect(),
        }
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    /// The schema id resolved for a context, if any.
    pub fn schema_id(&self, ctx: &SerializationContext<'_>) -> Option<i32> {
        let subject = self.config.subject_name_strategy.subject(ctx);
        self.schema_ids.get(&subject).copied()
    }

    /// Validate `value` against the schema and frame it for the context.
    pub fn serialize<T: Serialize + ?Sized>(
        &self,
        value: &T,
        ctx: &SerializationContext<'_>,
    ) -> Result<Bytes> {
        let subject = self.config.subject_name_strategy.subject(ctx);
        let schema_id = *self
            .schema_ids
            .get(&subject)
            .ok_or_else(|| SchemaError::UnknownSubject(subject.clone()))?;

        let instance = serde_json::to_value(value)?;
        self.schema
            .validate(&instance)
            .map_err(|violations| SchemaError::Validation {
                subject,
                violations,
            })?;

        let json = serde_json::to_vec(&instance)?;
        Ok(wire::encode(schema_id, &json))
    }

    /// Serialize a message value for `topic`.
    pub fn serialize_value<T: Serialize + ?Sized>(&self, value: &T, topic: &str) -> Result<Bytes> {
        self.serialize(value, &SerializationContext::value(topic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tests::EVENT_SCHEMA;
    use crate::wire::{decode, MAGIC_BYTE};
    use serde_json::json;

    fn serializer() -> JsonSchemaSerializer {
        let schema = SchemaDescriptor::from_json_str(EVENT_SCHEMA).unwrap();
        JsonSchemaSerializer::with_schema_ids(
            schema,
            SerializerConfig::default(),
            [("input_topic-value".to_string(), 42)],
        )
    }

    #[test]
    fn test_subject_name_strategies() {
        let ctx = SerializationContext::value("orders");
        assert_eq!(SubjectNameStrategy::TopicName.subject(&ctx), "orders-value");
        assert_eq!(
            SubjectNameStrategy::TopicName.subject(&SerializationContext::key("orders")),
            "orders-key"
        );
        assert_eq!(
            SubjectNameStrategy::RecordName("Event".to_string()).subject(&ctx),
            "Event"
        );
        assert_eq!(
            SubjectNameStrategy::TopicRecordName("Event".to_string()).subject(&ctx),
            "orders-Event"
        );
    }

    #[test]
    fn test_serialize_frames_with_schema_id() {
        let value = json!({
            "field1": "CLICK",
            "field2": "jsmith@walker-group.com",
            "field3": "0f8fad5b-d9cb-469f-a165-70867728950e"
        });

        let bytes = serializer().serialize_value(&value, "input_topic").unwrap();
        assert_eq!(bytes[0], MAGIC_BYTE);

        let (id, body) = decode(&bytes).unwrap();
        assert_eq!(id, 42);
        let decoded: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_serialize_rejects_unknown_event_type() {
        let value = json!({
            "field1": "UNKNOWN",
            "field2": "jsmith@walker-group.com",
            "field3": "0f8fad5b-d9cb-469f-a165-70867728950e"
        });

        let err = serializer()
            .serialize_value(&value, "input_topic")
            .unwrap_err();
        match err {
            SchemaError::Validation {
                subject,
                violations,
            } => {
                assert_eq!(subject, "input_topic-value");
                assert_eq!(violations.len(), 1);
                assert!(violations[0].contains("UNKNOWN"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_serialize_rejects_missing_field() {
        let value = json!({ "field1": "SALE", "field2": "a@b.com" });
        let err = serializer()
            .serialize_value(&value, "input_topic")
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("field3"));
    }

    #[test]
    fn test_serialize_unknown_subject() {
        let value = json!({});
        let err = serializer().serialize_value(&value, "other_topic").unwrap_err();
        assert!(matches!(err, SchemaError::UnknownSubject(s) if s == "other_topic-value"));
    }

    #[test]
    fn test_schema_id_lookup() {
        let serializer = serializer();
        assert_eq!(
            serializer.schema_id(&SerializationContext::value("input_topic")),
            Some(42)
        );
        assert_eq!(
            serializer.schema_id(&SerializationContext::key("input_topic")),
            None
        );
    }
}
