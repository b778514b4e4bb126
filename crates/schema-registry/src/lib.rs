//! Schema registry integration for kafka-datagen.
//!
//! This crate provides:
//! - `SchemaRegistryClient`: HTTP client for a Confluent-compatible registry
//! - `SchemaDescriptor`: a JSON Schema document loaded once and compiled
//! - `JsonSchemaSerializer`: validates values against the schema and frames
//!   them with the registry-assigned schema id
//! - `JsonSchemaDeserializer`: the inverse, for consumers and tests
//!
//! # Wire Format
//!
//! ```text
//! ┌────────────┬──────────────────┬──────────────────────┐
//! │ magic 0x00 │ schema id (i32)  │ JSON document (UTF-8) │
//! │  1 byte    │ 4 bytes, BE      │ N bytes               │
//! └────────────┴──────────────────┴──────────────────────┘
//! ```

pub mod client;
pub mod deserializer;
pub mod error;
pub mod schema;
pub mod serializer;
pub mod wire;

pub use client::{RegisteredSchema, RegistryConfig, SchemaRegistryClient};
pub use deserializer::JsonSchemaDeserializer;
pub use error::{Result, SchemaError};
pub use schema::SchemaDescriptor;
pub use serializer::{
    JsonSchemaSerializer, MessageField, SerializationContext, SerializerConfig,
    SubjectNameStrategy,
};
