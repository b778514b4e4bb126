//! kafka-datagen library
//!
//! Produces synthetic business events to Kafka, validating every payload
//! against a JSON Schema registered with a Confluent-compatible schema
//! registry.
//!
//! # Components
//!
//! - `event_generator` - synthetic event records
//! - `schema_registry` - registry client and validating serializer
//! - `kafka_producer` - asynchronous publish queue with delivery callbacks
//!   and drain barrier
//!
//! This crate wires them together: command-line configuration, topic
//! bootstrap and the producer run itself.
//!
//! # CLI Usage
//!
//! ```bash
//! # Produce 10 events to input_topic on a local broker
//! kafka-datagen --bootstrap-servers localhost:9092 \
//!   --schema-registry-url http://localhost:8081
//!
//! # Confluent Cloud style SASL_SSL with a secured registry
//! kafka-datagen --bootstrap-servers pkc-xxxxx.confluent.cloud:9092 \
//!   --security-protocol SASL_SSL --sasl-mechanism PLAIN \
//!   --sasl-username "$API_KEY" --sasl-password "$API_SECRET" \
//!   --schema-registry-url https://psrc-xxxxx.confluent.cloud \
//!   --schema-registry-basic-auth "$SR_KEY:$SR_SECRET" \
//!   --count 1000 --flush-timeout 2m
//! ```

pub mod config;
pub mod logging;
pub mod run;

pub use config::{KafkaArgs, ProducerArgs, QueueArgs, RegistryArgs, RunOptions};
pub use run::{prepare_serializer, produce, run_producer, RunSummary};
