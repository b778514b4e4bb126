//! Kafka publishing for kafka-datagen.
//!
//! This library provides an asynchronous publish queue in front of a Kafka
//! producer:
//!
//! - **Publish queue**: `publish` enqueues a message with a delivery callback
//!   and returns without doing network I/O; a bounded buffer applies
//!   backpressure
//! - **Delivery callbacks**: every enqueued message gets exactly one
//!   `DeliveryOutcome`, delivered on a background task
//! - **Drain barrier**: `flush` waits until everything enqueued so far has
//!   resolved, or a timeout passes
//! - **Topic management**: creating the output topic if it doesn't exist
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kafka_producer::{BrokerConfig, DeliveryOutcome, KafkaTransport, PublishQueue, QueueConfig};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let broker = BrokerConfig::new(["localhost:9092"]);
//!     let transport = KafkaTransport::new(&broker)?;
//!     let queue = PublishQueue::new(Arc::new(transport), QueueConfig::default())?;
//!
//!     queue
//!         .publish("input_topic", None, b"hello".to_vec().into(), |outcome| match outcome {
//!             DeliveryOutcome::Success(report) => tracing::info!("Delivered to {report}"),
//!             DeliveryOutcome::Failure(err) => tracing::error!("Delivery failed: {err}"),
//!         })
//!         .await?;
//!
//!     let remaining = queue.flush(Duration::from_secs(30)).await;
//!     assert_eq!(remaining, 0);
//!     Ok(())
//! }
//! ```

pub mod config;
mod drain;
pub mod error;
pub mod outcome;
pub mod queue;
pub mod testing;
pub mod topic;
pub mod transport;

pub use config::{BrokerConfig, QueueConfig, RetryPolicy, SaslMechanism, SecurityProtocol};
pub use error::{DeliveryError, PublishError, TransportError};
pub use outcome::{DeliveryCallback, DeliveryOutcome, DeliveryReport};
pub use queue::{OutboundRecord, PublishQueue};
pub use topic::create_topic_if_not_exists;
pub use transport::{KafkaTransport, Transport};
