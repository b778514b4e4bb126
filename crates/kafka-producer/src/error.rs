//! Error types for publishing.

use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use std::time::Duration;
use thiserror::Error;

/// Errors returned to the caller of the publish queue.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Publish queue is full: message for topic '{topic}' not enqueued within {timeout:?}")]
    QueueFull { topic: String, timeout: Duration },

    #[error("Publish queue is closed")]
    Closed,

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Kafka error: {0}")]
    Kafka(#[from] KafkaError),

    #[error("Topic creation error: {0}")]
    TopicCreation(String),
}

/// Failure reported by a transport for a single record.
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    #[error("Kafka error: {0}")]
    Kafka(#[from] KafkaError),

    /// Broker temporarily unreachable; worth retrying
    #[error("Broker unavailable: {0}")]
    Unavailable(String),

    /// Broker refused the record; retrying will not help
    #[error("Message rejected: {0}")]
    Rejected(String),
}

impl TransportError {
    /// Whether sending the same record again may succeed.
    pub fn is_retriable(&self) -> bool {
        match self {
            TransportError::Kafka(err) => err.rdkafka_error_code().is_some_and(is_retriable_code),
            TransportError::Unavailable(_) => true,
            TransportError::Rejected(_) => false,
        }
    }
}

/// `MessageTimedOut` is terminal: librdkafka only reports it once its own
/// retries have used up `message.timeout.ms`.
fn is_retriable_code(code: RDKafkaErrorCode) -> bool {
    matches!(
        code,
        RDKafkaErrorCode::QueueFull
            | RDKafkaErrorCode::RequestTimedOut
            | RDKafkaErrorCode::NotEnoughReplicas
            | RDKafkaErrorCode::NotEnoughReplicasAfterAppend
            | RDKafkaErrorCode::LeaderNotAvailable
            | RDKafkaErrorCode::NotLeaderForPartition
            | RDKafkaErrorCode::BrokerTransportFailure
            | RDKafkaErrorCode::AllBrokersDown
            | RDKafkaErrorCode::NetworkException
    )
}

/// Terminal delivery failure, handed to the message's callback.
#[derive(Error, Debug, Clone)]
#[error("Message to topic '{topic}' failed after {attempts} attempt(s): {source}")]
pub struct DeliveryError {
    pub topic: String,
    pub attempts: u32,
    #[source]
    pub source: TransportError,
}
