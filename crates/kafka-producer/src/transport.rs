//! Transports that move batches of records to the broker.

use crate::config::BrokerConfig;
use crate::error::{PublishError, TransportError};
use crate::outcome::DeliveryReport;
use crate::queue::OutboundRecord;
use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use std::time::Duration;

/// Sends records to a broker and reports one result per record.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transmit a batch. The returned vector holds one result per record, in
    /// the same order as `records`.
    async fn send_batch(
        &self,
        records: &[&OutboundRecord],
    ) -> Vec<Result<DeliveryReport, TransportError>>;

    /// Wait for anything the transport itself still buffers.
    async fn flush(&self, _timeout: Duration) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Transport backed by an rdkafka `FutureProducer`.
pub struct KafkaTransport {
    producer: FutureProducer,
    queue_timeout: Duration,
}

impl KafkaTransport {
    /// Create a Kafka transport. Does not contact the brokers.
    pub fn new(config: &BrokerConfig) -> Result<Self, PublishError> {
        let producer: FutureProducer = config.client_config()?.create()?;

        tracing::debug!(
            "Created Kafka producer for {}",
            config.bootstrap_servers_string()
        );

        Ok(Self {
            producer,
            queue_timeout: Duration::from_secs(5),
        })
    }

    /// How long a send may wait for room in librdkafka's own queue.
    pub fn with_queue_timeout(mut self, queue_timeout: Duration) -> Self {
        self.queue_timeout = queue_timeout;
        self
    }
}

#[async_trait]
impl Transport for KafkaTransport {
    async fn send_batch(
        &self,
        records: &[&OutboundRecord],
    ) -> Vec<Result<DeliveryReport, TransportError>> {
        // Hand every record to the producer first, then wait for all acks
        let futures = records.iter().map(|record| {
            let mut future_record =
                FutureRecord::<[u8], [u8]>::to(&record.topic).payload(record.payload.as_ref());
            if let Some(key) = &record.key {
                future_record = future_record.key(key.as_ref());
            }
            self.producer.send(future_record, self.queue_timeout)
        });

        futures::future::join_all(futures)
            .await
            .into_iter()
            .zip(records)
            .map(|(result, record)| match result {
                Ok((partition, offset)) => Ok(DeliveryReport {
                    topic: record.topic.clone(),
                    partition,
                    offset,
                }),
                Err((err, _)) => Err(TransportError::Kafka(err)),
            })
            .collect()
    }

    async fn flush(&self, timeout: Duration) -> Result<(), TransportError> {
        let producer = self.producer.clone();
        tokio::task::spawn_blocking(move || producer.flush(timeout))
            .await
            .map_err(|e| TransportError::Unavailable(format!("flush task failed: {e}")))?
            .map_err(TransportError::Kafka)
    }
}
