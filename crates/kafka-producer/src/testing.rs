//! In-memory transport for exercising the publish queue without a broker.
//!
//! `MemoryTransport` acknowledges records with per-partition offsets and can
//! be told to fail records for a topic, either for a fixed number of attempts
//! (a broker outage that heals) or permanently.

use crate::error::TransportError;
use crate::outcome::DeliveryReport;
use crate::queue::OutboundRecord;
use crate::transport::Transport;
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct FailurePlan {
    error: TransportError,
    /// Attempts left to fail; `None` fails forever
    remaining: Option<u32>,
}

#[derive(Debug, Default)]
struct MemoryState {
    offsets: HashMap<(String, i32), i64>,
    delivered: Vec<OutboundRecord>,
    failures: HashMap<String, FailurePlan>,
    attempts: u64,
    next_partition: i32,
}

/// Transport that stores acknowledged records in memory.
#[derive(Debug)]
pub struct MemoryTransport {
    partitions: i32,
    latency: Duration,
    state: Mutex<MemoryState>,
}

impl MemoryTransport {
    pub fn new(partitions: i32) -> Self {
        Self {
            partitions: partitions.max(1),
            latency: Duration::ZERO,
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Delay every batch by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fail records for `topic` with `error`, for the next `attempts`
    /// attempts or forever when `None`.
    pub async fn fail_topic(&self, topic: &str, error: TransportError, attempts: Option<u32>) {
        self.state.lock().await.failures.insert(
            topic.to_string(),
            FailurePlan {
                error,
                remaining: attempts,
            },
        );
    }

    /// Records acknowledged so far, in acknowledgment order.
    pub async fn delivered(&self) -> Vec<OutboundRecord> {
        self.state.lock().await.delivered.clone()
    }

    /// Total records offered to the transport, including failed attempts.
    pub async fn attempts(&self) -> u64 {
        self.state.lock().await.attempts
    }

    fn partition_for(&self, state: &mut MemoryState, record: &OutboundRecord) -> i32 {
        match &record.key {
            Some(key) => {
                let mut hasher = DefaultHasher::new();
                key.hash(&mut hasher);
                (hasher.finish() % self.partitions as u64) as i32
            }
            None => {
                let partition = state.next_partition;
                state.next_partition = (state.next_partition + 1) % self.partitions;
                partition
            }
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send_batch(
        &self,
        records: &[&OutboundRecord],
    ) -> Vec<Result<DeliveryReport, TransportError>> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let mut state = self.state.lock().await;
        let mut results = Vec::with_capacity(records.len());

        for record in records {
            state.attempts += 1;

            if let Some(plan) = state.failures.get_mut(&record.topic) {
                match plan.remaining {
                    Some(0) => {}
                    Some(ref mut n) => {
                        *n -= 1;
                        results.push(Err(plan.error.clone()));
                        continue;
                    }
                    None => {
                        results.push(Err(plan.error.clone()));
                        continue;
                    }
                }
            }

            let partition = self.partition_for(&mut state, record);
            let offset = state
                .offsets
                .entry((record.topic.clone(), partition))
                .or_insert(0);
            let report = DeliveryReport {
                topic: record.topic.clone(),
                partition,
                offset: *offset,
            };
            *offset += 1;

            state.delivered.push((*record).clone());
            results.push(Ok(report));
        }

        results
    }
}
