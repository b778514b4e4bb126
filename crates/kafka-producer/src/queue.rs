//! Asynchronous publish queue.
//!
//! ```text
//!  publish() ──► bounded mpsc ──► worker ──► batch ──► Transport
//!      │                            │                     │
//!      │ backpressure / QueueFull   │ max_in_flight       │ per-record result
//!      ▼                            ▼                     ▼
//!  OutstandingTracker ◄──────── callback(outcome) ◄── retry / resolve
//! ```

use crate::config::{QueueConfig, RetryPolicy};
use crate::drain::OutstandingTracker;
use crate::error::{DeliveryError, PublishError, TransportError};
use crate::outcome::{DeliveryCallback, DeliveryOutcome};
use crate::transport::Transport;
use bytes::Bytes;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tracing::{debug, error, warn};

/// A record as handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRecord {
    pub topic: String,
    pub key: Option<Bytes>,
    pub payload: Bytes,
}

/// A record together with its completion callback.
struct OutboundMessage {
    record: OutboundRecord,
    callback: DeliveryCallback,
}

impl OutboundMessage {
    /// Invoke the callback and mark the message resolved. A panicking
    /// callback is logged and still counts as resolved.
    fn resolve(self, outcome: DeliveryOutcome, tracker: &OutstandingTracker) {
        let callback = self.callback;
        if std::panic::catch_unwind(AssertUnwindSafe(move || callback(outcome))).is_err() {
            error!(
                "Delivery callback panicked for message to topic '{}'",
                self.record.topic
            );
        }
        tracker.resolved();
    }
}

/// Queue that accepts messages without blocking on network I/O and reports
/// each message's outcome through a callback.
pub struct PublishQueue {
    sender: mpsc::Sender<OutboundMessage>,
    tracker: Arc<OutstandingTracker>,
    transport: Arc<dyn Transport>,
    worker: JoinHandle<()>,
    enqueue_timeout: Duration,
}

impl PublishQueue {
    /// Create a queue and spawn its background worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(transport: Arc<dyn Transport>, config: QueueConfig) -> Result<Self, PublishError> {
        config.validate()?;

        let (sender, receiver) = mpsc::channel(config.capacity);
        let tracker = Arc::new(OutstandingTracker::new());
        let enqueue_timeout = config.enqueue_timeout;

        let worker = tokio::spawn(run_worker(
            transport.clone(),
            receiver,
            config,
            tracker.clone(),
        ));

        Ok(Self {
            sender,
            tracker,
            transport,
            worker,
            enqueue_timeout,
        })
    }

    /// Enqueue a message for delivery.
    ///
    /// Returns as soon as the message is buffered. If the buffer is full this
    /// waits for space, up to the configured enqueue timeout, then fails with
    /// `QueueFull`. On error the callback is dropped without being called.
    ///
    /// Cancel safe: dropping the future before it completes leaves nothing
    /// enqueued and nothing counted as outstanding.
    pub async fn publish<F>(
        &self,
        topic: impl Into<String>,
        key: Option<Bytes>,
        payload: Bytes,
        callback: F,
    ) -> Result<(), PublishError>
    where
        F: FnOnce(DeliveryOutcome) + Send + 'static,
    {
        let permit = match tokio::time::timeout(self.enqueue_timeout, self.sender.reserve()).await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(PublishError::Closed),
            Err(_) => {
                return Err(PublishError::QueueFull {
                    topic: topic.into(),
                    timeout: self.enqueue_timeout,
                })
            }
        };

        // No await between counting and sending
        self.tracker.enqueued();
        permit.send(OutboundMessage {
            record: OutboundRecord {
                topic: topic.into(),
                key,
                payload,
            },
            callback: Box::new(callback),
        });
        Ok(())
    }

    /// Enqueue a message, failing with `QueueFull` immediately if the buffer
    /// has no space.
    pub fn try_publish<F>(
        &self,
        topic: impl Into<String>,
        key: Option<Bytes>,
        payload: Bytes,
        callback: F,
    ) -> Result<(), PublishError>
    where
        F: FnOnce(DeliveryOutcome) + Send + 'static,
    {
        let message = OutboundMessage {
            record: OutboundRecord {
                topic: topic.into(),
                key,
                payload,
            },
            callback: Box::new(callback),
        };

        self.tracker.enqueued();
        match self.sender.try_send(message) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(message)) => {
                self.tracker.resolved();
                Err(PublishError::QueueFull {
                    topic: message.record.topic,
                    timeout: Duration::ZERO,
                })
            }
            Err(TrySendError::Closed(_)) => {
                self.tracker.resolved();
                Err(PublishError::Closed)
            }
        }
    }

    /// Enqueue a message and get a receiver for its outcome instead of a
    /// callback.
    pub async fn publish_with_receipt(
        &self,
        topic: impl Into<String>,
        key: Option<Bytes>,
        payload: Bytes,
    ) -> Result<oneshot::Receiver<DeliveryOutcome>, PublishError> {
        let (tx, rx) = oneshot::channel();
        self.publish(topic, key, payload, move |outcome| {
            // The caller may have dropped the receiver
            let _ = tx.send(outcome);
        })
        .await?;
        Ok(rx)
    }

    /// Messages enqueued whose callback has not run yet.
    pub fn outstanding(&self) -> usize {
        self.tracker.outstanding()
    }

    /// Drain barrier: wait until every message enqueued so far has resolved,
    /// or `timeout` passes. Returns the number still outstanding; 0 means
    /// fully drained.
    pub async fn flush(&self, timeout: Duration) -> usize {
        let remaining = self.tracker.wait_drained(timeout).await;
        if remaining > 0 {
            warn!(
                "{} message(s) still outstanding after {:?}",
                remaining, timeout
            );
        }
        remaining
    }

    /// Stop accepting messages, let the worker deliver what is already
    /// queued, and flush the transport. Returns the number of messages that
    /// did not resolve within `timeout`.
    pub async fn shutdown(self, timeout: Duration) -> usize {
        let PublishQueue {
            sender,
            tracker,
            transport,
            worker,
            ..
        } = self;

        let deadline = Instant::now() + timeout;
        drop(sender);

        if tokio::time::timeout_at(deadline, worker).await.is_err() {
            warn!("Publish worker did not finish within {:?}", timeout);
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if let Err(e) = transport.flush(remaining).await {
            warn!("Transport flush failed: {}", e);
        }

        tracker.outstanding()
    }
}

/// Background worker: pulls messages off the channel, groups them into
/// batches and spawns a delivery task per batch.
async fn run_worker(
    transport: Arc<dyn Transport>,
    mut receiver: mpsc::Receiver<OutboundMessage>,
    config: QueueConfig,
    tracker: Arc<OutstandingTracker>,
) {
    let permits = Arc::new(Semaphore::new(config.max_in_flight));
    let mut in_flight = JoinSet::new();

    while let Some(first) = receiver.recv().await {
        let mut batch = Vec::with_capacity(config.batch_size);
        batch.push(first);

        let linger_deadline = Instant::now() + config.linger;
        while batch.len() < config.batch_size {
            match tokio::time::timeout_at(linger_deadline, receiver.recv()).await {
                Ok(Some(message)) => batch.push(message),
                Ok(None) | Err(_) => break,
            }
        }

        let permit = match permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };

        debug!("Dispatching batch of {} message(s)", batch.len());
        let transport = transport.clone();
        let tracker = tracker.clone();
        let retry = config.retry;
        in_flight.spawn(async move {
            deliver_batch(transport.as_ref(), batch, retry, &tracker).await;
            drop(permit);
        });

        while let Some(result) = in_flight.try_join_next() {
            if let Err(e) = result {
                error!("Delivery task failed: {}", e);
            }
        }
    }

    while let Some(result) = in_flight.join_next().await {
        if let Err(e) = result {
            error!("Delivery task failed: {}", e);
        }
    }

    debug!("Publish worker stopped");
}

/// Transmit one batch, retrying retriable per-record failures until the
/// retry budget is spent. Every message is resolved exactly once.
async fn deliver_batch(
    transport: &dyn Transport,
    batch: Vec<OutboundMessage>,
    retry: RetryPolicy,
    tracker: &OutstandingTracker,
) {
    let mut pending = batch;
    let mut attempt: u32 = 1;

    loop {
        let records: Vec<&OutboundRecord> = pending.iter().map(|m| &m.record).collect();
        let mut results = transport.send_batch(&records).await.into_iter();
        drop(records);

        let mut retry_next = Vec::new();
        for message in pending {
            let result = results.next().unwrap_or_else(|| {
                Err(TransportError::Rejected(
                    "transport returned no result for record".to_string(),
                ))
            });

            match result {
                Ok(report) => message.resolve(DeliveryOutcome::Success(report), tracker),
                Err(err) if err.is_retriable() && attempt <= retry.max_retries => {
                    debug!(
                        "Retrying message to topic '{}' after attempt {}: {}",
                        message.record.topic, attempt, err
                    );
                    retry_next.push(message);
                }
                Err(err) => {
                    let failure = DeliveryError {
                        topic: message.record.topic.clone(),
                        attempts: attempt,
                        source: err,
                    };
                    message.resolve(DeliveryOutcome::Failure(failure), tracker);
                }
            }
        }

        if retry_next.is_empty() {
            return;
        }

        let backoff = retry.backoff(attempt);
        warn!(
            "{} message(s) failed with retriable errors, retrying in {:?} (attempt {} of {})",
            retry_next.len(),
            backoff,
            attempt + 1,
            retry.max_retries + 1
        );
        tokio::time::sleep(backoff).await;

        attempt += 1;
        pending = retry_next;
    }
}
