//! Delivery outcomes and callbacks.

use crate::error::DeliveryError;
use std::fmt;

/// Where the broker stored an acknowledged message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

impl fmt::Display for DeliveryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.topic, self.partition, self.offset)
    }
}

/// Terminal result of publishing one message.
#[derive(Debug, Clone)]
pub enum DeliveryOutcome {
    Success(DeliveryReport),
    Failure(DeliveryError),
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryOutcome::Success(_))
    }
}

/// Invoked exactly once per enqueued message, on the queue's background
/// worker. Callbacks must not block.
pub type DeliveryCallback = Box<dyn FnOnce(DeliveryOutcome) + Send + 'static>;
