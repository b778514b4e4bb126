//! The event record produced by the generator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Categorical tag describing what happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    Click,
    Sale,
    Return,
    Exchange,
}

impl EventType {
    /// Every event type, in declaration order.
    pub const ALL: [EventType; 4] = [
        EventType::Click,
        EventType::Sale,
        EventType::Return,
        EventType::Exchange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Click => "CLICK",
            EventType::Sale => "SALE",
            EventType::Return => "RETURN",
            EventType::Exchange => "EXCHANGE",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown event type: {0}")]
pub struct ParseEventTypeError(String);

impl FromStr for EventType {
    type Err = ParseEventTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseEventTypeError(s.to_string()))
    }
}

/// A single synthetic business event.
///
/// Field names match the JSON document registered with the schema registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event type tag
    pub field1: EventType,
    /// Email address of the acting customer
    pub field2: String,
    /// Unique event id (UUID v4, hyphenated)
    pub field3: String,
}

impl EventRecord {
    /// The unique event id, used as message key when records are keyed.
    pub fn id(&self) -> &str {
        &self.field3
    }
}
