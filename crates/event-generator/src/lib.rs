//! Synthetic event generator for kafka-datagen.
//!
//! This crate provides the `EventGenerator` which fabricates fake business
//! events. Each event carries an event type tag, a company-style email address
//! and a freshly minted UUID v4 that downstream consumers can use for
//! deduplication.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  EventGenerator  │
//! │                  │
//! │  - rng (StdRng)  │
//! │  - generated     │
//! └────────┬─────────┘
//!          │
//!          ▼
//!    EventRecord { field1, field2, field3 }
//! ```
//!
//! # Example
//!
//! ```rust
//! use event_generator::EventGenerator;
//!
//! let mut generator = EventGenerator::with_seed(42);
//! let record = generator.generate();
//! println!("Generated event: {:?}", record);
//! ```
//!
//! Generators built with the same seed produce the same sequence of events.
//! `EventGenerator::new()` seeds from OS entropy.

pub mod generator;
pub mod generators;
pub mod record;

// Re-exports for convenience
pub use generator::{EventGenerator, EventRecordIterator};
pub use record::{EventRecord, EventType, ParseEventTypeError};
