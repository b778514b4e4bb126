//! Individual value generators for the event record fields.

pub mod email;
pub mod uuid;

use crate::record::EventType;
use rand::seq::IndexedRandom;
use rand::Rng;

/// Pick an event type uniformly at random.
pub fn generate_event_type<R: Rng>(rng: &mut R) -> EventType {
    // ALL is non-empty, so choose always yields a value
    *EventType::ALL.choose(rng).unwrap_or(&EventType::Click)
}
