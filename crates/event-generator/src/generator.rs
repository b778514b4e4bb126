//! Main event generator.

use crate::generators::email::generate_company_email;
use crate::generators::generate_event_type;
use crate::generators::uuid::generate_uuid_v4;
use crate::record::EventRecord;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Generator that fabricates synthetic event records.
///
/// Seeded generators are reproducible: the same seed yields the same
/// sequence of records, including the event ids.
pub struct EventGenerator {
    rng: StdRng,
    generated: u64,
}

impl EventGenerator {
    /// Create a generator seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            generated: 0,
        }
    }

    /// Create a generator with a fixed seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            generated: 0,
        }
    }

    /// Number of records generated so far.
    pub fn generated(&self) -> u64 {
        self.generated
    }

    /// Generate the next event record.
    pub fn generate(&mut self) -> EventRecord {
        let field1 = generate_event_type(&mut self.rng);
        let field2 = generate_company_email(&mut self.rng);
        let field3 = generate_uuid_v4(&mut self.rng).to_string();

        self.generated += 1;

        EventRecord {
            field1,
            field2,
            field3,
        }
    }

    /// Generate `count` records lazily.
    pub fn records(&mut self, count: u64) -> EventRecordIterator<'_> {
        EventRecordIterator {
            generator: self,
            remaining: count,
        }
    }
}

impl Default for EventGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator returned by [`EventGenerator::records`].
pub struct EventRecordIterator<'a> {
    generator: &'a mut EventGenerator,
    remaining: u64,
}

impl Iterator for EventRecordIterator<'_> {
    type Item = EventRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.generator.generate())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}
