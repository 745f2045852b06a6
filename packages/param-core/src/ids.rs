//! Time-based identity generation for pages, records and columns.

use std::sync::atomic::{AtomicI64, Ordering};

/// Generates strictly increasing millisecond seeds.
///
/// Seeds start at the wall clock and never repeat within one generator,
/// even when called several times in the same millisecond.
#[derive(Debug)]
pub struct IdGenerator {
    last_seed: AtomicI64,
}

impl IdGenerator {
    /// Creates a generator seeded from the current time.
    pub fn new() -> Self {
        Self {
            last_seed: AtomicI64::new(0),
        }
    }

    /// Creates a generator whose first seed is `seed` (or the clock, if later).
    pub fn starting_at(seed: i64) -> Self {
        Self {
            last_seed: AtomicI64::new(seed - 1),
        }
    }

    /// Returns the next seed: the current time in milliseconds, bumped past
    /// the previous seed when the clock has not advanced.
    pub fn next_seed(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let mut last = self.last_seed.load(Ordering::Relaxed);
        loop {
            let next = now.max(last + 1);
            match self.last_seed.compare_exchange_weak(
                last,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }

    /// Returns a fresh standalone id.
    pub fn next_id(&self) -> String {
        self.next_seed().to_string()
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Id of the `index`-th row of an import batch.
pub fn import_id(seed: i64, index: usize) -> String {
    format!("{}_import_{}", seed, index)
}

/// Id given to the `index`-th decoded row that carried none.
pub fn row_id(seed: i64, index: usize) -> String {
    format!("{}_{}", seed, index)
}
