//! Replacement and aging unit.
//!
//! Recency counters are statistics only: a hit bumps the matched slot
//! (saturating at 254 so a just-written 255 stays distinguishable) and a
//! global sweep decrements every nonzero counter once per aging interval.
//!
//! Learning does NOT consult the counters. Missed queries go into the learned
//! pool strictly round-robin; once the pool is full the oldest learned entry
//! is overwritten without notice.

use crate::domain::{CamError, Pattern, SlotIndex, RECENCY_USAGE_CEILING};
use crate::store::PatternStore;

#[derive(Debug, Clone)]
pub struct AgingUnit {
    interval: u64,
    elapsed: u64,
    cursor: usize,
    pool_size: usize,
    sweeps: u64,
}

impl AgingUnit {
    pub fn new(interval: u64, pool_size: usize) -> Self {
        Self {
            interval: interval.max(1),
            elapsed: 0,
            cursor: 0,
            pool_size,
            sweeps: 0,
        }
    }

    /// Record a hit on `slot`
    pub fn touch(&self, store: &mut PatternStore, slot: SlotIndex) {
        if let Some(recency) = store.recency_mut(slot) {
            if *recency < RECENCY_USAGE_CEILING {
                *recency += 1;
            }
        }
    }

    /// Advance one tick; returns true when a decay sweep ran
    pub fn tick(&mut self, store: &mut PatternStore) -> bool {
        self.elapsed += 1;
        if self.elapsed < self.interval {
            return false;
        }
        self.elapsed = 0;
        self.sweeps += 1;

        let mut decayed = 0usize;
        for t in store.templates_mut() {
            if t.recency > 0 {
                t.recency -= 1;
                decayed += 1;
            }
        }
        log::trace!("Aging sweep {}: {} counters decremented", self.sweeps, decayed);
        true
    }

    /// Learned-pool offset the next miss will overwrite
    pub fn next_learn_offset(&self) -> Option<usize> {
        (self.pool_size > 0).then_some(self.cursor)
    }

    /// Store `pattern` at the cursor and advance it modulo the pool size
    pub fn learn(
        &mut self,
        store: &mut PatternStore,
        pattern: Pattern,
    ) -> Result<Option<SlotIndex>, CamError> {
        let Some(offset) = self.next_learn_offset() else {
            return Ok(None);
        };
        let slot = store.learn(offset, pattern)?;
        self.cursor = (self.cursor + 1) % self.pool_size;
        log::debug!(
            "Learned {} into slot {} (next cursor {})",
            pattern,
            slot,
            self.cursor
        );
        Ok(Some(slot))
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn sweeps(&self) -> u64 {
        self.sweeps
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }
}
