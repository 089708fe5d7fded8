//! Distance engine.
//!
//! Every occupied slot is compared against the delayed query in one logical
//! step: `popcount((query ^ template) & mask)`. Slots are independent, so the
//! `parallel` feature can fan the banks out over rayon without changing the
//! result.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::domain::{Pattern, SlotIndex};
use crate::store::{PatternStore, Template};

/// Hamming distance between two patterns over the bits in `mask`
#[inline]
pub fn distance(query: Pattern, template: Pattern, mask: u16) -> u8 {
    query.hamming(template, mask)
}

/// Per-slot distances for one evaluation; `None` marks an unoccupied slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceField {
    banks: Vec<Vec<Option<u8>>>,
}

impl DistanceField {
    pub fn banks(&self) -> &[Vec<Option<u8>>] {
        &self.banks
    }

    pub fn get(&self, slot: SlotIndex) -> Option<u8> {
        self.banks
            .get(slot.bank)
            .and_then(|b| b.get(slot.offset))
            .copied()
            .flatten()
    }

    /// Number of slots that produced a distance
    pub fn candidates(&self) -> usize {
        self.banks.iter().flatten().filter(|d| d.is_some()).count()
    }
}

#[inline]
fn bank_distances(bank: &[Template], query: Pattern, mask: u16) -> Vec<Option<u8>> {
    bank.iter()
        .map(|t| t.occupied.then(|| distance(query, t.value, mask)))
        .collect()
}

/// Distances from `query` to every slot of `store`
#[cfg(not(feature = "parallel"))]
pub fn compute(store: &PatternStore, query: Pattern, mask: u16) -> DistanceField {
    let banks = store
        .banks()
        .iter()
        .map(|bank| bank_distances(bank, query, mask))
        .collect();
    DistanceField { banks }
}

/// Distances from `query` to every slot of `store` (rayon)
#[cfg(feature = "parallel")]
pub fn compute(store: &PatternStore, query: Pattern, mask: u16) -> DistanceField {
    let banks = store
        .banks()
        .par_iter()
        .map(|bank| bank_distances(bank, query, mask))
        .collect();
    DistanceField { banks }
}
