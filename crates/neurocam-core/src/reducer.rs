//! Bank and global minimum reduction.
//!
//! Both reducers scan in index order with strict `<`, so the first candidate
//! holding the minimum wins: lowest offset inside a bank, then lowest bank
//! across banks.

use crate::distance::DistanceField;
use crate::domain::SlotIndex;

/// Best candidate of a single bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankMin {
    pub distance: u8,
    pub offset: usize,
}

/// Winner across all banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalMin {
    pub distance: u8,
    pub slot: SlotIndex,
    /// Smallest bank minimum strictly above `distance`
    pub second_best: Option<u8>,
}

/// Minimum distance and its offset within one bank
pub fn reduce_bank(distances: &[Option<u8>]) -> Option<BankMin> {
    let mut best: Option<BankMin> = None;
    for (offset, d) in distances.iter().enumerate() {
        let Some(d) = *d else { continue };
        match best {
            Some(b) if d >= b.distance => {}
            _ => best = Some(BankMin { distance: d, offset }),
        }
    }
    best
}

/// Per-bank minima for a whole distance field
pub fn reduce_banks(field: &DistanceField) -> Vec<Option<BankMin>> {
    field.banks().iter().map(|bank| reduce_bank(bank)).collect()
}

/// Combine bank minima into the global winner and the second-best distance
pub fn reduce_global(bank_mins: &[Option<BankMin>]) -> Option<GlobalMin> {
    let mut winner: Option<(usize, BankMin)> = None;
    for (bank, min) in bank_mins.iter().enumerate() {
        let Some(min) = *min else { continue };
        match winner {
            Some((_, w)) if min.distance >= w.distance => {}
            _ => winner = Some((bank, min)),
        }
    }

    let (bank, min) = winner?;
    let second_best = bank_mins
        .iter()
        .flatten()
        .map(|m| m.distance)
        .filter(|&d| d > min.distance)
        .min();

    Some(GlobalMin {
        distance: min.distance,
        slot: SlotIndex::new(bank, min.offset),
        second_best,
    })
}
