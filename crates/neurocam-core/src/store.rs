//! Pattern store: banked template table with per-slot metadata.
//!
//! # Layout
//! ```text
//! bank 0      [s0 s1 .. sK-1]   main banks, written explicitly
//! bank 1      [..]
//! ...
//! bank B-1    [..]
//! bank B      [l0 .. lP-1]      learned pool (present when P > 0)
//! ```
//! Linear slot index = sum of preceding bank sizes + offset, so main-bank
//! slots keep the `bank * K + offset` numbering of the legacy 16-entry table.

use crate::config::{CamConfig, SeedProfile};
use crate::domain::{CamError, Pattern, SlotIndex, RECENCY_WRITTEN};

/// Factory templates for the 12-bit, 4x4 layout (linear slot order).
pub const FACTORY_SEEDS: [u16; 16] = [
    0x000, 0x0FF, 0xF00, 0xFFF, // bank 0
    0xAAA, 0x555, 0x333, 0xCCC, // bank 1
    0x0F0, 0xF0F, 0x3C3, 0xC3C, // bank 2
    0x00F, 0xFF0, 0x666, 0x999, // bank 3
];

/// One stored template and its bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Template {
    pub value: Pattern,
    pub bank: usize,
    pub recency: u8,
    pub priority: u8,
    pub learned: bool,
    pub occupied: bool,
}

#[derive(Debug, Clone)]
pub struct PatternStore {
    width: u8,
    main_banks: usize,
    banks: Vec<Vec<Template>>,
    /// First linear index of each bank
    bases: Vec<usize>,
}

impl PatternStore {
    /// Empty store with the configured geometry
    pub fn new(config: &CamConfig) -> Self {
        let g = &config.geometry;
        let mut banks: Vec<Vec<Template>> = (0..g.banks)
            .map(|bank| {
                vec![
                    Template {
                        bank,
                        ..Template::default()
                    };
                    g.slots_per_bank
                ]
            })
            .collect();
        if g.learned_pool_size > 0 {
            banks.push(vec![
                Template {
                    bank: g.banks,
                    ..Template::default()
                };
                g.learned_pool_size
            ]);
        }

        let mut bases = Vec::with_capacity(banks.len());
        let mut next = 0;
        for bank in &banks {
            bases.push(next);
            next += bank.len();
        }

        Self {
            width: g.pattern_width,
            main_banks: g.banks,
            banks,
            bases,
        }
    }

    /// Store populated according to the seed section of `config`
    pub fn seeded(config: &CamConfig) -> Self {
        let mut store = Self::new(config);
        let seeds: Vec<u16> = if !config.seed.custom.is_empty() {
            config.seed.custom.clone()
        } else {
            match config.seed.profile {
                SeedProfile::Factory => FACTORY_SEEDS.to_vec(),
                SeedProfile::Empty => Vec::new(),
            }
        };

        let k = config.geometry.slots_per_bank;
        let capacity = store.main_capacity();
        for (linear, bits) in seeds.into_iter().take(capacity).enumerate() {
            let value = Pattern(bits).truncate(store.width);
            store.banks[linear / k][linear % k] = Template {
                value,
                bank: linear / k,
                recency: RECENCY_WRITTEN,
                priority: 0,
                learned: false,
                occupied: true,
            };
        }
        store
    }

    #[inline]
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Main banks plus the learned bank, if any
    #[inline]
    pub fn bank_count(&self) -> usize {
        self.banks.len()
    }

    #[inline]
    pub fn main_bank_count(&self) -> usize {
        self.main_banks
    }

    /// Bank index of the learned pool
    pub fn learned_bank(&self) -> Option<usize> {
        (self.banks.len() > self.main_banks).then_some(self.main_banks)
    }

    pub fn learned_pool_size(&self) -> usize {
        self.learned_bank().map_or(0, |b| self.banks[b].len())
    }

    pub fn main_capacity(&self) -> usize {
        self.banks[..self.main_banks].iter().map(Vec::len).sum()
    }

    /// Total slots across all banks
    pub fn capacity(&self) -> usize {
        self.banks.iter().map(Vec::len).sum()
    }

    pub fn occupied(&self) -> usize {
        self.iter().filter(|(_, t)| t.occupied).count()
    }

    pub fn bank(&self, bank: usize) -> Option<&[Template]> {
        self.banks.get(bank).map(Vec::as_slice)
    }

    pub fn banks(&self) -> &[Vec<Template>] {
        &self.banks
    }

    pub fn linear_index(&self, slot: SlotIndex) -> Option<usize> {
        let bank = self.banks.get(slot.bank)?;
        (slot.offset < bank.len()).then(|| self.bases[slot.bank] + slot.offset)
    }

    pub fn slot_at(&self, linear: usize) -> Option<SlotIndex> {
        let bank = self.bases.iter().rposition(|&base| base <= linear)?;
        let offset = linear - self.bases[bank];
        (offset < self.banks[bank].len()).then_some(SlotIndex::new(bank, offset))
    }

    pub fn template(&self, slot: SlotIndex) -> Result<&Template, CamError> {
        self.banks
            .get(slot.bank)
            .and_then(|b| b.get(slot.offset))
            .ok_or(CamError::SlotOutOfRange {
                bank: slot.bank,
                offset: slot.offset,
            })
    }

    fn template_mut(&mut self, slot: SlotIndex) -> Result<&mut Template, CamError> {
        self.banks
            .get_mut(slot.bank)
            .and_then(|b| b.get_mut(slot.offset))
            .ok_or(CamError::SlotOutOfRange {
                bank: slot.bank,
                offset: slot.offset,
            })
    }

    /// Current value of a slot; `None` for a slot never written
    pub fn read(&self, bank: usize, offset: usize) -> Result<Option<Pattern>, CamError> {
        let t = self.template(SlotIndex::new(bank, offset))?;
        Ok(t.occupied.then_some(t.value))
    }

    pub fn check_pattern(&self, pattern: Pattern) -> Result<(), CamError> {
        if pattern.fits(self.width) {
            Ok(())
        } else {
            Err(CamError::PatternTooWide {
                pattern,
                width: self.width,
            })
        }
    }

    /// External write: learned=false, recency reset to the written mark
    pub fn write(&mut self, bank: usize, offset: usize, value: Pattern) -> Result<(), CamError> {
        self.write_with_priority(bank, offset, value, 0)
    }

    pub fn write_with_priority(
        &mut self,
        bank: usize,
        offset: usize,
        value: Pattern,
        priority: u8,
    ) -> Result<(), CamError> {
        self.check_pattern(value)?;
        let t = self.template_mut(SlotIndex::new(bank, offset))?;
        t.value = value;
        t.recency = RECENCY_WRITTEN;
        t.priority = priority;
        t.learned = false;
        t.occupied = true;
        Ok(())
    }

    /// Overwrite a learned-pool slot in place
    pub fn learn(&mut self, offset: usize, value: Pattern) -> Result<SlotIndex, CamError> {
        self.check_pattern(value)?;
        let bank = self.learned_bank().ok_or(CamError::SlotOutOfRange {
            bank: self.main_banks,
            offset,
        })?;
        let slot = SlotIndex::new(bank, offset);
        let t = self.template_mut(slot)?;
        t.value = value;
        t.recency = RECENCY_WRITTEN;
        t.priority = 0;
        t.learned = true;
        t.occupied = true;
        Ok(slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotIndex, &Template)> {
        self.banks.iter().enumerate().flat_map(|(b, bank)| {
            bank.iter()
                .enumerate()
                .map(move |(o, t)| (SlotIndex::new(b, o), t))
        })
    }

    pub(crate) fn templates_mut(&mut self) -> impl Iterator<Item = &mut Template> {
        self.banks.iter_mut().flatten()
    }

    pub(crate) fn recency_mut(&mut self, slot: SlotIndex) -> Option<&mut u8> {
        self.template_mut(slot).ok().map(|t| &mut t.recency)
    }
}
