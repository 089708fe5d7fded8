//! Core value types shared by every stage of the matcher.
//!
//! Patterns are fixed-width bit vectors (at most [`MAX_PATTERN_WIDTH`] bits,
//! the limit imposed by the 2-bit nibble selector of the loading channel).
//! Slot addresses are `(bank, offset)` pairs; the store owns the mapping to
//! linear indices.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Widest pattern the engine accepts (4 nibbles).
pub const MAX_PATTERN_WIDTH: u8 = 16;

/// Distance reported when nothing could be matched.
pub const NO_MATCH_DISTANCE: u8 = u8::MAX;

/// Recency value assigned to a freshly written template.
pub const RECENCY_WRITTEN: u8 = 255;

/// Highest value a usage bump can reach (one below the just-written mark).
pub const RECENCY_USAGE_CEILING: u8 = 254;

/// A fixed-width bit vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pattern(pub u16);

impl Pattern {
    pub const ZERO: Pattern = Pattern(0);

    #[inline]
    pub fn bits(self) -> u16 {
        self.0
    }

    /// Mask covering the low `width` bits.
    #[inline]
    pub fn width_mask(width: u8) -> u16 {
        if width >= 16 {
            u16::MAX
        } else {
            (1u16 << width) - 1
        }
    }

    /// True if no bit above `width` is set.
    #[inline]
    pub fn fits(self, width: u8) -> bool {
        self.0 & !Self::width_mask(width) == 0
    }

    /// Truncate to the low `width` bits.
    #[inline]
    pub fn truncate(self, width: u8) -> Pattern {
        Pattern(self.0 & Self::width_mask(width))
    }

    /// Hamming distance to `other` over the bits selected by `mask`.
    #[inline]
    pub fn hamming(self, other: Pattern, mask: u16) -> u8 {
        ((self.0 ^ other.0) & mask).count_ones() as u8
    }

    /// Parse `0x1A3`, `1a3` or `0b0001_1010_0011`.
    ///
    /// Text without a `0b` prefix is always hexadecimal: `255` is `0x255`.
    pub fn parse(text: &str) -> Option<Pattern> {
        let cleaned: String = text.trim().chars().filter(|c| *c != '_').collect();
        let lower = cleaned.to_ascii_lowercase();
        let parsed = if let Some(bin) = lower.strip_prefix("0b") {
            u16::from_str_radix(bin, 2)
        } else {
            u16::from_str_radix(lower.trim_start_matches("0x"), 16)
        };
        parsed.ok().map(Pattern)
    }
}

impl From<u16> for Pattern {
    fn from(bits: u16) -> Self {
        Pattern(bits)
    }
}

impl fmt::LowerHex for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl fmt::UpperHex for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:03X}", self.0)
    }
}

/// Address of a slot: bank plus offset inside that bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotIndex {
    pub bank: usize,
    pub offset: usize,
}

impl SlotIndex {
    pub fn new(bank: usize, offset: usize) -> Self {
        Self { bank, offset }
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.bank, self.offset)
    }
}

/// Match-mode selector carried through the pipeline.
///
/// The raw selector is two bits wide on the wire but the engine accepts any
/// byte; everything outside the enumerated set decodes to `Reserved`, which
/// completes as a no-op search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchMode {
    /// Valid only on distance 0.
    Exact,
    /// Valid when distance <= fuzzy threshold.
    Fuzzy,
    /// Distance counted only over the partial mask; valid when <= fuzzy threshold.
    Partial,
    /// Fuzzy search that stores the query on a miss.
    Learning,
    /// Undefined selector value.
    Reserved(u8),
}

impl MatchMode {
    pub fn from_selector(raw: u8) -> Self {
        match raw {
            0 => MatchMode::Exact,
            1 => MatchMode::Fuzzy,
            2 => MatchMode::Partial,
            3 => MatchMode::Learning,
            other => MatchMode::Reserved(other),
        }
    }

    pub fn selector(self) -> u8 {
        match self {
            MatchMode::Exact => 0,
            MatchMode::Fuzzy => 1,
            MatchMode::Partial => 2,
            MatchMode::Learning => 3,
            MatchMode::Reserved(raw) => raw,
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "exact" => Some(MatchMode::Exact),
            "fuzzy" => Some(MatchMode::Fuzzy),
            "partial" => Some(MatchMode::Partial),
            "learning" | "learn" => Some(MatchMode::Learning),
            _ => None,
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Exact => write!(f, "exact"),
            MatchMode::Fuzzy => write!(f, "fuzzy"),
            MatchMode::Partial => write!(f, "partial"),
            MatchMode::Learning => write!(f, "learning"),
            MatchMode::Reserved(raw) => write!(f, "reserved({})", raw),
        }
    }
}

/// Control flags delayed in lock-step with their query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlWord {
    pub search: bool,
    /// Set when an explicit store write owns the tick this query completes
    /// on; a learning write from the query is then dropped.
    pub write: bool,
    pub learn: bool,
    pub mode: MatchMode,
}

impl ControlWord {
    pub fn for_mode(mode: MatchMode, learning_enabled: bool) -> Self {
        let search = !matches!(mode, MatchMode::Reserved(_));
        Self {
            search,
            write: false,
            learn: search && (learning_enabled || mode == MatchMode::Learning),
            mode,
        }
    }
}

/// Handle returned on submission; identifies the query in results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueryHandle {
    pub seq: u64,
    /// Tick count at submission.
    pub submitted_at: u64,
}

/// Outcome of the most recently completed query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub valid: bool,
    pub slot: Option<SlotIndex>,
    /// Linear slot index of `slot`, if any.
    pub slot_index: Option<usize>,
    pub distance: u8,
    pub confidence: u8,
    pub mode: Option<MatchMode>,
    pub query: Option<Pattern>,
    pub handle: Option<QueryHandle>,
    /// Learned-pool slot written because this query missed.
    pub learned: Option<SlotIndex>,
    pub completed_at: u64,
}

impl MatchResult {
    /// Result before any query has completed, or for an empty store.
    pub fn no_match() -> Self {
        Self {
            valid: false,
            slot: None,
            slot_index: None,
            distance: NO_MATCH_DISTANCE,
            confidence: 0,
            mode: None,
            query: None,
            handle: None,
            learned: None,
            completed_at: 0,
        }
    }

    pub fn is_exact(&self) -> bool {
        self.valid && self.distance == 0
    }
}

impl Default for MatchResult {
    fn default() -> Self {
        Self::no_match()
    }
}

/// One record of the history ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub query: Pattern,
    pub slot: SlotIndex,
    pub distance: u8,
    pub tick: u64,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CamError {
    #[error("fuzzy threshold {value} out of range 0..={max}")]
    ThresholdOutOfRange { value: u8, max: u8 },
    #[error("partial mask {mask:#06x} has bits outside the {width}-bit pattern")]
    MaskOutOfRange { mask: u16, width: u8 },
    #[error("pattern {pattern} is wider than {width} bits")]
    PatternTooWide { pattern: Pattern, width: u8 },
    #[error("slot {bank}:{offset} does not exist")]
    SlotOutOfRange { bank: usize, offset: usize },
    #[error("frame cycle {cycle} out of range for a {width}-bit pattern")]
    FrameCycleOutOfRange { cycle: u8, width: u8 },
    #[error("nibble {nibble:#x} is wider than 4 bits")]
    NibbleOutOfRange { nibble: u8 },
}

impl CamError {
    /// Errors raised by rejected register writes; the previous value stays live.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CamError::ThresholdOutOfRange { .. } | CamError::MaskOutOfRange { .. }
        )
    }
}
