//! NeuroCAM core: a deterministic Hamming-distance content-addressable memory.
//!
//! A query travels a fixed-depth ingress pipeline, is compared against every
//! stored template in one step, reduced bank-wise and then globally, and is
//! published with a confidence derived from the best/second-best bank gap.
//! Missed queries can be learned into a round-robin pool.
//!
//! ```rust
//! use neurocam_core::{MatchMode, NeuroCam, Pattern};
//!
//! let mut cam = NeuroCam::default();
//! let r = cam.search(Pattern(0x0FF), MatchMode::Exact).unwrap();
//! assert!(r.valid);
//! assert_eq!(r.slot_index, Some(1));
//! assert_eq!(r.confidence, 255);
//! ```

#![allow(clippy::new_without_default)]
#![allow(clippy::unnecessary_lazy_evaluations)]

pub mod aging;
pub mod confidence;
pub mod config;
pub mod distance;
pub mod domain;
pub mod engine;
pub mod framing; // nibble-channel boundary adapter
pub mod history;
pub mod pipeline;
pub mod reducer;
pub mod store;

#[cfg(test)]
pub mod tests_config;
#[cfg(test)]
pub mod tests_proptest;

// Domain types
pub use domain::{
    CamError, ControlWord, HistoryEntry, MatchMode, MatchResult, Pattern, QueryHandle, SlotIndex,
    MAX_PATTERN_WIDTH, NO_MATCH_DISTANCE,
};

// Configuration
pub use config::{
    AgingConfig, CamConfig, ConfigError, GeometryConfig, LearningConfig, MatchingConfig,
    SeedConfig, SeedProfile,
};

// Engine
pub use engine::{CamStats, NeuroCam};

// Components
pub use aging::AgingUnit;
pub use distance::DistanceField;
pub use framing::{Beat, Frame, FrameAssembler};
pub use history::HistoryLog;
pub use pipeline::IngressPipeline;
pub use reducer::{BankMin, GlobalMin};
pub use store::{PatternStore, Template, FACTORY_SEEDS};
