//! Tick-driven matching engine.
//!
//! # Tick anatomy
//! ```text
//! staged query ──▶ IngressPipeline (N stages) ──▶ DistanceField
//!                                                    │
//!                    reduce_bank ◀───────────────────┘
//!                         │
//!                    reduce_global ──▶ confidence::score ──▶ MatchResult
//!                                                              │
//!           commit: recency bump, one store write, aging, history
//! ```
//! Everything in a tick is computed from the state left by the previous tick
//! and committed together at the end. Host-side calls (`submit_query`,
//! `write_template`) only stage inputs for the next `tick()`.
//!
//! # Write arbitration
//! At most one store write lands per tick. When an explicit write and a
//! learning write coincide, the explicit write is the last writer and wins;
//! the learning write is dropped and the learning cursor stays put.

use serde::Serialize;

use crate::aging::AgingUnit;
use crate::config::{CamConfig, ConfigError};
use crate::confidence;
use crate::distance;
use crate::domain::{
    CamError, ControlWord, HistoryEntry, MatchMode, MatchResult, Pattern, QueryHandle, SlotIndex,
};
use crate::framing::Frame;
use crate::history::HistoryLog;
use crate::pipeline::{IngressPipeline, Stage};
use crate::reducer;
use crate::store::{PatternStore, Template};

/// Counters exported for observability
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CamStats {
    pub ticks: u64,
    pub queries_submitted: u64,
    pub queries_completed: u64,
    pub hits: u64,
    pub misses: u64,
    pub reserved_noops: u64,
    pub explicit_writes: u64,
    pub learned_writes: u64,
    pub dropped_writes: u64,
    pub aging_sweeps: u64,
}

impl CamStats {
    pub fn hit_rate(&self) -> f32 {
        let searched = self.hits + self.misses;
        if searched == 0 {
            0.0
        } else {
            self.hits as f32 / searched as f32
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, Copy)]
struct StagedWrite {
    slot: SlotIndex,
    value: Pattern,
    priority: u8,
}

/// Outcome of evaluating one stage against the store snapshot
struct Evaluation {
    result: MatchResult,
    hit: Option<SlotIndex>,
    learn: Option<Pattern>,
    write_owned: bool,
}

#[derive(Debug, Clone)]
pub struct NeuroCam {
    config: CamConfig,
    store: PatternStore,
    pipeline: IngressPipeline,
    aging: AgingUnit,
    history: HistoryLog,
    fuzzy_threshold: u8,
    partial_mask: u16,
    learning_enabled: bool,
    staged_query: Option<Stage>,
    staged_write: Option<StagedWrite>,
    result: MatchResult,
    now: u64,
    next_seq: u64,
    stats: CamStats,
}

impl NeuroCam {
    /// Build an engine with a factory- (or config-) seeded store
    pub fn new(config: CamConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: CamConfig) -> Self {
        let g = &config.geometry;
        Self {
            store: PatternStore::seeded(&config),
            pipeline: IngressPipeline::new(g.pipeline_depth),
            aging: AgingUnit::new(config.aging.interval_ticks, g.learned_pool_size),
            history: HistoryLog::new(g.history_depth),
            fuzzy_threshold: config.matching.fuzzy_threshold,
            partial_mask: config.matching.partial_mask,
            learning_enabled: config.learning.enabled,
            staged_query: None,
            staged_write: None,
            result: MatchResult::no_match(),
            now: 0,
            next_seq: 0,
            stats: CamStats::default(),
            config,
        }
    }

    // ------------------------------------------------------------------
    // Control surface
    // ------------------------------------------------------------------

    /// Stage a query; it completes exactly `pipeline_depth` ticks from now.
    ///
    /// Only one query enters per tick: a second submission before `tick()`
    /// replaces the first.
    pub fn submit_query(&mut self, pattern: Pattern, mode: MatchMode) -> Result<QueryHandle, CamError> {
        self.store.check_pattern(pattern)?;
        let handle = QueryHandle {
            seq: self.next_seq,
            submitted_at: self.now,
        };
        self.next_seq += 1;
        self.stats.queries_submitted += 1;

        let stage = Stage {
            query: pattern,
            control: ControlWord::for_mode(mode, self.learning_enabled),
            handle,
        };
        if let Some(replaced) = self.staged_query.replace(stage) {
            log::warn!(
                "Query #{} replaced by #{} before entering the pipeline",
                replaced.handle.seq,
                handle.seq
            );
        }
        Ok(handle)
    }

    /// Stage a query using the raw mode selector bits
    pub fn submit_bits(&mut self, pattern: Pattern, selector: u8) -> Result<QueryHandle, CamError> {
        self.submit_query(pattern, MatchMode::from_selector(selector))
    }

    /// Stage an explicit template write, committed at the next tick boundary
    pub fn write_template(&mut self, bank: usize, offset: usize, pattern: Pattern) -> Result<(), CamError> {
        self.write_template_with_priority(bank, offset, pattern, 0)
    }

    pub fn write_template_with_priority(
        &mut self,
        bank: usize,
        offset: usize,
        pattern: Pattern,
        priority: u8,
    ) -> Result<(), CamError> {
        let slot = SlotIndex::new(bank, offset);
        self.store.template(slot)?;
        self.store.check_pattern(pattern)?;

        let write = StagedWrite {
            slot,
            value: pattern,
            priority,
        };
        if let Some(replaced) = self.staged_write.replace(write) {
            log::warn!(
                "Staged write to {} superseded by write to {}",
                replaced.slot,
                slot
            );
        }
        Ok(())
    }

    /// Stage the write carried by an assembled frame
    pub fn write_frame(&mut self, frame: &Frame) -> Result<(), CamError> {
        self.write_template(frame.bank, frame.address, frame.pattern)
    }

    pub fn set_learning_enabled(&mut self, enabled: bool) {
        self.learning_enabled = enabled;
    }

    pub fn learning_enabled(&self) -> bool {
        self.learning_enabled
    }

    /// Rejected values leave the previous threshold in place
    pub fn set_fuzzy_threshold(&mut self, threshold: u8) -> Result<(), CamError> {
        let max = self.store.width();
        if threshold > max {
            return Err(CamError::ThresholdOutOfRange {
                value: threshold,
                max,
            });
        }
        self.fuzzy_threshold = threshold;
        Ok(())
    }

    pub fn fuzzy_threshold(&self) -> u8 {
        self.fuzzy_threshold
    }

    /// Rejected masks leave the previous mask in place
    pub fn set_partial_mask(&mut self, mask: u16) -> Result<(), CamError> {
        let width = self.store.width();
        if !Pattern(mask).fits(width) {
            return Err(CamError::MaskOutOfRange { mask, width });
        }
        self.partial_mask = mask;
        Ok(())
    }

    pub fn partial_mask(&self) -> u16 {
        self.partial_mask
    }

    /// Most recently completed result; repeated calls return the same value
    pub fn poll_result(&self) -> MatchResult {
        self.result
    }

    /// History ring, most recent last
    pub fn read_history(&self) -> Vec<HistoryEntry> {
        self.history.read()
    }

    pub fn read_template(&self, bank: usize, offset: usize) -> Result<Option<Pattern>, CamError> {
        self.store.read(bank, offset)
    }

    pub fn template(&self, slot: SlotIndex) -> Result<&Template, CamError> {
        self.store.template(slot)
    }

    pub fn store(&self) -> &PatternStore {
        &self.store
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn stats(&self) -> &CamStats {
        &self.stats
    }

    pub fn config(&self) -> &CamConfig {
        &self.config
    }

    /// Ticks elapsed since construction
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn latency(&self) -> usize {
        self.pipeline.depth()
    }

    pub fn learn_cursor(&self) -> usize {
        self.aging.cursor()
    }

    /// True when nothing is staged or in flight
    pub fn is_idle(&self) -> bool {
        self.staged_query.is_none() && self.staged_write.is_none() && self.pipeline.is_empty()
    }

    // ------------------------------------------------------------------
    // Clocking
    // ------------------------------------------------------------------

    /// Advance one step. Returns the result completed on this tick, if any.
    pub fn tick(&mut self) -> Option<MatchResult> {
        self.now += 1;
        self.stats.ticks += 1;

        let write = self.staged_write.take();
        let incoming = self.staged_query.take();
        // the write flag is latched as the stage leaves the pipeline
        let arriving = self.pipeline.advance(incoming).map(|mut stage| {
            stage.control.write = write.is_some();
            stage
        });

        // evaluate against the store as left by the previous tick
        let evaluation = arriving.map(|stage| self.evaluate(stage));

        let mut completed = None;
        if let Some(Evaluation {
            mut result,
            hit,
            learn,
            write_owned,
        }) = evaluation
        {
            if let Some(slot) = hit {
                self.aging.touch(&mut self.store, slot);
            }

            if let Some(pattern) = learn {
                if write_owned {
                    self.stats.dropped_writes += 1;
                    log::warn!(
                        "Learning write of {} dropped: explicit write owns tick {}",
                        pattern,
                        self.now
                    );
                } else {
                    match self.aging.learn(&mut self.store, pattern) {
                        Ok(Some(slot)) => {
                            self.stats.learned_writes += 1;
                            result.learned = Some(slot);
                        }
                        Ok(None) => {
                            log::debug!("Miss on {} not learned: learned pool disabled", pattern)
                        }
                        Err(e) => log::error!("Learning write failed: {}", e),
                    }
                }
            }

            if result.valid {
                if let Some(slot) = result.slot {
                    self.history.record(HistoryEntry {
                        query: result.query.unwrap_or_default(),
                        slot,
                        distance: result.distance,
                        tick: self.now,
                    });
                }
            }

            self.stats.queries_completed += 1;
            self.result = result;
            completed = Some(result);
        }

        if let Some(w) = write {
            match self
                .store
                .write_with_priority(w.slot.bank, w.slot.offset, w.value, w.priority)
            {
                Ok(()) => {
                    self.stats.explicit_writes += 1;
                    log::debug!("Wrote {} to slot {} at tick {}", w.value, w.slot, self.now);
                }
                Err(e) => log::error!("Explicit write failed: {}", e),
            }
        }

        if self.aging.tick(&mut self.store) {
            self.stats.aging_sweeps += 1;
        }

        log::trace!(
            "tick {}: {} in flight, completed {:?}",
            self.now,
            self.pipeline.in_flight(),
            completed.map(|r| r.handle.map(|h| h.seq))
        );
        completed
    }

    /// Tick until nothing is staged or in flight; returns completed results
    pub fn run_until_idle(&mut self) -> Vec<MatchResult> {
        let mut results = Vec::new();
        while !self.is_idle() {
            if let Some(r) = self.tick() {
                results.push(r);
            }
        }
        results
    }

    /// Submit, clock the pipeline through, and return the query's result
    pub fn search(&mut self, pattern: Pattern, mode: MatchMode) -> Result<MatchResult, CamError> {
        let handle = self.submit_query(pattern, mode)?;
        let mut outcome = None;
        while !self.is_idle() {
            if let Some(r) = self.tick() {
                if r.handle == Some(handle) {
                    outcome = Some(r);
                }
            }
        }
        Ok(outcome.unwrap_or_else(|| self.poll_result()))
    }

    // ------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------

    fn evaluate(&mut self, stage: Stage) -> Evaluation {
        let control = stage.control;
        let mut result = MatchResult {
            mode: Some(control.mode),
            query: Some(stage.query),
            handle: Some(stage.handle),
            completed_at: self.now,
            ..MatchResult::no_match()
        };

        if !control.search {
            self.stats.reserved_noops += 1;
            log::debug!(
                "Query #{} has {} selector, completing as no-op",
                stage.handle.seq,
                control.mode
            );
            return Evaluation {
                result,
                hit: None,
                learn: None,
                write_owned: control.write,
            };
        }

        let full_mask = Pattern::width_mask(self.store.width());
        let mask = match control.mode {
            MatchMode::Partial => self.partial_mask,
            _ => full_mask,
        };

        let field = distance::compute(&self.store, stage.query, mask);
        let bank_mins = reducer::reduce_banks(&field);
        let global = reducer::reduce_global(&bank_mins);

        if let Some(g) = global {
            result.slot = Some(g.slot);
            result.slot_index = self.store.linear_index(g.slot);
            result.distance = g.distance;
            result.confidence =
                confidence::score(g.distance, g.second_best, self.config.matching.confidence_shift);
            result.valid = match control.mode {
                MatchMode::Exact => g.distance == 0,
                MatchMode::Fuzzy | MatchMode::Partial | MatchMode::Learning => {
                    g.distance <= self.fuzzy_threshold
                }
                MatchMode::Reserved(_) => false,
            };
        }

        if result.valid {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }

        let missed = global.map_or(true, |g| g.distance > self.fuzzy_threshold);
        let learn = (control.learn && missed).then_some(stage.query);

        Evaluation {
            hit: if result.valid { result.slot } else { None },
            result,
            learn,
            write_owned: control.write,
        }
    }
}

impl Default for NeuroCam {
    fn default() -> Self {
        Self::build(CamConfig::default())
    }
}
