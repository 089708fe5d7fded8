//! Ingress pipeline: fixed-depth staging ring.
//!
//! Each tick writes the incoming stage (or a bubble) at the cursor, moves the
//! cursor, and releases whatever sits under it. An entry therefore leaves on
//! exactly the N-th `advance` after it entered; for N = 1 it leaves on the
//! same call.

use crate::domain::{ControlWord, Pattern, QueryHandle};

/// One occupied pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub query: Pattern,
    pub control: ControlWord,
    pub handle: QueryHandle,
}

#[derive(Debug, Clone)]
pub struct IngressPipeline {
    stages: Vec<Option<Stage>>,
    cursor: usize,
}

impl IngressPipeline {
    pub fn new(depth: usize) -> Self {
        Self {
            stages: vec![None; depth.max(1)],
            cursor: 0,
        }
    }

    /// Shift by one stage; returns the stage reaching the distance engine
    pub fn advance(&mut self, incoming: Option<Stage>) -> Option<Stage> {
        let depth = self.stages.len();
        self.stages[self.cursor] = incoming;
        self.cursor = (self.cursor + 1) % depth;
        self.stages[self.cursor].take()
    }

    pub fn depth(&self) -> usize {
        self.stages.len()
    }

    /// Queries currently in flight
    pub fn in_flight(&self) -> usize {
        self.stages.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight() == 0
    }
}
