//! Bounded history of completed matches.
//!
//! A fixed ring of depth H with a monotonic head pointer. Entries are only
//! ever overwritten, never removed one by one.

use crate::domain::HistoryEntry;

#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: Vec<Option<HistoryEntry>>,
    head: usize,
    recorded: u64,
}

impl HistoryLog {
    pub fn new(depth: usize) -> Self {
        Self {
            entries: vec![None; depth.max(1)],
            head: 0,
            recorded: 0,
        }
    }

    /// Write at head and advance it modulo depth
    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries[self.head] = Some(entry);
        self.head = (self.head + 1) % self.entries.len();
        self.recorded += 1;
    }

    /// Retained entries, oldest first and most recent last
    pub fn read(&self) -> Vec<HistoryEntry> {
        let depth = self.entries.len();
        (0..depth)
            .filter_map(|i| self.entries[(self.head + i) % depth])
            .collect()
    }

    pub fn latest(&self) -> Option<HistoryEntry> {
        let depth = self.entries.len();
        self.entries[(self.head + depth - 1) % depth]
    }

    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.recorded == 0
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn head(&self) -> usize {
        self.head
    }

    /// Entries recorded since construction, including overwritten ones
    pub fn total_recorded(&self) -> u64 {
        self.recorded
    }

    pub fn clear(&mut self) {
        self.entries.iter_mut().for_each(|e| *e = None);
        self.head = 0;
        self.recorded = 0;
    }
}
