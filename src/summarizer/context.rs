//! Bounded window of the most recent successful section summaries.

use std::collections::VecDeque;

/// One retained summary and the section it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextEntry {
    pub section_index: usize,
    pub summary: String,
}

/// Fixed-capacity ring of prior summaries, oldest first.
///
/// Entries are never reordered. Once full, each push evicts the oldest entry.
/// A capacity of zero retains nothing.
#[derive(Debug, Clone)]
pub struct RollingContext {
    capacity: usize,
    entries: VecDeque<ContextEntry>,
}

impl RollingContext {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Records a successful summary, evicting the oldest entry when full.
    pub fn push(&mut self, section_index: usize, summary: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(ContextEntry {
            section_index,
            summary: summary.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = &ContextEntry> {
        self.entries.iter()
    }

    /// Renders the retained summaries as a prompt block, oldest first,
    /// each tagged with its section index.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("[Section {} summary]\n{}", e.section_index, e.summary))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
