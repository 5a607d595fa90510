//! In-memory completion cache.
//!
//! Entries never expire; callers invalidate explicitly after a submission.

use std::collections::HashMap;

use crate::models::{CompletionKey, CompletionSummary};

/// Completion summaries keyed by (project, group, test, date).
#[derive(Debug, Clone, Default)]
pub struct CompletionCache {
    entries: HashMap<CompletionKey, CompletionSummary>,
}

impl CompletionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CompletionKey) -> Option<&CompletionSummary> {
        self.entries.get(key)
    }

    /// Store a summary; the last write for a key wins.
    pub fn insert(&mut self, key: CompletionKey, summary: CompletionSummary) {
        self.entries.insert(key, summary);
    }

    /// Drop one entry, returning it if present.
    pub fn invalidate(&mut self, key: &CompletionKey) -> Option<CompletionSummary> {
        self.entries.remove(key)
    }

    /// Drop every entry of a project. Returns the number removed.
    pub fn invalidate_project(&mut self, project_ref: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.project_ref != project_ref);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
