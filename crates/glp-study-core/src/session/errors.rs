//! Per-project fetch failures.
//!
//! Failures are recorded here instead of aborting the load; the UI shows
//! them inline next to the affected project.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Fetch failures recorded for one project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectErrors {
    /// Group list failure
    pub groups: Option<String>,
    /// Test list failure
    pub tests: Option<String>,
    /// Captured data failure (latest aggregation)
    pub records: Option<String>,
}

impl ProjectErrors {
    pub fn is_empty(&self) -> bool {
        self.groups.is_none() && self.tests.is_none() && self.records.is_none()
    }
}

/// Non-fatal error map keyed by project reference.
#[derive(Debug, Clone, Default)]
pub struct ErrorBag {
    by_project: HashMap<String, ProjectErrors>,
}

impl ErrorBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_groups(&mut self, project_ref: &str, message: impl Into<String>) {
        self.entry(project_ref).groups = Some(message.into());
    }

    pub fn record_tests(&mut self, project_ref: &str, message: impl Into<String>) {
        self.entry(project_ref).tests = Some(message.into());
    }

    pub fn record_records(&mut self, project_ref: &str, message: impl Into<String>) {
        self.entry(project_ref).records = Some(message.into());
    }

    /// Forget a captured data failure after a successful fetch.
    pub fn clear_records(&mut self, project_ref: &str) {
        if let Some(errors) = self.by_project.get_mut(project_ref) {
            errors.records = None;
            if errors.is_empty() {
                self.by_project.remove(project_ref);
            }
        }
    }

    pub fn get(&self, project_ref: &str) -> Option<&ProjectErrors> {
        self.by_project.get(project_ref)
    }

    pub fn is_empty(&self) -> bool {
        self.by_project.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_project.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ProjectErrors)> {
        self.by_project.iter()
    }

    fn entry(&mut self, project_ref: &str) -> &mut ProjectErrors {
        self.by_project.entry(project_ref.to_string()).or_default()
    }
}
