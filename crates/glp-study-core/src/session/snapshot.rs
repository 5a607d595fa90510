//! Immutable snapshot of fetched study data.

use std::collections::HashMap;

use crate::models::{Group, Project, TestType};

/// Projects with their groups and tests, as fetched at load time.
#[derive(Debug, Clone, Default)]
pub struct StudySnapshot {
    projects: Vec<Project>,
    groups: HashMap<String, Vec<Group>>,
    tests: HashMap<String, Vec<TestType>>,
}

impl StudySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a project with its groups and tests, keeping insertion order.
    pub fn insert_project(&mut self, project: Project, groups: Vec<Group>, tests: Vec<TestType>) {
        self.groups.insert(project.ref_num.clone(), groups);
        self.tests.insert(project.ref_num.clone(), tests);
        self.projects.push(project);
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, project_ref: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.ref_num == project_ref)
    }

    pub fn groups(&self, project_ref: &str) -> &[Group] {
        self.groups.get(project_ref).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn tests(&self, project_ref: &str) -> &[TestType] {
        self.tests.get(project_ref).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn group(&self, project_ref: &str, group_id: i64) -> Option<&Group> {
        self.groups(project_ref).iter().find(|g| g.id == group_id)
    }

    pub fn test(&self, project_ref: &str, test_id: i64) -> Option<&TestType> {
        self.tests(project_ref).iter().find(|t| t.id == test_id)
    }

    /// Position of a group in its project's listing, used for ordering.
    pub fn group_position(&self, project_ref: &str, group_id: i64) -> usize {
        self.groups(project_ref)
            .iter()
            .position(|g| g.id == group_id)
            .unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Activity, Project};

    #[test]
    fn test_lookup() {
        let mut snapshot = StudySnapshot::new();
        let project = Project::assemble(&Activity::new("P1", "in progress"), None, &[], 30);
        snapshot.insert_project(
            project,
            vec![Group::new(1, "G1", "R"), Group::new(2, "G2", "R")],
            vec![TestType::new(10, "Body Weight", "D", 0)],
        );

        assert!(snapshot.project("P1").is_some());
        assert!(snapshot.project("P2").is_none());
        assert_eq!(snapshot.groups("P1").len(), 2);
        assert!(snapshot.groups("P2").is_empty());
        assert_eq!(snapshot.group("P1", 2).unwrap().name, "G2");
        assert!(snapshot.test("P1", 11).is_none());
        assert_eq!(snapshot.group_position("P1", 2), 1);
    }
}
