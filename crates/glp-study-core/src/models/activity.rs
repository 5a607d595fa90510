//! Activity models.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{null_as_default, string_or_number};

/// A unit of ongoing study work, keyed by its project reference number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    /// Project reference number (shared by every activity of a project)
    #[serde(deserialize_with = "string_or_number")]
    pub ref_num: String,
    /// Free-form status ("in progress", "completed", ...)
    #[serde(default)]
    pub status: Option<String>,
    /// Optional display title
    #[serde(default)]
    pub title: Option<String>,
}

/// Envelope returned by the activity list call: `{"a_list": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActivityList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub a_list: Vec<Activity>,
}

/// Activity status classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityStatus {
    InProgress,
    Completed,
    Other,
}

impl ActivityStatus {
    /// Classify a raw status string (case-insensitive).
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("in progress") => ActivityStatus::InProgress,
            Some("completed") => ActivityStatus::Completed,
            _ => ActivityStatus::Other,
        }
    }

    /// Listing priority; lower sorts first.
    pub fn priority(self) -> u8 {
        match self {
            ActivityStatus::InProgress => 1,
            ActivityStatus::Completed => 2,
            ActivityStatus::Other => 3,
        }
    }
}

impl Activity {
    /// Create an activity with the given reference and status.
    pub fn new(ref_num: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            ref_num: ref_num.into(),
            status: Some(status.into()),
            title: None,
        }
    }

    pub fn status_kind(&self) -> ActivityStatus {
        ActivityStatus::parse(self.status.as_deref())
    }
}

/// Keep the first activity per `ref_num` and order by status priority.
///
/// The sort is stable, so activities with equal priority keep API order.
pub fn canonical_activities(activities: Vec<Activity>) -> Vec<Activity> {
    let mut seen = HashSet::new();
    let mut unique: Vec<Activity> = activities
        .into_iter()
        .filter(|a| seen.insert(a.ref_num.clone()))
        .collect();

    unique.sort_by_key(|a| a.status_kind().priority());
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(ActivityStatus::parse(Some("In Progress")), ActivityStatus::InProgress);
        assert_eq!(ActivityStatus::parse(Some("completed ")), ActivityStatus::Completed);
        assert_eq!(ActivityStatus::parse(Some("on hold")), ActivityStatus::Other);
        assert_eq!(ActivityStatus::parse(None), ActivityStatus::Other);
    }

    #[test]
    fn test_canonical_keeps_first_occurrence() {
        let activities = vec![
            Activity::new("P1", "completed"),
            Activity::new("P1", "in progress"),
            Activity::new("P2", "in progress"),
        ];

        let canonical = canonical_activities(activities);
        assert_eq!(canonical.len(), 2);

        let p1 = canonical.iter().find(|a| a.ref_num == "P1").unwrap();
        assert_eq!(p1.status.as_deref(), Some("completed"));
    }

    #[test]
    fn test_canonical_sorted_by_priority() {
        let activities = vec![
            Activity::new("A", "draft"),
            Activity::new("B", "completed"),
            Activity::new("C", "in progress"),
            Activity::new("D", "completed"),
        ];

        let order: Vec<String> = canonical_activities(activities)
            .into_iter()
            .map(|a| a.ref_num)
            .collect();
        assert_eq!(order, vec!["C", "B", "D", "A"]);
    }

    #[test]
    fn test_activity_list_from_api_json() {
        let json = r#"{"a_list": [{"ref_num": "GLP-01", "status": "In Progress", "extra": 1}]}"#;
        let list: ActivityList = serde_json::from_str(json).unwrap();
        assert_eq!(list.a_list.len(), 1);
        assert_eq!(list.a_list[0].status_kind(), ActivityStatus::InProgress);

        let empty: ActivityList = serde_json::from_str(r#"{"a_list": null}"#).unwrap();
        assert!(empty.a_list.is_empty());
    }
}
