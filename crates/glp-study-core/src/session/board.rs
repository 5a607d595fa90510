//! Study result board: Today / Upcoming / Overdue / Completed occurrences.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::completion::CompletionAggregator;
use crate::models::{CompletionKey, CompletionStatus, CompletionSummary, Group};
use crate::schedule::{ScheduleResolver, ScheduleStatus};

/// Board tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoardTab {
    Today,
    Upcoming,
    Overdue,
    Completed,
}

impl BoardTab {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "today" => Some(BoardTab::Today),
            "upcoming" => Some(BoardTab::Upcoming),
            "overdue" => Some(BoardTab::Overdue),
            "completed" => Some(BoardTab::Completed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BoardTab::Today => "Today",
            BoardTab::Upcoming => "Upcoming",
            BoardTab::Overdue => "Overdue",
            BoardTab::Completed => "Completed",
        }
    }

    /// Schedule status shown for entries of this tab.
    pub fn occurrence_status(self) -> Option<ScheduleStatus> {
        match self {
            BoardTab::Today => Some(ScheduleStatus::Today),
            BoardTab::Upcoming => Some(ScheduleStatus::Upcoming),
            BoardTab::Overdue => Some(ScheduleStatus::Overdue),
            BoardTab::Completed => None,
        }
    }
}

/// Which occurrences to list.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardQuery {
    pub project_ref: String,
    pub tab: BoardTab,
    /// Restrict to one group
    pub group_id: Option<i64>,
    /// Restrict to one test
    pub test_id: Option<i64>,
    pub reference: NaiveDate,
}

impl BoardQuery {
    pub fn new(project_ref: impl Into<String>, tab: BoardTab, reference: NaiveDate) -> Self {
        Self {
            project_ref: project_ref.into(),
            tab,
            group_id: None,
            test_id: None,
            reference,
        }
    }
}

/// One scheduled occurrence for one group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardEntry {
    pub group_id: i64,
    /// Group label (study type, or name when no study type is set)
    pub group_name: String,
    pub test_id: i64,
    pub test_name: String,
    pub frequency_label: String,
    pub tab: BoardTab,
    pub status: Option<ScheduleStatus>,
    pub schedule_date: NaiveDate,
    pub completion: CompletionSummary,
}

fn group_label(group: &Group) -> String {
    if group.study_type.trim().is_empty() {
        group.name.clone()
    } else {
        group.study_type.clone()
    }
}

/// List board entries. Pending entries come first, then the project's
/// group order, then date.
pub fn study_board(
    aggregator: &mut CompletionAggregator<'_>,
    resolver: &ScheduleResolver,
    query: &BoardQuery,
) -> Vec<BoardEntry> {
    let snapshot = aggregator.snapshot();
    let project_ref = query.project_ref.as_str();
    let range = snapshot.project(project_ref).and_then(|p| p.date_range);

    let groups: Vec<&Group> = snapshot
        .groups(project_ref)
        .iter()
        .filter(|g| query.group_id.map_or(true, |id| g.id == id))
        .collect();
    let tests = snapshot
        .tests(project_ref)
        .iter()
        .filter(|t| query.test_id.map_or(true, |id| t.id == id));

    let mut entries = Vec::new();
    for test in tests {
        let schedule = resolver.resolve(test, range.as_ref(), query.reference);
        let dates: Vec<NaiveDate> = match query.tab {
            BoardTab::Today if schedule.status == ScheduleStatus::Today => vec![query.reference],
            BoardTab::Today => Vec::new(),
            BoardTab::Upcoming => schedule.next_schedule_date.into_iter().collect(),
            BoardTab::Overdue | BoardTab::Completed => {
                schedule.past_dates(query.reference).collect()
            }
        };

        for date in dates {
            for group in &groups {
                let key = CompletionKey::new(project_ref, group.id, test.id, date);
                let completion = aggregator.completion_status(&key, false);

                let keep = match query.tab {
                    BoardTab::Overdue => completion.status == CompletionStatus::Pending,
                    BoardTab::Completed => completion.status == CompletionStatus::Completed,
                    BoardTab::Today | BoardTab::Upcoming => true,
                };
                if !keep {
                    continue;
                }

                entries.push(BoardEntry {
                    group_id: group.id,
                    group_name: group_label(group),
                    test_id: test.id,
                    test_name: test.name.clone(),
                    frequency_label: schedule.frequency_label.clone(),
                    tab: query.tab,
                    status: query.tab.occurrence_status(),
                    schedule_date: date,
                    completion,
                });
            }
        }
    }

    entries.sort_by_key(|e| {
        (
            e.completion.status != CompletionStatus::Pending,
            snapshot.group_position(project_ref, e.group_id),
            e.schedule_date,
        )
    });
    entries
}
