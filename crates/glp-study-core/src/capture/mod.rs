//! Data capture: pre-filled entry sheets and submission payloads.

mod sheet;

pub use sheet::*;

use chrono::NaiveDate;
use thiserror::Error;

use crate::source::SourceError;

/// Capture errors.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Test {test_id} is not scheduled on {date}")]
    NotScheduled { test_id: i64, date: NaiveDate },

    #[error("Group {0} not found")]
    UnknownGroup(i64),

    #[error("Test {0} not found")]
    UnknownTest(i64),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

pub type CaptureResult<T> = Result<T, CaptureError>;
