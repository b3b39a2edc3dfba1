use chrono::NaiveDate;
use thiserror::Error;

/// Failures of the business-day engine. Every variant is a deterministic
/// function of the inputs; nothing here is retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeadlineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(
        "degenerate calendar: scanned {scanned_days} days from {from} and still needed {remaining} business day(s)"
    )]
    DegenerateCalendar {
        from: NaiveDate,
        scanned_days: u32,
        remaining: i64,
    },
}

impl DeadlineError {
    pub fn invalid(message: impl Into<String>) -> Self {
        DeadlineError::InvalidInput(message.into())
    }
}

pub type DeadlineResult<T> = Result<T, DeadlineError>;
