use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("invalid calendar date `{0}`; expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("week start day must be between 0 (Sunday) and 6 (Saturday), got {0}")]
    InvalidWeekStartDay(u32),

    #[error("{0} text cannot be empty")]
    EmptyText(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type PlannerResult<T> = Result<T, PlannerError>;
