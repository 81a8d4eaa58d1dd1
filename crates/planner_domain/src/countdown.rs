use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::DAYS_PER_WEEK;

/// Whole weeks and leftover days until a target day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Countdown {
    pub total_days: i64,
    pub weeks: i64,
    pub days: i64,
}

impl Countdown {
    pub fn is_past(&self) -> bool {
        self.total_days < 0
    }

    pub fn is_today(&self) -> bool {
        self.total_days == 0
    }

    /// "3 weeks, 2 days"
    pub fn label(&self) -> String {
        format!(
            "{} {}, {} {}",
            self.weeks,
            plural(self.weeks, "week", "weeks"),
            self.days,
            plural(self.days, "day", "days")
        )
    }
}

fn plural(value: i64, one: &'static str, many: &'static str) -> &'static str {
    if value == 1 {
        one
    } else {
        many
    }
}

/// Weeks are floored and days keep the sign of the difference, so a target
/// three days in the past yields `-1` weeks and `-3` days.
pub fn countdown(target: NaiveDate, today: NaiveDate) -> Countdown {
    let total_days = target.signed_duration_since(today).num_days();
    Countdown {
        total_days,
        weeks: total_days.div_euclid(DAYS_PER_WEEK),
        days: total_days % DAYS_PER_WEEK,
    }
}
