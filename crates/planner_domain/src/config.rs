use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::calendar::{parse_date, WeekStartDay};

pub const DEFAULT_USER_ID: &str = "local";
pub const DEFAULT_HEATMAP_DAYS: usize = 365;
/// Ten years of history.
pub const MAX_HEATMAP_DAYS: usize = 3_660;

/// First day counted by the "since program start" statistics.
pub fn default_program_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 29).unwrap_or_default()
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlannerConfig {
    pub user_id: String,
    pub week_start_day: WeekStartDay,
    pub heatmap_days: usize,
    pub program_start: NaiveDate,
}

impl PlannerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from `PLANNER_*` keys. Unparseable values are logged
    /// and the default kept.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(user) = lookup("PLANNER_USER_ID") {
            let user = user.trim();
            if !user.is_empty() {
                config.user_id = user.to_string();
            }
        }
        if let Some(raw) = lookup("PLANNER_WEEK_START_DAY") {
            match raw
                .trim()
                .parse::<u32>()
                .ok()
                .and_then(|day| WeekStartDay::from_number(day).ok())
            {
                Some(day) => config.week_start_day = day,
                None => warn!(value = %raw, "ignoring invalid PLANNER_WEEK_START_DAY"),
            }
        }
        if let Some(raw) = lookup("PLANNER_HEATMAP_DAYS") {
            match raw.trim().parse::<usize>() {
                Ok(days) if (1..=MAX_HEATMAP_DAYS).contains(&days) => {
                    config.heatmap_days = days
                }
                _ => warn!(value = %raw, "ignoring invalid PLANNER_HEATMAP_DAYS"),
            }
        }
        if let Some(raw) = lookup("PLANNER_PROGRAM_START") {
            match parse_date(&raw) {
                Ok(date) => config.program_start = date,
                Err(err) => warn!(%err, "ignoring invalid PLANNER_PROGRAM_START"),
            }
        }
        info!(
            user = %config.user_id,
            week_start_day = config.week_start_day.number(),
            heatmap_days = config.heatmap_days,
            program_start = %config.program_start,
            "planner configuration loaded"
        );
        config
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            user_id: DEFAULT_USER_ID.to_string(),
            week_start_day: WeekStartDay::default(),
            heatmap_days: DEFAULT_HEATMAP_DAYS,
            program_start: default_program_start(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn reads_planner_keys() {
        let config = PlannerConfig::from_lookup(lookup_from(&[
            ("PLANNER_USER_ID", " sam "),
            ("PLANNER_WEEK_START_DAY", "1"),
            ("PLANNER_HEATMAP_DAYS", "90"),
            ("PLANNER_PROGRAM_START", "2026/01/05"),
        ]));
        assert_eq!(config.user_id, "sam");
        assert_eq!(config.week_start_day, WeekStartDay::MONDAY);
        assert_eq!(config.heatmap_days, 90);
        assert_eq!(
            config.program_start,
            NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
        );
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let config = PlannerConfig::from_lookup(lookup_from(&[
            ("PLANNER_WEEK_START_DAY", "9"),
            ("PLANNER_HEATMAP_DAYS", "0"),
            ("PLANNER_PROGRAM_START", "soon"),
        ]));
        assert_eq!(config, PlannerConfig::default());
        assert_eq!(config.week_start_day, WeekStartDay::TUESDAY);
    }

    #[test]
    fn heatmap_days_are_bounded() {
        let huge =
            PlannerConfig::from_lookup(lookup_from(&[("PLANNER_HEATMAP_DAYS", "200000000")]));
        assert_eq!(huge.heatmap_days, DEFAULT_HEATMAP_DAYS);
        let max = MAX_HEATMAP_DAYS.to_string();
        let edge =
            PlannerConfig::from_lookup(lookup_from(&[("PLANNER_HEATMAP_DAYS", max.as_str())]));
        assert_eq!(edge.heatmap_days, MAX_HEATMAP_DAYS);
    }
}
