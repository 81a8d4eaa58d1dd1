//! Completion aggregation: intensity buckets, percentages, streaks and
//! heatmap series built from snapshots of goal and discipline records.
//!
//! Everything here is pure. Time-relative operations take the reference
//! `today` explicitly.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar::Dated;
use crate::records::{DailyGoalRecord, DisciplineFlag, DisciplineRecord};

/// Streak walks never look further back than this.
pub const STREAK_LOOKBACK_DAYS: i64 = 365;

pub const MAX_INTENSITY: u8 = 4;

/// One day of a heatmap series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeatmapCell {
    pub date: NaiveDate,
    pub intensity: u8,
    pub count: u32,
    pub total: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DisciplineRecord>,
}

impl Dated for HeatmapCell {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Tally {
    completed: u32,
    total: u32,
}

impl Tally {
    fn add(&mut self, completed: bool) {
        self.total += 1;
        if completed {
            self.completed += 1;
        }
    }
}

fn tally_goals<'a>(goals: impl IntoIterator<Item = &'a DailyGoalRecord>) -> Tally {
    let mut tally = Tally::default();
    for goal in goals {
        tally.add(goal.completed);
    }
    tally
}

fn index_goals(goals: &[DailyGoalRecord]) -> HashMap<NaiveDate, Tally> {
    let mut by_date: HashMap<NaiveDate, Tally> = HashMap::new();
    for goal in goals {
        by_date.entry(goal.date).or_default().add(goal.completed);
    }
    by_date
}

/// First record for `date` wins when the snapshot holds duplicates.
fn find_tracking(date: NaiveDate, tracking: &[DisciplineRecord]) -> Option<&DisciplineRecord> {
    tracking.iter().find(|record| record.date == date)
}

fn index_tracking(tracking: &[DisciplineRecord]) -> HashMap<NaiveDate, &DisciplineRecord> {
    let mut by_date = HashMap::new();
    for record in tracking {
        by_date.entry(record.date).or_insert(record);
    }
    by_date
}

/// `round(part / whole * 100)`, 0 for an empty whole.
pub fn rounded_percentage(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    (f64::from(part) / f64::from(whole) * 100.0).round() as u32
}

/// Buckets a completed/total ratio with inclusive upper bounds:
/// 0% -> 0, up to 25% -> 1, up to 50% -> 2, up to 75% -> 3, else 4.
fn goal_bucket(tally: Tally) -> u8 {
    if tally.total == 0 || tally.completed == 0 {
        return 0;
    }
    // Integer comparison keeps the 25/50/75 boundaries exact.
    let scaled = u64::from(tally.completed) * 100;
    let total = u64::from(tally.total);
    if scaled <= 25 * total {
        1
    } else if scaled <= 50 * total {
        2
    } else if scaled <= 75 * total {
        3
    } else {
        MAX_INTENSITY
    }
}

/// Maps 0..3 completed flags onto the 5-level palette. Level 2 is never used.
fn discipline_bucket(completed: u32) -> u8 {
    match completed {
        0 => 0,
        1 => 1,
        2 => 3,
        _ => MAX_INTENSITY,
    }
}

pub fn goal_intensity(date: NaiveDate, goals: &[DailyGoalRecord]) -> u8 {
    goal_bucket(tally_goals(goals.iter().filter(|goal| goal.date == date)))
}

pub fn discipline_intensity(date: NaiveDate, tracking: &[DisciplineRecord]) -> u8 {
    find_tracking(date, tracking)
        .map(|record| discipline_bucket(record.completed_count()))
        .unwrap_or(0)
}

pub fn weekly_goals_percentage(week_dates: &[NaiveDate], goals: &[DailyGoalRecord]) -> u32 {
    let tally = tally_goals(
        goals
            .iter()
            .filter(|goal| week_dates.contains(&goal.date)),
    );
    rounded_percentage(tally.completed, tally.total)
}

/// Missing days count as zero of three.
pub fn weekly_discipline_percentage(
    week_dates: &[NaiveDate],
    tracking: &[DisciplineRecord],
) -> u32 {
    let completed = discipline_completed_in(week_dates, tracking);
    let total = week_dates.len() as u32 * DisciplineRecord::FLAG_COUNT;
    rounded_percentage(completed, total)
}

fn discipline_completed_in(dates: &[NaiveDate], tracking: &[DisciplineRecord]) -> u32 {
    dates
        .iter()
        .filter_map(|date| find_tracking(*date, tracking))
        .map(DisciplineRecord::completed_count)
        .sum()
}

pub fn build_goals_heatmap(dates: &[NaiveDate], goals: &[DailyGoalRecord]) -> Vec<HeatmapCell> {
    let by_date = index_goals(goals);
    dates
        .iter()
        .map(|date| {
            let tally = by_date.get(date).copied().unwrap_or_default();
            HeatmapCell {
                date: *date,
                intensity: goal_bucket(tally),
                count: tally.completed,
                total: tally.total,
                metadata: None,
            }
        })
        .collect()
}

pub fn build_discipline_heatmap(
    dates: &[NaiveDate],
    tracking: &[DisciplineRecord],
) -> Vec<HeatmapCell> {
    let by_date = index_tracking(tracking);
    dates
        .iter()
        .map(|date| {
            let record = by_date.get(date).copied();
            let count = record.map(DisciplineRecord::completed_count).unwrap_or(0);
            HeatmapCell {
                date: *date,
                intensity: record.map(|_| discipline_bucket(count)).unwrap_or(0),
                count,
                total: DisciplineRecord::FLAG_COUNT,
                metadata: record.copied(),
            }
        })
        .collect()
}

fn streak_while(today: NaiveDate, mut qualifies: impl FnMut(NaiveDate) -> bool) -> u32 {
    let mut streak = 0;
    for back in 0..STREAK_LOOKBACK_DAYS {
        if !qualifies(today - Duration::days(back)) {
            break;
        }
        streak += 1;
    }
    streak
}

/// Consecutive days ending at `today` with at least one completed goal.
pub fn current_goals_streak(goals: &[DailyGoalRecord], today: NaiveDate) -> u32 {
    let by_date = index_goals(goals);
    streak_while(today, |date| {
        by_date
            .get(&date)
            .map(|tally| tally.completed > 0)
            .unwrap_or(false)
    })
}

/// Consecutive days ending at `today` with all three habits checked.
pub fn current_discipline_streak(tracking: &[DisciplineRecord], today: NaiveDate) -> u32 {
    let by_date = index_tracking(tracking);
    streak_while(today, |date| {
        by_date
            .get(&date)
            .map(|record| record.is_complete())
            .unwrap_or(false)
    })
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoalsStatistics {
    pub total_goals: u32,
    pub completed_goals: u32,
    pub percentage: u32,
}

pub fn overall_goals_statistics(cells: &[HeatmapCell]) -> GoalsStatistics {
    let total_goals = cells.iter().map(|cell| cell.total).sum();
    let completed_goals = cells.iter().map(|cell| cell.count).sum();
    GoalsStatistics {
        total_goals,
        completed_goals,
        percentage: rounded_percentage(completed_goals, total_goals),
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlagStatistics {
    pub completed: u32,
    pub total: u32,
    pub percentage: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisciplineStatistics {
    pub am_checkin: FlagStatistics,
    pub pm_checkin: FlagStatistics,
    pub set_goals_tomorrow: FlagStatistics,
}

impl DisciplineStatistics {
    pub fn for_flag(&self, flag: DisciplineFlag) -> FlagStatistics {
        match flag {
            DisciplineFlag::AmCheckin => self.am_checkin,
            DisciplineFlag::PmCheckin => self.pm_checkin,
            DisciplineFlag::SetGoalsTomorrow => self.set_goals_tomorrow,
        }
    }
}

/// Per-habit totals over the whole tracking set, measured against the
/// number of days in the series rather than the number of tracked days.
pub fn overall_discipline_statistics(
    cells: &[HeatmapCell],
    tracking: &[DisciplineRecord],
) -> DisciplineStatistics {
    let days = cells.len() as u32;
    let flag_stats = |flag: DisciplineFlag| {
        let completed = tracking.iter().filter(|record| record.get(flag)).count() as u32;
        FlagStatistics {
            completed,
            total: days,
            percentage: rounded_percentage(completed, days),
        }
    };
    DisciplineStatistics {
        am_checkin: flag_stats(DisciplineFlag::AmCheckin),
        pm_checkin: flag_stats(DisciplineFlag::PmCheckin),
        set_goals_tomorrow: flag_stats(DisciplineFlag::SetGoalsTomorrow),
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeeklySummary {
    pub total_goals: u32,
    pub completed_goals: u32,
    pub goals_percentage: u32,
    pub discipline_completed: u32,
    pub discipline_total: u32,
    pub discipline_percentage: u32,
}

pub fn weekly_summary(
    week_dates: &[NaiveDate],
    goals: &[DailyGoalRecord],
    tracking: &[DisciplineRecord],
) -> WeeklySummary {
    let tally = tally_goals(
        goals
            .iter()
            .filter(|goal| week_dates.contains(&goal.date)),
    );
    WeeklySummary {
        total_goals: tally.total,
        completed_goals: tally.completed,
        goals_percentage: weekly_goals_percentage(week_dates, goals),
        discipline_completed: discipline_completed_in(week_dates, tracking),
        discipline_total: week_dates.len() as u32 * DisciplineRecord::FLAG_COUNT,
        discipline_percentage: weekly_discipline_percentage(week_dates, tracking),
    }
}
