use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{Cadence, Dated};

pub type RecordId = u64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyGoalRecord {
    #[serde(default)]
    pub id: RecordId,
    pub date: NaiveDate,
    #[serde(default)]
    pub text: String,
    pub completed: bool,
    #[serde(default)]
    pub order: u32,
}

impl DailyGoalRecord {
    /// A bare completion record, as the aggregator sees it.
    pub fn new(date: NaiveDate, completed: bool) -> Self {
        Self {
            id: 0,
            date,
            text: String::new(),
            completed,
            order: 0,
        }
    }
}

impl Dated for DailyGoalRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DisciplineFlag {
    AmCheckin,
    PmCheckin,
    SetGoalsTomorrow,
}

impl DisciplineFlag {
    /// Fixed display order.
    pub const ALL: [DisciplineFlag; 3] = [
        DisciplineFlag::AmCheckin,
        DisciplineFlag::PmCheckin,
        DisciplineFlag::SetGoalsTomorrow,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DisciplineFlag::AmCheckin => "AM Check-in",
            DisciplineFlag::PmCheckin => "PM Check-in",
            DisciplineFlag::SetGoalsTomorrow => "next day goal-setting",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisciplineRecord {
    pub date: NaiveDate,
    #[serde(default)]
    pub am_checkin: bool,
    #[serde(default)]
    pub pm_checkin: bool,
    #[serde(default)]
    pub set_goals_tomorrow: bool,
}

impl DisciplineRecord {
    pub const FLAG_COUNT: u32 = 3;

    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            am_checkin: false,
            pm_checkin: false,
            set_goals_tomorrow: false,
        }
    }

    pub fn with_flag(date: NaiveDate, flag: DisciplineFlag) -> Self {
        let mut record = Self::empty(date);
        record.set(flag, true);
        record
    }

    pub fn get(&self, flag: DisciplineFlag) -> bool {
        match flag {
            DisciplineFlag::AmCheckin => self.am_checkin,
            DisciplineFlag::PmCheckin => self.pm_checkin,
            DisciplineFlag::SetGoalsTomorrow => self.set_goals_tomorrow,
        }
    }

    pub fn set(&mut self, flag: DisciplineFlag, value: bool) {
        match flag {
            DisciplineFlag::AmCheckin => self.am_checkin = value,
            DisciplineFlag::PmCheckin => self.pm_checkin = value,
            DisciplineFlag::SetGoalsTomorrow => self.set_goals_tomorrow = value,
        }
    }

    pub fn toggle(&mut self, flag: DisciplineFlag) {
        let current = self.get(flag);
        self.set(flag, !current);
    }

    pub fn completed_count(&self) -> u32 {
        DisciplineFlag::ALL
            .iter()
            .filter(|flag| self.get(**flag))
            .count() as u32
    }

    pub fn is_complete(&self) -> bool {
        self.completed_count() == Self::FLAG_COUNT
    }

    pub fn completed_flags(&self) -> impl Iterator<Item = DisciplineFlag> + '_ {
        DisciplineFlag::ALL
            .into_iter()
            .filter(move |flag| self.get(*flag))
    }
}

impl Dated for DisciplineRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeeklyGoal {
    #[serde(default)]
    pub id: RecordId,
    pub period_start: NaiveDate,
    #[serde(default)]
    pub cadence: Cadence,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub order: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LookaheadSection {
    ThisWeek,
    NextWeek,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LookaheadItem {
    #[serde(default)]
    pub id: RecordId,
    pub week_start: NaiveDate,
    pub section: LookaheadSection,
    pub text: String,
    #[serde(default)]
    pub order: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountdownEvent {
    #[serde(default)]
    pub id: RecordId,
    pub name: String,
    pub target_date: NaiveDate,
}
