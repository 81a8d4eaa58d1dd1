//! Query interface of the backing store, scoped by user id, plus an
//! in-memory implementation.

use std::collections::HashMap;

use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::records::{
    CountdownEvent, DailyGoalRecord, DisciplineRecord, LookaheadItem, RecordId, WeeklyGoal,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: RecordId },

    #[error("store backend failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Row-level operations the dashboard needs from the store. Date ranges are
/// inclusive on both ends. Rows come back ordered by date, then `order`.
pub trait PlannerStore: Send + Sync {
    fn daily_goals_between(
        &self,
        user: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<DailyGoalRecord>>;
    fn daily_goal(&self, user: &str, id: RecordId) -> StoreResult<DailyGoalRecord>;
    fn insert_daily_goal(&self, user: &str, goal: DailyGoalRecord) -> StoreResult<DailyGoalRecord>;
    fn update_daily_goal(&self, user: &str, goal: &DailyGoalRecord) -> StoreResult<()>;
    fn delete_daily_goal(&self, user: &str, id: RecordId) -> StoreResult<()>;

    /// Goals whose period starts within `from..=to`.
    fn weekly_goals_between(
        &self,
        user: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<WeeklyGoal>>;
    fn weekly_goal(&self, user: &str, id: RecordId) -> StoreResult<WeeklyGoal>;
    fn insert_weekly_goal(&self, user: &str, goal: WeeklyGoal) -> StoreResult<WeeklyGoal>;
    fn update_weekly_goal(&self, user: &str, goal: &WeeklyGoal) -> StoreResult<()>;
    fn delete_weekly_goal(&self, user: &str, id: RecordId) -> StoreResult<()>;

    fn discipline_between(
        &self,
        user: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<DisciplineRecord>>;
    /// Replaces the record for `record.date`, inserting when absent.
    fn upsert_discipline(&self, user: &str, record: DisciplineRecord) -> StoreResult<()>;

    fn lookahead_for_week(&self, user: &str, week_start: NaiveDate)
        -> StoreResult<Vec<LookaheadItem>>;
    fn insert_lookahead(&self, user: &str, item: LookaheadItem) -> StoreResult<LookaheadItem>;
    fn update_lookahead(&self, user: &str, item: &LookaheadItem) -> StoreResult<()>;
    fn delete_lookahead(&self, user: &str, id: RecordId) -> StoreResult<()>;

    fn countdown(&self, user: &str) -> StoreResult<Option<CountdownEvent>>;
    fn save_countdown(&self, user: &str, event: CountdownEvent) -> StoreResult<CountdownEvent>;
    fn delete_countdown(&self, user: &str) -> StoreResult<()>;
}

/// Initial rows for a [`MemoryStore`], usually read from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PlannerSeed {
    pub daily_goals: Vec<DailyGoalRecord>,
    pub weekly_goals: Vec<WeeklyGoal>,
    pub discipline: Vec<DisciplineRecord>,
    pub lookahead: Vec<LookaheadItem>,
    pub countdown: Option<CountdownEvent>,
}

impl PlannerSeed {
    pub fn from_json_str(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

#[derive(Debug, Default)]
struct UserTables {
    daily_goals: Vec<DailyGoalRecord>,
    weekly_goals: Vec<WeeklyGoal>,
    discipline: Vec<DisciplineRecord>,
    lookahead: Vec<LookaheadItem>,
    countdown: Option<CountdownEvent>,
}

#[derive(Debug, Default)]
struct Tables {
    next_id: RecordId,
    users: HashMap<String, UserTables>,
}

impl Tables {
    fn allocate_id(&mut self) -> RecordId {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, user: &str) -> Option<&UserTables> {
        self.users.get(user)
    }

    fn user_mut(&mut self, user: &str) -> &mut UserTables {
        self.users.entry(user.to_string()).or_default()
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `seed` for `user`, assigning ids to rows that carry id 0.
    pub fn with_seed(user: &str, seed: PlannerSeed) -> Self {
        let store = Self::new();
        {
            let mut tables = store.tables.write();
            let PlannerSeed {
                mut daily_goals,
                mut weekly_goals,
                discipline,
                mut lookahead,
                mut countdown,
            } = seed;
            let max_seeded = daily_goals
                .iter()
                .map(|goal| goal.id)
                .chain(weekly_goals.iter().map(|goal| goal.id))
                .chain(lookahead.iter().map(|item| item.id))
                .chain(countdown.iter().map(|event| event.id))
                .max()
                .unwrap_or(0);
            tables.next_id = max_seeded;
            for goal in &mut daily_goals {
                if goal.id == 0 {
                    goal.id = tables.allocate_id();
                }
            }
            for goal in &mut weekly_goals {
                if goal.id == 0 {
                    goal.id = tables.allocate_id();
                }
            }
            for item in &mut lookahead {
                if item.id == 0 {
                    item.id = tables.allocate_id();
                }
            }
            if let Some(event) = countdown.as_mut() {
                if event.id == 0 {
                    event.id = tables.allocate_id();
                }
            }
            let rows = tables.user_mut(user);
            rows.daily_goals = daily_goals;
            rows.weekly_goals = weekly_goals;
            rows.discipline = discipline;
            rows.lookahead = lookahead;
            rows.countdown = countdown;
        }
        store
    }

    fn read_rows<T>(&self, user: &str, select: impl FnOnce(&UserTables) -> T) -> T
    where
        T: Default,
    {
        let tables = self.tables.read();
        tables.user(user).map(select).unwrap_or_default()
    }
}

fn in_range(date: NaiveDate, from: NaiveDate, to: NaiveDate) -> bool {
    from <= date && date <= to
}

fn replace_by_id<T: Clone>(
    rows: &mut [T],
    kind: &'static str,
    id: RecordId,
    id_of: impl Fn(&T) -> RecordId,
    value: &T,
) -> StoreResult<()> {
    let slot = rows
        .iter_mut()
        .find(|row| id_of(row) == id)
        .ok_or(StoreError::NotFound { kind, id })?;
    *slot = value.clone();
    Ok(())
}

fn remove_by_id<T>(
    rows: &mut Vec<T>,
    kind: &'static str,
    id: RecordId,
    id_of: impl Fn(&T) -> RecordId,
) -> StoreResult<()> {
    let before = rows.len();
    rows.retain(|row| id_of(row) != id);
    if rows.len() == before {
        return Err(StoreError::NotFound { kind, id });
    }
    Ok(())
}

impl PlannerStore for MemoryStore {
    fn daily_goals_between(
        &self,
        user: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<DailyGoalRecord>> {
        let mut goals: Vec<DailyGoalRecord> = self.read_rows(user, |rows| {
            rows.daily_goals
                .iter()
                .filter(|goal| in_range(goal.date, from, to))
                .cloned()
                .collect()
        });
        goals.sort_by_key(|goal| (goal.date, goal.order));
        Ok(goals)
    }

    fn daily_goal(&self, user: &str, id: RecordId) -> StoreResult<DailyGoalRecord> {
        self.read_rows(user, |rows| {
            rows.daily_goals.iter().find(|goal| goal.id == id).cloned()
        })
        .ok_or(StoreError::NotFound {
            kind: "daily goal",
            id,
        })
    }

    fn insert_daily_goal(
        &self,
        user: &str,
        mut goal: DailyGoalRecord,
    ) -> StoreResult<DailyGoalRecord> {
        let mut tables = self.tables.write();
        goal.id = tables.allocate_id();
        tables.user_mut(user).daily_goals.push(goal.clone());
        Ok(goal)
    }

    fn update_daily_goal(&self, user: &str, goal: &DailyGoalRecord) -> StoreResult<()> {
        let mut tables = self.tables.write();
        replace_by_id(
            &mut tables.user_mut(user).daily_goals,
            "daily goal",
            goal.id,
            |row| row.id,
            goal,
        )
    }

    fn delete_daily_goal(&self, user: &str, id: RecordId) -> StoreResult<()> {
        let mut tables = self.tables.write();
        remove_by_id(
            &mut tables.user_mut(user).daily_goals,
            "daily goal",
            id,
            |row| row.id,
        )
    }

    fn weekly_goals_between(
        &self,
        user: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<WeeklyGoal>> {
        let mut goals: Vec<WeeklyGoal> = self.read_rows(user, |rows| {
            rows.weekly_goals
                .iter()
                .filter(|goal| in_range(goal.period_start, from, to))
                .cloned()
                .collect()
        });
        goals.sort_by_key(|goal| (goal.period_start, goal.order));
        Ok(goals)
    }

    fn weekly_goal(&self, user: &str, id: RecordId) -> StoreResult<WeeklyGoal> {
        self.read_rows(user, |rows| {
            rows.weekly_goals.iter().find(|goal| goal.id == id).cloned()
        })
        .ok_or(StoreError::NotFound {
            kind: "weekly goal",
            id,
        })
    }

    fn insert_weekly_goal(&self, user: &str, mut goal: WeeklyGoal) -> StoreResult<WeeklyGoal> {
        let mut tables = self.tables.write();
        goal.id = tables.allocate_id();
        tables.user_mut(user).weekly_goals.push(goal.clone());
        Ok(goal)
    }

    fn update_weekly_goal(&self, user: &str, goal: &WeeklyGoal) -> StoreResult<()> {
        let mut tables = self.tables.write();
        replace_by_id(
            &mut tables.user_mut(user).weekly_goals,
            "weekly goal",
            goal.id,
            |row| row.id,
            goal,
        )
    }

    fn delete_weekly_goal(&self, user: &str, id: RecordId) -> StoreResult<()> {
        let mut tables = self.tables.write();
        remove_by_id(
            &mut tables.user_mut(user).weekly_goals,
            "weekly goal",
            id,
            |row| row.id,
        )
    }

    fn discipline_between(
        &self,
        user: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<DisciplineRecord>> {
        let mut records: Vec<DisciplineRecord> = self.read_rows(user, |rows| {
            rows.discipline
                .iter()
                .filter(|record| in_range(record.date, from, to))
                .copied()
                .collect()
        });
        records.sort_by_key(|record| record.date);
        Ok(records)
    }

    fn upsert_discipline(&self, user: &str, record: DisciplineRecord) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let rows = &mut tables.user_mut(user).discipline;
        match rows.iter().position(|existing| existing.date == record.date) {
            Some(index) => rows[index] = record,
            None => rows.push(record),
        }
        Ok(())
    }

    fn lookahead_for_week(
        &self,
        user: &str,
        week_start: NaiveDate,
    ) -> StoreResult<Vec<LookaheadItem>> {
        let mut items: Vec<LookaheadItem> = self.read_rows(user, |rows| {
            rows.lookahead
                .iter()
                .filter(|item| item.week_start == week_start)
                .cloned()
                .collect()
        });
        items.sort_by_key(|item| item.order);
        Ok(items)
    }

    fn insert_lookahead(&self, user: &str, mut item: LookaheadItem) -> StoreResult<LookaheadItem> {
        let mut tables = self.tables.write();
        item.id = tables.allocate_id();
        tables.user_mut(user).lookahead.push(item.clone());
        Ok(item)
    }

    fn update_lookahead(&self, user: &str, item: &LookaheadItem) -> StoreResult<()> {
        let mut tables = self.tables.write();
        replace_by_id(
            &mut tables.user_mut(user).lookahead,
            "lookahead item",
            item.id,
            |row| row.id,
            item,
        )
    }

    fn delete_lookahead(&self, user: &str, id: RecordId) -> StoreResult<()> {
        let mut tables = self.tables.write();
        remove_by_id(
            &mut tables.user_mut(user).lookahead,
            "lookahead item",
            id,
            |row| row.id,
        )
    }

    fn countdown(&self, user: &str) -> StoreResult<Option<CountdownEvent>> {
        Ok(self.read_rows(user, |rows| rows.countdown.clone()))
    }

    fn save_countdown(&self, user: &str, mut event: CountdownEvent) -> StoreResult<CountdownEvent> {
        let mut tables = self.tables.write();
        if event.id == 0 {
            event.id = tables.allocate_id();
        }
        tables.user_mut(user).countdown = Some(event.clone());
        Ok(event)
    }

    fn delete_countdown(&self, user: &str) -> StoreResult<()> {
        let mut tables = self.tables.write();
        tables.user_mut(user).countdown = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Cadence;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rows_are_scoped_by_user() {
        let store = MemoryStore::new();
        store
            .insert_daily_goal("alice", DailyGoalRecord::new(day(2026, 1, 6), true))
            .unwrap();
        let mine = store
            .daily_goals_between("alice", day(2026, 1, 1), day(2026, 1, 31))
            .unwrap();
        let theirs = store
            .daily_goals_between("bob", day(2026, 1, 1), day(2026, 1, 31))
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert!(theirs.is_empty());
    }

    #[test]
    fn ranges_are_inclusive_and_sorted() {
        let store = MemoryStore::new();
        for (date, order) in [(day(2026, 1, 7), 2), (day(2026, 1, 6), 1), (day(2026, 1, 7), 1)] {
            let mut goal = DailyGoalRecord::new(date, false);
            goal.order = order;
            store.insert_daily_goal("u", goal).unwrap();
        }
        store
            .insert_daily_goal("u", DailyGoalRecord::new(day(2026, 1, 8), false))
            .unwrap();
        let goals = store
            .daily_goals_between("u", day(2026, 1, 6), day(2026, 1, 7))
            .unwrap();
        let keys: Vec<_> = goals.iter().map(|goal| (goal.date, goal.order)).collect();
        assert_eq!(
            keys,
            vec![(day(2026, 1, 6), 1), (day(2026, 1, 7), 1), (day(2026, 1, 7), 2)]
        );
    }

    #[test]
    fn update_and_delete_report_missing_rows() {
        let store = MemoryStore::new();
        let mut goal = store
            .insert_weekly_goal(
                "u",
                WeeklyGoal {
                    id: 0,
                    period_start: day(2026, 1, 6),
                    cadence: Cadence::Weekly,
                    text: "Ship".into(),
                    completed: false,
                    order: 1,
                },
            )
            .unwrap();
        goal.completed = true;
        store.update_weekly_goal("u", &goal).unwrap();
        assert!(store.weekly_goal("u", goal.id).unwrap().completed);

        store.delete_weekly_goal("u", goal.id).unwrap();
        assert!(matches!(
            store.delete_weekly_goal("u", goal.id),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.update_weekly_goal("u", &goal),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn discipline_upsert_keeps_one_row_per_day() {
        let store = MemoryStore::new();
        let date = day(2026, 1, 6);
        let mut record = DisciplineRecord::empty(date);
        store.upsert_discipline("u", record).unwrap();
        record.pm_checkin = true;
        store.upsert_discipline("u", record).unwrap();
        let rows = store.discipline_between("u", date, date).unwrap();
        assert_eq!(rows, vec![record]);
    }

    #[test]
    fn seed_assigns_fresh_ids_after_seeded_ones() {
        let seed = PlannerSeed::from_json_str(
            r#"{
                "daily_goals": [
                    {"id": 7, "date": "2026-01-06", "completed": true},
                    {"date": "2026-01-06", "completed": false}
                ],
                "countdown": {"name": "Launch", "target_date": "2026-03-01"}
            }"#,
        )
        .unwrap();
        let store = MemoryStore::with_seed("u", seed);
        let goals = store
            .daily_goals_between("u", day(2026, 1, 6), day(2026, 1, 6))
            .unwrap();
        let mut ids: Vec<_> = goals.iter().map(|goal| goal.id).collect();
        ids.sort();
        assert_eq!(ids, vec![7, 8]);
        assert_eq!(store.countdown("u").unwrap().unwrap().id, 9);
    }
}
