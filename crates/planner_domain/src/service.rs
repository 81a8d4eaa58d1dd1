use anyhow::{anyhow, Result};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    calendar::{self, Cadence, WeekPeriod, BIWEEKLY_SPAN_DAYS},
    clock::{Clock, SystemClock},
    completion::{
        self, DisciplineStatistics, GoalsStatistics, WeeklySummary, STREAK_LOOKBACK_DAYS,
    },
    config::PlannerConfig,
    countdown::{self, Countdown},
    error::PlannerError,
    heatmap::{HeatmapKind, HeatmapView},
    records::{
        CountdownEvent, DailyGoalRecord, DisciplineFlag, DisciplineRecord, LookaheadItem,
        LookaheadSection, RecordId, WeeklyGoal,
    },
    store::PlannerStore,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayPlan {
    pub date: NaiveDate,
    pub day_name: String,
    pub day_number: u32,
    pub is_today: bool,
    pub goals: Vec<DailyGoalRecord>,
    pub discipline: Option<DisciplineRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeeklyGoalsPanel {
    pub cadence: Cadence,
    pub goals: Vec<WeeklyGoal>,
    pub biweekly_end: Option<NaiveDate>,
    pub biweekly_end_label: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LookaheadPanel {
    pub this_week: Vec<LookaheadItem>,
    pub next_week: Vec<LookaheadItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountdownPanel {
    pub event: CountdownEvent,
    pub remaining: Countdown,
}

/// Everything the week view renders, recomputed from a fresh fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardSnapshot {
    pub today: NaiveDate,
    pub week: WeekPeriod,
    pub week_label: String,
    pub days: Vec<DayPlan>,
    pub weekly_goals: WeeklyGoalsPanel,
    pub lookahead: LookaheadPanel,
    pub summary: WeeklySummary,
    pub goals_heatmap: HeatmapView,
    pub discipline_heatmap: HeatmapView,
    pub goals_streak: u32,
    pub discipline_streak: u32,
    pub goals_statistics: GoalsStatistics,
    pub discipline_statistics: DisciplineStatistics,
    pub countdown: Option<CountdownPanel>,
}

pub struct DashboardService {
    store: Box<dyn PlannerStore>,
    clock: Box<dyn Clock>,
    config: PlannerConfig,
}

pub struct DashboardServiceBuilder {
    store: Option<Box<dyn PlannerStore>>,
    clock: Box<dyn Clock>,
    config: PlannerConfig,
}

impl DashboardServiceBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            clock: Box::new(SystemClock),
            config: PlannerConfig::default(),
        }
    }

    pub fn with_store(mut self, store: impl PlannerStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<DashboardService> {
        let store = self
            .store
            .ok_or_else(|| anyhow!("dashboard service requires a store"))?;
        Ok(DashboardService {
            store,
            clock: self.clock,
            config: self.config,
        })
    }
}

impl Default for DashboardServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty(text: &str, what: &'static str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(PlannerError::EmptyText(what).into());
    }
    Ok(trimmed.to_string())
}

impl DashboardService {
    pub fn builder() -> DashboardServiceBuilder {
        DashboardServiceBuilder::new()
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn current_week(&self) -> WeekPeriod {
        WeekPeriod::containing(self.today(), self.config.week_start_day)
    }

    fn user(&self) -> &str {
        &self.config.user_id
    }

    /// Fetches every row the week view needs and aggregates it. `week_start`
    /// is realigned to the configured start day first.
    #[instrument(skip(self))]
    pub fn snapshot(&self, week_start: NaiveDate) -> Result<DashboardSnapshot> {
        let today = self.today();
        let week = WeekPeriod::containing(week_start, self.config.week_start_day);
        let week_dates = week.dates();
        let user = self.user();

        let week_goals = self.store.daily_goals_between(user, week.start, week.end())?;
        let week_tracking = self.store.discipline_between(user, week.start, week.end())?;

        // History covers both the heatmap window and the streak lookback.
        let heatmap_dates = calendar::last_n_days(self.config.heatmap_days, today);
        let streak_from = today
            .checked_sub_signed(Duration::days(STREAK_LOOKBACK_DAYS - 1))
            .unwrap_or(NaiveDate::MIN);
        let history_from = heatmap_dates
            .first()
            .map_or(streak_from, |first| (*first).min(streak_from));
        let all_goals = self.store.daily_goals_between(user, history_from, today)?;
        let all_tracking = self.store.discipline_between(user, history_from, today)?;

        let program_dates = calendar::dates_since(self.config.program_start, today);
        let program_tracking =
            self.store
                .discipline_between(user, self.config.program_start, today)?;

        let days = week_dates
            .iter()
            .map(|date| DayPlan {
                date: *date,
                day_name: calendar::day_name(*date),
                day_number: date.day(),
                is_today: *date == today,
                goals: week_goals
                    .iter()
                    .filter(|goal| goal.date == *date)
                    .cloned()
                    .collect(),
                discipline: week_tracking
                    .iter()
                    .find(|record| record.date == *date)
                    .copied(),
            })
            .collect();

        let goals_cells = completion::build_goals_heatmap(&heatmap_dates, &all_goals);
        let discipline_cells = completion::build_discipline_heatmap(&heatmap_dates, &all_tracking);
        let program_cells = completion::build_discipline_heatmap(&program_dates, &program_tracking);

        let countdown = self.store.countdown(user)?.map(|event| CountdownPanel {
            remaining: countdown::countdown(event.target_date, today),
            event,
        });

        let snapshot = DashboardSnapshot {
            today,
            week,
            week_label: calendar::format_week_display(week.start),
            days,
            weekly_goals: self.weekly_goals_panel(week.start)?,
            lookahead: self.lookahead_panel(week.start)?,
            summary: completion::weekly_summary(&week_dates, &week_goals, &week_tracking),
            goals_streak: completion::current_goals_streak(&all_goals, today),
            discipline_streak: completion::current_discipline_streak(&all_tracking, today),
            goals_statistics: completion::overall_goals_statistics(&goals_cells),
            discipline_statistics: completion::overall_discipline_statistics(
                &program_cells,
                &program_tracking,
            ),
            goals_heatmap: HeatmapView::build(HeatmapKind::Goals, &goals_cells),
            discipline_heatmap: HeatmapView::build(HeatmapKind::Discipline, &discipline_cells),
            countdown,
        };
        debug!(
            week = %snapshot.week.start,
            goals = all_goals.len(),
            tracking = all_tracking.len(),
            "dashboard snapshot computed"
        );
        Ok(snapshot)
    }

    /// Goals opened this week plus biweekly goals still running from the
    /// previous week.
    pub fn visible_weekly_goals(&self, week_start: NaiveDate) -> Result<Vec<WeeklyGoal>> {
        let from = week_start - Duration::days(BIWEEKLY_SPAN_DAYS - 1);
        let goals = self
            .store
            .weekly_goals_between(self.user(), from, week_start)?;
        Ok(goals
            .into_iter()
            .filter(|goal| {
                goal.period_start == week_start
                    || (goal.cadence == Cadence::Biweekly
                        && calendar::is_in_biweekly_period(goal.period_start, week_start))
            })
            .collect())
    }

    fn weekly_goals_panel(&self, week_start: NaiveDate) -> Result<WeeklyGoalsPanel> {
        let goals = self.visible_weekly_goals(week_start)?;
        // The week's own goals decide the cadence; carried-over goals only
        // when the week has none yet.
        let anchor = goals
            .iter()
            .find(|goal| goal.period_start == week_start)
            .or_else(|| goals.first());
        let cadence = anchor.map(|goal| goal.cadence).unwrap_or_default();
        let biweekly_end = match (cadence, anchor) {
            (Cadence::Biweekly, Some(goal)) => Some(calendar::biweekly_period_end(goal.period_start)),
            _ => None,
        };
        Ok(WeeklyGoalsPanel {
            cadence,
            biweekly_end_label: biweekly_end.map(calendar::format_biweekly_end_date),
            biweekly_end,
            goals,
        })
    }

    fn lookahead_panel(&self, week_start: NaiveDate) -> Result<LookaheadPanel> {
        let items = self.store.lookahead_for_week(self.user(), week_start)?;
        let (this_week, next_week) = items
            .into_iter()
            .partition(|item| item.section == LookaheadSection::ThisWeek);
        Ok(LookaheadPanel {
            this_week,
            next_week,
        })
    }

    #[instrument(skip(self))]
    pub fn add_daily_goal(&self, date: NaiveDate, text: &str) -> Result<DailyGoalRecord> {
        let text = non_empty(text, "goal")?;
        let existing = self.store.daily_goals_between(self.user(), date, date)?;
        let goal = DailyGoalRecord {
            id: 0,
            date,
            text,
            completed: false,
            order: existing.len() as u32 + 1,
        };
        let stored = self.store.insert_daily_goal(self.user(), goal)?;
        debug!(id = stored.id, "daily goal added");
        Ok(stored)
    }

    #[instrument(skip(self))]
    pub fn toggle_daily_goal(&self, id: RecordId) -> Result<DailyGoalRecord> {
        let mut goal = self.store.daily_goal(self.user(), id)?;
        goal.completed = !goal.completed;
        self.store.update_daily_goal(self.user(), &goal)?;
        Ok(goal)
    }

    #[instrument(skip(self))]
    pub fn delete_daily_goal(&self, id: RecordId) -> Result<()> {
        self.store.delete_daily_goal(self.user(), id)?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn add_weekly_goal(
        &self,
        week_start: NaiveDate,
        text: &str,
        cadence: Cadence,
    ) -> Result<WeeklyGoal> {
        let text = non_empty(text, "weekly goal")?;
        let existing = self
            .store
            .weekly_goals_between(self.user(), week_start, week_start)?;
        let goal = WeeklyGoal {
            id: 0,
            period_start: week_start,
            cadence,
            text,
            completed: false,
            order: existing.len() as u32 + 1,
        };
        Ok(self.store.insert_weekly_goal(self.user(), goal)?)
    }

    #[instrument(skip(self))]
    pub fn toggle_weekly_goal(&self, id: RecordId) -> Result<WeeklyGoal> {
        let mut goal = self.store.weekly_goal(self.user(), id)?;
        goal.completed = !goal.completed;
        self.store.update_weekly_goal(self.user(), &goal)?;
        Ok(goal)
    }

    #[instrument(skip(self))]
    pub fn rename_weekly_goal(&self, id: RecordId, text: &str) -> Result<WeeklyGoal> {
        let text = non_empty(text, "weekly goal")?;
        let mut goal = self.store.weekly_goal(self.user(), id)?;
        goal.text = text;
        self.store.update_weekly_goal(self.user(), &goal)?;
        Ok(goal)
    }

    #[instrument(skip(self))]
    pub fn delete_weekly_goal(&self, id: RecordId) -> Result<()> {
        self.store.delete_weekly_goal(self.user(), id)?;
        Ok(())
    }

    /// Rewrites the cadence of every goal opened at `period_start`. Returns
    /// how many goals changed.
    #[instrument(skip(self))]
    pub fn set_cadence(&self, period_start: NaiveDate, cadence: Cadence) -> Result<usize> {
        let goals = self
            .store
            .weekly_goals_between(self.user(), period_start, period_start)?;
        let mut changed = 0;
        for mut goal in goals {
            if goal.cadence == cadence {
                continue;
            }
            goal.cadence = cadence;
            self.store.update_weekly_goal(self.user(), &goal)?;
            changed += 1;
        }
        debug!(changed, "cadence updated");
        Ok(changed)
    }

    /// Flips one habit for `date`, creating the day's record when missing.
    #[instrument(skip(self))]
    pub fn toggle_discipline(&self, date: NaiveDate, flag: DisciplineFlag) -> Result<DisciplineRecord> {
        let existing = self.store.discipline_between(self.user(), date, date)?;
        let record = match existing.first() {
            Some(record) => {
                let mut record = *record;
                record.toggle(flag);
                record
            }
            None => DisciplineRecord::with_flag(date, flag),
        };
        self.store.upsert_discipline(self.user(), record)?;
        Ok(record)
    }

    #[instrument(skip(self))]
    pub fn add_lookahead_item(
        &self,
        week_start: NaiveDate,
        section: LookaheadSection,
        text: &str,
    ) -> Result<LookaheadItem> {
        let text = non_empty(text, "lookahead")?;
        let order = self
            .store
            .lookahead_for_week(self.user(), week_start)?
            .iter()
            .filter(|item| item.section == section)
            .count() as u32
            + 1;
        let item = LookaheadItem {
            id: 0,
            week_start,
            section,
            text,
            order,
        };
        Ok(self.store.insert_lookahead(self.user(), item)?)
    }

    #[instrument(skip(self))]
    pub fn edit_lookahead_item(
        &self,
        week_start: NaiveDate,
        id: RecordId,
        text: &str,
    ) -> Result<LookaheadItem> {
        let text = non_empty(text, "lookahead")?;
        let mut item = self
            .store
            .lookahead_for_week(self.user(), week_start)?
            .into_iter()
            .find(|item| item.id == id)
            .ok_or_else(|| anyhow!("lookahead item {id} not found in week of {week_start}"))?;
        item.text = text;
        self.store.update_lookahead(self.user(), &item)?;
        Ok(item)
    }

    #[instrument(skip(self))]
    pub fn delete_lookahead_item(&self, id: RecordId) -> Result<()> {
        self.store.delete_lookahead(self.user(), id)?;
        Ok(())
    }

    /// Creates the countdown, or replaces the existing one in place.
    #[instrument(skip(self))]
    pub fn save_countdown(&self, name: &str, target_date: NaiveDate) -> Result<CountdownEvent> {
        let name = non_empty(name, "countdown")?;
        let id = self
            .store
            .countdown(self.user())?
            .map(|event| event.id)
            .unwrap_or(0);
        let event = CountdownEvent {
            id,
            name,
            target_date,
        };
        Ok(self.store.save_countdown(self.user(), event)?)
    }

    #[instrument(skip(self))]
    pub fn clear_countdown(&self) -> Result<()> {
        self.store.delete_countdown(self.user())?;
        Ok(())
    }
}
