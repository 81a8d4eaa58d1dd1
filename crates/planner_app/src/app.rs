use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use planner_domain::{
    calendar::{self, Cadence},
    clock::SystemClock,
    heatmap::HeatmapView,
    records::{DisciplineFlag, DisciplineRecord},
    DashboardService, DashboardSnapshot, MemoryStore, PlannerConfig, PlannerSeed,
};
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub(crate) planner: PlannerConfig,
    pub(crate) data_path: Option<PathBuf>,
    pub(crate) week: Option<NaiveDate>,
    pub(crate) output: OutputFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self {
            planner: PlannerConfig::from_env(),
            ..Self::default()
        };
        if let Ok(path) = std::env::var("PLANNER_DATA") {
            if !path.trim().is_empty() {
                info!(path = %path, "using planner data file");
                config.data_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(week) = std::env::var("PLANNER_WEEK") {
            let date = calendar::parse_date(&week)
                .with_context(|| format!("PLANNER_WEEK is not a date: `{week}`"))?;
            config.week = Some(date);
        }
        if let Ok(format) = std::env::var("PLANNER_OUTPUT") {
            match format.trim().to_ascii_lowercase().as_str() {
                "json" => config.output = OutputFormat::Json,
                "text" | "" => config.output = OutputFormat::Text,
                other => warn!(value = %other, "ignoring unknown PLANNER_OUTPUT"),
            }
        }
        Ok(config)
    }
}

/// Reads a seed file. A missing file is an empty planner.
pub fn load_seed(path: &Path) -> Result<PlannerSeed> {
    if !path.exists() {
        warn!(path = %path.display(), "planner data file not found, starting empty");
        return Ok(PlannerSeed::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    PlannerSeed::from_json_str(&raw)
        .with_context(|| format!("failed to parse planner data in {}", path.display()))
}

pub fn build_service(config: &AppConfig) -> Result<DashboardService> {
    let seed = match &config.data_path {
        Some(path) => load_seed(path)?,
        None => PlannerSeed::default(),
    };
    DashboardService::builder()
        .with_store(MemoryStore::with_seed(&config.planner.user_id, seed))
        .with_clock(SystemClock)
        .with_config(config.planner.clone())
        .build()
}

pub fn run(config: AppConfig) -> Result<()> {
    let service = build_service(&config)?;
    let week_start = config
        .week
        .unwrap_or_else(|| service.current_week().start);
    info!(%week_start, "rendering dashboard");
    let snapshot = service
        .snapshot(week_start)
        .context("failed to compute dashboard snapshot")?;
    let output = match config.output {
        OutputFormat::Text => render_report(&snapshot),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&snapshot).context("failed to encode snapshot")?
        }
    };
    println!("{output}");
    Ok(())
}

const HEATMAP_GLYPHS: [char; 5] = ['.', '░', '▒', '▓', '█'];

pub fn render_report(snapshot: &DashboardSnapshot) -> String {
    Report(snapshot).to_string()
}

/// Plain-text dashboard for one snapshot.
pub struct Report<'a>(pub &'a DashboardSnapshot);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.0;
        writeln!(f, "{}", snapshot.week_label)?;
        writeln!(
            f,
            "{}",
            calendar::format_period_range(snapshot.week.start, snapshot.week.end())
        )?;
        writeln!(f)?;

        for day in &snapshot.days {
            let marker = if day.is_today { " (today)" } else { "" };
            writeln!(f, "{} {}{marker}", day.day_name, day.day_number)?;
            for goal in &day.goals {
                writeln!(f, "  {} {}", checkbox(goal.completed), goal.text)?;
            }
            if let Some(record) = &day.discipline {
                writeln!(f, "  habits: {}", describe_habits(record))?;
            }
        }
        writeln!(f)?;

        let panel = &snapshot.weekly_goals;
        writeln!(f, "Weekly goals ({})", panel.cadence)?;
        if let (Cadence::Biweekly, Some(label)) = (panel.cadence, &panel.biweekly_end_label) {
            writeln!(f, "  ends {label}")?;
        }
        for goal in &panel.goals {
            writeln!(f, "  {} {}", checkbox(goal.completed), goal.text)?;
        }

        let lookahead = &snapshot.lookahead;
        if !lookahead.this_week.is_empty() || !lookahead.next_week.is_empty() {
            writeln!(f)?;
            writeln!(f, "Lookahead")?;
            for item in &lookahead.this_week {
                writeln!(f, "  this week: {}", item.text)?;
            }
            for item in &lookahead.next_week {
                writeln!(f, "  next week: {}", item.text)?;
            }
        }
        writeln!(f)?;

        let summary = &snapshot.summary;
        writeln!(
            f,
            "Goals {}/{} ({}%)  Discipline {}/{} ({}%)",
            summary.completed_goals,
            summary.total_goals,
            summary.goals_percentage,
            summary.discipline_completed,
            summary.discipline_total,
            summary.discipline_percentage
        )?;
        writeln!(
            f,
            "Streaks: goals {} days, discipline {} days",
            snapshot.goals_streak, snapshot.discipline_streak
        )?;
        writeln!(f)?;

        write_heatmap(f, &snapshot.goals_heatmap)?;
        let stats = &snapshot.goals_statistics;
        writeln!(
            f,
            "  {}/{} goals completed ({}%)",
            stats.completed_goals, stats.total_goals, stats.percentage
        )?;
        writeln!(f)?;

        write_heatmap(f, &snapshot.discipline_heatmap)?;
        for flag in DisciplineFlag::ALL {
            let flag_stats = snapshot.discipline_statistics.for_flag(flag);
            writeln!(
                f,
                "  {}: {}/{} ({}%)",
                flag.label(),
                flag_stats.completed,
                flag_stats.total,
                flag_stats.percentage
            )?;
        }

        if let Some(panel) = &snapshot.countdown {
            writeln!(f)?;
            let remaining = &panel.remaining;
            let status = if remaining.is_today() {
                "today".to_string()
            } else if remaining.is_past() {
                "passed".to_string()
            } else {
                remaining.label()
            };
            writeln!(
                f,
                "{} on {}: {status}",
                panel.event.name,
                calendar::format_date(panel.event.target_date)
            )?;
        }
        Ok(())
    }
}

/// Seven text rows, one per weekday, each column a calendar week.
fn write_heatmap(out: &mut impl fmt::Write, view: &HeatmapView) -> fmt::Result {
    writeln!(out, "{}", view.kind.title())?;
    let labels = calendar::day_of_week_labels();
    for (row, label) in labels.iter().enumerate() {
        let mut line = format!("  {label:<4}");
        for week in &view.weeks {
            let glyph = row
                .checked_sub(week.leading_blanks)
                .and_then(|index| week.days.get(index))
                .map(|day| HEATMAP_GLYPHS[usize::from(day.cell.intensity.min(4))])
                .unwrap_or(' ');
            line.push(glyph);
        }
        writeln!(out, "{}", line.trim_end())?;
    }
    debug!(kind = ?view.kind, weeks = view.weeks.len(), "heatmap rendered");
    Ok(())
}

fn checkbox(done: bool) -> &'static str {
    if done {
        "[x]"
    } else {
        "[ ]"
    }
}

fn describe_habits(record: &DisciplineRecord) -> String {
    DisciplineFlag::ALL
        .iter()
        .map(|flag| format!("{} {}", checkbox(record.get(*flag)), flag.label()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use planner_domain::clock::FixedClock;
    use tempfile::tempdir;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn missing_seed_file_is_empty() {
        let temp = tempdir().unwrap();
        let seed = load_seed(&temp.path().join("absent.json")).unwrap();
        assert!(seed.daily_goals.is_empty());
        assert!(seed.countdown.is_none());
    }

    #[test]
    fn malformed_seed_file_reports_path() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_seed(&path).unwrap_err();
        assert!(format!("{err}").contains("broken.json"));
    }

    #[test]
    fn report_lists_week_goals_and_countdown() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("planner.json");
        std::fs::write(
            &path,
            r#"{
                "daily_goals": [
                    { "date": "2026-01-07", "text": "Gym", "completed": true }
                ],
                "weekly_goals": [
                    { "period_start": "2026-01-06", "cadence": "biweekly", "text": "Finish course" }
                ],
                "discipline": [
                    { "date": "2026-01-07", "am_checkin": true }
                ],
                "countdown": { "name": "Race", "target_date": "2026-02-01" }
            }"#,
        )
        .unwrap();

        let config = PlannerConfig::default();
        let service = DashboardService::builder()
            .with_store(MemoryStore::with_seed(
                &config.user_id,
                load_seed(&path).unwrap(),
            ))
            .with_clock(FixedClock(day(2026, 1, 7)))
            .with_config(config)
            .build()
            .unwrap();
        let snapshot = service.snapshot(day(2026, 1, 6)).unwrap();
        let report = render_report(&snapshot);

        assert!(report.starts_with("Week of Tue, Jan 6, 2026\nJan 6 - Jan 12\n"));
        assert!(report.contains("WEDNESDAY 7 (today)\n  [x] Gym\n"));
        assert!(report.contains("habits: [x] AM Check-in, [ ] PM Check-in"));
        assert!(report.contains("Weekly goals (biweekly)\n  ends Monday, Jan 19\n"));
        assert!(report.contains("Goals 1/1 (100%)"));
        assert!(report.contains("Race on 2026-02-01: 3 weeks, 4 days"));
    }

    #[test]
    fn heatmap_rows_align_under_weekdays() {
        let service = DashboardService::builder()
            .with_store(MemoryStore::new())
            .with_clock(FixedClock(day(2026, 1, 7)))
            .with_config(PlannerConfig {
                heatmap_days: 4,
                ..PlannerConfig::default()
            })
            .build()
            .unwrap();
        let snapshot = service.snapshot(day(2026, 1, 6)).unwrap();
        let mut out = String::new();
        write_heatmap(&mut out, &snapshot.goals_heatmap).unwrap();

        // Jan 4 (Sun) through Jan 7 (Wed) fill the first four rows.
        let rows: Vec<&str> = out.lines().skip(1).collect();
        assert_eq!(rows.len(), 7);
        assert!(rows[0].ends_with('.'));
        assert!(rows[3].ends_with('.'));
        assert!(!rows[4].ends_with('.'));
    }
}
