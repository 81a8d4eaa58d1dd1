//! Renderable heatmap grid: Sunday-based week columns, month label anchors
//! and per-cell tooltip text.

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::calendar::{self, MonthLabel};
use crate::completion::HeatmapCell;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HeatmapKind {
    Goals,
    Discipline,
}

impl HeatmapKind {
    pub fn title(self) -> &'static str {
        match self {
            HeatmapKind::Goals => "Goals",
            HeatmapKind::Discipline => "Discipline",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeatmapDay {
    pub cell: HeatmapCell,
    pub tooltip: String,
}

/// One grid column. `leading_blanks` is the number of empty rows above the
/// first day so it lands under its weekday.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeatmapWeek {
    pub leading_blanks: usize,
    pub days: Vec<HeatmapDay>,
}

impl HeatmapWeek {
    pub fn trailing_blanks(&self) -> usize {
        7usize.saturating_sub(self.leading_blanks + self.days.len())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeatmapView {
    pub kind: HeatmapKind,
    pub weeks: Vec<HeatmapWeek>,
    pub month_labels: Vec<MonthLabel>,
}

impl HeatmapView {
    pub fn build(kind: HeatmapKind, cells: &[HeatmapCell]) -> Self {
        let weeks = calendar::group_by_calendar_week(cells)
            .into_iter()
            .map(|bucket| {
                let leading_blanks = bucket
                    .first()
                    .map(|cell| cell.date.weekday().num_days_from_sunday() as usize)
                    .unwrap_or(0);
                let days = bucket
                    .into_iter()
                    .map(|cell| HeatmapDay {
                        tooltip: tooltip(kind, &cell),
                        cell,
                    })
                    .collect();
                HeatmapWeek {
                    leading_blanks,
                    days,
                }
            })
            .collect();

        Self {
            kind,
            weeks,
            month_labels: calendar::month_label_positions(cells),
        }
    }

    pub fn days(&self) -> impl Iterator<Item = &HeatmapDay> {
        self.weeks.iter().flat_map(|week| week.days.iter())
    }
}

pub fn tooltip(kind: HeatmapKind, cell: &HeatmapCell) -> String {
    match kind {
        HeatmapKind::Goals => goals_tooltip(cell),
        HeatmapKind::Discipline => discipline_tooltip(cell),
    }
}

pub fn goals_tooltip(cell: &HeatmapCell) -> String {
    let on = calendar::format_ordinal_date(cell.date);
    if cell.total == 0 {
        format!("No goals set on {on}")
    } else {
        format!("{}/{} goals completed on {on}", cell.count, cell.total)
    }
}

pub fn discipline_tooltip(cell: &HeatmapCell) -> String {
    let on = calendar::format_ordinal_date(cell.date);
    let Some(record) = &cell.metadata else {
        return format!("No habits tracked on {on}");
    };
    let labels: Vec<&str> = record.completed_flags().map(|flag| flag.label()).collect();
    if labels.is_empty() {
        format!("No habits completed on {on}")
    } else {
        format!("{} completed on {on}", labels.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::completion::{build_discipline_heatmap, build_goals_heatmap};
    use crate::records::{DailyGoalRecord, DisciplineRecord};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn goals_tooltips() {
        let date = day(2025, 12, 30);
        let goals = vec![
            DailyGoalRecord::new(date, true),
            DailyGoalRecord::new(date, false),
        ];
        let cells = build_goals_heatmap(&[date, day(2025, 12, 31)], &goals);
        assert_eq!(
            goals_tooltip(&cells[0]),
            "1/2 goals completed on December 30th"
        );
        assert_eq!(goals_tooltip(&cells[1]), "No goals set on December 31st");
    }

    #[test]
    fn discipline_tooltips_keep_fixed_label_order() {
        let date = day(2026, 1, 2);
        let mut record = DisciplineRecord::empty(date);
        let empty = build_discipline_heatmap(&[date], &[record]);
        assert_eq!(
            discipline_tooltip(&empty[0]),
            "No habits completed on January 2nd"
        );

        record.set_goals_tomorrow = true;
        record.am_checkin = true;
        let partial = build_discipline_heatmap(&[date], &[record]);
        assert_eq!(
            discipline_tooltip(&partial[0]),
            "AM Check-in, next day goal-setting completed on January 2nd"
        );

        let untracked = build_discipline_heatmap(&[date], &[]);
        assert_eq!(
            discipline_tooltip(&untracked[0]),
            "No habits tracked on January 2nd"
        );
    }

    #[test]
    fn view_pads_partial_weeks() {
        // Wednesday 2025-06-04 through Monday 2025-06-16.
        let dates: Vec<NaiveDate> = day(2025, 6, 4).iter_days().take(13).collect();
        let cells = build_goals_heatmap(&dates, &[]);
        let view = HeatmapView::build(HeatmapKind::Goals, &cells);

        assert_eq!(view.weeks.len(), 3);
        assert_eq!(view.weeks[0].leading_blanks, 3);
        assert_eq!(view.weeks[0].days.len(), 4);
        assert_eq!(view.weeks[1].leading_blanks, 0);
        assert_eq!(view.weeks[1].trailing_blanks(), 0);
        assert_eq!(view.weeks[2].days.len(), 2);
        assert_eq!(view.weeks[2].trailing_blanks(), 5);
        assert_eq!(view.days().count(), 13);
        assert_eq!(view.month_labels.len(), 1);
        assert_eq!(view.month_labels[0].month, "Jun");
        assert!(view
            .days()
            .all(|day| day.tooltip.starts_with("No goals set on June")));
    }
}
