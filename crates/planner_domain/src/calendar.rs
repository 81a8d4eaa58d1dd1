//! Calendar and period arithmetic on timezone-naive days.
//!
//! Every function here works on [`NaiveDate`] only. Weekdays are numbered
//! 0 = Sunday through 6 = Saturday wherever a number is exposed.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, PlannerResult};

pub const DAYS_PER_WEEK: i64 = 7;
pub const BIWEEKLY_SPAN_DAYS: i64 = 14;

/// Canonical storage format for calendar days.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Anything positioned on a single calendar day.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

impl Dated for NaiveDate {
    fn date(&self) -> NaiveDate {
        *self
    }
}

/// First day of the planning week. Serialized as its 0..6 number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct WeekStartDay(Weekday);

impl WeekStartDay {
    pub const SUNDAY: Self = Self(Weekday::Sun);
    pub const MONDAY: Self = Self(Weekday::Mon);
    /// The legacy Tuesday-to-Monday planning week.
    pub const TUESDAY: Self = Self(Weekday::Tue);

    pub fn new(weekday: Weekday) -> Self {
        Self(weekday)
    }

    pub fn from_number(day: u32) -> PlannerResult<Self> {
        let weekday = match day {
            0 => Weekday::Sun,
            1 => Weekday::Mon,
            2 => Weekday::Tue,
            3 => Weekday::Wed,
            4 => Weekday::Thu,
            5 => Weekday::Fri,
            6 => Weekday::Sat,
            other => return Err(PlannerError::InvalidWeekStartDay(other)),
        };
        Ok(Self(weekday))
    }

    pub fn number(self) -> u32 {
        self.0.num_days_from_sunday()
    }

    pub fn weekday(self) -> Weekday {
        self.0
    }
}

impl Default for WeekStartDay {
    fn default() -> Self {
        Self::TUESDAY
    }
}

impl TryFrom<u32> for WeekStartDay {
    type Error = PlannerError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_number(value)
    }
}

impl From<WeekStartDay> for u32 {
    fn from(value: WeekStartDay) -> Self {
        value.number()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    #[default]
    Weekly,
    Biweekly,
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cadence::Weekly => f.write_str("weekly"),
            Cadence::Biweekly => f.write_str("biweekly"),
        }
    }
}

impl FromStr for Cadence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(Cadence::Weekly),
            "biweekly" => Ok(Cadence::Biweekly),
            other => Err(format!("unknown cadence `{other}`")),
        }
    }
}

/// Seven consecutive days starting on the configured week start day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeekPeriod {
    pub start: NaiveDate,
    pub week_start_day: WeekStartDay,
}

impl WeekPeriod {
    pub fn containing(date: NaiveDate, week_start_day: WeekStartDay) -> Self {
        Self {
            start: week_start(date, week_start_day),
            week_start_day,
        }
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        week_dates(self.start)
    }

    pub fn end(&self) -> NaiveDate {
        self.start + Duration::days(DAYS_PER_WEEK - 1)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        is_date_in_week(date, self.start)
    }

    pub fn previous(&self) -> Self {
        Self {
            start: previous_week(self.start),
            ..*self
        }
    }

    pub fn next(&self) -> Self {
        Self {
            start: next_week(self.start),
            ..*self
        }
    }
}

/// Fourteen consecutive days anchored at `start`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BiweeklyPeriod {
    pub start: NaiveDate,
}

impl BiweeklyPeriod {
    pub fn new(start: NaiveDate) -> Self {
        Self { start }
    }

    pub fn end(&self) -> NaiveDate {
        biweekly_period_end(self.start)
    }

    pub fn includes_week(&self, reference_week_start: NaiveDate) -> bool {
        is_in_biweekly_period(self.start, reference_week_start)
    }
}

/// Returns the latest date on or before `date` whose weekday is `week_start_day`.
pub fn week_start(date: NaiveDate, week_start_day: WeekStartDay) -> NaiveDate {
    let weekday = i64::from(date.weekday().num_days_from_sunday());
    let start = i64::from(week_start_day.number());
    let days_back = (weekday - start + DAYS_PER_WEEK) % DAYS_PER_WEEK;
    date - Duration::days(days_back)
}

pub fn week_dates(start: NaiveDate) -> Vec<NaiveDate> {
    (0..DAYS_PER_WEEK)
        .map(|offset| start + Duration::days(offset))
        .collect()
}

pub fn previous_week(start: NaiveDate) -> NaiveDate {
    start - Duration::days(DAYS_PER_WEEK)
}

pub fn next_week(start: NaiveDate) -> NaiveDate {
    start + Duration::days(DAYS_PER_WEEK)
}

pub fn is_date_in_week(date: NaiveDate, start: NaiveDate) -> bool {
    let offset = date.signed_duration_since(start).num_days();
    (0..DAYS_PER_WEEK).contains(&offset)
}

/// The `n` days ending at `today` inclusive, oldest first. Stops early at
/// the start of the representable calendar.
pub fn last_n_days(n: usize, today: NaiveDate) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = (0..n as u64)
        .map_while(|back| today.checked_sub_days(Days::new(back)))
        .collect();
    dates.reverse();
    dates
}

/// Every day from `epoch` through `today`. Empty when `epoch` is in the future.
pub fn dates_since(epoch: NaiveDate, today: NaiveDate) -> Vec<NaiveDate> {
    epoch
        .iter_days()
        .take_while(|date| *date <= today)
        .collect()
}

/// True when the week starting at `reference_week_start` falls inside the
/// 14-day period opened at `period_start`. Weeks before the period never match.
pub fn is_in_biweekly_period(period_start: NaiveDate, reference_week_start: NaiveDate) -> bool {
    let diff = reference_week_start
        .signed_duration_since(period_start)
        .num_days();
    (0..BIWEEKLY_SPAN_DAYS).contains(&diff)
}

/// Closing day of the second week of a biweekly period.
pub fn biweekly_period_end(period_start: NaiveDate) -> NaiveDate {
    period_start + Duration::days(BIWEEKLY_SPAN_DAYS - 1)
}

/// Splits a chronological run into Sunday-to-Saturday buckets for grid layout.
///
/// This is independent of [`WeekStartDay`]: the heatmap grid always uses
/// Sunday columns.
pub fn group_by_calendar_week<T: Dated + Clone>(cells: &[T]) -> Vec<Vec<T>> {
    let mut weeks = Vec::new();
    let mut current: Vec<T> = Vec::with_capacity(DAYS_PER_WEEK as usize);

    for (index, cell) in cells.iter().enumerate() {
        current.push(cell.clone());
        let closes_week = cell.date().weekday() == Weekday::Sat;
        if closes_week || index + 1 == cells.len() {
            weeks.push(std::mem::take(&mut current));
        }
    }

    weeks
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonthLabel {
    pub month: String,
    pub week_index: usize,
}

/// Month short names anchored at the first week bucket each month appears in.
pub fn month_label_positions<T: Dated + Clone>(cells: &[T]) -> Vec<MonthLabel> {
    let mut labels = Vec::new();
    let mut last_month: Option<(i32, u32)> = None;

    for (week_index, week) in group_by_calendar_week(cells).iter().enumerate() {
        let Some(first) = week.first() else {
            continue;
        };
        let date = first.date();
        let key = (date.year(), date.month());
        if last_month != Some(key) {
            labels.push(MonthLabel {
                month: date.format("%b").to_string(),
                week_index,
            });
            last_month = Some(key);
        }
    }

    labels
}

/// Parses `YYYY-MM-DD`, also accepting `/` separators.
pub fn parse_date(input: &str) -> PlannerResult<NaiveDate> {
    let normalized = input.trim().replace('/', "-");
    NaiveDate::parse_from_str(&normalized, DATE_FORMAT)
        .map_err(|_| PlannerError::InvalidDate(input.to_string()))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn ordinal_suffix(day: u32) -> &'static str {
    if (11..=13).contains(&day) {
        return "th";
    }
    match day % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

/// "December 30th"
pub fn format_ordinal_date(date: NaiveDate) -> String {
    format!(
        "{} {}{}",
        date.format("%B"),
        date.day(),
        ordinal_suffix(date.day())
    )
}

/// "Week of Tue, Dec 23, 2025"
pub fn format_week_display(start: NaiveDate) -> String {
    format!(
        "Week of {}, {} {}, {}",
        start.format("%a"),
        start.format("%b"),
        start.day(),
        start.year()
    )
}

/// "Monday, Jan 5"
pub fn format_biweekly_end_date(end: NaiveDate) -> String {
    format!("{}, {} {}", end.format("%A"), end.format("%b"), end.day())
}

/// "Dec 23 - Jan 5"
pub fn format_period_range(start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "{} {} - {} {}",
        start.format("%b"),
        start.day(),
        end.format("%b"),
        end.day()
    )
}

/// "TUESDAY"
pub fn day_name(date: NaiveDate) -> String {
    date.format("%A").to_string().to_ascii_uppercase()
}

/// "Tue"
pub fn short_day_name(date: NaiveDate) -> String {
    date.format("%a").to_string()
}

pub fn day_of_week_labels() -> [&'static str; 7] {
    ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_start_aligns_every_start_day_and_contains_date() {
        let base = day(2025, 12, 20);
        for offset in 0..21 {
            let date = base + Duration::days(offset);
            for number in 0..7 {
                let start_day = WeekStartDay::from_number(number).unwrap();
                let start = week_start(date, start_day);
                assert_eq!(start.weekday().num_days_from_sunday(), number);
                let dates = week_dates(start);
                assert_eq!(dates.len(), 7);
                assert!(dates.contains(&date), "{date} not in week of {start}");
                for pair in dates.windows(2) {
                    assert_eq!(pair[1] - pair[0], Duration::days(1));
                }
            }
        }
    }

    #[test]
    fn tuesday_week_matches_legacy_offsets() {
        // Sunday goes back five days, Monday six.
        assert_eq!(
            week_start(day(2025, 12, 28), WeekStartDay::TUESDAY),
            day(2025, 12, 23)
        );
        assert_eq!(
            week_start(day(2025, 12, 29), WeekStartDay::TUESDAY),
            day(2025, 12, 23)
        );
        assert_eq!(
            week_start(day(2025, 12, 30), WeekStartDay::TUESDAY),
            day(2025, 12, 30)
        );
    }

    #[test]
    fn biweekly_membership_is_half_open() {
        let start = day(2025, 12, 30);
        assert!(is_in_biweekly_period(start, start));
        assert!(is_in_biweekly_period(start, start + Duration::days(7)));
        assert!(is_in_biweekly_period(start, start + Duration::days(13)));
        assert!(!is_in_biweekly_period(start, start + Duration::days(14)));
        assert!(!is_in_biweekly_period(start, start - Duration::days(1)));
        assert_eq!(biweekly_period_end(start), day(2026, 1, 12));
        assert_eq!(BiweeklyPeriod::new(start).end().weekday(), Weekday::Mon);
    }

    #[test]
    fn last_n_days_ends_today_oldest_first() {
        let today = day(2026, 3, 1);
        let days = last_n_days(365, today);
        assert_eq!(days.len(), 365);
        assert_eq!(days.last(), Some(&today));
        assert_eq!(days[0], today - Duration::days(364));
        assert!(last_n_days(0, today).is_empty());
    }

    #[test]
    fn last_n_days_stops_at_earliest_date() {
        let today = NaiveDate::MIN + Days::new(2);
        let days = last_n_days(usize::MAX, today);
        assert_eq!(days, vec![NaiveDate::MIN, NaiveDate::MIN + Days::new(1), today]);
    }

    #[test]
    fn dates_since_is_inclusive_and_empty_for_future_epoch() {
        let epoch = day(2025, 12, 29);
        let days = dates_since(epoch, day(2026, 1, 2));
        assert_eq!(days.len(), 5);
        assert_eq!(days[0], epoch);
        assert!(dates_since(epoch, day(2025, 12, 1)).is_empty());
    }

    #[test]
    fn groups_into_sunday_weeks() {
        // 2025-06-04 is a Wednesday.
        let days: Vec<NaiveDate> = day(2025, 6, 4).iter_days().take(11).collect();
        let weeks = group_by_calendar_week(&days);
        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].len(), 4);
        assert_eq!(weeks[0].last().unwrap().weekday(), Weekday::Sat);
        assert_eq!(weeks[1].len(), 7);
        assert_eq!(weeks[1][0].weekday(), Weekday::Sun);
        assert!(group_by_calendar_week::<NaiveDate>(&[]).is_empty());
    }

    #[test]
    fn month_labels_follow_bucket_starts() {
        let days: Vec<NaiveDate> = day(2025, 5, 25).iter_days().take(21).collect();
        let labels = month_label_positions(&days);
        assert_eq!(
            labels,
            vec![
                MonthLabel {
                    month: "May".into(),
                    week_index: 0
                },
                MonthLabel {
                    month: "Jun".into(),
                    week_index: 1
                },
            ]
        );
    }

    #[test]
    fn ordinal_dates() {
        assert_eq!(format_ordinal_date(day(2025, 12, 30)), "December 30th");
        assert_eq!(format_ordinal_date(day(2025, 1, 1)), "January 1st");
        assert_eq!(format_ordinal_date(day(2025, 1, 11)), "January 11th");
        assert_eq!(format_ordinal_date(day(2025, 1, 12)), "January 12th");
        assert_eq!(format_ordinal_date(day(2025, 1, 22)), "January 22nd");
        assert_eq!(format_ordinal_date(day(2025, 1, 23)), "January 23rd");
    }

    #[test]
    fn parse_and_format_round_trip() {
        for raw in ["2025-01-01", "2024-02-29", "2025-12-31"] {
            assert_eq!(format_date(parse_date(raw).unwrap()), raw);
        }
        assert_eq!(parse_date("2025/06/02").unwrap(), day(2025, 6, 2));
        assert!(matches!(
            parse_date("2025-13-01"),
            Err(PlannerError::InvalidDate(_))
        ));
    }

    #[test]
    fn display_strings() {
        assert_eq!(
            format_week_display(day(2025, 12, 23)),
            "Week of Tue, Dec 23, 2025"
        );
        assert_eq!(format_biweekly_end_date(day(2026, 1, 5)), "Monday, Jan 5");
        assert_eq!(
            format_period_range(day(2025, 12, 23), day(2026, 1, 5)),
            "Dec 23 - Jan 5"
        );
        assert_eq!(day_name(day(2025, 12, 23)), "TUESDAY");
        assert_eq!(short_day_name(day(2025, 12, 23)), "Tue");
    }

    #[test]
    fn week_start_day_rejects_out_of_range() {
        assert!(WeekStartDay::from_number(7).is_err());
        assert_eq!(WeekStartDay::default().number(), 2);
        let json = serde_json::to_string(&WeekStartDay::MONDAY).unwrap();
        assert_eq!(json, "1");
    }

    #[test]
    fn week_period_navigation() {
        let week = WeekPeriod::containing(day(2025, 12, 25), WeekStartDay::TUESDAY);
        assert_eq!(week.start, day(2025, 12, 23));
        assert_eq!(week.end(), day(2025, 12, 29));
        assert!(week.contains(day(2025, 12, 29)));
        assert!(!week.contains(day(2025, 12, 30)));
        assert_eq!(week.next().start, day(2025, 12, 30));
        assert_eq!(week.previous().start, day(2025, 12, 16));
    }
}
