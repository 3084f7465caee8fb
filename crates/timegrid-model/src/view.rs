use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Date-range selector for the visible part of the grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewMode {
    /// First 7 days of the anchor month.
    Week,
    /// First 15 days of the anchor month.
    HalfMonth,
    /// The full calendar month (28-31 days).
    Month,
}

/// Inclusive visible date range derived from a view mode and anchor month.
///
/// Windows only filter the matrix for display and totals; they never mutate
/// it, so switching modes cannot lose out-of-window edits.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ViewWindow {
    /// Compute the window for `mode` anchored at `(year, month)`.
    ///
    /// Returns `None` when `month` is not a valid 1-12 calendar month (or the
    /// year is outside chrono's supported range).
    pub fn anchored(mode: ViewMode, year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let end = match mode {
            ViewMode::Week => start.checked_add_days(Days::new(6))?,
            ViewMode::HalfMonth => start.checked_add_days(Days::new(14))?,
            ViewMode::Month => start.checked_add_months(Months::new(1))?.pred_opt()?,
        };
        Some(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of days in the window.
    pub fn days(&self) -> u32 {
        (self.end - self.start).num_days() as u32 + 1
    }

    /// Iterate the window's dates in ascending order.
    pub fn iter_days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |date| *date <= end)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_window_spans_seven_days() {
        let window = ViewWindow::anchored(ViewMode::Week, 2025, 3).unwrap();
        assert_eq!(window.start, date(2025, 3, 1));
        assert_eq!(window.end, date(2025, 3, 7));
        assert_eq!(window.days(), 7);
    }

    #[test]
    fn half_month_window_spans_fifteen_days() {
        let window = ViewWindow::anchored(ViewMode::HalfMonth, 2025, 3).unwrap();
        assert_eq!(window.end, date(2025, 3, 15));
        assert_eq!(window.days(), 15);
    }

    #[test]
    fn month_window_tracks_calendar_length() {
        let feb = ViewWindow::anchored(ViewMode::Month, 2025, 2).unwrap();
        assert_eq!(feb.end, date(2025, 2, 28));

        let leap_feb = ViewWindow::anchored(ViewMode::Month, 2024, 2).unwrap();
        assert_eq!(leap_feb.end, date(2024, 2, 29));

        let jan = ViewWindow::anchored(ViewMode::Month, 2025, 1).unwrap();
        assert_eq!(jan.days(), 31);
    }

    #[test]
    fn containment_is_boundary_inclusive() {
        let window = ViewWindow::anchored(ViewMode::Week, 2025, 3).unwrap();
        assert!(window.contains(date(2025, 3, 1)));
        assert!(window.contains(date(2025, 3, 7)));
        assert!(!window.contains(date(2025, 3, 8)));
        assert!(!window.contains(date(2025, 2, 28)));
    }

    #[test]
    fn invalid_anchor_month_is_rejected() {
        assert_eq!(ViewWindow::anchored(ViewMode::Week, 2025, 0), None);
        assert_eq!(ViewWindow::anchored(ViewMode::Month, 2025, 13), None);
    }

    #[test]
    fn iter_days_covers_the_window() {
        let window = ViewWindow::anchored(ViewMode::Week, 2025, 3).unwrap();
        let days: Vec<_> = window.iter_days().collect();
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], date(2025, 3, 1));
        assert_eq!(days[6], date(2025, 3, 7));
    }
}
