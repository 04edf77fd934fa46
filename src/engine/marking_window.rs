// ==========================================
// Marking Maestro - Marking window calculator
// ==========================================
// Window: [due_date, due_date + MARKING_PERIOD_DAYS]
// Pure, no failure modes. The offset is global policy, not per task.
// Near the end of the calendar the deadline saturates at NaiveDateTime::MAX.
// ==========================================

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Marking period length in days (global policy)
pub const MARKING_PERIOD_DAYS: i64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkingWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl MarkingWindow {
    /// Derive the marking window from a task due date.
    pub fn for_due_date(due_date: NaiveDateTime) -> Self {
        Self {
            start: due_date,
            end: marking_deadline(due_date),
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end.date()
    }

    /// `now` is strictly past the end of the window
    pub fn has_elapsed(&self, now: NaiveDateTime) -> bool {
        now > self.end
    }
}

/// Marking deadline = due date + marking period
pub fn marking_deadline(due_date: NaiveDateTime) -> NaiveDateTime {
    due_date
        .checked_add_signed(Duration::days(MARKING_PERIOD_DAYS))
        .unwrap_or(NaiveDateTime::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_window_is_fourteen_days() {
        let window = MarkingWindow::for_due_date(dt(2024, 3, 1));
        assert_eq!(window.start, dt(2024, 3, 1));
        assert_eq!(window.end, dt(2024, 3, 15));
    }

    #[test]
    fn test_window_crosses_month_and_leap_day() {
        let window = MarkingWindow::for_due_date(dt(2024, 2, 20));
        assert_eq!(window.end, dt(2024, 3, 5));
    }

    #[test]
    fn test_has_elapsed_is_strict() {
        let window = MarkingWindow::for_due_date(dt(2024, 3, 1));
        assert!(!window.has_elapsed(dt(2024, 3, 15)));
        assert!(window.has_elapsed(dt(2024, 3, 16)));
    }

    #[test]
    fn test_deadline_saturates_at_calendar_end() {
        let due = NaiveDate::MAX.and_hms_opt(0, 0, 0).unwrap();
        let window = MarkingWindow::for_due_date(due);
        assert_eq!(window.start, due);
        assert_eq!(window.end, NaiveDateTime::MAX);
        assert!(!window.has_elapsed(dt(2024, 3, 16)));
    }
}
