// ==========================================
// Marking Maestro - Progress rules
// ==========================================
// Overdue: now > due_date + marking period AND not completed.
// Uses the same MarkingWindow as allocation so both stay consistent.
// ==========================================

use crate::domain::progress::ProgressRecord;
use crate::domain::task::Task;
use crate::domain::types::{TaskId, TaskStatus, TeacherId};
use crate::engine::marking_window::MarkingWindow;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Whether a marking entry is overdue at `now`.
pub fn is_overdue(due_date: NaiveDateTime, status: TaskStatus, now: NaiveDateTime) -> bool {
    MarkingWindow::for_due_date(due_date).has_elapsed(now) && !status.is_completed()
}

// ==========================================
// TeacherProgressSummary
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherProgressSummary {
    pub teacher_id: TeacherId,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub in_progress_tasks: usize,
    pub overdue_tasks: usize,
    pub completion_rate: f64, // percent
}

impl TeacherProgressSummary {
    /// Summarise a teacher's entries; each entry is paired with its task due date.
    pub fn build(
        teacher_id: TeacherId,
        entries: &[(&ProgressRecord, NaiveDateTime)],
        now: NaiveDateTime,
    ) -> Self {
        let total_tasks = entries.len();
        let completed_tasks = entries
            .iter()
            .filter(|(r, _)| r.status == TaskStatus::Completed)
            .count();
        let in_progress_tasks = entries
            .iter()
            .filter(|(r, _)| r.status == TaskStatus::InProgress)
            .count();
        let overdue_tasks = entries
            .iter()
            .filter(|(r, due)| is_overdue(*due, r.status, now))
            .count();
        let completion_rate = if total_tasks > 0 {
            completed_tasks as f64 / total_tasks as f64 * 100.0
        } else {
            0.0
        };

        Self {
            teacher_id,
            total_tasks,
            completed_tasks,
            in_progress_tasks,
            overdue_tasks,
            completion_rate,
        }
    }
}

// ==========================================
// TaskProgressSummary
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskProgressSummary {
    pub task_id: TaskId,
    pub task_name: String,
    pub total_classes: usize,
    pub completed_classes: usize,
    pub overall_progress: f64, // mean completion percentage
    pub is_overdue: bool,
    pub due_date: NaiveDateTime,
    pub marking_deadline: NaiveDateTime,
    pub total_markers: usize,
}

impl TaskProgressSummary {
    /// Task-level rollup. Overdue when past the marking deadline and the
    /// mean progress is below 100.
    pub fn build(task: &Task, entries: &[&ProgressRecord], now: NaiveDateTime) -> Self {
        let window = MarkingWindow::for_due_date(task.due_date);
        let total_classes = entries.len();
        let completed_classes = entries
            .iter()
            .filter(|r| r.status == TaskStatus::Completed)
            .count();
        let overall_progress = if total_classes > 0 {
            entries.iter().map(|r| r.completion_percentage).sum::<f64>() / total_classes as f64
        } else {
            0.0
        };
        let total_markers = entries
            .iter()
            .map(|r| &r.teacher_id)
            .collect::<HashSet<_>>()
            .len();

        Self {
            task_id: task.task_id.clone(),
            task_name: task.name.clone(),
            total_classes,
            completed_classes,
            overall_progress,
            is_overdue: window.has_elapsed(now) && overall_progress < 100.0,
            due_date: window.start,
            marking_deadline: window.end,
            total_markers,
        }
    }
}

// ==========================================
// Gantt filter
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GanttFilter {
    pub teacher_id: Option<TeacherId>,
    pub course: Option<String>,
    pub year_group: Option<String>,
    /// Both bounds required for the date filter to apply
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl GanttFilter {
    /// Date range filter: the due date or the marking deadline falls in
    /// [start_date, end_date] (inclusive).
    pub fn matches_dates(&self, due_date: NaiveDateTime) -> bool {
        let (Some(start), Some(end)) = (self.start_date, self.end_date) else {
            return true;
        };
        let window = MarkingWindow::for_due_date(due_date);
        let in_range = |d: NaiveDate| d >= start && d <= end;
        in_range(window.start_date()) || in_range(window.end_date())
    }

    /// Full predicate over one row's attributes.
    pub fn matches(
        &self,
        teacher_id: &TeacherId,
        course: &str,
        class_year_group: &str,
        due_date: NaiveDateTime,
    ) -> bool {
        if let Some(t) = &self.teacher_id {
            if t != teacher_id {
                return false;
            }
        }
        if let Some(c) = &self.course {
            if c != course {
                return false;
            }
        }
        if let Some(y) = &self.year_group {
            if y != class_year_group {
                return false;
            }
        }
        self.matches_dates(due_date)
    }
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

    fn record(teacher: &str, status: TaskStatus, pct: f64) -> ProgressRecord {
        ProgressRecord {
            progress_id: 0,
            task_id: "K1".into(),
            teacher_id: teacher.into(),
            class_id: "C1".into(),
            status,
            completion_percentage: pct,
            comments: None,
            estimated_completion_date: None,
            last_updated: dt(2024, 3, 1),
        }
    }

    fn task() -> Task {
        Task {
            task_id: "K1".into(),
            name: "Essay".to_string(),
            course: "English".to_string(),
            year_group: "Year 9".to_string(),
            due_date: dt(2024, 3, 1),
            markers_required: 2,
            status: TaskStatus::InProgress,
        }
    }

    #[test]
    fn test_overdue_requires_elapsed_window() {
        assert!(!is_overdue(dt(2024, 3, 1), TaskStatus::NotStarted, dt(2024, 3, 15)));
        assert!(is_overdue(dt(2024, 3, 1), TaskStatus::NotStarted, dt(2024, 3, 16)));
        assert!(!is_overdue(dt(2024, 3, 1), TaskStatus::Completed, dt(2024, 4, 1)));
    }

    #[test]
    fn test_teacher_summary_counts() {
        let a = record("T1", TaskStatus::Completed, 100.0);
        let b = record("T1", TaskStatus::InProgress, 50.0);
        let c = record("T1", TaskStatus::NotStarted, 0.0);
        let entries = vec![(&a, dt(2024, 3, 1)), (&b, dt(2024, 3, 1)), (&c, dt(2024, 4, 1))];

        let summary = TeacherProgressSummary::build("T1".into(), &entries, dt(2024, 3, 20));

        assert_eq!(summary.total_tasks, 3);
        assert_eq!(summary.completed_tasks, 1);
        assert_eq!(summary.in_progress_tasks, 1);
        assert_eq!(summary.overdue_tasks, 1);
        assert!((summary.completion_rate - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_teacher_summary_empty() {
        let summary = TeacherProgressSummary::build("T1".into(), &[], dt(2024, 3, 20));
        assert_eq!(summary.total_tasks, 0);
        assert_eq!(summary.completion_rate, 0.0);
    }

    #[test]
    fn test_task_summary_rollup() {
        let a = record("T1", TaskStatus::Completed, 100.0);
        let b = record("T2", TaskStatus::InProgress, 50.0);
        let c = record("T2", TaskStatus::InProgress, 30.0);

        let summary = TaskProgressSummary::build(&task(), &[&a, &b, &c], dt(2024, 3, 20));

        assert_eq!(summary.total_classes, 3);
        assert_eq!(summary.completed_classes, 1);
        assert_eq!(summary.total_markers, 2);
        assert!((summary.overall_progress - 60.0).abs() < 1e-9);
        assert!(summary.is_overdue);
        assert_eq!(summary.marking_deadline, dt(2024, 3, 15));
    }

    #[test]
    fn test_task_summary_fully_done_is_not_overdue() {
        let a = record("T1", TaskStatus::Completed, 100.0);
        let summary = TaskProgressSummary::build(&task(), &[&a], dt(2024, 5, 1));
        assert!(!summary.is_overdue);
    }

    #[test]
    fn test_gantt_date_filter_matches_deadline() {
        let filter = GanttFilter {
            start_date: NaiveDate::from_ymd_opt(2024, 3, 10),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 20),
            ..Default::default()
        };
        // due 03-01 is outside, deadline 03-15 inside
        assert!(filter.matches_dates(dt(2024, 3, 1)));
        // due 02-01, deadline 02-15: both outside
        assert!(!filter.matches_dates(dt(2024, 2, 1)));
    }

    #[test]
    fn test_gantt_partial_date_range_is_ignored() {
        let filter = GanttFilter {
            start_date: NaiveDate::from_ymd_opt(2024, 3, 10),
            ..Default::default()
        };
        assert!(filter.matches_dates(dt(2020, 1, 1)));
    }

    #[test]
    fn test_gantt_attribute_filters() {
        let filter = GanttFilter {
            teacher_id: Some("T1".into()),
            course: Some("English".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&"T1".into(), "English", "Year 9", dt(2024, 3, 1)));
        assert!(!filter.matches(&"T2".into(), "English", "Year 9", dt(2024, 3, 1)));
        assert!(!filter.matches(&"T1".into(), "Maths", "Year 9", dt(2024, 3, 1)));
    }
}
