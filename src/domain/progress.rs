// ==========================================
// Marking Maestro - Marking progress tracking model
// ==========================================
// Decoupled from Allocation: keyed by (task, teacher, class),
// survives reallocation runs.
// ==========================================

use crate::domain::types::{ClassId, TaskId, TaskStatus, TeacherId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub progress_id: i64,
    pub task_id: TaskId,
    pub teacher_id: TeacherId,
    pub class_id: ClassId,
    pub status: TaskStatus,
    pub completion_percentage: f64, // 0.0 - 100.0
    pub comments: Option<String>,
    pub estimated_completion_date: Option<NaiveDateTime>,
    pub last_updated: NaiveDateTime,
}

/// Partial update applied to one or many progress records
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub status: Option<TaskStatus>,
    pub completion_percentage: Option<f64>,
    pub comments: Option<String>,
    pub estimated_completion_date: Option<NaiveDateTime>,
}

impl ProgressUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.completion_percentage.is_none()
            && self.comments.is_none()
            && self.estimated_completion_date.is_none()
    }

    /// Apply the patch and stamp `last_updated`.
    ///
    /// Completion percentage is clamped into [0, 100].
    pub fn apply(&self, record: &mut ProgressRecord, now: NaiveDateTime) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(pct) = self.completion_percentage {
            record.completion_percentage = clamp_percentage(pct);
        }
        if let Some(comments) = &self.comments {
            record.comments = Some(comments.clone());
        }
        if let Some(eta) = self.estimated_completion_date {
            record.estimated_completion_date = Some(eta);
        }
        record.last_updated = now;
    }
}

pub fn clamp_percentage(pct: f64) -> f64 {
    if pct.is_nan() {
        return 0.0;
    }
    pct.clamp(0.0, 100.0)
}
