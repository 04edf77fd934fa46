// ==========================================
// Marking Maestro - Allocation (marking assignment) model
// ==========================================
// Regenerated in full on every allocation run.
// ==========================================

use crate::domain::types::{ClassId, TaskId, TaskStatus, TeacherId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Allocation - one (task, teacher, class) marking record
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub allocation_id: Option<i64>, // None until persisted
    pub task_id: TaskId,
    pub teacher_id: TeacherId,
    pub class_id: ClassId,
    pub start_date: NaiveDateTime, // = task due date
    pub end_date: NaiveDateTime,   // = start + marking period
    pub status: TaskStatus,
}

/// Partial update of an allocation (manual reassignment / rescheduling)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllocationPatch {
    pub teacher_id: Option<TeacherId>,
    pub status: Option<TaskStatus>,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
}

impl AllocationPatch {
    pub fn is_empty(&self) -> bool {
        self.teacher_id.is_none()
            && self.status.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
    }

    pub fn apply(&self, allocation: &mut Allocation) {
        if let Some(teacher_id) = &self.teacher_id {
            allocation.teacher_id = teacher_id.clone();
        }
        if let Some(status) = self.status {
            allocation.status = status;
        }
        if let Some(start) = self.start_date {
            allocation.start_date = start;
        }
        if let Some(end) = self.end_date {
            allocation.end_date = end;
        }
    }
}

// ==========================================
// AllocationRunLog - one row per allocation run
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRunLog {
    pub run_id: String,
    pub started_at: NaiveDateTime,
    pub finished_at: NaiveDateTime,
    pub tasks_total: usize,
    pub tasks_skipped: usize,
    pub tasks_under_allocated: usize,
    pub allocations_count: usize,
}
