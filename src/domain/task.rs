// ==========================================
// Marking Maestro - Assessment task model
// ==========================================

use crate::domain::types::{TaskId, TaskStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Task - an assessment that needs marking
// ==========================================
// Owns the classes of its course transitively (shared `course` value).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: TaskId,
    pub name: String,
    pub course: String,
    pub year_group: String,
    pub due_date: NaiveDateTime, // naive UTC
    pub markers_required: u32,
    pub status: TaskStatus,
}
