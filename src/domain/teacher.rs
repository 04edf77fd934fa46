// ==========================================
// Marking Maestro - Teacher (roster) model
// ==========================================

use crate::domain::types::TeacherId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// Teacher - a potential marker
// ==========================================
// leave_dates is kept as raw text ("<date> to <date>, ...");
// parsing happens in engine::leave_parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    pub teacher_id: TeacherId,
    pub name: String,
    pub email: String,
    pub leave_dates: String,
    pub class_allocations: String, // free-text note, not used by the engine
}

impl Teacher {
    pub fn new(teacher_id: impl Into<TeacherId>, name: impl Into<String>) -> Self {
        Self {
            teacher_id: teacher_id.into(),
            name: name.into(),
            email: String::new(),
            leave_dates: String::new(),
            class_allocations: String::new(),
        }
    }

    pub fn with_leave(mut self, leave_dates: impl Into<String>) -> Self {
        self.leave_dates = leave_dates.into();
        self
    }

    pub fn has_leave_data(&self) -> bool {
        !self.leave_dates.trim().is_empty()
    }
}

// ==========================================
// LeaveInterval - one parsed leave range
// ==========================================
// Inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveInterval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl LeaveInterval {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Inclusive overlap: `start <= other_end && end >= other_start`
    pub fn overlaps(&self, other_start: NaiveDate, other_end: NaiveDate) -> bool {
        self.start <= other_end && self.end >= other_start
    }
}
