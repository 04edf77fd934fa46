// ==========================================
// Marking Maestro - Class model
// ==========================================

use crate::domain::types::{ClassId, TeacherId};
use serde::{Deserialize, Serialize};

/// A taught class. Exactly one course and one home teacher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub class_id: ClassId,
    pub name: String,
    pub course: String,
    pub year_group: String,
    pub teacher_id: TeacherId, // home teacher
    pub student_count: u32,
}
