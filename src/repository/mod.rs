// ==========================================
// Marking Maestro - Repository layer
// ==========================================
// Rule: repositories hold no business logic
// ==========================================
// Responsibility: data access behind typed interfaces
// Constraint: every query is parameterised
// ==========================================

pub mod allocation_repo;
pub mod class_repo;
pub mod error;
pub mod progress_repo;
pub mod row_codec;
pub mod task_repo;
pub mod teacher_repo;

pub use allocation_repo::AllocationRepository;
pub use class_repo::ClassRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use progress_repo::{ProgressFilter, ProgressRepository};
pub use task_repo::TaskRepository;
pub use teacher_repo::TeacherRepository;
