// ==========================================
// Marking Maestro - Domain layer
// ==========================================
// Entities and value types only.
// No data access, no engine logic.
// ==========================================

pub mod allocation;
pub mod class;
pub mod progress;
pub mod task;
pub mod teacher;
pub mod types;

pub use allocation::{Allocation, AllocationPatch, AllocationRunLog};
pub use class::Class;
pub use progress::{ProgressRecord, ProgressUpdate};
pub use task::Task;
pub use teacher::{LeaveInterval, Teacher};
pub use types::{ClassId, TaskId, TaskStatus, TeacherId};
