// ==========================================
// Marking Maestro - Engine layer
// ==========================================
// Allocation rules and progress rules.
// Engines never touch the database; they compute and return.
// ==========================================

pub mod availability;
pub mod eligibility;
pub mod leave_parser;
pub mod marking_window;
pub mod orchestrator;
pub mod planner;
pub mod progress;

pub use availability::AvailabilityChecker;
pub use eligibility::{EligibilityRanker, MarkerCandidate};
pub use leave_parser::LeaveParser;
pub use marking_window::{marking_deadline, MarkingWindow, MARKING_PERIOD_DAYS};
pub use orchestrator::{AllocationEngine, AllocationRunResult, RosterSnapshot, TaskAllocationOutcome};
pub use planner::{AllocationPlanner, AssignReason, MarkingPair};
pub use progress::{is_overdue, GanttFilter, TaskProgressSummary, TeacherProgressSummary};
