// ==========================================
// Marking Maestro - API layer
// ==========================================
// Responsibility: business entry points used by the CLI
// ==========================================

pub mod allocation_api;
pub mod dashboard_api;
pub mod error;
pub mod import_api;
pub mod progress_api;

pub use allocation_api::{AllocationApi, AllocationRunReport};
pub use dashboard_api::{DashboardApi, DashboardStatistics, TeacherLoad, TeacherReport, TeacherReportRow};
pub use error::{ApiError, ApiResult};
pub use import_api::ImportApi;
pub use progress_api::{GanttRow, ProgressApi, ProgressEntryView};
