// ==========================================
// Marking Maestro - Report config reader trait
// ==========================================
// Responsibility: read-only configuration needed by dashboard reports
// No writes, no business logic.
// ==========================================

use async_trait::async_trait;
use std::error::Error;

pub type ConfigReadResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ReportConfigReader
// ==========================================
// Implemented by: ConfigManager (config_kv table)
#[async_trait]
pub trait ReportConfigReader: Send + Sync {
    /// Tasks due within this many days count as "upcoming"
    ///
    /// # Default
    /// - 14
    async fn get_upcoming_window_days(&self) -> ConfigReadResult<i64>;

    /// Maximum number of upcoming tasks listed on the dashboard
    ///
    /// # Default
    /// - 5
    async fn get_upcoming_task_limit(&self) -> ConfigReadResult<usize>;
}
