// ==========================================
// Marking Maestro - Config layer
// ==========================================
// Responsibility: runtime settings with defaults
// Storage: config_kv table
// ==========================================

pub mod config_manager;
pub mod report_config_trait;

pub use config_manager::{
    config_keys, ConfigManager, DEFAULT_UPCOMING_TASK_LIMIT, DEFAULT_UPCOMING_WINDOW_DAYS,
    MAX_UPCOMING_WINDOW_DAYS,
};
pub use report_config_trait::{ConfigReadResult, ReportConfigReader};
