// ==========================================
// Marking Maestro - Application state
// ==========================================
// Responsibility: one shared connection, every repository and API
// instance wired together
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{AllocationApi, DashboardApi, ImportApi, ProgressApi};
use crate::config::{ConfigManager, ReportConfigReader};
use crate::db::{configure_sqlite_connection, init_schema, open_sqlite_connection};
use crate::repository::{
    AllocationRepository, ClassRepository, ProgressRepository, TaskRepository, TeacherRepository,
};

/// Environment variable overriding the database location
pub const DB_PATH_ENV: &str = "MARKING_MAESTRO_DB_PATH";

/// Application state
///
/// Every repository shares the same connection so a run's writes are
/// seen by the next read without reopening.
pub struct AppState {
    pub db_path: String,
    pub config: Arc<ConfigManager>,
    pub import_api: Arc<ImportApi>,
    pub allocation_api: Arc<AllocationApi>,
    pub progress_api: Arc<ProgressApi>,
    pub dashboard_api: Arc<DashboardApi>,
}

impl AppState {
    /// Open (or create) the database at `db_path` and wire everything up
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!(db_path = %db_path, "initialising app state");

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("cannot open database {}: {}", db_path, e))?;
        Self::from_connection(db_path, conn)
    }

    /// In-memory database (tests, dry runs)
    pub fn in_memory() -> Result<Self, String> {
        let conn = Connection::open_in_memory()
            .map_err(|e| format!("cannot open in-memory database: {}", e))?;
        configure_sqlite_connection(&conn).map_err(|e| format!("pragma setup failed: {}", e))?;
        Self::from_connection(":memory:".to_string(), conn)
    }

    fn from_connection(db_path: String, conn: Connection) -> Result<Self, String> {
        init_schema(&conn).map_err(|e| format!("schema initialisation failed: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ===== Repositories =====
        let teacher_repo = Arc::new(TeacherRepository::new(conn.clone()));
        let task_repo = Arc::new(TaskRepository::new(conn.clone()));
        let class_repo = Arc::new(ClassRepository::new(conn.clone()));
        let allocation_repo = Arc::new(AllocationRepository::new(conn.clone()));
        let progress_repo = Arc::new(ProgressRepository::new(conn.clone()));

        // ===== Config =====
        let config = Arc::new(ConfigManager::from_connection(conn));
        let report_config: Arc<dyn ReportConfigReader> = config.clone();

        // ===== APIs =====
        let import_api = Arc::new(ImportApi::new(
            teacher_repo.clone(),
            task_repo.clone(),
            class_repo.clone(),
            allocation_repo.clone(),
        ));
        let allocation_api = Arc::new(AllocationApi::new(
            teacher_repo.clone(),
            task_repo.clone(),
            class_repo.clone(),
            allocation_repo.clone(),
        ));
        let progress_api = Arc::new(ProgressApi::new(
            teacher_repo.clone(),
            task_repo.clone(),
            class_repo.clone(),
            allocation_repo.clone(),
            progress_repo.clone(),
        ));
        let dashboard_api = Arc::new(DashboardApi::new(
            teacher_repo,
            task_repo,
            class_repo,
            allocation_repo,
            progress_repo,
            report_config,
        ));

        tracing::info!("app state ready");

        Ok(Self {
            db_path,
            config,
            import_api,
            allocation_api,
            progress_api,
            dashboard_api,
        })
    }
}

/// Default database location
///
/// Order: `MARKING_MAESTRO_DB_PATH`, then the user data directory,
/// then the working directory.
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let Some(data_dir) = dirs::data_dir() else {
        return "./marking_maestro.db".to_string();
    };

    let dir = data_dir.join("marking-maestro");
    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!(error = %e, "cannot create data directory, using working directory");
        return "./marking_maestro.db".to_string();
    }
    dir.join("marking_maestro.db").to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_state_starts_empty() {
        let state = AppState::in_memory().unwrap();
        assert!(state.import_api.list_teachers().unwrap().is_empty());
        assert!(state.allocation_api.list_allocations().unwrap().is_empty());
    }
}
