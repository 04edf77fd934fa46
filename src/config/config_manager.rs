// ==========================================
// Marking Maestro - Config manager
// ==========================================
// Responsibility: load, query and override settings
// Storage: config_kv table (key-value + scope)
// ==========================================

use crate::config::report_config_trait::{ConfigReadResult, ReportConfigReader};
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Well-known config_kv keys
pub mod config_keys {
    pub const UPCOMING_WINDOW_DAYS: &str = "upcoming_window_days";
    pub const UPCOMING_TASK_LIMIT: &str = "upcoming_task_limit";
}

pub const DEFAULT_UPCOMING_WINDOW_DAYS: i64 = 14;
/// Upper bound for the upcoming-task window (about ten years)
pub const MAX_UPCOMING_WINDOW_DAYS: i64 = 3650;
pub const DEFAULT_UPCOMING_TASK_LIMIT: usize = 5;

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// Open a dedicated connection to `db_path`
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Share an existing connection
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Read a global-scope value
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Insert or overwrite a global-scope value
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO config_kv (scope_id, key, value, updated_at)
               VALUES (?1, ?2, ?3, datetime('now'))
               ON CONFLICT(scope_id, key) DO UPDATE SET
                   value = excluded.value,
                   updated_at = excluded.updated_at"#,
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    /// All global settings, sorted by key
    pub fn get_config_snapshot(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt
            .query_map(params![GLOBAL_SCOPE], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows.into_iter().collect())
    }

    /// Parse a stored value, falling back to `default` when absent or malformed
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> RepositoryResult<T>
    where
        T: std::str::FromStr,
    {
        match self.get_global_config_value(key)? {
            None => Ok(default),
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    warn!(key, value = %raw, "malformed config value, using default");
                    Ok(default)
                }
            },
        }
    }
}

#[async_trait]
impl ReportConfigReader for ConfigManager {
    async fn get_upcoming_window_days(&self) -> ConfigReadResult<i64> {
        let days = self.get_parsed_or_default(
            config_keys::UPCOMING_WINDOW_DAYS,
            DEFAULT_UPCOMING_WINDOW_DAYS,
        )?;
        if days > MAX_UPCOMING_WINDOW_DAYS {
            warn!(days, max = MAX_UPCOMING_WINDOW_DAYS, "upcoming window too large, clamped");
        }
        Ok(days.clamp(0, MAX_UPCOMING_WINDOW_DAYS))
    }

    async fn get_upcoming_task_limit(&self) -> ConfigReadResult<usize> {
        Ok(self.get_parsed_or_default(
            config_keys::UPCOMING_TASK_LIMIT,
            DEFAULT_UPCOMING_TASK_LIMIT,
        )?)
    }
}
