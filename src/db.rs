// ==========================================
// Marking Maestro - SQLite connection setup
// ==========================================
// Goals:
// - one place for PRAGMA setup on every Connection::open
// - one busy_timeout for every connection
// - schema creation for a fresh database
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// Default busy_timeout (milliseconds)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// schema_version expected by this build
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Full schema, idempotent (`IF NOT EXISTS`)
///
/// Notes:
/// - teacher/task/class keep an implicit rowid so listing order = import order
/// - allocation references are not foreign keys: imports replace entity sets
///   wholesale and allocations are regenerated afterwards
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL DEFAULT 'global',
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS teacher (
    teacher_id TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    email TEXT NOT NULL DEFAULT '',
    leave_dates TEXT NOT NULL DEFAULT '',
    class_allocations TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS task (
    task_id TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    course TEXT NOT NULL,
    year_group TEXT NOT NULL,
    due_date TEXT NOT NULL,
    markers_required INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'Not Started'
);

CREATE TABLE IF NOT EXISTS class (
    class_id TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    course TEXT NOT NULL,
    year_group TEXT NOT NULL,
    teacher_id TEXT NOT NULL,
    student_count INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS allocation (
    allocation_id INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id TEXT NOT NULL,
    teacher_id TEXT NOT NULL,
    class_id TEXT NOT NULL,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'Not Started'
);
CREATE INDEX IF NOT EXISTS idx_allocation_task ON allocation(task_id);
CREATE INDEX IF NOT EXISTS idx_allocation_teacher ON allocation(teacher_id);

CREATE TABLE IF NOT EXISTS marking_progress (
    progress_id INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id TEXT NOT NULL,
    teacher_id TEXT NOT NULL,
    class_id TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'Not Started',
    completion_percentage REAL NOT NULL DEFAULT 0,
    comments TEXT,
    estimated_completion_date TEXT,
    last_updated TEXT NOT NULL,
    UNIQUE (task_id, teacher_id, class_id)
);

CREATE TABLE IF NOT EXISTS allocation_run_log (
    run_id TEXT PRIMARY KEY,
    started_at TEXT NOT NULL,
    finished_at TEXT NOT NULL,
    tasks_total INTEGER NOT NULL,
    tasks_skipped INTEGER NOT NULL,
    tasks_under_allocated INTEGER NOT NULL,
    allocations_count INTEGER NOT NULL
);
"#;

/// Apply the shared PRAGMAs to a connection
///
/// - foreign_keys must be enabled per connection
/// - busy_timeout must be set per connection
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Open a SQLite connection with the shared configuration
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Create all tables and stamp the schema version (idempotent)
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// Read schema_version (None if the table does not exist)
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), None);
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }
}
