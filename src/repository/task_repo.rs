// ==========================================
// Marking Maestro - Assessment task repository
// ==========================================

use crate::domain::task::Task;
use crate::domain::types::{TaskId, TaskStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::{fmt_datetime, parse_datetime, parse_status};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = "task_id, name, course, year_group, due_date, markers_required, status";

pub struct TaskRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TaskRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Replace every task (delete then insert, one transaction)
    pub fn replace_all(&self, tasks: &[Task]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM task", [])?;
        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO task (task_id, name, course, year_group, due_date, markers_required, status)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
            )?;
            for task in tasks {
                stmt.execute(params![
                    task.task_id.as_str(),
                    task.name,
                    task.course,
                    task.year_group,
                    fmt_datetime(&task.due_date),
                    task.markers_required,
                    task.status.as_str(),
                ])?;
            }
        }

        tx.commit()?;
        Ok(tasks.len())
    }

    /// All tasks in import order
    pub fn find_all(&self) -> RepositoryResult<Vec<Task>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM task ORDER BY rowid ASC",
            SELECT_COLUMNS
        ))?;
        let tasks = stmt
            .query_map([], map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    pub fn find_by_id(&self, task_id: &TaskId) -> RepositoryResult<Option<Task>> {
        let conn = self.get_conn()?;
        let task = conn
            .query_row(
                &format!("SELECT {} FROM task WHERE task_id = ?1", SELECT_COLUMNS),
                params![task_id.as_str()],
                map_row,
            )
            .optional()?;
        Ok(task)
    }

    /// Overwrite the lifecycle status (no transition guard)
    pub fn update_status(&self, task_id: &TaskId, status: TaskStatus) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE task SET status = ?1 WHERE task_id = ?2",
            params![status.as_str(), task_id.as_str()],
        )?;
        Ok(affected > 0)
    }

    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM task", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

fn map_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        task_id: TaskId::new(row.get::<_, String>(0)?),
        name: row.get(1)?,
        course: row.get(2)?,
        year_group: row.get(3)?,
        due_date: parse_datetime(4, &row.get::<_, String>(4)?)?,
        markers_required: row.get(5)?,
        status: parse_status(&row.get::<_, String>(6)?),
    })
}
