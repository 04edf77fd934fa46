// ==========================================
// Marking Maestro - Allocation repository
// ==========================================
// Responsibilities:
// - full replacement of the allocation set per run (one transaction)
// - allocation_run_log bookkeeping
// - manual patch / delete of single allocations
// ==========================================

use crate::domain::allocation::{Allocation, AllocationRunLog};
use crate::domain::types::{ClassId, TaskId, TaskStatus, TeacherId};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::{fmt_datetime, parse_datetime, parse_status};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str =
    "allocation_id, task_id, teacher_id, class_id, start_date, end_date, status";

pub struct AllocationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AllocationRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Swap the stored allocation set for a new one and record the run
    ///
    /// # Arguments
    /// * `allocations` - full result of one allocation run
    /// * `run_log` - summary row for allocation_run_log
    ///
    /// # Returns
    /// Allocations with their assigned `allocation_id`
    ///
    /// Either everything is written or nothing (rollback on any error).
    pub fn replace_all(
        &self,
        allocations: &[Allocation],
        run_log: &AllocationRunLog,
    ) -> RepositoryResult<Vec<Allocation>> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM allocation", [])?;

        let mut stored = Vec::with_capacity(allocations.len());
        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO allocation (task_id, teacher_id, class_id, start_date, end_date, status)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            )?;
            for allocation in allocations {
                stmt.execute(params![
                    allocation.task_id.as_str(),
                    allocation.teacher_id.as_str(),
                    allocation.class_id.as_str(),
                    fmt_datetime(&allocation.start_date),
                    fmt_datetime(&allocation.end_date),
                    allocation.status.as_str(),
                ])?;
                let mut saved = allocation.clone();
                saved.allocation_id = Some(tx.last_insert_rowid());
                stored.push(saved);
            }
        }

        tx.execute(
            r#"INSERT INTO allocation_run_log
               (run_id, started_at, finished_at, tasks_total, tasks_skipped, tasks_under_allocated, allocations_count)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
            params![
                run_log.run_id,
                fmt_datetime(&run_log.started_at),
                fmt_datetime(&run_log.finished_at),
                run_log.tasks_total as i64,
                run_log.tasks_skipped as i64,
                run_log.tasks_under_allocated as i64,
                run_log.allocations_count as i64,
            ],
        )?;

        tx.commit()?;
        Ok(stored)
    }

    /// All allocations in generation order
    pub fn find_all(&self) -> RepositoryResult<Vec<Allocation>> {
        self.query_list(
            &format!(
                "SELECT {} FROM allocation ORDER BY allocation_id ASC",
                SELECT_COLUMNS
            ),
            None,
        )
    }

    pub fn find_by_id(&self, allocation_id: i64) -> RepositoryResult<Option<Allocation>> {
        let conn = self.get_conn()?;
        let allocation = conn
            .query_row(
                &format!(
                    "SELECT {} FROM allocation WHERE allocation_id = ?1",
                    SELECT_COLUMNS
                ),
                params![allocation_id],
                map_row,
            )
            .optional()?;
        Ok(allocation)
    }

    pub fn find_by_task(&self, task_id: &TaskId) -> RepositoryResult<Vec<Allocation>> {
        self.query_list(
            &format!(
                "SELECT {} FROM allocation WHERE task_id = ?1 ORDER BY allocation_id ASC",
                SELECT_COLUMNS
            ),
            Some(task_id.as_str()),
        )
    }

    pub fn find_by_teacher(&self, teacher_id: &TeacherId) -> RepositoryResult<Vec<Allocation>> {
        self.query_list(
            &format!(
                "SELECT {} FROM allocation WHERE teacher_id = ?1 ORDER BY allocation_id ASC",
                SELECT_COLUMNS
            ),
            Some(teacher_id.as_str()),
        )
    }

    fn query_list(&self, sql: &str, key: Option<&str>) -> RepositoryResult<Vec<Allocation>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = match key {
            Some(k) => stmt.query_map(params![k], map_row)?,
            None => stmt.query_map([], map_row)?,
        };
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Persist a patched allocation
    ///
    /// # Errors
    /// `NotFound` when the allocation does not exist
    pub fn update(&self, allocation: &Allocation) -> RepositoryResult<()> {
        let id = allocation
            .allocation_id
            .ok_or_else(|| RepositoryError::FieldValueError {
                field: "allocation_id".to_string(),
                message: "allocation has not been persisted".to_string(),
            })?;

        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"UPDATE allocation
               SET teacher_id = ?1, start_date = ?2, end_date = ?3, status = ?4
               WHERE allocation_id = ?5"#,
            params![
                allocation.teacher_id.as_str(),
                fmt_datetime(&allocation.start_date),
                fmt_datetime(&allocation.end_date),
                allocation.status.as_str(),
                id,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Allocation".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Set the status of every allocation belonging to a task
    pub fn update_status_by_task(
        &self,
        task_id: &TaskId,
        status: TaskStatus,
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE allocation SET status = ?1 WHERE task_id = ?2",
            params![status.as_str(), task_id.as_str()],
        )?;
        Ok(affected)
    }

    /// # Returns
    /// - Ok(true): deleted
    /// - Ok(false): no such allocation
    pub fn delete(&self, allocation_id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM allocation WHERE allocation_id = ?1",
            params![allocation_id],
        )?;
        Ok(affected > 0)
    }

    /// Most recent runs first
    pub fn find_run_logs(&self, limit: usize) -> RepositoryResult<Vec<AllocationRunLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT run_id, started_at, finished_at, tasks_total, tasks_skipped,
                      tasks_under_allocated, allocations_count
               FROM allocation_run_log
               ORDER BY started_at DESC
               LIMIT ?1"#,
        )?;
        let logs = stmt
            .query_map(params![limit as i64], |row| {
                Ok(AllocationRunLog {
                    run_id: row.get(0)?,
                    started_at: parse_datetime(1, &row.get::<_, String>(1)?)?,
                    finished_at: parse_datetime(2, &row.get::<_, String>(2)?)?,
                    tasks_total: row.get::<_, i64>(3)? as usize,
                    tasks_skipped: row.get::<_, i64>(4)? as usize,
                    tasks_under_allocated: row.get::<_, i64>(5)? as usize,
                    allocations_count: row.get::<_, i64>(6)? as usize,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(logs)
    }
}

fn map_row(row: &Row) -> rusqlite::Result<Allocation> {
    Ok(Allocation {
        allocation_id: Some(row.get(0)?),
        task_id: TaskId::new(row.get::<_, String>(1)?),
        teacher_id: TeacherId::new(row.get::<_, String>(2)?),
        class_id: ClassId::new(row.get::<_, String>(3)?),
        start_date: parse_datetime(4, &row.get::<_, String>(4)?)?,
        end_date: parse_datetime(5, &row.get::<_, String>(5)?)?,
        status: parse_status(&row.get::<_, String>(6)?),
    })
}
