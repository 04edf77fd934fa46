// ==========================================
// Marking Maestro - Marking progress repository
// ==========================================
// marking_progress rows are keyed by (task, teacher, class) and are
// never deleted by an allocation run.
// ==========================================

use crate::domain::allocation::Allocation;
use crate::domain::progress::{ProgressRecord, ProgressUpdate};
use crate::domain::types::{ClassId, TaskId, TaskStatus, TeacherId};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::{
    fmt_datetime, parse_datetime, parse_optional_datetime, parse_status,
};
use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = "progress_id, task_id, teacher_id, class_id, status, \
     completion_percentage, comments, estimated_completion_date, last_updated";

/// Optional equality filters for listing progress rows
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressFilter {
    pub teacher_id: Option<TeacherId>,
    pub task_id: Option<TaskId>,
    pub status: Option<TaskStatus>,
}

pub struct ProgressRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProgressRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Create a "Not Started" progress row for every allocation that lacks one
    ///
    /// # Returns
    /// Number of rows created
    pub fn ensure_for_allocations(
        &self,
        allocations: &[Allocation],
        now: NaiveDateTime,
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut created = 0;
        {
            let mut stmt = tx.prepare(
                r#"INSERT OR IGNORE INTO marking_progress
                   (task_id, teacher_id, class_id, status, completion_percentage, last_updated)
                   VALUES (?1, ?2, ?3, ?4, 0, ?5)"#,
            )?;
            for allocation in allocations {
                created += stmt.execute(params![
                    allocation.task_id.as_str(),
                    allocation.teacher_id.as_str(),
                    allocation.class_id.as_str(),
                    TaskStatus::NotStarted.as_str(),
                    fmt_datetime(&now),
                ])?;
            }
        }

        tx.commit()?;
        Ok(created)
    }

    pub fn find_all(&self) -> RepositoryResult<Vec<ProgressRecord>> {
        self.find_filtered(&ProgressFilter::default())
    }

    pub fn find_filtered(&self, filter: &ProgressFilter) -> RepositoryResult<Vec<ProgressRecord>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(teacher_id) = &filter.teacher_id {
            clauses.push("teacher_id = ?");
            values.push(Value::Text(teacher_id.as_str().to_string()));
        }
        if let Some(task_id) = &filter.task_id {
            clauses.push("task_id = ?");
            values.push(Value::Text(task_id.as_str().to_string()));
        }
        if let Some(status) = filter.status {
            clauses.push("status = ?");
            values.push(Value::Text(status.as_str().to_string()));
        }

        let mut sql = format!("SELECT {} FROM marking_progress", SELECT_COLUMNS);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY progress_id ASC");

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(values), map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    pub fn find_by_id(&self, progress_id: i64) -> RepositoryResult<Option<ProgressRecord>> {
        let conn = self.get_conn()?;
        let record = conn
            .query_row(
                &format!(
                    "SELECT {} FROM marking_progress WHERE progress_id = ?1",
                    SELECT_COLUMNS
                ),
                params![progress_id],
                map_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Apply a patch to one progress row
    ///
    /// # Returns
    /// The updated record
    pub fn update(
        &self,
        progress_id: i64,
        update: &ProgressUpdate,
        now: NaiveDateTime,
    ) -> RepositoryResult<ProgressRecord> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let record = apply_in_tx(&tx, progress_id, update, now)?;
        tx.commit()?;
        Ok(record)
    }

    /// Apply the same patch to many rows; any missing id rolls back all of them
    pub fn bulk_update(
        &self,
        progress_ids: &[i64],
        update: &ProgressUpdate,
        now: NaiveDateTime,
    ) -> RepositoryResult<Vec<ProgressRecord>> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut updated = Vec::with_capacity(progress_ids.len());
        for &id in progress_ids {
            updated.push(apply_in_tx(&tx, id, update, now)?);
        }

        tx.commit()?;
        Ok(updated)
    }
}

fn apply_in_tx(
    tx: &Transaction,
    progress_id: i64,
    update: &ProgressUpdate,
    now: NaiveDateTime,
) -> RepositoryResult<ProgressRecord> {
    let mut record = tx
        .query_row(
            &format!(
                "SELECT {} FROM marking_progress WHERE progress_id = ?1",
                SELECT_COLUMNS
            ),
            params![progress_id],
            map_row,
        )
        .optional()?
        .ok_or_else(|| RepositoryError::NotFound {
            entity: "MarkingProgress".to_string(),
            id: progress_id.to_string(),
        })?;

    update.apply(&mut record, now);

    tx.execute(
        r#"UPDATE marking_progress
           SET status = ?1, completion_percentage = ?2, comments = ?3,
               estimated_completion_date = ?4, last_updated = ?5
           WHERE progress_id = ?6"#,
        params![
            record.status.as_str(),
            record.completion_percentage,
            record.comments,
            record.estimated_completion_date.as_ref().map(fmt_datetime),
            fmt_datetime(&record.last_updated),
            progress_id,
        ],
    )?;

    Ok(record)
}

fn map_row(row: &Row) -> rusqlite::Result<ProgressRecord> {
    Ok(ProgressRecord {
        progress_id: row.get(0)?,
        task_id: TaskId::new(row.get::<_, String>(1)?),
        teacher_id: TeacherId::new(row.get::<_, String>(2)?),
        class_id: ClassId::new(row.get::<_, String>(3)?),
        status: parse_status(&row.get::<_, String>(4)?),
        completion_percentage: row.get(5)?,
        comments: row.get(6)?,
        estimated_completion_date: parse_optional_datetime(7, row.get(7)?)?,
        last_updated: parse_datetime(8, &row.get::<_, String>(8)?)?,
    })
}
