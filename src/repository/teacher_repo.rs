// ==========================================
// Marking Maestro - Teacher roster repository
// ==========================================
// Data access only, no business rules.
// ==========================================

use crate::domain::teacher::Teacher;
use crate::domain::types::TeacherId;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = "teacher_id, name, email, leave_dates, class_allocations";

// ==========================================
// TeacherRepository
// ==========================================
pub struct TeacherRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TeacherRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Replace the whole roster (delete then insert, one transaction)
    ///
    /// # Returns
    /// Number of teachers inserted
    pub fn replace_all(&self, teachers: &[Teacher]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM teacher", [])?;
        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO teacher (teacher_id, name, email, leave_dates, class_allocations)
                   VALUES (?1, ?2, ?3, ?4, ?5)"#,
            )?;
            for teacher in teachers {
                stmt.execute(params![
                    teacher.teacher_id.as_str(),
                    teacher.name,
                    teacher.email,
                    teacher.leave_dates,
                    teacher.class_allocations,
                ])?;
            }
        }

        tx.commit()?;
        Ok(teachers.len())
    }

    /// All teachers in import order
    pub fn find_all(&self) -> RepositoryResult<Vec<Teacher>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM teacher ORDER BY rowid ASC",
            SELECT_COLUMNS
        ))?;
        let teachers = stmt
            .query_map([], map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(teachers)
    }

    pub fn find_by_id(&self, teacher_id: &TeacherId) -> RepositoryResult<Option<Teacher>> {
        let conn = self.get_conn()?;
        let teacher = conn
            .query_row(
                &format!("SELECT {} FROM teacher WHERE teacher_id = ?1", SELECT_COLUMNS),
                params![teacher_id.as_str()],
                map_row,
            )
            .optional()?;
        Ok(teacher)
    }

    /// Insert or update one teacher (staffing changes)
    pub fn upsert(&self, teacher: &Teacher) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO teacher (teacher_id, name, email, leave_dates, class_allocations)
               VALUES (?1, ?2, ?3, ?4, ?5)
               ON CONFLICT(teacher_id) DO UPDATE SET
                   name = excluded.name,
                   email = excluded.email,
                   leave_dates = excluded.leave_dates,
                   class_allocations = excluded.class_allocations"#,
            params![
                teacher.teacher_id.as_str(),
                teacher.name,
                teacher.email,
                teacher.leave_dates,
                teacher.class_allocations,
            ],
        )?;
        Ok(())
    }

    /// Overwrite the leave text of one teacher
    ///
    /// # Returns
    /// - Ok(true): updated
    /// - Ok(false): no such teacher
    pub fn update_leave_dates(
        &self,
        teacher_id: &TeacherId,
        leave_dates: &str,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE teacher SET leave_dates = ?1 WHERE teacher_id = ?2",
            params![leave_dates, teacher_id.as_str()],
        )?;
        Ok(affected > 0)
    }

    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM teacher", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

fn map_row(row: &Row) -> rusqlite::Result<Teacher> {
    Ok(Teacher {
        teacher_id: TeacherId::new(row.get::<_, String>(0)?),
        name: row.get(1)?,
        email: row.get(2)?,
        leave_dates: row.get(3)?,
        class_allocations: row.get(4)?,
    })
}
