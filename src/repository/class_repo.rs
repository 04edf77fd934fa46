// ==========================================
// Marking Maestro - Class repository
// ==========================================

use crate::domain::class::Class;
use crate::domain::types::{ClassId, TeacherId};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = "class_id, name, course, year_group, teacher_id, student_count";

pub struct ClassRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ClassRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Replace every class (delete then insert, one transaction)
    pub fn replace_all(&self, classes: &[Class]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM class", [])?;
        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO class (class_id, name, course, year_group, teacher_id, student_count)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            )?;
            for class in classes {
                stmt.execute(params![
                    class.class_id.as_str(),
                    class.name,
                    class.course,
                    class.year_group,
                    class.teacher_id.as_str(),
                    class.student_count,
                ])?;
            }
        }

        tx.commit()?;
        Ok(classes.len())
    }

    /// All classes in import order (course listing order derives from this)
    pub fn find_all(&self) -> RepositoryResult<Vec<Class>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM class ORDER BY rowid ASC",
            SELECT_COLUMNS
        ))?;
        let classes = stmt
            .query_map([], map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(classes)
    }

    pub fn find_by_id(&self, class_id: &ClassId) -> RepositoryResult<Option<Class>> {
        let conn = self.get_conn()?;
        let class = conn
            .query_row(
                &format!("SELECT {} FROM class WHERE class_id = ?1", SELECT_COLUMNS),
                params![class_id.as_str()],
                map_row,
            )
            .optional()?;
        Ok(class)
    }

    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM class", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

fn map_row(row: &Row) -> rusqlite::Result<Class> {
    Ok(Class {
        class_id: ClassId::new(row.get::<_, String>(0)?),
        name: row.get(1)?,
        course: row.get(2)?,
        year_group: row.get(3)?,
        teacher_id: TeacherId::new(row.get::<_, String>(4)?),
        student_count: row.get(5)?,
    })
}
