// ==========================================
// Marking Maestro - Roster importer
// ==========================================
// Pipeline: parse -> check columns -> map rows -> validate -> replace
// Each import replaces the entity set wholesale; any row error aborts
// the whole file before anything is written.
// ==========================================

use crate::domain::class::Class;
use crate::domain::task::Task;
use crate::domain::teacher::Teacher;
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::{
    FieldMapper, CLASS_REQUIRED_COLUMNS, COL_CLASS_ID, COL_TASK_ID, COL_TEACHER_ID,
    STAFF_REQUIRED_COLUMNS, TASK_REQUIRED_COLUMNS,
};
use crate::importer::file_parser::{RawRow, UniversalFileParser};
use crate::importer::validator::ImportValidator;
use crate::repository::{ClassRepository, TaskRepository, TeacherRepository};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Which roster file an import targeted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    Staff,
    Tasks,
    Classes,
}

/// Outcome of one file import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSummary {
    pub batch_id: String,
    pub kind: ImportKind,
    pub rows_read: usize,
    pub rows_imported: usize,
    pub warnings: Vec<String>,
    pub elapsed_ms: u64,
}

pub struct RosterImporter {
    teacher_repo: Arc<TeacherRepository>,
    task_repo: Arc<TaskRepository>,
    class_repo: Arc<ClassRepository>,
    parser: UniversalFileParser,
    mapper: FieldMapper,
    validator: ImportValidator,
}

impl RosterImporter {
    pub fn new(
        teacher_repo: Arc<TeacherRepository>,
        task_repo: Arc<TaskRepository>,
        class_repo: Arc<ClassRepository>,
    ) -> Self {
        Self {
            teacher_repo,
            task_repo,
            class_repo,
            parser: UniversalFileParser,
            mapper: FieldMapper,
            validator: ImportValidator,
        }
    }

    /// Import the staff file (Teacher ID, Name, Email, Leave Dates, Class Allocations)
    #[instrument(skip(self, file_path), fields(file = %file_path.as_ref().display()))]
    pub fn import_staff<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<ImportSummary> {
        let started = Instant::now();
        let table = self.parser.parse(file_path.as_ref())?;
        self.mapper.check_columns(&table, STAFF_REQUIRED_COLUMNS)?;

        let teachers: Vec<Teacher> =
            map_rows(&table.rows, |row, n| self.mapper.map_teacher(row, n))?;
        self.validator.check_unique(
            COL_TEACHER_ID,
            teachers
                .iter()
                .enumerate()
                .map(|(i, t)| (i + 1, t.teacher_id.as_str())),
        )?;

        let imported = self.teacher_repo.replace_all(&teachers)?;
        Ok(self.finish(ImportKind::Staff, table.rows.len(), imported, Vec::new(), started))
    }

    /// Import the tasks file; every task starts "Not Started"
    #[instrument(skip(self, file_path), fields(file = %file_path.as_ref().display()))]
    pub fn import_tasks<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<ImportSummary> {
        let started = Instant::now();
        let table = self.parser.parse(file_path.as_ref())?;
        self.mapper.check_columns(&table, TASK_REQUIRED_COLUMNS)?;

        let tasks: Vec<Task> = map_rows(&table.rows, |row, n| self.mapper.map_task(row, n))?;
        self.validator.check_unique(
            COL_TASK_ID,
            tasks
                .iter()
                .enumerate()
                .map(|(i, t)| (i + 1, t.task_id.as_str())),
        )?;

        let warnings = tasks
            .iter()
            .filter(|t| t.markers_required == 0)
            .map(|t| format!("task {} requires no markers", t.task_id))
            .collect();

        let imported = self.task_repo.replace_all(&tasks)?;
        Ok(self.finish(ImportKind::Tasks, table.rows.len(), imported, warnings, started))
    }

    /// Import the classes file
    ///
    /// Home teachers missing from the current roster are reported as
    /// warnings; the allocator skips them at run time.
    #[instrument(skip(self, file_path), fields(file = %file_path.as_ref().display()))]
    pub fn import_classes<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<ImportSummary> {
        let started = Instant::now();
        let table = self.parser.parse(file_path.as_ref())?;
        self.mapper.check_columns(&table, CLASS_REQUIRED_COLUMNS)?;

        let classes: Vec<Class> = map_rows(&table.rows, |row, n| self.mapper.map_class(row, n))?;
        self.validator.check_unique(
            COL_CLASS_ID,
            classes
                .iter()
                .enumerate()
                .map(|(i, c)| (i + 1, c.class_id.as_str())),
        )?;

        let roster = self.teacher_repo.find_all()?;
        let known: Vec<&str> = roster.iter().map(|t| t.teacher_id.as_str()).collect();
        let warnings: Vec<String> = self
            .validator
            .dangling_references(&known, classes.iter().map(|c| c.teacher_id.as_str()))
            .into_iter()
            .map(|id| format!("home teacher {} is not on the staff roster", id))
            .collect();

        let imported = self.class_repo.replace_all(&classes)?;
        Ok(self.finish(ImportKind::Classes, table.rows.len(), imported, warnings, started))
    }

    fn finish(
        &self,
        kind: ImportKind,
        rows_read: usize,
        rows_imported: usize,
        warnings: Vec<String>,
        started: Instant,
    ) -> ImportSummary {
        let batch_id = Uuid::new_v4().to_string();
        for w in &warnings {
            warn!(batch_id = %batch_id, "{}", w);
        }
        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            batch_id = %batch_id,
            kind = ?kind,
            rows_read,
            rows_imported,
            elapsed_ms,
            "roster import finished"
        );

        ImportSummary {
            batch_id,
            kind,
            rows_read,
            rows_imported,
            warnings,
            elapsed_ms,
        }
    }
}

/// Map every row, numbering data rows from 1
fn map_rows<T, F>(rows: &[RawRow], mut f: F) -> ImportResult<Vec<T>>
where
    F: FnMut(&RawRow, usize) -> ImportResult<T>,
{
    rows.iter()
        .enumerate()
        .map(|(idx, row)| f(row, idx + 1))
        .collect()
}
