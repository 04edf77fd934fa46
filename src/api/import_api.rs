// ==========================================
// Marking Maestro - Roster import API
// ==========================================
// Responsibility: file imports plus single-record staffing changes
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::class::Class;
use crate::domain::task::Task;
use crate::domain::teacher::Teacher;
use crate::domain::types::{TaskId, TaskStatus, TeacherId};
use crate::engine::LeaveParser;
use crate::importer::{ImportSummary, RosterImporter};
use crate::repository::{AllocationRepository, ClassRepository, TaskRepository, TeacherRepository};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

pub struct ImportApi {
    importer: RosterImporter,
    teacher_repo: Arc<TeacherRepository>,
    task_repo: Arc<TaskRepository>,
    class_repo: Arc<ClassRepository>,
    allocation_repo: Arc<AllocationRepository>,
}

impl ImportApi {
    pub fn new(
        teacher_repo: Arc<TeacherRepository>,
        task_repo: Arc<TaskRepository>,
        class_repo: Arc<ClassRepository>,
        allocation_repo: Arc<AllocationRepository>,
    ) -> Self {
        Self {
            importer: RosterImporter::new(
                teacher_repo.clone(),
                task_repo.clone(),
                class_repo.clone(),
            ),
            teacher_repo,
            task_repo,
            class_repo,
            allocation_repo,
        }
    }

    // ===== File imports =====

    pub fn import_staff<P: AsRef<Path>>(&self, file_path: P) -> ApiResult<ImportSummary> {
        Ok(self.importer.import_staff(file_path)?)
    }

    pub fn import_tasks<P: AsRef<Path>>(&self, file_path: P) -> ApiResult<ImportSummary> {
        Ok(self.importer.import_tasks(file_path)?)
    }

    pub fn import_classes<P: AsRef<Path>>(&self, file_path: P) -> ApiResult<ImportSummary> {
        Ok(self.importer.import_classes(file_path)?)
    }

    // ===== Roster queries =====

    pub fn list_teachers(&self) -> ApiResult<Vec<Teacher>> {
        Ok(self.teacher_repo.find_all()?)
    }

    pub fn list_tasks(&self) -> ApiResult<Vec<Task>> {
        Ok(self.task_repo.find_all()?)
    }

    pub fn list_classes(&self) -> ApiResult<Vec<Class>> {
        Ok(self.class_repo.find_all()?)
    }

    // ===== Staffing changes =====

    /// Add a teacher or replace an existing teacher's record
    pub fn upsert_teacher(&self, teacher: &Teacher) -> ApiResult<()> {
        if teacher.teacher_id.as_str().trim().is_empty() {
            return Err(ApiError::InvalidInput("teacher id is empty".to_string()));
        }
        if teacher.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("teacher name is empty".to_string()));
        }
        warn_unparsed_leave(&teacher.teacher_id, &teacher.leave_dates);

        self.teacher_repo.upsert(teacher)?;
        info!(teacher_id = %teacher.teacher_id, "teacher upserted");
        Ok(())
    }

    /// Replace a teacher's leave text; takes effect on the next allocation run
    pub fn update_leave_dates(&self, teacher_id: &TeacherId, leave_dates: &str) -> ApiResult<()> {
        warn_unparsed_leave(teacher_id, leave_dates);

        if !self.teacher_repo.update_leave_dates(teacher_id, leave_dates)? {
            return Err(ApiError::NotFound(format!("Teacher (id={})", teacher_id)));
        }
        info!(teacher_id = %teacher_id, "leave dates updated");
        Ok(())
    }

    /// Set a task's status (any transition allowed) and mirror it onto
    /// the task's allocations
    pub fn update_task_status(&self, task_id: &TaskId, status: TaskStatus) -> ApiResult<()> {
        if !self.task_repo.update_status(task_id, status)? {
            return Err(ApiError::NotFound(format!("Task (id={})", task_id)));
        }
        let allocations = self.allocation_repo.update_status_by_task(task_id, status)?;
        info!(task_id = %task_id, status = %status, allocations, "task status updated");
        Ok(())
    }
}

/// Leave text that yields no interval at all is stored anyway but flagged
fn warn_unparsed_leave(teacher_id: &TeacherId, leave_dates: &str) {
    if !leave_dates.trim().is_empty() && LeaveParser::parse(leave_dates).is_empty() {
        warn!(teacher_id = %teacher_id, leave_dates, "leave dates contain no parseable range");
    }
}
