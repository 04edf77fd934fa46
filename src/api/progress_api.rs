// ==========================================
// Marking Maestro - Marking progress API
// ==========================================
// Responsibility: progress rows joined with roster data, summaries,
// Gantt timeline rows.
// `now` is always passed in so reports are reproducible.
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::class::Class;
use crate::domain::progress::{ProgressRecord, ProgressUpdate};
use crate::domain::task::Task;
use crate::domain::teacher::Teacher;
use crate::domain::types::{ClassId, TaskId, TaskStatus, TeacherId};
use crate::engine::{is_overdue, marking_deadline, GanttFilter, TaskProgressSummary, TeacherProgressSummary};
use crate::repository::{
    AllocationRepository, ClassRepository, ProgressFilter, ProgressRepository, TaskRepository,
    TeacherRepository,
};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// One progress row with display fields
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEntryView {
    pub progress_id: i64,
    pub task_id: TaskId,
    pub task_name: String,
    pub course: String,
    pub teacher_id: TeacherId,
    pub teacher_name: String,
    pub class_id: ClassId,
    pub class_name: String,
    pub status: TaskStatus,
    pub completion_percentage: f64,
    pub comments: Option<String>,
    pub estimated_completion_date: Option<NaiveDateTime>,
    pub last_updated: NaiveDateTime,
    pub due_date: NaiveDateTime,
    pub marking_deadline: NaiveDateTime,
    pub is_overdue: bool,
}

/// One bar of the marking timeline
#[derive(Debug, Clone, Serialize)]
pub struct GanttRow {
    pub allocation_id: Option<i64>,
    pub task_id: TaskId,
    pub task_name: String,
    pub course: String,
    pub year_group: String,
    pub teacher_id: TeacherId,
    pub teacher_name: String,
    pub class_id: ClassId,
    pub class_name: String,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub status: TaskStatus,
    pub completion_percentage: f64,
}

/// Lookup tables for one request
struct RosterIndex {
    teachers: HashMap<TeacherId, Teacher>,
    tasks: HashMap<TaskId, Task>,
    classes: HashMap<ClassId, Class>,
}

impl RosterIndex {
    fn teacher_name(&self, id: &TeacherId) -> String {
        self.teachers
            .get(id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    fn class_name(&self, id: &ClassId) -> String {
        self.classes
            .get(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| id.to_string())
    }
}

pub struct ProgressApi {
    teacher_repo: Arc<TeacherRepository>,
    task_repo: Arc<TaskRepository>,
    class_repo: Arc<ClassRepository>,
    allocation_repo: Arc<AllocationRepository>,
    progress_repo: Arc<ProgressRepository>,
}

impl ProgressApi {
    pub fn new(
        teacher_repo: Arc<TeacherRepository>,
        task_repo: Arc<TaskRepository>,
        class_repo: Arc<ClassRepository>,
        allocation_repo: Arc<AllocationRepository>,
        progress_repo: Arc<ProgressRepository>,
    ) -> Self {
        Self {
            teacher_repo,
            task_repo,
            class_repo,
            allocation_repo,
            progress_repo,
        }
    }

    fn load_index(&self) -> ApiResult<RosterIndex> {
        Ok(RosterIndex {
            teachers: self
                .teacher_repo
                .find_all()?
                .into_iter()
                .map(|t| (t.teacher_id.clone(), t))
                .collect(),
            tasks: self
                .task_repo
                .find_all()?
                .into_iter()
                .map(|t| (t.task_id.clone(), t))
                .collect(),
            classes: self
                .class_repo
                .find_all()?
                .into_iter()
                .map(|c| (c.class_id.clone(), c))
                .collect(),
        })
    }

    /// Create progress rows for allocations that have none yet
    ///
    /// # Returns
    /// Number of rows created
    #[instrument(skip(self))]
    pub fn sync_progress(&self, now: NaiveDateTime) -> ApiResult<usize> {
        let allocations = self.allocation_repo.find_all()?;
        let created = self.progress_repo.ensure_for_allocations(&allocations, now)?;
        info!(allocations = allocations.len(), created, "progress rows synced");
        Ok(created)
    }

    /// Progress rows joined with task/teacher/class data
    ///
    /// Rows whose task no longer exists are left out.
    pub fn list_entries(
        &self,
        filter: &ProgressFilter,
        now: NaiveDateTime,
    ) -> ApiResult<Vec<ProgressEntryView>> {
        let index = self.load_index()?;
        let records = self.progress_repo.find_filtered(filter)?;

        Ok(records
            .into_iter()
            .filter_map(|record| {
                let task = index.tasks.get(&record.task_id)?;
                Some(build_view(&index, task, record, now))
            })
            .collect())
    }

    pub fn update_entry(
        &self,
        progress_id: i64,
        update: &ProgressUpdate,
        now: NaiveDateTime,
    ) -> ApiResult<ProgressRecord> {
        validate_update(update)?;
        let record = self.progress_repo.update(progress_id, update, now)?;
        info!(progress_id, status = %record.status, pct = record.completion_percentage, "progress updated");
        Ok(record)
    }

    /// Apply one patch to many rows; all or none are written
    pub fn bulk_update(
        &self,
        progress_ids: &[i64],
        update: &ProgressUpdate,
        now: NaiveDateTime,
    ) -> ApiResult<Vec<ProgressRecord>> {
        if progress_ids.is_empty() {
            return Err(ApiError::InvalidInput("no progress ids given".to_string()));
        }
        validate_update(update)?;
        let records = self.progress_repo.bulk_update(progress_ids, update, now)?;
        info!(count = records.len(), "progress bulk updated");
        Ok(records)
    }

    pub fn teacher_summary(
        &self,
        teacher_id: &TeacherId,
        now: NaiveDateTime,
    ) -> ApiResult<TeacherProgressSummary> {
        if self.teacher_repo.find_by_id(teacher_id)?.is_none() {
            return Err(ApiError::NotFound(format!("Teacher (id={})", teacher_id)));
        }

        let tasks: HashMap<TaskId, Task> = self
            .task_repo
            .find_all()?
            .into_iter()
            .map(|t| (t.task_id.clone(), t))
            .collect();
        let records = self.progress_repo.find_filtered(&ProgressFilter {
            teacher_id: Some(teacher_id.clone()),
            ..Default::default()
        })?;

        let entries: Vec<(&ProgressRecord, NaiveDateTime)> = records
            .iter()
            .filter_map(|r| tasks.get(&r.task_id).map(|t| (r, t.due_date)))
            .collect();

        Ok(TeacherProgressSummary::build(teacher_id.clone(), &entries, now))
    }

    pub fn task_summary(
        &self,
        task_id: &TaskId,
        now: NaiveDateTime,
    ) -> ApiResult<TaskProgressSummary> {
        let task = self
            .task_repo
            .find_by_id(task_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Task (id={})", task_id)))?;

        let records = self.progress_repo.find_filtered(&ProgressFilter {
            task_id: Some(task_id.clone()),
            ..Default::default()
        })?;
        let refs: Vec<&ProgressRecord> = records.iter().collect();

        Ok(TaskProgressSummary::build(&task, &refs, now))
    }

    /// Timeline rows built from allocations, sorted by start then task
    pub fn gantt_rows(&self, filter: &GanttFilter) -> ApiResult<Vec<GanttRow>> {
        let index = self.load_index()?;
        let progress: HashMap<(TaskId, TeacherId, ClassId), f64> = self
            .progress_repo
            .find_all()?
            .into_iter()
            .map(|r| ((r.task_id, r.teacher_id, r.class_id), r.completion_percentage))
            .collect();

        let mut rows: Vec<GanttRow> = self
            .allocation_repo
            .find_all()?
            .into_iter()
            .filter_map(|a| {
                let task = index.tasks.get(&a.task_id)?;
                let year_group = index
                    .classes
                    .get(&a.class_id)
                    .map(|c| c.year_group.clone())
                    .unwrap_or_else(|| task.year_group.clone());

                if !filter.matches(&a.teacher_id, &task.course, &year_group, task.due_date) {
                    return None;
                }

                let completion_percentage = progress
                    .get(&(a.task_id.clone(), a.teacher_id.clone(), a.class_id.clone()))
                    .copied()
                    .unwrap_or(0.0);

                Some(GanttRow {
                    allocation_id: a.allocation_id,
                    task_name: task.name.clone(),
                    course: task.course.clone(),
                    year_group,
                    teacher_name: index.teacher_name(&a.teacher_id),
                    class_name: index.class_name(&a.class_id),
                    task_id: a.task_id,
                    teacher_id: a.teacher_id,
                    class_id: a.class_id,
                    start_date: a.start_date,
                    end_date: a.end_date,
                    status: a.status,
                    completion_percentage,
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            a.start_date
                .cmp(&b.start_date)
                .then_with(|| a.task_id.as_str().cmp(b.task_id.as_str()))
                .then_with(|| a.class_id.as_str().cmp(b.class_id.as_str()))
        });
        Ok(rows)
    }
}

fn build_view(
    index: &RosterIndex,
    task: &Task,
    record: ProgressRecord,
    now: NaiveDateTime,
) -> ProgressEntryView {
    ProgressEntryView {
        progress_id: record.progress_id,
        task_name: task.name.clone(),
        course: task.course.clone(),
        teacher_name: index.teacher_name(&record.teacher_id),
        class_name: index.class_name(&record.class_id),
        due_date: task.due_date,
        marking_deadline: marking_deadline(task.due_date),
        is_overdue: is_overdue(task.due_date, record.status, now),
        task_id: record.task_id,
        teacher_id: record.teacher_id,
        class_id: record.class_id,
        status: record.status,
        completion_percentage: record.completion_percentage,
        comments: record.comments,
        estimated_completion_date: record.estimated_completion_date,
        last_updated: record.last_updated,
    }
}

fn validate_update(update: &ProgressUpdate) -> ApiResult<()> {
    if update.is_empty() {
        return Err(ApiError::InvalidInput("nothing to update".to_string()));
    }
    if let Some(pct) = update.completion_percentage {
        if pct.is_nan() {
            return Err(ApiError::InvalidInput(
                "completion percentage is not a number".to_string(),
            ));
        }
    }
    Ok(())
}
