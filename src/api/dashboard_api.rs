// ==========================================
// Marking Maestro - Dashboard API
// ==========================================
// Responsibility: roll-up statistics and per-teacher reports
// Window and list sizes come from ReportConfigReader.
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ReportConfigReader;
use crate::domain::task::Task;
use crate::domain::teacher::Teacher;
use crate::domain::types::{ClassId, TaskId, TaskStatus, TeacherId};
use crate::engine::marking_deadline;
use crate::repository::{
    AllocationRepository, ClassRepository, ProgressFilter, ProgressRepository, TaskRepository,
    TeacherRepository,
};
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Teacher loads shown on the dashboard
pub const TEACHER_LOAD_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherLoad {
    pub teacher: Teacher,
    pub task_count: usize,
    pub student_count: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatistics {
    pub total_teachers: usize,
    pub total_tasks: usize,
    pub total_classes: usize,
    pub total_allocations: usize,
    pub tasks_by_status: BTreeMap<String, usize>,
    pub upcoming_tasks: Vec<Task>,
    pub teacher_loads: Vec<TeacherLoad>,
}

/// One allocation line of a teacher report
#[derive(Debug, Clone, Serialize)]
pub struct TeacherReportRow {
    pub allocation_id: Option<i64>,
    pub task_id: TaskId,
    pub task_name: String,
    pub course: String,
    pub class_id: ClassId,
    pub class_name: String,
    pub student_count: u32,
    pub due_date: NaiveDateTime,
    pub marking_deadline: NaiveDateTime,
    pub status: TaskStatus,
    pub completion_percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeacherReport {
    pub teacher: Teacher,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub in_progress_tasks: usize,
    pub pending_tasks: usize,
    pub total_students: u64,
    /// Mean completion over the rows, rounded to a whole percent
    pub average_progress: f64,
    pub rows: Vec<TeacherReportRow>,
}

pub struct DashboardApi {
    teacher_repo: Arc<TeacherRepository>,
    task_repo: Arc<TaskRepository>,
    class_repo: Arc<ClassRepository>,
    allocation_repo: Arc<AllocationRepository>,
    progress_repo: Arc<ProgressRepository>,
    config: Arc<dyn ReportConfigReader>,
}

impl DashboardApi {
    pub fn new(
        teacher_repo: Arc<TeacherRepository>,
        task_repo: Arc<TaskRepository>,
        class_repo: Arc<ClassRepository>,
        allocation_repo: Arc<AllocationRepository>,
        progress_repo: Arc<ProgressRepository>,
        config: Arc<dyn ReportConfigReader>,
    ) -> Self {
        Self {
            teacher_repo,
            task_repo,
            class_repo,
            allocation_repo,
            progress_repo,
            config,
        }
    }

    /// Dashboard roll-up at `now`
    ///
    /// - tasks_by_status always lists every status, zero included
    /// - upcoming: due in [now, now + window], earliest first, truncated
    /// - teacher loads: allocations and students marked, most students first
    pub async fn get_statistics(&self, now: NaiveDateTime) -> ApiResult<DashboardStatistics> {
        let window_days = self
            .config
            .get_upcoming_window_days()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        let upcoming_limit = self
            .config
            .get_upcoming_task_limit()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        let teachers = self.teacher_repo.find_all()?;
        let tasks = self.task_repo.find_all()?;
        let classes = self.class_repo.find_all()?;
        let allocations = self.allocation_repo.find_all()?;

        let mut tasks_by_status: BTreeMap<String, usize> = TaskStatus::ALL
            .iter()
            .map(|s| (s.as_str().to_string(), 0))
            .collect();
        for task in &tasks {
            *tasks_by_status
                .entry(task.status.as_str().to_string())
                .or_insert(0) += 1;
        }

        let horizon = Duration::try_days(window_days)
            .and_then(|window| now.checked_add_signed(window))
            .ok_or_else(|| {
                ApiError::ConfigError(format!(
                    "upcoming window of {} days is out of range",
                    window_days
                ))
            })?;
        let mut upcoming_tasks: Vec<Task> = tasks
            .iter()
            .filter(|t| t.due_date >= now && t.due_date <= horizon)
            .cloned()
            .collect();
        upcoming_tasks.sort_by_key(|t| t.due_date);
        upcoming_tasks.truncate(upcoming_limit);

        let students: HashMap<&ClassId, u32> = classes
            .iter()
            .map(|c| (&c.class_id, c.student_count))
            .collect();
        let mut per_teacher: HashMap<&TeacherId, (usize, u64)> = HashMap::new();
        for allocation in &allocations {
            let entry = per_teacher.entry(&allocation.teacher_id).or_default();
            entry.0 += 1;
            entry.1 += students.get(&allocation.class_id).copied().unwrap_or(0) as u64;
        }

        let mut teacher_loads: Vec<TeacherLoad> = teachers
            .iter()
            .map(|t| {
                let (task_count, student_count) =
                    per_teacher.get(&t.teacher_id).copied().unwrap_or((0, 0));
                TeacherLoad {
                    teacher: t.clone(),
                    task_count,
                    student_count,
                }
            })
            .collect();
        teacher_loads.sort_by(|a, b| b.student_count.cmp(&a.student_count));
        teacher_loads.truncate(TEACHER_LOAD_LIMIT);

        Ok(DashboardStatistics {
            total_teachers: teachers.len(),
            total_tasks: tasks.len(),
            total_classes: classes.len(),
            total_allocations: allocations.len(),
            tasks_by_status,
            upcoming_tasks,
            teacher_loads,
        })
    }

    /// Everything one teacher has been allocated, with progress
    pub fn teacher_report(&self, teacher_id: &TeacherId) -> ApiResult<TeacherReport> {
        let teacher = self
            .teacher_repo
            .find_by_id(teacher_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Teacher (id={})", teacher_id)))?;

        let tasks: HashMap<TaskId, Task> = self
            .task_repo
            .find_all()?
            .into_iter()
            .map(|t| (t.task_id.clone(), t))
            .collect();
        let classes: HashMap<ClassId, (String, u32)> = self
            .class_repo
            .find_all()?
            .into_iter()
            .map(|c| (c.class_id, (c.name, c.student_count)))
            .collect();
        let progress: HashMap<(TaskId, ClassId), f64> = self
            .progress_repo
            .find_filtered(&ProgressFilter {
                teacher_id: Some(teacher_id.clone()),
                ..Default::default()
            })?
            .into_iter()
            .map(|r| ((r.task_id, r.class_id), r.completion_percentage))
            .collect();

        let rows: Vec<TeacherReportRow> = self
            .allocation_repo
            .find_by_teacher(teacher_id)?
            .into_iter()
            .filter_map(|a| {
                let task = tasks.get(&a.task_id)?;
                let (class_name, student_count) = classes
                    .get(&a.class_id)
                    .cloned()
                    .unwrap_or_else(|| (a.class_id.to_string(), 0));
                let completion_percentage = progress
                    .get(&(a.task_id.clone(), a.class_id.clone()))
                    .copied()
                    .unwrap_or(0.0);

                Some(TeacherReportRow {
                    allocation_id: a.allocation_id,
                    task_name: task.name.clone(),
                    course: task.course.clone(),
                    due_date: task.due_date,
                    marking_deadline: marking_deadline(task.due_date),
                    task_id: a.task_id,
                    class_id: a.class_id,
                    class_name,
                    student_count,
                    status: a.status,
                    completion_percentage,
                })
            })
            .collect();

        let count = |status: TaskStatus| rows.iter().filter(|r| r.status == status).count();
        let average_progress = if rows.is_empty() {
            0.0
        } else {
            (rows.iter().map(|r| r.completion_percentage).sum::<f64>() / rows.len() as f64).round()
        };

        Ok(TeacherReport {
            teacher,
            total_tasks: rows.len(),
            completed_tasks: count(TaskStatus::Completed),
            in_progress_tasks: count(TaskStatus::InProgress),
            pending_tasks: count(TaskStatus::NotStarted),
            total_students: rows.iter().map(|r| r.student_count as u64).sum(),
            average_progress,
            rows,
        })
    }
}
