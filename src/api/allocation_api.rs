// ==========================================
// Marking Maestro - Allocation API
// ==========================================
// Responsibility: run the allocation engine over the stored roster and
// persist the result; manual edits of single allocations.
// A run is all-or-nothing: the previous allocation set survives any
// failure.
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::allocation::{Allocation, AllocationPatch, AllocationRunLog};
use crate::domain::types::{TaskId, TeacherId};
use crate::engine::{AllocationEngine, RosterSnapshot, TaskAllocationOutcome};
use crate::repository::{
    AllocationRepository, ClassRepository, TaskRepository, TeacherRepository,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Result of one persisted allocation run
#[derive(Debug, Clone, Serialize)]
pub struct AllocationRunReport {
    pub run_id: String,
    pub tasks_total: usize,
    pub tasks_skipped: usize,
    pub tasks_under_allocated: usize,
    pub allocations: Vec<Allocation>,
    pub task_outcomes: Vec<TaskAllocationOutcome>,
}

pub struct AllocationApi {
    teacher_repo: Arc<TeacherRepository>,
    task_repo: Arc<TaskRepository>,
    class_repo: Arc<ClassRepository>,
    allocation_repo: Arc<AllocationRepository>,
    engine: AllocationEngine,
}

impl AllocationApi {
    pub fn new(
        teacher_repo: Arc<TeacherRepository>,
        task_repo: Arc<TaskRepository>,
        class_repo: Arc<ClassRepository>,
        allocation_repo: Arc<AllocationRepository>,
    ) -> Self {
        Self {
            teacher_repo,
            task_repo,
            class_repo,
            allocation_repo,
            engine: AllocationEngine::new(),
        }
    }

    /// Regenerate every allocation from the current roster
    ///
    /// # Returns
    /// - Ok(AllocationRunReport): stored allocations (with ids) and per-task outcomes
    /// - Err(ApiError): nothing was changed
    #[instrument(skip(self))]
    pub fn run_allocation(&self) -> ApiResult<AllocationRunReport> {
        let started_at = Utc::now().naive_utc();
        let run_id = Uuid::new_v4().to_string();

        let snapshot = RosterSnapshot {
            teachers: self.teacher_repo.find_all()?,
            tasks: self.task_repo.find_all()?,
            classes: self.class_repo.find_all()?,
        };

        let result = self.engine.allocate(&snapshot);

        let run_log = AllocationRunLog {
            run_id: run_id.clone(),
            started_at,
            finished_at: Utc::now().naive_utc(),
            tasks_total: snapshot.tasks.len(),
            tasks_skipped: result.tasks_skipped(),
            tasks_under_allocated: result.tasks_under_allocated(),
            allocations_count: result.allocations.len(),
        };

        let stored = self
            .allocation_repo
            .replace_all(&result.allocations, &run_log)?;

        info!(
            run_id = %run_id,
            allocations = stored.len(),
            tasks_skipped = run_log.tasks_skipped,
            tasks_under_allocated = run_log.tasks_under_allocated,
            "allocation run persisted"
        );

        Ok(AllocationRunReport {
            run_id,
            tasks_total: run_log.tasks_total,
            tasks_skipped: run_log.tasks_skipped,
            tasks_under_allocated: run_log.tasks_under_allocated,
            allocations: stored,
            task_outcomes: result.task_outcomes,
        })
    }

    pub fn list_allocations(&self) -> ApiResult<Vec<Allocation>> {
        Ok(self.allocation_repo.find_all()?)
    }

    pub fn list_allocations_by_task(&self, task_id: &TaskId) -> ApiResult<Vec<Allocation>> {
        Ok(self.allocation_repo.find_by_task(task_id)?)
    }

    pub fn list_allocations_by_teacher(
        &self,
        teacher_id: &TeacherId,
    ) -> ApiResult<Vec<Allocation>> {
        Ok(self.allocation_repo.find_by_teacher(teacher_id)?)
    }

    pub fn recent_runs(&self, limit: usize) -> ApiResult<Vec<AllocationRunLog>> {
        Ok(self.allocation_repo.find_run_logs(limit)?)
    }

    /// Manual reassignment / rescheduling of one allocation
    ///
    /// # Errors
    /// - InvalidInput: empty patch, unknown teacher, end before start
    /// - NotFound: no such allocation
    #[instrument(skip(self, patch))]
    pub fn update_allocation(
        &self,
        allocation_id: i64,
        patch: &AllocationPatch,
    ) -> ApiResult<Allocation> {
        if patch.is_empty() {
            return Err(ApiError::InvalidInput("nothing to update".to_string()));
        }

        if let Some(teacher_id) = &patch.teacher_id {
            if self.teacher_repo.find_by_id(teacher_id)?.is_none() {
                return Err(ApiError::InvalidInput(format!(
                    "unknown teacher {}",
                    teacher_id
                )));
            }
        }

        let mut allocation = self
            .allocation_repo
            .find_by_id(allocation_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Allocation (id={})", allocation_id)))?;

        patch.apply(&mut allocation);
        if allocation.end_date < allocation.start_date {
            return Err(ApiError::InvalidInput(
                "end date is before start date".to_string(),
            ));
        }

        self.allocation_repo.update(&allocation)?;
        info!(allocation_id, teacher_id = %allocation.teacher_id, "allocation updated");
        Ok(allocation)
    }

    pub fn delete_allocation(&self, allocation_id: i64) -> ApiResult<()> {
        if !self.allocation_repo.delete(allocation_id)? {
            return Err(ApiError::NotFound(format!(
                "Allocation (id={})",
                allocation_id
            )));
        }
        info!(allocation_id, "allocation deleted");
        Ok(())
    }
}
