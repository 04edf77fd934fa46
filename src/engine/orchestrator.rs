// ==========================================
// Marking Maestro - Allocation engine (orchestrator)
// ==========================================
// Per task:
//   window -> availability filter -> eligibility ranking -> planner
// Pure function of (teachers, tasks, classes) -> allocations.
// Persistence is the caller's job (AllocationApi).
// ==========================================

use crate::domain::allocation::Allocation;
use crate::domain::class::Class;
use crate::domain::task::Task;
use crate::domain::teacher::Teacher;
use crate::domain::types::{TaskId, TeacherId};
use crate::engine::availability::AvailabilityChecker;
use crate::engine::eligibility::EligibilityRanker;
use crate::engine::planner::AllocationPlanner;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

// ==========================================
// RosterSnapshot - full input of one run
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct RosterSnapshot {
    pub teachers: Vec<Teacher>,
    pub tasks: Vec<Task>,
    pub classes: Vec<Class>,
}

/// Outcome of one task within a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskAllocationOutcome {
    pub task_id: TaskId,
    pub course_classes: usize,
    pub candidates: usize,
    pub markers_required: u32,
    pub assigned: usize,
    /// No classes share the task's course
    pub skipped_no_classes: bool,
}

impl TaskAllocationOutcome {
    /// Fewer assignments than max(classes, markers_required)
    pub fn is_under_allocated(&self) -> bool {
        !self.skipped_no_classes
            && self.assigned < self.course_classes.max(self.markers_required as usize)
    }
}

// ==========================================
// AllocationRunResult
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct AllocationRunResult {
    pub allocations: Vec<Allocation>,
    pub task_outcomes: Vec<TaskAllocationOutcome>,
}

impl AllocationRunResult {
    pub fn tasks_skipped(&self) -> usize {
        self.task_outcomes.iter().filter(|o| o.skipped_no_classes).count()
    }

    pub fn tasks_under_allocated(&self) -> usize {
        self.task_outcomes
            .iter()
            .filter(|o| o.is_under_allocated())
            .count()
    }
}

// ==========================================
// AllocationEngine
// ==========================================
pub struct AllocationEngine {
    ranker: EligibilityRanker,
    planner: AllocationPlanner,
}

impl AllocationEngine {
    pub fn new() -> Self {
        Self {
            ranker: EligibilityRanker::new(AvailabilityChecker::new()),
            planner: AllocationPlanner::new(),
        }
    }

    /// Run a full allocation over a snapshot.
    ///
    /// Tasks are processed in listing order; classes are grouped by course
    /// keeping listing order.
    #[instrument(skip_all, fields(
        teachers = snapshot.teachers.len(),
        tasks = snapshot.tasks.len(),
        classes = snapshot.classes.len()
    ))]
    pub fn allocate(&self, snapshot: &RosterSnapshot) -> AllocationRunResult {
        let roster: HashMap<TeacherId, Teacher> = snapshot
            .teachers
            .iter()
            .map(|t| (t.teacher_id.clone(), t.clone()))
            .collect();

        let mut classes_by_course: HashMap<&str, Vec<&Class>> = HashMap::new();
        for class in &snapshot.classes {
            classes_by_course
                .entry(class.course.as_str())
                .or_default()
                .push(class);
        }

        let mut result = AllocationRunResult::default();

        for task in &snapshot.tasks {
            let course_classes: &[&Class] = classes_by_course
                .get(task.course.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]);

            if course_classes.is_empty() {
                debug!(task_id = %task.task_id, course = %task.course, "course has no classes, task skipped");
                result.task_outcomes.push(TaskAllocationOutcome {
                    task_id: task.task_id.clone(),
                    course_classes: 0,
                    candidates: 0,
                    markers_required: task.markers_required,
                    assigned: 0,
                    skipped_no_classes: true,
                });
                continue;
            }

            let candidates = self.ranker.rank(task, course_classes, &roster);
            let pairs = self.planner.plan(task, course_classes, &candidates, &roster);

            let outcome = TaskAllocationOutcome {
                task_id: task.task_id.clone(),
                course_classes: course_classes.len(),
                candidates: candidates.len(),
                markers_required: task.markers_required,
                assigned: pairs.len(),
                skipped_no_classes: false,
            };
            if outcome.is_under_allocated() {
                debug!(
                    task_id = %task.task_id,
                    assigned = outcome.assigned,
                    classes = outcome.course_classes,
                    markers_required = outcome.markers_required,
                    "task under-allocated"
                );
            }

            result
                .allocations
                .extend(self.planner.to_allocations(task, &pairs));
            result.task_outcomes.push(outcome);
        }

        info!(
            allocations = result.allocations.len(),
            tasks_skipped = result.tasks_skipped(),
            tasks_under_allocated = result.tasks_under_allocated(),
            "allocation run computed"
        );

        result
    }
}

impl Default for AllocationEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::TaskStatus;
    use chrono::NaiveDate;

    fn task(id: &str, course: &str, markers_required: u32) -> Task {
        Task {
            task_id: id.into(),
            name: format!("{} task", course),
            course: course.to_string(),
            year_group: "Year 10".to_string(),
            due_date: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            markers_required,
            status: TaskStatus::NotStarted,
        }
    }

    fn class(id: &str, course: &str, teacher: &str) -> Class {
        Class {
            class_id: id.into(),
            name: id.to_string(),
            course: course.to_string(),
            year_group: "Year 10".to_string(),
            teacher_id: teacher.into(),
            student_count: 20,
        }
    }

    #[test]
    fn test_task_without_classes_is_skipped() {
        let snapshot = RosterSnapshot {
            teachers: vec![Teacher::new("T1", "A")],
            tasks: vec![task("K1", "Chemistry", 2)],
            classes: vec![class("C1", "Biology", "T1")],
        };

        let result = AllocationEngine::new().allocate(&snapshot);

        assert!(result.allocations.is_empty());
        assert_eq!(result.tasks_skipped(), 1);
        assert_eq!(result.tasks_under_allocated(), 0);
    }

    #[test]
    fn test_tasks_are_independent() {
        // The same teacher can mark across tasks.
        let snapshot = RosterSnapshot {
            teachers: vec![Teacher::new("T1", "A"), Teacher::new("T2", "B")],
            tasks: vec![task("K1", "Biology", 2), task("K2", "Biology", 2)],
            classes: vec![class("C1", "Biology", "T1"), class("C2", "Biology", "T2")],
        };

        let result = AllocationEngine::new().allocate(&snapshot);

        assert_eq!(result.allocations.len(), 4);
        let k2: Vec<_> = result
            .allocations
            .iter()
            .filter(|a| a.task_id.as_str() == "K2")
            .map(|a| (a.class_id.as_str(), a.teacher_id.as_str()))
            .collect();
        assert_eq!(k2, vec![("C1", "T2"), ("C2", "T1")]);
    }

    #[test]
    fn test_under_allocation_is_reported_not_failed() {
        let snapshot = RosterSnapshot {
            teachers: vec![Teacher::new("T1", "A")],
            tasks: vec![task("K1", "Latin", 3)],
            classes: vec![class("L1", "Latin", "T1")],
        };

        let result = AllocationEngine::new().allocate(&snapshot);

        assert_eq!(result.allocations.len(), 1);
        assert_eq!(result.tasks_under_allocated(), 1);
    }
}
