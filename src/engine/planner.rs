// ==========================================
// Marking Maestro - Allocation planner
// ==========================================
// Single deterministic greedy pass per task. No backtracking.
// ==========================================
// Rules (order matters):
// 1) single-class course: the class's home teacher marks it
//    (self-marking is the only option and is accepted)
// 2) multi-class course: per class in listing order, the first ranked
//    candidate who does not own the class and is not yet assigned;
//    a class with no such candidate stays unassigned (no revisit)
// 3) top-up: while assigned < markers_required and an unassigned candidate
//    remains, the best-ranked one takes the first class it does not own,
//    else its own first class (last-resort self-marking)
// 4) every pair becomes an Allocation over the marking window, "Not Started"
// ==========================================

use crate::domain::allocation::Allocation;
use crate::domain::class::Class;
use crate::domain::task::Task;
use crate::domain::teacher::Teacher;
use crate::domain::types::{ClassId, TaskStatus, TeacherId};
use crate::engine::eligibility::MarkerCandidate;
use crate::engine::marking_window::MarkingWindow;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

/// Which rule produced a pair; logged with every assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignReason {
    SingleClassHomeTeacher,
    CrossMarking,
    TopUp,
    TopUpSelfMarking,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkingPair {
    pub teacher_id: TeacherId,
    pub class_id: ClassId,
    pub reason: AssignReason,
}

// ==========================================
// AllocationPlanner
// ==========================================
#[derive(Debug, Default)]
pub struct AllocationPlanner {
    // stateless
}

impl AllocationPlanner {
    pub fn new() -> Self {
        Self {}
    }

    /// Plan the (teacher, class) pairs for one task.
    ///
    /// # Arguments
    /// - `task`: provides `markers_required`
    /// - `course_classes`: classes of the task's course in listing order
    /// - `candidates`: ranked pool from `EligibilityRanker`
    /// - `roster`: used only to confirm the single-class home teacher exists
    ///
    /// # Returns
    /// Pairs in emission order. Length is ideally
    /// max(classes, markers_required) but may be shorter when candidates run out.
    #[instrument(skip_all, fields(
        task_id = %task.task_id,
        classes = course_classes.len(),
        candidates = candidates.len(),
        markers_required = task.markers_required
    ))]
    pub fn plan(
        &self,
        task: &Task,
        course_classes: &[&Class],
        candidates: &[MarkerCandidate],
        roster: &HashMap<TeacherId, Teacher>,
    ) -> Vec<MarkingPair> {
        let mut pairs: Vec<MarkingPair> = Vec::new();
        let mut assigned: HashSet<&TeacherId> = HashSet::new();

        match course_classes {
            [] => return pairs,
            [only] => {
                // Step 1: forced self-marking, leave status not consulted
                if roster.contains_key(&only.teacher_id) {
                    assigned.insert(&only.teacher_id);
                    pairs.push(MarkingPair {
                        teacher_id: only.teacher_id.clone(),
                        class_id: only.class_id.clone(),
                        reason: AssignReason::SingleClassHomeTeacher,
                    });
                } else {
                    debug!(class_id = %only.class_id, "single-class home teacher missing, no assignment");
                }
            }
            _ => {
                // Step 2: cross-marking
                for class in course_classes {
                    let pick = candidates.iter().find(|c| {
                        !c.owns(&class.class_id) && !assigned.contains(&c.teacher_id)
                    });
                    match pick {
                        Some(candidate) => {
                            assigned.insert(&candidate.teacher_id);
                            pairs.push(MarkingPair {
                                teacher_id: candidate.teacher_id.clone(),
                                class_id: class.class_id.clone(),
                                reason: AssignReason::CrossMarking,
                            });
                        }
                        None => {
                            debug!(class_id = %class.class_id, "no eligible marker, class left unassigned");
                        }
                    }
                }
            }
        }

        // Step 3: top-up
        let required = task.markers_required as usize;
        while pairs.len() < required {
            let Some(candidate) = candidates
                .iter()
                .find(|c| !assigned.contains(&c.teacher_id))
            else {
                debug!(
                    assigned = pairs.len(),
                    required, "candidates exhausted below markers_required"
                );
                break;
            };

            let other_class = course_classes
                .iter()
                .find(|class| !candidate.owns(&class.class_id))
                .map(|class| (class.class_id.clone(), AssignReason::TopUp));
            let target = other_class.or_else(|| {
                candidate
                    .own_classes
                    .first()
                    .map(|class_id| (class_id.clone(), AssignReason::TopUpSelfMarking))
            });

            assigned.insert(&candidate.teacher_id);
            if let Some((class_id, reason)) = target {
                pairs.push(MarkingPair {
                    teacher_id: candidate.teacher_id.clone(),
                    class_id,
                    reason,
                });
            }
        }

        for pair in &pairs {
            debug!(
                teacher_id = %pair.teacher_id,
                class_id = %pair.class_id,
                reason = ?pair.reason,
                "marker assigned"
            );
        }
        pairs
    }

    /// Turn planned pairs into allocation records (step 4).
    pub fn to_allocations(&self, task: &Task, pairs: &[MarkingPair]) -> Vec<Allocation> {
        let window = MarkingWindow::for_due_date(task.due_date);
        pairs
            .iter()
            .map(|pair| Allocation {
                allocation_id: None,
                task_id: task.task_id.clone(),
                teacher_id: pair.teacher_id.clone(),
                class_id: pair.class_id.clone(),
                start_date: window.start,
                end_date: window.end,
                status: TaskStatus::NotStarted,
            })
            .collect()
    }
}
