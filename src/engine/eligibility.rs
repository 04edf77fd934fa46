// ==========================================
// Marking Maestro - Eligibility ranker
// ==========================================
// Input: task + classes of its course + teacher roster
// Output: candidate pool ordered by teaching load (ascending)
// Rules:
// 1) candidates are the home teachers of the course's classes
// 2) a home teacher on leave during the marking window is excluded
//    from the whole pool for this task
// 3) load = number of own classes within this course
// 4) ties keep first-seen order in the class listing (stable sort)
// ==========================================

use crate::domain::class::Class;
use crate::domain::task::Task;
use crate::domain::teacher::Teacher;
use crate::domain::types::{ClassId, TeacherId};
use crate::engine::availability::AvailabilityChecker;
use crate::engine::marking_window::MarkingWindow;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument, warn};

// ==========================================
// MarkerCandidate - one entry of the ranked pool
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerCandidate {
    pub teacher_id: TeacherId,
    /// Home-teacher classes within this course, in listing order (never empty)
    pub own_classes: Vec<ClassId>,
}

impl MarkerCandidate {
    /// Teaching load measure for this task
    pub fn load(&self) -> usize {
        self.own_classes.len()
    }

    pub fn owns(&self, class_id: &ClassId) -> bool {
        self.own_classes.contains(class_id)
    }
}

// ==========================================
// EligibilityRanker
// ==========================================
pub struct EligibilityRanker {
    availability: AvailabilityChecker,
}

impl EligibilityRanker {
    pub fn new(availability: AvailabilityChecker) -> Self {
        Self { availability }
    }

    /// Build the ordered candidate pool for one task.
    ///
    /// # Arguments
    /// - `task`: task being allocated (provides the marking window)
    /// - `course_classes`: every class sharing the task's course, in listing order
    /// - `roster`: teachers by identifier
    ///
    /// # Returns
    /// Candidates sorted by load ascending; empty when the course has no
    /// classes or every home teacher is on leave.
    #[instrument(skip_all, fields(task_id = %task.task_id, classes = course_classes.len()))]
    pub fn rank(
        &self,
        task: &Task,
        course_classes: &[&Class],
        roster: &HashMap<TeacherId, Teacher>,
    ) -> Vec<MarkerCandidate> {
        let window = MarkingWindow::for_due_date(task.due_date);

        // Own-class lists computed once per teacher
        let mut own_classes: HashMap<&TeacherId, Vec<ClassId>> = HashMap::new();
        for class in course_classes {
            own_classes
                .entry(&class.teacher_id)
                .or_default()
                .push(class.class_id.clone());
        }

        let mut seen: HashSet<&TeacherId> = HashSet::new();
        let mut candidates = Vec::new();

        for class in course_classes {
            let teacher_id = &class.teacher_id;
            if !seen.insert(teacher_id) {
                continue;
            }

            let Some(teacher) = roster.get(teacher_id) else {
                warn!(
                    class_id = %class.class_id,
                    teacher_id = %teacher_id,
                    "home teacher not in roster, skipped"
                );
                continue;
            };

            if self.availability.is_unavailable(teacher, &window) {
                debug!(teacher_id = %teacher_id, "home teacher on leave during marking window, excluded");
                continue;
            }

            candidates.push(MarkerCandidate {
                teacher_id: teacher_id.clone(),
                own_classes: own_classes.get(teacher_id).cloned().unwrap_or_default(),
            });
        }

        // Vec::sort_by_key is stable: equal loads keep first-seen order
        candidates.sort_by_key(MarkerCandidate::load);
        candidates
    }
}

impl Default for EligibilityRanker {
    fn default() -> Self {
        Self::new(AvailabilityChecker::new())
    }
}
