// ==========================================
// Marking Maestro - Availability checker
// ==========================================
// Input: teacher leave text + marking window
// Output: true = unavailable (on leave during the window)
// Overlap: Ls <= We AND Le >= Ws, inclusive, at calendar-date granularity
// ==========================================

use crate::domain::teacher::{LeaveInterval, Teacher};
use crate::engine::leave_parser::LeaveParser;
use crate::engine::marking_window::MarkingWindow;

// ==========================================
// AvailabilityChecker
// ==========================================
// Stateless; the same inputs always yield the same answer.
#[derive(Debug, Default, Clone, Copy)]
pub struct AvailabilityChecker;

impl AvailabilityChecker {
    pub fn new() -> Self {
        Self
    }

    /// Whether the teacher is on leave at any point of the marking window.
    ///
    /// A missing/empty leave field, or one where every segment is malformed,
    /// means "available".
    pub fn is_unavailable(&self, teacher: &Teacher, window: &MarkingWindow) -> bool {
        if !teacher.has_leave_data() {
            return false;
        }
        let intervals = LeaveParser::parse(&teacher.leave_dates);
        Self::any_overlap(&intervals, window)
    }

    /// Overlap test over already-parsed intervals.
    pub fn any_overlap(intervals: &[LeaveInterval], window: &MarkingWindow) -> bool {
        let (ws, we) = (window.start_date(), window.end_date());
        intervals.iter().any(|leave| leave.overlaps(ws, we))
    }
}
