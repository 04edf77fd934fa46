// ==========================================
// Marking Maestro - Field mapper
// ==========================================
// Responsibility: source column -> domain field + type conversion
// Column lookup is case-insensitive on the trimmed header.
// ==========================================

use crate::domain::class::Class;
use crate::domain::task::Task;
use crate::domain::teacher::Teacher;
use crate::domain::types::{ClassId, TaskId, TaskStatus, TeacherId};
use crate::engine::leave_parser::parse_date;
use crate::engine::marking_window::MARKING_PERIOD_DAYS;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{RawRow, RawTable};
use chrono::{Duration, NaiveDate, NaiveDateTime};

// ===== Staff file =====
pub const COL_TEACHER_ID: &str = "Teacher ID";
pub const COL_NAME: &str = "Name";
pub const COL_EMAIL: &str = "Email";
pub const COL_LEAVE_DATES: &str = "Leave Dates";
pub const COL_CLASS_ALLOCATIONS: &str = "Class Allocations";

// ===== Tasks file =====
pub const COL_TASK_ID: &str = "Task ID";
pub const COL_TASK_NAME: &str = "Task Name";
pub const COL_COURSE: &str = "Course";
pub const COL_YEAR_GROUP: &str = "Year Group";
pub const COL_DUE_DATE: &str = "Due Date";
pub const COL_MARKERS_REQUIRED: &str = "Number of Markers Required";

// ===== Classes file =====
pub const COL_CLASS_ID: &str = "Class ID";
pub const COL_CLASS_NAME: &str = "Class Name";
pub const COL_STUDENT_COUNT: &str = "Student Count";

pub const STAFF_REQUIRED_COLUMNS: &[&str] = &[COL_TEACHER_ID, COL_NAME, COL_EMAIL];
pub const TASK_REQUIRED_COLUMNS: &[&str] = &[
    COL_TASK_ID,
    COL_TASK_NAME,
    COL_COURSE,
    COL_YEAR_GROUP,
    COL_DUE_DATE,
    COL_MARKERS_REQUIRED,
];
pub const CLASS_REQUIRED_COLUMNS: &[&str] = &[
    COL_CLASS_ID,
    COL_CLASS_NAME,
    COL_COURSE,
    COL_YEAR_GROUP,
    COL_TEACHER_ID,
    COL_STUDENT_COUNT,
];

/// Excel stores dates as days since 1899-12-30
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

pub struct FieldMapper;

impl FieldMapper {
    /// Fail fast when the header line lacks required columns
    pub fn check_columns(&self, table: &RawTable, required: &[&str]) -> ImportResult<()> {
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|col| !table.has_header(col))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ImportError::MissingColumns(missing.join(", ")))
        }
    }

    pub fn map_teacher(&self, row: &RawRow, row_number: usize) -> ImportResult<Teacher> {
        Ok(Teacher {
            teacher_id: TeacherId::new(self.require(row, COL_TEACHER_ID, row_number)?),
            name: self.require(row, COL_NAME, row_number)?,
            email: self.get_string(row, COL_EMAIL).unwrap_or_default(),
            leave_dates: self.get_string(row, COL_LEAVE_DATES).unwrap_or_default(),
            class_allocations: self
                .get_string(row, COL_CLASS_ALLOCATIONS)
                .unwrap_or_default(),
        })
    }

    /// Imported tasks always start "Not Started"
    pub fn map_task(&self, row: &RawRow, row_number: usize) -> ImportResult<Task> {
        Ok(Task {
            task_id: TaskId::new(self.require(row, COL_TASK_ID, row_number)?),
            name: self.require(row, COL_TASK_NAME, row_number)?,
            course: self.require(row, COL_COURSE, row_number)?,
            year_group: self.require(row, COL_YEAR_GROUP, row_number)?,
            due_date: self.parse_due_date(row, COL_DUE_DATE, row_number)?,
            markers_required: self.parse_count(row, COL_MARKERS_REQUIRED, row_number)?,
            status: TaskStatus::NotStarted,
        })
    }

    pub fn map_class(&self, row: &RawRow, row_number: usize) -> ImportResult<Class> {
        Ok(Class {
            class_id: ClassId::new(self.require(row, COL_CLASS_ID, row_number)?),
            name: self.require(row, COL_CLASS_NAME, row_number)?,
            course: self.require(row, COL_COURSE, row_number)?,
            year_group: self.require(row, COL_YEAR_GROUP, row_number)?,
            teacher_id: TeacherId::new(self.require(row, COL_TEACHER_ID, row_number)?),
            student_count: self.parse_count(row, COL_STUDENT_COUNT, row_number)?,
        })
    }

    /// Non-empty trimmed value for a column, if any
    fn get_string(&self, row: &RawRow, key: &str) -> Option<String> {
        row.iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn require(&self, row: &RawRow, key: &str, row_number: usize) -> ImportResult<String> {
        self.get_string(row, key)
            .ok_or_else(|| ImportError::MissingValue {
                row: row_number,
                field: key.to_string(),
            })
    }

    /// Non-negative whole number; Excel's "3.0" is accepted
    fn parse_count(&self, row: &RawRow, key: &str, row_number: usize) -> ImportResult<u32> {
        let value = self.require(row, key, row_number)?;
        if let Ok(n) = value.parse::<u32>() {
            return Ok(n);
        }

        match value.parse::<f64>() {
            Ok(f) if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => Ok(f as u32),
            _ => Err(ImportError::TypeConversionError {
                row: row_number,
                field: key.to_string(),
                message: format!("expected a non-negative whole number, got {}", value),
            }),
        }
    }

    /// Datetime, plain date (midnight) or Excel serial date
    fn parse_due_date(
        &self,
        row: &RawRow,
        key: &str,
        row_number: usize,
    ) -> ImportResult<NaiveDateTime> {
        let value = self.require(row, key, row_number)?;

        const DATETIME_FORMATS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%d %H:%M",
        ];
        let parsed = DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(&value, fmt).ok())
            .or_else(|| parse_date(&value).map(|date| date.and_time(chrono::NaiveTime::MIN)))
            .or_else(|| excel_serial_to_datetime(&value))
            // the marking deadline must stay representable
            .filter(|due| {
                due.checked_add_signed(Duration::days(MARKING_PERIOD_DAYS))
                    .is_some()
            });

        parsed.ok_or_else(|| ImportError::DateFormatError {
            row: row_number,
            field: key.to_string(),
            value,
        })
    }
}

fn excel_serial_to_datetime(value: &str) -> Option<NaiveDateTime> {
    let serial = value.parse::<f64>().ok()?;
    if !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    let (y, m, d) = EXCEL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?.and_time(chrono::NaiveTime::MIN);
    let seconds = (serial * 86_400.0).round() as i64;
    epoch.checked_add_signed(Duration::seconds(seconds))
}
