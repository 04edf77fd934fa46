// ==========================================
// Marking Maestro - Column codecs
// ==========================================
// Datetimes are stored as ISO text "%Y-%m-%dT%H:%M:%S" (naive UTC).
// ==========================================

use crate::domain::types::TaskStatus;
use chrono::NaiveDateTime;
use rusqlite::types::Type;

pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub fn fmt_datetime(value: &NaiveDateTime) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

/// Parse a stored datetime; accepts a bare date for hand-edited rows.
pub fn parse_datetime(idx: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| {
            chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub fn parse_optional_datetime(
    idx: usize,
    raw: Option<String>,
) -> rusqlite::Result<Option<NaiveDateTime>> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| parse_datetime(idx, &s))
        .transpose()
}

/// Unknown stored status strings fall back to "Not Started".
pub fn parse_status(raw: &str) -> TaskStatus {
    raw.parse().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_datetime_codec() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(13, 5, 0)
            .unwrap();
        let s = fmt_datetime(&dt);
        assert_eq!(s, "2024-03-01T13:05:00");
        assert_eq!(parse_datetime(0, &s).unwrap(), dt);
        assert_eq!(
            parse_datetime(0, "2024-03-01").unwrap().date(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert!(parse_datetime(0, "yesterday").is_err());
    }

    #[test]
    fn test_unknown_status_defaults() {
        assert_eq!(parse_status("Delayed"), TaskStatus::NotStarted);
        assert_eq!(parse_status("Completed"), TaskStatus::Completed);
    }
}
