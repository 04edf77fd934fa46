// ==========================================
// Marking Maestro - Leave text parser
// ==========================================
// Grammar:
//   list    := segment ("," segment)*
//   segment := date WS "to" WS date
// The separator is the lowercase word "to", matched exactly.
// Slashed dates are month-first (03/20/2024).
// Error policy: a malformed segment is skipped, never surfaced.
// ==========================================

use crate::domain::teacher::LeaveInterval;
use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

const SEPARATOR_WORD: &str = "to";

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

pub struct LeaveParser;

impl LeaveParser {
    /// Parse a free-text leave field into intervals.
    ///
    /// Empty or whitespace-only input yields no intervals.
    pub fn parse(raw: &str) -> Vec<LeaveInterval> {
        raw.split(',')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .filter_map(Self::parse_segment)
            .collect()
    }

    /// Parse one `<date> to <date>` segment.
    pub fn parse_segment(segment: &str) -> Option<LeaveInterval> {
        let tokens: Vec<&str> = segment.split_whitespace().collect();
        let Some(pos) = tokens.iter().position(|t| *t == SEPARATOR_WORD) else {
            debug!(segment, "leave segment without separator, skipped");
            return None;
        };

        let left = tokens[..pos].join(" ");
        let right = tokens[pos + 1..].join(" ");

        match (parse_date(&left), parse_date(&right)) {
            (Some(start), Some(end)) => Some(LeaveInterval::new(start, end)),
            _ => {
                debug!(segment, "leave segment with unparseable dates, skipped");
                None
            }
        }
    }
}

/// Parse a calendar date; datetimes are reduced to their date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_multiple_segments() {
        let intervals = LeaveParser::parse("2023-01-01 to 2023-01-15, 2023-02-10 to 2023-02-20");
        assert_eq!(
            intervals,
            vec![
                LeaveInterval::new(d(2023, 1, 1), d(2023, 1, 15)),
                LeaveInterval::new(d(2023, 2, 10), d(2023, 2, 20)),
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(LeaveParser::parse("").is_empty());
        assert!(LeaveParser::parse("   ").is_empty());
    }

    #[test]
    fn test_segment_without_separator_is_skipped() {
        let intervals = LeaveParser::parse("2023-01-01, 2023-02-10 to 2023-02-20");
        assert_eq!(intervals, vec![LeaveInterval::new(d(2023, 2, 10), d(2023, 2, 20))]);
    }

    #[test]
    fn test_malformed_dates_are_skipped() {
        let intervals = LeaveParser::parse("soon to later, 2023-02-10 to 2023-02-20, 2023-13-01 to 2023-13-05");
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].start, d(2023, 2, 10));
    }

    #[test]
    fn test_alternative_formats() {
        assert_eq!(parse_date("2024/03/01"), Some(d(2024, 3, 1)));
        assert_eq!(parse_date("01/03/2024"), Some(d(2024, 1, 3)));
        assert_eq!(parse_date("03/20/2024"), Some(d(2024, 3, 20)));
        assert_eq!(parse_date("20/03/2024"), None);
        assert_eq!(parse_date("2024-03-01T08:30:00"), Some(d(2024, 3, 1)));
        assert_eq!(parse_date("2024-03-01 08:30:00"), Some(d(2024, 3, 1)));
        assert_eq!(parse_date("March"), None);
    }

    #[test]
    fn test_slashed_range_is_month_first() {
        let intervals = LeaveParser::parse("03/05/2024 to 03/20/2024");
        assert_eq!(intervals, vec![LeaveInterval::new(d(2024, 3, 5), d(2024, 3, 20))]);
    }

    #[test]
    fn test_separator_is_case_sensitive() {
        assert!(LeaveParser::parse("2024-03-01 TO 2024-03-05").is_empty());
        assert!(LeaveParser::parse("2024-03-01 To 2024-03-05").is_empty());
        assert_eq!(LeaveParser::parse("2024-03-01 to 2024-03-05").len(), 1);
    }
}
