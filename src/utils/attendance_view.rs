use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use crate::model::attendance::{AttendanceRecord, AttendanceStatus};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive date bounds; a missing side is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Builds a range from the raw `YYYY-MM-DD` inputs of the history filter.
    /// Empty or malformed bounds are treated as unbounded.
    pub fn from_inputs(start: Option<&str>, end: Option<&str>) -> Self {
        Self::new(start.and_then(parse_bound), end.and_then(parse_bound))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }
}

fn parse_bound(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(e) => {
            debug!(input = raw, error = %e, "Ignoring malformed date bound");
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({ "total": 3, "present": 2, "absent": 1, "percentage": 66.7 }))]
pub struct AttendanceSummary {
    pub total: u64,
    pub present: u64,
    pub absent: u64,
    /// Present share in percent, rounded to one decimal place
    pub percentage: f64,
}

impl AttendanceSummary {
    pub fn from_records(records: &[AttendanceRecord]) -> Self {
        let total = records.len() as u64;
        let present = records
            .iter()
            .filter(|r| r.status == AttendanceStatus::Present)
            .count() as u64;

        let percentage = if total == 0 {
            0.0
        } else {
            round_one_decimal(present as f64 / total as f64 * 100.0)
        };

        Self {
            total,
            present,
            absent: total - present,
            percentage,
        }
    }

    /// Percentage rendered with exactly one decimal place, e.g. `100.0`.
    pub fn percentage_text(&self) -> String {
        format!("{:.1}", self.percentage)
    }
}

impl fmt::Display for AttendanceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "present {} / absent {} / total {} ({}%)",
            self.present,
            self.absent,
            self.total,
            self.percentage_text()
        )
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceView {
    /// Records inside the range, most recent date first
    pub filtered_records: Vec<AttendanceRecord>,
    pub summary: AttendanceSummary,
}

/// Sorts by date, most recent first. Records sharing a date keep their relative order.
pub fn sort_by_date_desc(records: &mut [AttendanceRecord]) {
    records.sort_by(|a, b| b.date.cmp(&a.date));
}

pub fn filter_by_range(records: &[AttendanceRecord], range: &DateRange) -> Vec<AttendanceRecord> {
    records
        .iter()
        .filter(|r| range.contains(r.date))
        .cloned()
        .collect()
}

/// Sorted, range-filtered history plus its summary. Recomputed from scratch on
/// every call; the inputs are never mutated.
pub fn build_attendance_view(records: &[AttendanceRecord], range: &DateRange) -> AttendanceView {
    let mut sorted = records.to_vec();
    sort_by_date_desc(&mut sorted);

    let filtered_records = filter_by_range(&sorted, range);
    let summary = AttendanceSummary::from_records(&filtered_records);

    AttendanceView {
        filtered_records,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn record(id: &str, day: &str, status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            id: id.to_string(),
            employee_id: "EMP-001".to_string(),
            date: date(day),
            status,
            logged_at: Utc::now(),
        }
    }

    fn sample() -> Vec<AttendanceRecord> {
        vec![
            record("a", "2024-01-03", AttendanceStatus::Present),
            record("b", "2024-01-01", AttendanceStatus::Absent),
            record("c", "2024-01-02", AttendanceStatus::Present),
        ]
    }

    fn ids(records: &[AttendanceRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn open_start_bound_keeps_recent_records() {
        let range = DateRange::new(Some(date("2024-01-02")), None);
        let view = build_attendance_view(&sample(), &range);

        assert_eq!(ids(&view.filtered_records), vec!["a", "c"]);
        assert_eq!(
            view.summary,
            AttendanceSummary {
                total: 2,
                present: 2,
                absent: 0,
                percentage: 100.0
            }
        );
        assert_eq!(view.summary.percentage_text(), "100.0");
    }

    #[test]
    fn unbounded_range_returns_everything_sorted() {
        let view = build_attendance_view(&sample(), &DateRange::default());

        assert_eq!(ids(&view.filtered_records), vec!["a", "c", "b"]);
        assert_eq!(view.summary.total, 3);
        assert_eq!(view.summary.present, 2);
        assert_eq!(view.summary.absent, 1);
        assert_eq!(view.summary.percentage, 66.7);
        assert_eq!(view.summary.percentage_text(), "66.7");
    }

    #[test]
    fn range_excluding_all_records_yields_zero_summary() {
        let range = DateRange::new(Some(date("2025-01-01")), Some(date("2025-12-31")));
        let view = build_attendance_view(&sample(), &range);

        assert!(view.filtered_records.is_empty());
        assert_eq!(view.summary, AttendanceSummary::default());
        assert_eq!(view.summary.percentage, 0.0);
        assert_eq!(view.summary.percentage_text(), "0.0");
    }

    #[test]
    fn empty_input_is_not_an_error() {
        let view = build_attendance_view(&[], &DateRange::new(Some(date("2024-01-01")), None));
        assert!(view.filtered_records.is_empty());
        assert_eq!(view.summary.total, 0);
    }

    #[test]
    fn bounds_are_inclusive() {
        let range = DateRange::new(Some(date("2024-01-01")), Some(date("2024-01-02")));
        let view = build_attendance_view(&sample(), &range);

        assert_eq!(ids(&view.filtered_records), vec!["c", "b"]);
        assert_eq!(view.summary.percentage, 50.0);
    }

    #[test]
    fn same_day_records_keep_input_order() {
        let records = vec![
            record("x1", "2024-02-01", AttendanceStatus::Present),
            record("y", "2024-02-03", AttendanceStatus::Absent),
            record("x2", "2024-02-01", AttendanceStatus::Absent),
            record("x3", "2024-02-01", AttendanceStatus::Present),
        ];

        let view = build_attendance_view(&records, &DateRange::default());
        assert_eq!(ids(&view.filtered_records), vec!["y", "x1", "x2", "x3"]);
    }

    #[test]
    fn output_dates_never_increase() {
        let records: Vec<_> = (1..=28)
            .rev()
            .chain(1..=28)
            .enumerate()
            .map(|(i, day)| {
                let status = if i % 3 == 0 {
                    AttendanceStatus::Absent
                } else {
                    AttendanceStatus::Present
                };
                record(&i.to_string(), &format!("2024-02-{day:02}"), status)
            })
            .collect();

        let view = build_attendance_view(&records, &DateRange::default());
        assert!(view
            .filtered_records
            .windows(2)
            .all(|pair| pair[0].date >= pair[1].date));
        assert_eq!(view.summary.present + view.summary.absent, view.summary.total);
    }

    #[test]
    fn inverted_range_matches_nothing() {
        let range = DateRange::new(Some(date("2024-01-03")), Some(date("2024-01-01")));
        let view = build_attendance_view(&sample(), &range);

        assert!(view.filtered_records.is_empty());
        assert_eq!(view.summary, AttendanceSummary::default());
    }

    #[test]
    fn view_serializes_for_the_history_table() {
        let range = DateRange::new(Some(date("2024-01-02")), None);
        let value = serde_json::to_value(build_attendance_view(&sample(), &range)).unwrap();

        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["filtered_records", "summary"]);

        let percentage = &value["summary"]["percentage"];
        assert!(percentage.is_f64());
        assert_eq!(percentage.as_f64(), Some(100.0));
        assert_eq!(value["summary"]["total"], 2);

        let first = &value["filtered_records"][0];
        assert_eq!(first["date"], "2024-01-03");
        assert_eq!(first["_id"], "a");
        assert!(first["timestamp"].is_string());
    }

    #[test]
    fn filtering_twice_matches_filtering_once() {
        let range = DateRange::new(Some(date("2024-01-02")), Some(date("2024-01-03")));
        let once = build_attendance_view(&sample(), &range);
        let twice = build_attendance_view(&once.filtered_records, &range);

        assert_eq!(once, twice);
    }

    #[test]
    fn inputs_are_left_untouched() {
        let records = sample();
        let before = records.clone();
        let _ = build_attendance_view(&records, &DateRange::default());

        assert_eq!(records, before);
    }

    #[test]
    fn malformed_or_blank_bounds_are_unbounded() {
        assert_eq!(DateRange::from_inputs(Some(""), Some("not-a-date")), DateRange::default());
        assert_eq!(
            DateRange::from_inputs(Some(" 2024-01-02 "), None),
            DateRange::new(Some(date("2024-01-02")), None)
        );
    }

    #[test]
    fn one_in_three_rounds_to_one_decimal() {
        let records = vec![
            record("a", "2024-01-01", AttendanceStatus::Present),
            record("b", "2024-01-02", AttendanceStatus::Absent),
            record("c", "2024-01-03", AttendanceStatus::Absent),
        ];

        let summary = AttendanceSummary::from_records(&records);
        assert_eq!(summary.percentage, 33.3);
        assert_eq!(
            summary.to_string(),
            "present 1 / absent 2 / total 3 (33.3%)"
        );
    }
}
