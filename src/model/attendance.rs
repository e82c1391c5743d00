use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Attendance outcome for one employee on one day.
///
/// The textual form (`Present` / `Absent`) is used both on the wire and in the
/// `attendance.status` column.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "_id": "5f0c2d1e-8a4b-4c3d-9e2f-1a2b3c4d5e6f",
        "employee_id": "EMP-001",
        "date": "2024-01-03",
        "status": "Present",
        "timestamp": "2024-01-03T09:12:44Z"
    })
)]
pub struct AttendanceRecord {
    #[serde(rename = "_id")]
    pub id: String,

    #[schema(example = "EMP-001")]
    pub employee_id: String,

    #[schema(example = "2024-01-03", value_type = String, format = "date")]
    pub date: NaiveDate,

    pub status: AttendanceStatus,

    /// When the mark was submitted
    #[serde(rename = "timestamp")]
    #[schema(example = "2024-01-03T09:12:44Z", value_type = String, format = "date-time")]
    pub logged_at: DateTime<Utc>,
}

/// Row shape of the `attendance` table; `status` is kept as text until parsed.
#[derive(Debug, FromRow)]
pub struct AttendanceRow {
    pub id: String,
    pub employee_id: String,
    pub date: NaiveDate,
    pub status: String,
    pub logged_at: DateTime<Utc>,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = strum::ParseError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            employee_id: row.employee_id,
            date: row.date,
            status: row.status.parse()?,
            logged_at: row.logged_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn status_uses_capitalized_spelling() {
        assert_eq!(AttendanceStatus::Present.as_ref(), "Present");
        assert_eq!(AttendanceStatus::Absent.to_string(), "Absent");
        assert_eq!("Absent".parse::<AttendanceStatus>(), Ok(AttendanceStatus::Absent));
        assert!("present".parse::<AttendanceStatus>().is_err());
    }

    #[test]
    fn record_serializes_with_client_field_names() {
        let record = AttendanceRecord {
            id: "a1".into(),
            employee_id: "EMP-001".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            status: AttendanceStatus::Present,
            logged_at: Utc.with_ymd_and_hms(2024, 1, 3, 9, 0, 0).unwrap(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["_id"], "a1");
        assert_eq!(value["date"], "2024-01-03");
        assert_eq!(value["status"], "Present");
        assert!(value.get("timestamp").is_some());
        assert!(value.get("logged_at").is_none());
    }

    #[test]
    fn row_with_unknown_status_is_rejected() {
        let row = AttendanceRow {
            id: "a1".into(),
            employee_id: "EMP-001".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            status: "Late".into(),
            logged_at: Utc::now(),
        };

        assert!(AttendanceRecord::try_from(row).is_err());
    }
}
