use crate::{
    error::{ApiError, is_duplicate_key, is_foreign_key},
    model::attendance::{AttendanceRecord, AttendanceRow, AttendanceStatus},
    utils::{
        attendance_view::{AttendanceView, DateRange, build_attendance_view, sort_by_date_desc},
        employee_cache,
    },
};
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct MarkAttendance {
    #[schema(example = "EMP-001")]
    pub employee_id: String,
    #[schema(example = "2024-01-03", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Present")]
    pub status: AttendanceStatus,
}

/// Raw date inputs of the history filter; blank or malformed values mean "unbounded".
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct HistoryQuery {
    /// Inclusive lower bound, `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DD`
    pub end_date: Option<String>,
}

impl HistoryQuery {
    pub fn range(&self) -> DateRange {
        DateRange::from_inputs(self.start_date.as_deref(), self.end_date.as_deref())
    }
}

async fn ensure_employee(pool: &MySqlPool, employee_id: &str) -> Result<(), ApiError> {
    let exists = employee_cache::employee_exists(pool, employee_id)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Employee lookup failed");
            ApiError::Internal
        })?;

    if exists {
        Ok(())
    } else {
        Err(ApiError::not_found("Employee not found"))
    }
}

/// Records of an existing employee. An empty result is re-checked against the
/// database so a stale cache entry can't turn a removed employee into a 200.
async fn employee_records(
    pool: &MySqlPool,
    employee_id: &str,
) -> Result<Vec<AttendanceRecord>, ApiError> {
    ensure_employee(pool, employee_id).await?;
    let records = fetch_records(pool, employee_id).await?;

    if records.is_empty() {
        employee_cache::forget(employee_id).await;
        ensure_employee(pool, employee_id).await?;
    }

    Ok(records)
}

/// All records of one employee, most recent first.
async fn fetch_records(
    pool: &MySqlPool,
    employee_id: &str,
) -> Result<Vec<AttendanceRecord>, ApiError> {
    let rows = sqlx::query_as::<_, AttendanceRow>(
        r#"
        SELECT id, employee_id, date, status, logged_at
        FROM attendance
        WHERE employee_id = ?
        "#,
    )
    .bind(employee_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to fetch attendance");
        ApiError::Internal
    })?;

    let mut records = rows
        .into_iter()
        .map(AttendanceRecord::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            error!(error = %e, employee_id, "Unreadable attendance status");
            ApiError::Internal
        })?;

    sort_by_date_desc(&mut records);
    Ok(records)
}

/// Mark attendance
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = MarkAttendance,
    responses(
        (status = 201, description = "Attendance marked", body = AttendanceRecord),
        (status = 400, description = "Invalid payload or already marked for the date", body = Object, example = json!({
            "detail": "Attendance already marked for this date"
        })),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "detail": "Employee not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
#[instrument(
    name = "mark_attendance",
    skip(pool, payload),
    fields(employee_id = %payload.employee_id, date = %payload.date)
)]
pub async fn mark_attendance(
    pool: web::Data<MySqlPool>,
    payload: web::Json<MarkAttendance>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    let employee_id = payload.employee_id.trim().to_string();

    if employee_id.is_empty() {
        return Err(ApiError::bad_request("employee_id must not be empty"));
    }

    ensure_employee(pool.get_ref(), &employee_id).await?;

    let record = AttendanceRecord {
        id: Uuid::new_v4().to_string(),
        employee_id,
        date: payload.date,
        status: payload.status,
        logged_at: Utc::now().trunc_subsecs(0),
    };

    let result = sqlx::query(
        r#"
        INSERT INTO attendance (id, employee_id, date, status, logged_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.id)
    .bind(&record.employee_id)
    .bind(record.date)
    .bind(record.status.as_ref())
    .bind(record.logged_at)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {
            info!(status = %record.status, "Attendance marked");
            Ok(HttpResponse::Created().json(record))
        }

        // one mark per employee and day
        Err(e) if is_duplicate_key(&e) => Err(ApiError::bad_request(
            "Attendance already marked for this date",
        )),

        // employee removed after the existence check
        Err(e) if is_foreign_key(&e) => {
            employee_cache::forget(&record.employee_id).await;
            Err(ApiError::not_found("Employee not found"))
        }

        Err(e) => {
            error!(error = %e, "Failed to mark attendance");
            Err(ApiError::Internal)
        }
    }
}

/// Attendance records of an employee
#[utoipa::path(
    get,
    path = "/api/attendance/{employee_id}",
    params(
        ("employee_id" = String, Path, description = "Employee code")
    ),
    responses(
        (status = 200, description = "Records, most recent date first", body = [AttendanceRecord]),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = path.into_inner();

    let records = employee_records(pool.get_ref(), &employee_id).await?;

    Ok(HttpResponse::Ok().json(records))
}

/// Filtered attendance history with present/absent summary
#[utoipa::path(
    get,
    path = "/api/attendance/{employee_id}/history",
    params(
        ("employee_id" = String, Path, description = "Employee code"),
        HistoryQuery
    ),
    responses(
        (status = 200, description = "History view", body = AttendanceView),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn attendance_history(
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = path.into_inner();
    let range = query.range();

    let records = employee_records(pool.get_ref(), &employee_id).await?;

    let view = build_attendance_view(&records, &range);
    debug!(
        employee_id = %employee_id,
        start = ?range.start,
        end = ?range.end,
        summary = %view.summary,
        "Built attendance history"
    );

    Ok(HttpResponse::Ok().json(view))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_query_maps_to_range() {
        let query = HistoryQuery {
            start_date: Some("2024-01-02".into()),
            end_date: Some("".into()),
        };

        let range = query.range();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 1, 2));
        assert_eq!(range.end, None);
    }

    #[test]
    fn absent_query_is_unbounded() {
        assert_eq!(HistoryQuery::default().range(), DateRange::default());
    }

    #[test]
    fn mark_payload_rejects_unknown_status() {
        let parsed = serde_json::from_str::<MarkAttendance>(
            r#"{"employee_id":"EMP-001","date":"2024-01-03","status":"Late"}"#,
        );
        assert!(parsed.is_err());

        let parsed = serde_json::from_str::<MarkAttendance>(
            r#"{"employee_id":"EMP-001","date":"2024-01-03","status":"Absent"}"#,
        )
        .unwrap();
        assert_eq!(parsed.status, AttendanceStatus::Absent);
    }
}
