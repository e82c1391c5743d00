use crate::{error::ApiError, model::attendance::AttendanceStatus};
use actix_web::{HttpResponse, web};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    #[schema(example = 12)]
    pub total_employees: i64,
    #[schema(example = 9)]
    pub present_today: i64,
    #[schema(example = 2)]
    pub absent_today: i64,
}

async fn count_marked(
    pool: &MySqlPool,
    date: NaiveDate,
    status: AttendanceStatus,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM attendance WHERE date = ? AND status = ?")
        .bind(date)
        .bind(status.as_ref())
        .fetch_one(pool)
        .await
}

/// Headline counts for the dashboard
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    responses(
        (status = 200, description = "Employee and today's attendance counts", body = DashboardStats),
        (status = 500, description = "Internal server error")
    ),
    tag = "Dashboard"
)]
pub async fn dashboard_stats(pool: web::Data<MySqlPool>) -> Result<HttpResponse, ApiError> {
    let today = Local::now().date_naive();

    let stats = async {
        let total_employees = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees")
            .fetch_one(pool.get_ref())
            .await?;

        Ok::<_, sqlx::Error>(DashboardStats {
            total_employees,
            present_today: count_marked(pool.get_ref(), today, AttendanceStatus::Present).await?,
            absent_today: count_marked(pool.get_ref(), today, AttendanceStatus::Absent).await?,
        })
    }
    .await
    .map_err(|e| {
        error!(error = %e, %today, "Failed to compute dashboard stats");
        ApiError::Internal
    })?;

    Ok(HttpResponse::Ok().json(stats))
}
