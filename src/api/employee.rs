use crate::{
    error::{ApiError, is_duplicate_key},
    model::employee::Employee,
    utils::employee_cache,
};
use actix_web::{HttpResponse, web};
use chrono::{SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

const EMPLOYEE_COLUMNS: &str = "id, employee_id, full_name, email, department, created_at";

/// Body for both create and update; the client always sends the full form.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct EmployeePayload {
    #[schema(example = "EMP-001")]
    pub employee_id: String,
    #[schema(example = "John Doe")]
    pub full_name: String,
    #[schema(example = "john.doe@company.com", format = "email")]
    pub email: String,
    #[schema(example = "Engineering")]
    pub department: String,
}

impl EmployeePayload {
    /// Trims every field and rejects blanks and malformed emails.
    pub fn validated(self) -> Result<Self, ApiError> {
        let payload = Self {
            employee_id: self.employee_id.trim().to_string(),
            full_name: self.full_name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            department: self.department.trim().to_string(),
        };

        for (field, value) in [
            ("employee_id", &payload.employee_id),
            ("full_name", &payload.full_name),
            ("email", &payload.email),
            ("department", &payload.department),
        ] {
            if value.is_empty() {
                return Err(ApiError::bad_request(format!("{field} must not be empty")));
            }
        }

        if !is_valid_email(&payload.email) {
            return Err(ApiError::bad_request("Invalid email address"));
        }

        Ok(payload)
    }
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

/// Escapes `LIKE` wildcards so the search text matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeQuery {
    /// Substring match on code, name, email or department
    pub search: Option<String>,
    /// Exact department name
    pub department: Option<String>,
}

async fn fetch_employee(pool: &MySqlPool, id: &str) -> Result<Option<Employee>, ApiError> {
    sqlx::query_as::<_, Employee>(&format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        error!(error = %e, id, "Failed to fetch employee");
        ApiError::Internal
    })
}

fn duplicate_employee() -> ApiError {
    ApiError::conflict("An employee with this employee ID or email already exists")
}

/// List employees
#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Employees, newest first", body = [Employee]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn list_employees(
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> Result<HttpResponse, ApiError> {
    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        conditions.push(
            "(employee_id LIKE ? OR full_name LIKE ? OR email LIKE ? OR department LIKE ?)",
        );
        let like = format!("%{}%", escape_like(search));
        bindings.extend(std::iter::repeat_n(like, 4));
    }

    if let Some(department) = query.department.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        conditions.push("department = ?");
        bindings.push(department.to_string());
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees {} ORDER BY created_at DESC, id",
        where_clause
    );
    debug!(sql = %sql, bindings = ?bindings, "Fetching employees");

    let mut data_query = sqlx::query_as::<_, Employee>(&sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }

    let employees = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %sql, "Failed to fetch employees");
        ApiError::Internal
    })?;

    Ok(HttpResponse::Ok().json(employees))
}

/// Get employee by id
#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    params(
        ("id" = String, Path, description = "Employee record id")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "detail": "Employee not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn get_employee(
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    match fetch_employee(pool.get_ref(), &id).await? {
        Some(employee) => Ok(HttpResponse::Ok().json(employee)),
        None => Err(ApiError::not_found("Employee not found")),
    }
}

/// Create employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = EmployeePayload,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Missing field or invalid email", body = Object, example = json!({
            "detail": "Invalid email address"
        })),
        (status = 409, description = "Duplicate employee ID or email", body = Object, example = json!({
            "detail": "An employee with this employee ID or email already exists"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn create_employee(
    pool: web::Data<MySqlPool>,
    payload: web::Json<EmployeePayload>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner().validated()?;

    let employee = Employee {
        id: Uuid::new_v4().to_string(),
        employee_id: payload.employee_id,
        full_name: payload.full_name,
        email: payload.email,
        department: payload.department,
        created_at: Utc::now().trunc_subsecs(0),
    };

    sqlx::query(
        r#"
        INSERT INTO employees
        (id, employee_id, full_name, email, department, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&employee.id)
    .bind(&employee.employee_id)
    .bind(&employee.full_name)
    .bind(&employee.email)
    .bind(&employee.department)
    .bind(employee.created_at)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        if is_duplicate_key(&e) {
            return duplicate_employee();
        }
        error!(error = %e, employee_id = %employee.employee_id, "Failed to create employee");
        ApiError::Internal
    })?;

    employee_cache::mark_known(&employee.employee_id).await;
    info!(id = %employee.id, employee_id = %employee.employee_id, "Employee created");

    Ok(HttpResponse::Created().json(employee))
}

/// Update employee
#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    params(
        ("id" = String, Path, description = "Employee record id")
    ),
    request_body = EmployeePayload,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 400, description = "Missing field or invalid email"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "detail": "Employee not found"
        })),
        (status = 409, description = "Duplicate employee ID or email"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn update_employee(
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    payload: web::Json<EmployeePayload>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let payload = payload.into_inner().validated()?;

    let existing = fetch_employee(pool.get_ref(), &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    sqlx::query(
        r#"
        UPDATE employees
        SET employee_id = ?, full_name = ?, email = ?, department = ?
        WHERE id = ?
        "#,
    )
    .bind(&payload.employee_id)
    .bind(&payload.full_name)
    .bind(&payload.email)
    .bind(&payload.department)
    .bind(&id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        if is_duplicate_key(&e) {
            return duplicate_employee();
        }
        error!(error = %e, id = %id, "Failed to update employee");
        ApiError::Internal
    })?;

    // attendance rows follow the code change through ON UPDATE CASCADE
    if existing.employee_id != payload.employee_id {
        employee_cache::forget(&existing.employee_id).await;
    }
    employee_cache::mark_known(&payload.employee_id).await;

    let updated = Employee {
        id,
        employee_id: payload.employee_id,
        full_name: payload.full_name,
        email: payload.email,
        department: payload.department,
        created_at: existing.created_at,
    };

    info!(id = %updated.id, employee_id = %updated.employee_id, "Employee updated");
    Ok(HttpResponse::Ok().json(updated))
}

/// Delete employee and their attendance history
#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    params(
        ("id" = String, Path, description = "Employee record id")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Employee deleted successfully"
        })),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "detail": "Employee not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn delete_employee(
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let existing = fetch_employee(pool.get_ref(), &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    let result = sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(&id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, id = %id, "Failed to delete employee");
            ApiError::Internal
        })?;

    employee_cache::forget(&existing.employee_id).await;

    // deleted concurrently between the lookup and the delete
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Employee not found"));
    }

    info!(id = %id, employee_id = %existing.employee_id, "Employee deleted");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee deleted successfully"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(email: &str) -> EmployeePayload {
        EmployeePayload {
            employee_id: " EMP-001 ".into(),
            full_name: "John Doe".into(),
            email: email.into(),
            department: "Engineering ".into(),
        }
    }

    #[test]
    fn validation_trims_and_normalizes() {
        let p = payload(" John.Doe@Company.com ").validated().unwrap();
        assert_eq!(p.employee_id, "EMP-001");
        assert_eq!(p.email, "john.doe@company.com");
        assert_eq!(p.department, "Engineering");
    }

    #[test]
    fn blank_field_is_rejected() {
        let mut p = payload("john@company.com");
        p.full_name = "   ".into();

        assert_eq!(
            p.validated().unwrap_err(),
            ApiError::bad_request("full_name must not be empty")
        );
    }

    #[test]
    fn search_wildcards_match_literally() {
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like(r"C:\dept"), r"C:\\dept");
        assert_eq!(escape_like("Engineering"), "Engineering");
    }

    #[test]
    fn email_shapes() {
        for ok in ["a@b.co", "first.last@sub.example.org"] {
            assert!(is_valid_email(ok), "{ok} should be accepted");
        }
        for bad in ["plain", "@b.co", "a@b", "a@.co", "a@b.", "a@@b.co", "a b@c.co", "a@b..co"] {
            assert!(!is_valid_email(bad), "{bad} should be rejected");
        }
    }
}
