use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "_id": "0b6f4c3e-2d1a-4e8f-9c7b-6a5d4e3f2a1b",
        "employee_id": "EMP-001",
        "full_name": "John Doe",
        "email": "john.doe@company.com",
        "department": "Engineering",
        "created_at": "2024-01-01T08:00:00Z"
    })
)]
pub struct Employee {
    #[serde(rename = "_id")]
    #[schema(example = "0b6f4c3e-2d1a-4e8f-9c7b-6a5d4e3f2a1b")]
    pub id: String,

    /// Business identifier shown in the directory, unique per employee
    #[schema(example = "EMP-001")]
    pub employee_id: String,

    #[schema(example = "John Doe")]
    pub full_name: String,

    #[schema(example = "john.doe@company.com", format = "email")]
    pub email: String,

    #[schema(example = "Engineering")]
    pub department: String,

    #[schema(example = "2024-01-01T08:00:00Z", value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}
