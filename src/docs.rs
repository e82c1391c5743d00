use crate::api::attendance::{HistoryQuery, MarkAttendance};
use crate::api::dashboard::DashboardStats;
use crate::api::employee::{EmployeePayload, EmployeeQuery};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::employee::Employee;
use crate::utils::attendance_view::{AttendanceSummary, AttendanceView};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRMS Lite API",
        version = "1.0.0",
        description = r#"
## HRMS Lite

Backend for a lightweight Human Resource Management client.

### Features
- **Employee Management**
  - Create, update, list, search and delete employee profiles
- **Attendance Management**
  - Mark daily attendance as Present or Absent
  - View attendance history filtered by date range, with present/absent totals and attendance percentage
- **Dashboard**
  - Total employees and today's present/absent counts

### Errors
Failed requests return `{"detail": "<message>"}` with a matching status code.
"#,
    ),
    paths(
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::create_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::attendance::mark_attendance,
        crate::api::attendance::list_attendance,
        crate::api::attendance::attendance_history,

        crate::api::dashboard::dashboard_stats
    ),
    components(
        schemas(
            Employee,
            EmployeePayload,
            EmployeeQuery,
            AttendanceStatus,
            AttendanceRecord,
            MarkAttendance,
            HistoryQuery,
            AttendanceSummary,
            AttendanceView,
            DashboardStats
        )
    ),
    tags(
        (name = "Employee", description = "Employee directory APIs"),
        (name = "Attendance", description = "Attendance marking and history APIs"),
        (name = "Dashboard", description = "Dashboard statistics APIs"),
    )
)]
pub struct ApiDoc;
