pub mod attendance_view;
pub mod employee_cache;
