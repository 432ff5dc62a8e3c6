use crate::model::attendance::{
    Attendance, AttendanceStatus, AttendanceSummary, CreateAttendance,
};
use crate::model::employee::{
    CreateEmployee, Department, DepartmentCount, Employee, EmployeeSummary,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Tracker API",
        version = "1.0.0",
        description = r#"
## Employee Attendance Tracker

A small admin API for keeping a list of employees and the days they were present or absent.

### Features
- **Employees**
  - Create, list, view and delete employees (deleting removes their attendance too)
  - Headcount summary per department
- **Attendance**
  - Mark one employee present or absent for a calendar day (at most once per day)
  - Filter records by employee, date and status
  - Present/absent totals per employee

### Errors
- `400` with a field map, e.g. `{"date": "Attendance for this employee on 2024-01-01 already exists."}`
- `404` with `{"detail": "Not found."}`

### Security
No authentication is applied. Restrict access at the network level.
"#,
    ),
    paths(
        crate::api::employee::list_employees,
        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::delete_employee,
        crate::api::employee::employee_summary,

        crate::api::attendance::list_attendance,
        crate::api::attendance::mark_attendance,
        crate::api::attendance::delete_attendance,
        crate::api::attendance::attendance_summary
    ),
    components(
        schemas(
            Employee,
            CreateEmployee,
            Department,
            DepartmentCount,
            EmployeeSummary,
            Attendance,
            AttendanceStatus,
            CreateAttendance,
            AttendanceSummary
        )
    ),
    tags(
        (name = "Employee", description = "Employee management APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
    )
)]
pub struct ApiDoc;
