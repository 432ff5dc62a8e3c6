pub mod attendance;
pub mod employee;

pub use attendance::AttendanceService;
pub use employee::EmployeeService;
