//! Persistence contracts for employees and attendance records.
//!
//! Both stores are object safe so services can hold them as `Arc<dyn ...>`.
//! Unique and foreign key constraints are enforced by the store itself; a
//! write that violates one fails with [`StoreError::Conflict`].

pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::model::attendance::{Attendance, AttendanceFilter, AttendanceSummary, NewAttendance};
use crate::model::employee::{DepartmentCount, Employee, NewEmployee};

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

/// The constraint a rejected write collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    EmployeeCode,
    EmployeeEmail,
    AttendanceDay,
    EmployeeReference,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("constraint violated: {0:?}")]
    Conflict(Constraint),
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Newest first.
    async fn list_employees(&self) -> StoreResult<Vec<Employee>>;
    async fn get_employee(&self, id: u64) -> StoreResult<Option<Employee>>;
    async fn employee_code_exists(&self, employee_id: &str) -> StoreResult<bool>;
    async fn email_exists(&self, email: &str) -> StoreResult<bool>;
    async fn insert_employee(&self, employee: &NewEmployee) -> StoreResult<Employee>;
    /// Removes the employee and its attendance records. Returns false when
    /// no employee had that id.
    async fn delete_employee(&self, id: u64) -> StoreResult<bool>;
    async fn count_employees(&self) -> StoreResult<u64>;
    /// Departments with at least one employee, largest first.
    async fn department_counts(&self) -> StoreResult<Vec<DepartmentCount>>;
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Most recent date first.
    async fn list_attendance(&self, filter: &AttendanceFilter) -> StoreResult<Vec<Attendance>>;
    async fn get_attendance(&self, id: u64) -> StoreResult<Option<Attendance>>;
    /// Whether a record exists for the pair, ignoring the record `exclude`.
    async fn attendance_exists(
        &self,
        employee: u64,
        date: NaiveDate,
        exclude: Option<u64>,
    ) -> StoreResult<bool>;
    async fn insert_attendance(&self, attendance: &NewAttendance) -> StoreResult<Attendance>;
    async fn delete_attendance(&self, id: u64) -> StoreResult<bool>;
    /// One row per employee with records, ordered by external employee id.
    async fn attendance_summary(&self) -> StoreResult<Vec<AttendanceSummary>>;
}
