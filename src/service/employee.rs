use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult, FieldErrors};
use crate::model::employee::{CreateEmployee, Employee, EmployeeSummary};
use crate::store::{Constraint, EmployeeStore, StoreError};

pub const DUPLICATE_EMPLOYEE_ID: &str = "employee with this employee id already exists.";
pub const DUPLICATE_EMAIL: &str = "employee with this email already exists.";

#[derive(Clone)]
pub struct EmployeeService {
    store: Arc<dyn EmployeeStore>,
}

impl EmployeeService {
    pub fn new(store: Arc<dyn EmployeeStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> ApiResult<Vec<Employee>> {
        let employees = self.store.list_employees().await?;
        debug!(count = employees.len(), "Listed employees");
        Ok(employees)
    }

    /// Validates and normalizes the payload, then stores it. Both uniqueness
    /// failures are reported together when the pre-check finds them; a
    /// conflict raised by the store itself maps to the same messages.
    pub async fn create(&self, payload: CreateEmployee) -> ApiResult<Employee> {
        let new = payload.validate()?;

        let mut errors = FieldErrors::default();
        if self.store.employee_code_exists(&new.employee_id).await? {
            errors.add("employee_id", DUPLICATE_EMPLOYEE_ID);
        }
        if self.store.email_exists(&new.email).await? {
            errors.add("email", DUPLICATE_EMAIL);
        }
        errors.into_result()?;

        let employee = self
            .store
            .insert_employee(&new)
            .await
            .map_err(conflict_to_validation)?;

        info!(id = employee.id, employee_id = %employee.employee_id, "Employee created");
        Ok(employee)
    }

    pub async fn retrieve(&self, id: u64) -> ApiResult<Employee> {
        self.store.get_employee(id).await?.ok_or(ApiError::NotFound)
    }

    pub async fn delete(&self, id: u64) -> ApiResult<()> {
        if !self.store.delete_employee(id).await? {
            return Err(ApiError::NotFound);
        }
        info!(id, "Employee deleted with its attendance records");
        Ok(())
    }

    pub async fn summary(&self) -> ApiResult<EmployeeSummary> {
        let total_employees = self.store.count_employees().await?;
        let departments = self.store.department_counts().await?;
        Ok(EmployeeSummary {
            total_employees,
            departments,
        })
    }
}

fn conflict_to_validation(err: StoreError) -> ApiError {
    match err {
        StoreError::Conflict(Constraint::EmployeeCode) => {
            FieldErrors::single("employee_id", DUPLICATE_EMPLOYEE_ID).into()
        }
        StoreError::Conflict(Constraint::EmployeeEmail) => {
            FieldErrors::single("email", DUPLICATE_EMAIL).into()
        }
        other => other.into(),
    }
}
