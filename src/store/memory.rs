use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::{AttendanceStore, Constraint, EmployeeStore, StoreError, StoreResult};
use crate::model::attendance::{
    Attendance, AttendanceFilter, AttendanceStatus, AttendanceSummary, NewAttendance,
};
use crate::model::employee::{DepartmentCount, Employee, NewEmployee};

#[derive(Debug, Clone)]
struct AttendanceRow {
    id: u64,
    employee: u64,
    date: NaiveDate,
    status: AttendanceStatus,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    employees: BTreeMap<u64, Employee>,
    attendance: BTreeMap<u64, AttendanceRow>,
    next_employee_id: u64,
    next_attendance_id: u64,
}

impl Tables {
    fn join(&self, row: &AttendanceRow) -> StoreResult<Attendance> {
        let employee = self.employees.get(&row.employee).ok_or_else(|| {
            StoreError::InvalidData(format!(
                "attendance {} references missing employee {}",
                row.id, row.employee
            ))
        })?;
        Ok(Attendance {
            id: row.id,
            employee: row.employee,
            employee_name: employee.full_name.clone(),
            employee_id_display: employee.employee_id.clone(),
            date: row.date,
            status: row.status,
            created_at: row.created_at,
        })
    }
}

/// Process-local store holding both tables behind one lock, so every check
/// and write happens atomically.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        let tables = self.tables.read().await;
        let mut employees: Vec<Employee> = tables.employees.values().cloned().collect();
        employees.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(employees)
    }

    async fn get_employee(&self, id: u64) -> StoreResult<Option<Employee>> {
        Ok(self.tables.read().await.employees.get(&id).cloned())
    }

    async fn employee_code_exists(&self, employee_id: &str) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.employees.values().any(|e| e.employee_id == employee_id))
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.employees.values().any(|e| e.email == email))
    }

    async fn insert_employee(&self, employee: &NewEmployee) -> StoreResult<Employee> {
        let mut tables = self.tables.write().await;

        if tables.employees.values().any(|e| e.employee_id == employee.employee_id) {
            return Err(StoreError::Conflict(Constraint::EmployeeCode));
        }
        if tables.employees.values().any(|e| e.email == employee.email) {
            return Err(StoreError::Conflict(Constraint::EmployeeEmail));
        }

        tables.next_employee_id += 1;
        let now = Utc::now();
        let created = Employee {
            id: tables.next_employee_id,
            employee_id: employee.employee_id.clone(),
            full_name: employee.full_name.clone(),
            email: employee.email.clone(),
            department: employee.department,
            created_at: now,
            updated_at: now,
        };
        tables.employees.insert(created.id, created.clone());
        Ok(created)
    }

    async fn delete_employee(&self, id: u64) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.employees.remove(&id).is_none() {
            return Ok(false);
        }
        tables.attendance.retain(|_, row| row.employee != id);
        Ok(true)
    }

    async fn count_employees(&self) -> StoreResult<u64> {
        Ok(self.tables.read().await.employees.len() as u64)
    }

    async fn department_counts(&self) -> StoreResult<Vec<DepartmentCount>> {
        let tables = self.tables.read().await;
        let mut counts = HashMap::new();
        for employee in tables.employees.values() {
            *counts.entry(employee.department).or_insert(0u64) += 1;
        }
        let mut departments: Vec<DepartmentCount> = counts
            .into_iter()
            .map(|(department, count)| DepartmentCount { department, count })
            .collect();
        departments.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.department.as_ref().cmp(b.department.as_ref()))
        });
        Ok(departments)
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn list_attendance(&self, filter: &AttendanceFilter) -> StoreResult<Vec<Attendance>> {
        let tables = self.tables.read().await;
        let mut records = Vec::new();
        for row in tables.attendance.values() {
            let record = tables.join(row)?;
            if filter.matches(&record) {
                records.push(record);
            }
        }
        records.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(records)
    }

    async fn get_attendance(&self, id: u64) -> StoreResult<Option<Attendance>> {
        let tables = self.tables.read().await;
        tables.attendance.get(&id).map(|row| tables.join(row)).transpose()
    }

    async fn attendance_exists(
        &self,
        employee: u64,
        date: NaiveDate,
        exclude: Option<u64>,
    ) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.attendance.values().any(|row| {
            row.employee == employee && row.date == date && Some(row.id) != exclude
        }))
    }

    async fn insert_attendance(&self, attendance: &NewAttendance) -> StoreResult<Attendance> {
        let mut tables = self.tables.write().await;

        if !tables.employees.contains_key(&attendance.employee) {
            return Err(StoreError::Conflict(Constraint::EmployeeReference));
        }
        if tables
            .attendance
            .values()
            .any(|row| row.employee == attendance.employee && row.date == attendance.date)
        {
            return Err(StoreError::Conflict(Constraint::AttendanceDay));
        }

        tables.next_attendance_id += 1;
        let row = AttendanceRow {
            id: tables.next_attendance_id,
            employee: attendance.employee,
            date: attendance.date,
            status: attendance.status,
            created_at: Utc::now(),
        };
        tables.attendance.insert(row.id, row.clone());
        tables.join(&row)
    }

    async fn delete_attendance(&self, id: u64) -> StoreResult<bool> {
        Ok(self.tables.write().await.attendance.remove(&id).is_some())
    }

    async fn attendance_summary(&self) -> StoreResult<Vec<AttendanceSummary>> {
        let tables = self.tables.read().await;
        let mut totals: BTreeMap<u64, (u64, u64)> = BTreeMap::new();
        for row in tables.attendance.values() {
            let entry = totals.entry(row.employee).or_default();
            match row.status {
                AttendanceStatus::Present => entry.0 += 1,
                AttendanceStatus::Absent => entry.1 += 1,
            }
        }

        let mut summary = Vec::with_capacity(totals.len());
        for (employee_id, (total_present, total_absent)) in totals {
            let employee = tables.employees.get(&employee_id).ok_or_else(|| {
                StoreError::InvalidData(format!("summary references missing employee {employee_id}"))
            })?;
            summary.push(AttendanceSummary {
                employee_id,
                employee_id_display: employee.employee_id.clone(),
                employee_name: employee.full_name.clone(),
                total_present,
                total_absent,
            });
        }
        summary.sort_by(|a, b| a.employee_id_display.cmp(&b.employee_id_display));
        Ok(summary)
    }
}
