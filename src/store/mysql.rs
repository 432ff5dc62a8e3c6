use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySql, MySqlPool, QueryBuilder};
use tracing::debug;

use super::{AttendanceStore, Constraint, EmployeeStore, StoreError, StoreResult};
use crate::model::attendance::{Attendance, AttendanceFilter, AttendanceSummary, NewAttendance};
use crate::model::employee::{DepartmentCount, Employee, NewEmployee};

/// MySQL reports both unique and foreign key violations with this SQLSTATE.
const INTEGRITY_VIOLATION: &str = "23000";

const EMPLOYEE_SELECT_SQL: &str = r#"
    SELECT id, employee_id, full_name, email, department, created_at, updated_at
    FROM employees
"#;

const ATTENDANCE_SELECT_SQL: &str = r#"
    SELECT
        a.id,
        a.employee_id AS employee,
        e.full_name AS employee_name,
        e.employee_id AS employee_id_display,
        a.date,
        a.status,
        a.created_at
    FROM attendance a
    JOIN employees e ON e.id = a.employee_id
"#;

#[derive(FromRow)]
struct EmployeeRow {
    id: u64,
    employee_id: String,
    full_name: String,
    email: String,
    department: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = StoreError;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        let department = row.department.parse().map_err(|_| {
            StoreError::InvalidData(format!(
                "employee {} has unknown department {:?}",
                row.id, row.department
            ))
        })?;
        Ok(Employee {
            id: row.id,
            employee_id: row.employee_id,
            full_name: row.full_name,
            email: row.email,
            department,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    employee: u64,
    employee_name: String,
    employee_id_display: String,
    date: NaiveDate,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AttendanceRow> for Attendance {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(|_| {
            StoreError::InvalidData(format!(
                "attendance {} has unknown status {:?}",
                row.id, row.status
            ))
        })?;
        Ok(Attendance {
            id: row.id,
            employee: row.employee,
            employee_name: row.employee_name,
            employee_id_display: row.employee_id_display,
            date: row.date,
            status,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct DepartmentCountRow {
    department: String,
    count: i64,
}

#[derive(FromRow)]
struct SummaryRow {
    employee_id: u64,
    employee_id_display: String,
    employee_name: String,
    total_present: i64,
    total_absent: i64,
}

/// Maps integrity violations to the constraint they hit, using the
/// constraint names declared in `schema.sql`.
fn map_db_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(INTEGRITY_VIOLATION) {
            let message = db_err.message();
            let constraint = if message.contains("uniq_employees_employee_id") {
                Some(Constraint::EmployeeCode)
            } else if message.contains("uniq_employees_email") {
                Some(Constraint::EmployeeEmail)
            } else if message.contains("uniq_attendance_employee_date") {
                Some(Constraint::AttendanceDay)
            } else if message.contains("fk_attendance_employee") {
                Some(Constraint::EmployeeReference)
            } else {
                None
            };
            if let Some(constraint) = constraint {
                return StoreError::Conflict(constraint);
            }
        }
    }
    StoreError::Database(err)
}

fn push_condition(builder: &mut QueryBuilder<'_, MySql>, has_where: &mut bool, column: &str) {
    builder.push(if *has_where { " AND " } else { " WHERE " });
    *has_where = true;
    builder.push(column);
    builder.push(" = ");
}

fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeStore for MySqlStore {
    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        let sql = format!("{EMPLOYEE_SELECT_SQL} ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query_as::<_, EmployeeRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;
        rows.into_iter().map(Employee::try_from).collect()
    }

    async fn get_employee(&self, id: u64) -> StoreResult<Option<Employee>> {
        let sql = format!("{EMPLOYEE_SELECT_SQL} WHERE id = ?");
        let row = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;
        row.map(Employee::try_from).transpose()
    }

    async fn employee_code_exists(&self, employee_id: &str) -> StoreResult<bool> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees WHERE employee_id = ?")
                .bind(employee_id)
                .fetch_one(&self.pool)
                .await
                .map_err(map_db_error)?;
        Ok(count > 0)
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(count > 0)
    }

    async fn insert_employee(&self, employee: &NewEmployee) -> StoreResult<Employee> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO employees
            (employee_id, full_name, email, department, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&employee.employee_id)
        .bind(&employee.full_name)
        .bind(&employee.email)
        .bind(employee.department.as_ref())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        let id = result.last_insert_id();
        debug!(id, "Inserted employee row");

        self.get_employee(id).await?.ok_or_else(|| {
            StoreError::InvalidData(format!("employee {id} vanished after insert"))
        })
    }

    async fn delete_employee(&self, id: u64) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        // The FK cascades too; deleting explicitly keeps the behaviour on
        // tables created without it.
        sqlx::query("DELETE FROM attendance WHERE employee_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        let result = sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(map_db_error)?;
            return Ok(false);
        }

        tx.commit().await.map_err(map_db_error)?;
        Ok(true)
    }

    async fn count_employees(&self) -> StoreResult<u64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) AS total FROM employees")
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(to_count(total))
    }

    async fn department_counts(&self) -> StoreResult<Vec<DepartmentCount>> {
        let rows = sqlx::query_as::<_, DepartmentCountRow>(
            r#"
            SELECT department, COUNT(*) AS count
            FROM employees
            GROUP BY department
            ORDER BY count DESC, department ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        rows.into_iter()
            .map(|row| -> StoreResult<DepartmentCount> {
                let department = row.department.parse().map_err(|_| {
                    StoreError::InvalidData(format!("unknown department {:?}", row.department))
                })?;
                Ok(DepartmentCount {
                    department,
                    count: to_count(row.count),
                })
            })
            .collect()
    }
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn list_attendance(&self, filter: &AttendanceFilter) -> StoreResult<Vec<Attendance>> {
        let mut builder = QueryBuilder::<MySql>::new(ATTENDANCE_SELECT_SQL);
        let mut has_where = false;

        if let Some(employee) = filter.employee {
            push_condition(&mut builder, &mut has_where, "a.employee_id");
            builder.push_bind(employee);
        }
        if let Some(date) = filter.date {
            push_condition(&mut builder, &mut has_where, "a.date");
            builder.push_bind(date);
        }
        if let Some(status) = filter.status {
            push_condition(&mut builder, &mut has_where, "a.status");
            builder.push_bind(status.to_string());
        }
        builder.push(" ORDER BY a.date DESC, a.id DESC");

        debug!(sql = %builder.sql(), ?filter, "Fetching attendance");

        let rows = builder
            .build_query_as::<AttendanceRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;
        rows.into_iter().map(Attendance::try_from).collect()
    }

    async fn get_attendance(&self, id: u64) -> StoreResult<Option<Attendance>> {
        let sql = format!("{ATTENDANCE_SELECT_SQL} WHERE a.id = ?");
        let row = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;
        row.map(Attendance::try_from).transpose()
    }

    async fn attendance_exists(
        &self,
        employee: u64,
        date: NaiveDate,
        exclude: Option<u64>,
    ) -> StoreResult<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM attendance
            WHERE employee_id = ? AND date = ? AND (? IS NULL OR id <> ?)
            "#,
        )
        .bind(employee)
        .bind(date)
        .bind(exclude)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(count > 0)
    }

    async fn insert_attendance(&self, attendance: &NewAttendance) -> StoreResult<Attendance> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance (employee_id, date, status, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(attendance.employee)
        .bind(attendance.date)
        .bind(attendance.status.as_ref())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        let id = result.last_insert_id();
        debug!(id, employee = attendance.employee, "Inserted attendance row");

        self.get_attendance(id).await?.ok_or_else(|| {
            StoreError::InvalidData(format!("attendance {id} vanished after insert"))
        })
    }

    async fn delete_attendance(&self, id: u64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM attendance WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn attendance_summary(&self) -> StoreResult<Vec<AttendanceSummary>> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT
                e.id AS employee_id,
                e.employee_id AS employee_id_display,
                e.full_name AS employee_name,
                COUNT(CASE WHEN a.status = 'Present' THEN 1 END) AS total_present,
                COUNT(CASE WHEN a.status = 'Absent' THEN 1 END) AS total_absent
            FROM attendance a
            JOIN employees e ON e.id = a.employee_id
            GROUP BY e.id, e.employee_id, e.full_name
            ORDER BY e.employee_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows
            .into_iter()
            .map(|row| AttendanceSummary {
                employee_id: row.employee_id,
                employee_id_display: row.employee_id_display,
                employee_name: row.employee_name,
                total_present: to_count(row.total_present),
                total_absent: to_count(row.total_absent),
            })
            .collect())
    }
}
