use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult, FieldErrors};
use crate::model::attendance::{
    Attendance, AttendanceFilter, AttendanceQuery, AttendanceSummary, CreateAttendance,
    NewAttendance, UNKNOWN_EMPLOYEE_CHOICE, unknown_employee,
};
use crate::store::{AttendanceStore, Constraint, EmployeeStore, StoreError};

fn duplicate_day(date: NaiveDate) -> String {
    format!("Attendance for this employee on {date} already exists.")
}

#[derive(Clone)]
pub struct AttendanceService {
    attendance: Arc<dyn AttendanceStore>,
    employees: Arc<dyn EmployeeStore>,
}

impl AttendanceService {
    pub fn new(attendance: Arc<dyn AttendanceStore>, employees: Arc<dyn EmployeeStore>) -> Self {
        Self {
            attendance,
            employees,
        }
    }

    /// Lists records matching the query. An `employee` filter must name an
    /// existing employee.
    pub async fn list(&self, query: AttendanceQuery) -> ApiResult<Vec<Attendance>> {
        let filter = query.validate()?;
        if let Some(employee) = filter.employee {
            if self.employees.get_employee(employee).await?.is_none() {
                return Err(FieldErrors::single("employee", UNKNOWN_EMPLOYEE_CHOICE).into());
            }
        }
        self.list_filtered(&filter).await
    }

    pub async fn list_filtered(&self, filter: &AttendanceFilter) -> ApiResult<Vec<Attendance>> {
        let records = self.attendance.list_attendance(filter).await?;
        debug!(count = records.len(), ?filter, "Listed attendance");
        Ok(records)
    }

    pub async fn create(&self, payload: CreateAttendance) -> ApiResult<Attendance> {
        let new = payload.validate()?;
        self.check(&new, None).await?;

        let record = self
            .attendance
            .insert_attendance(&new)
            .await
            .map_err(|e| conflict_to_validation(e, &new))?;

        info!(
            id = record.id,
            employee = record.employee,
            date = %record.date,
            status = %record.status,
            "Attendance marked"
        );
        Ok(record)
    }

    /// Checks the referenced employee and the one-record-per-day rule.
    /// `current` is the record being edited, which never collides with itself.
    pub async fn check(&self, new: &NewAttendance, current: Option<u64>) -> ApiResult<()> {
        if self.employees.get_employee(new.employee).await?.is_none() {
            return Err(FieldErrors::single("employee", unknown_employee(new.employee)).into());
        }
        if self
            .attendance
            .attendance_exists(new.employee, new.date, current)
            .await?
        {
            return Err(FieldErrors::single("date", duplicate_day(new.date)).into());
        }
        Ok(())
    }

    pub async fn delete(&self, id: u64) -> ApiResult<()> {
        if !self.attendance.delete_attendance(id).await? {
            return Err(ApiError::NotFound);
        }
        info!(id, "Attendance deleted");
        Ok(())
    }

    pub async fn summary(&self) -> ApiResult<Vec<AttendanceSummary>> {
        Ok(self.attendance.attendance_summary().await?)
    }
}

fn conflict_to_validation(err: StoreError, new: &NewAttendance) -> ApiError {
    match err {
        StoreError::Conflict(Constraint::AttendanceDay) => {
            FieldErrors::single("date", duplicate_day(new.date)).into()
        }
        StoreError::Conflict(Constraint::EmployeeReference) => {
            FieldErrors::single("employee", unknown_employee(new.employee)).into()
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceStatus;
    use crate::model::employee::{Department, Employee, NewEmployee};
    use crate::store::MemoryStore;

    struct Fixture {
        store: Arc<MemoryStore>,
        service: AttendanceService,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            let service = AttendanceService::new(store.clone(), store.clone());
            Self { store, service }
        }

        async fn employee(&self, code: &str) -> Employee {
            self.store
                .insert_employee(&NewEmployee {
                    employee_id: code.to_string(),
                    full_name: format!("Name {code}"),
                    email: format!("{}@x.com", code.to_lowercase()),
                    department: Department::Operations,
                })
                .await
                .unwrap()
        }

        async fn mark(&self, employee: u64, date: &str, status: &str) -> ApiResult<Attendance> {
            self.service
                .create(CreateAttendance {
                    employee: Some(employee.into()),
                    date: Some(date.into()),
                    status: Some(status.into()),
                })
                .await
        }
    }

    fn field_error(result: ApiResult<Attendance>, field: &str) -> String {
        match result {
            Err(ApiError::Validation(errors)) => errors
                .get(field)
                .unwrap_or_else(|| panic!("no error on {field}: {errors}"))
                .to_string(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[actix_web::test]
    async fn create_enriches_with_employee_fields() {
        let fx = Fixture::new();
        let ann = fx.employee("E1").await;
        let record = fx
            .service
            .create(CreateAttendance {
                employee: Some(ann.id.into()),
                date: Some("2024-01-01".into()),
                status: None,
            })
            .await
            .unwrap();
        assert_eq!(record.employee, ann.id);
        assert_eq!(record.employee_name, "Name E1");
        assert_eq!(record.employee_id_display, "E1");
        assert_eq!(record.status, AttendanceStatus::Present);
    }

    #[actix_web::test]
    async fn second_mark_for_same_day_fails_on_date() {
        let fx = Fixture::new();
        let ann = fx.employee("E1").await;
        fx.mark(ann.id, "2024-01-01", "Present").await.unwrap();

        let message = field_error(fx.mark(ann.id, "2024-01-01", "Present").await, "date");
        assert_eq!(
            message,
            "Attendance for this employee on 2024-01-01 already exists."
        );

        // a different day or a different employee is fine
        fx.mark(ann.id, "2024-01-02", "Absent").await.unwrap();
        let bob = fx.employee("E2").await;
        fx.mark(bob.id, "2024-01-01", "Absent").await.unwrap();
    }

    #[actix_web::test]
    async fn concurrent_marks_for_same_day_leave_one_record() {
        let fx = Fixture::new();
        let ann = fx.employee("E1").await;

        let (first, second) = tokio::join!(
            fx.mark(ann.id, "2024-01-01", "Present"),
            fx.mark(ann.id, "2024-01-01", "Absent"),
        );
        let (winner, loser) = match (first, second) {
            (Ok(record), Err(err)) | (Err(err), Ok(record)) => (record, Err(err)),
            other => panic!("expected exactly one success, got {other:?}"),
        };
        assert_eq!(winner.employee, ann.id);
        assert_eq!(
            field_error(loser, "date"),
            "Attendance for this employee on 2024-01-01 already exists."
        );

        let all = fx.service.list(AttendanceQuery::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, winner.id);
    }

    #[actix_web::test]
    async fn employee_filter_must_name_an_existing_employee() {
        let fx = Fixture::new();
        let ann = fx.employee("E1").await;
        fx.mark(ann.id, "2024-01-01", "Present").await.unwrap();

        let result = fx
            .service
            .list(AttendanceQuery {
                employee: Some((ann.id + 100).to_string()),
                ..AttendanceQuery::default()
            })
            .await;
        match result {
            Err(ApiError::Validation(errors)) => {
                assert_eq!(errors.get("employee"), Some(UNKNOWN_EMPLOYEE_CHOICE))
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[actix_web::test]
    async fn check_ignores_the_record_being_edited() {
        let fx = Fixture::new();
        let ann = fx.employee("E1").await;
        let record = fx.mark(ann.id, "2024-01-01", "Present").await.unwrap();
        let edit = NewAttendance {
            employee: ann.id,
            date: record.date,
            status: AttendanceStatus::Absent,
        };
        assert!(fx.service.check(&edit, Some(record.id)).await.is_ok());
        assert!(fx.service.check(&edit, None).await.is_err());
    }

    #[actix_web::test]
    async fn unknown_employee_is_a_field_error() {
        let fx = Fixture::new();
        let message = field_error(fx.mark(404, "2024-01-01", "Present").await, "employee");
        assert_eq!(message, "Invalid pk \"404\" - object does not exist.");
    }

    #[actix_web::test]
    async fn list_applies_filters() {
        let fx = Fixture::new();
        let ann = fx.employee("E1").await;
        let bob = fx.employee("E2").await;
        fx.mark(ann.id, "2024-01-01", "Present").await.unwrap();
        fx.mark(ann.id, "2024-01-02", "Absent").await.unwrap();
        fx.mark(bob.id, "2024-01-01", "Absent").await.unwrap();

        let all = fx.service.list(AttendanceQuery::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].date.to_string(), "2024-01-02");

        let absent_on_first = fx
            .service
            .list(AttendanceQuery {
                date: Some("2024-01-01".into()),
                status: Some("Absent".into()),
                ..AttendanceQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(absent_on_first.len(), 1);
        assert_eq!(absent_on_first[0].employee, bob.id);

        let anns = fx
            .service
            .list(AttendanceQuery {
                employee: Some(ann.id.to_string()),
                ..AttendanceQuery::default()
            })
            .await
            .unwrap();
        assert!(anns.iter().all(|a| a.employee == ann.id));
        assert_eq!(anns.len(), 2);
    }

    #[actix_web::test]
    async fn summary_counts_present_and_absent() {
        let fx = Fixture::new();
        let zed = fx.employee("Z9").await;
        let ann = fx.employee("A1").await;
        fx.employee("M5").await; // no records, left out of the summary

        for day in 1..=4 {
            fx.mark(zed.id, &format!("2024-02-0{day}"), "Present")
                .await
                .unwrap();
        }
        fx.mark(zed.id, "2024-02-05", "Absent").await.unwrap();
        fx.mark(ann.id, "2024-02-01", "Absent").await.unwrap();
        fx.mark(ann.id, "2024-02-02", "Absent").await.unwrap();

        let summary = fx.service.summary().await.unwrap();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].employee_id_display, "A1");
        assert_eq!((summary[0].total_present, summary[0].total_absent), (0, 2));
        assert_eq!(summary[1].employee_id_display, "Z9");
        assert_eq!(summary[1].employee_id, zed.id);
        assert_eq!((summary[1].total_present, summary[1].total_absent), (4, 1));
    }

    #[actix_web::test]
    async fn delete_removes_record() {
        let fx = Fixture::new();
        let ann = fx.employee("E1").await;
        let record = fx.mark(ann.id, "2024-01-01", "Present").await.unwrap();

        fx.service.delete(record.id).await.unwrap();
        assert!(matches!(fx.service.delete(record.id).await, Err(ApiError::NotFound)));
        assert!(fx.service.list(AttendanceQuery::default()).await.unwrap().is_empty());
    }

    #[test]
    fn store_conflicts_become_field_errors() {
        let new = NewAttendance {
            employee: 1,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            status: AttendanceStatus::Present,
        };
        match conflict_to_validation(StoreError::Conflict(Constraint::AttendanceDay), &new) {
            ApiError::Validation(errors) => assert_eq!(
                errors.get("date"),
                Some("Attendance for this employee on 2024-01-01 already exists.")
            ),
            other => panic!("unexpected {other:?}"),
        }
    }
}
