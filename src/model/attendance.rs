use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::{IntoParams, ToSchema};

use super::{choice_text, invalid_choice};
use crate::error::{FieldErrors, REQUIRED};

const DATE_FORMAT: &str = "%Y-%m-%d";
const WRONG_DATE_FORMAT: &str = "Date has wrong format. Use YYYY-MM-DD.";

/// Reported when the `employee` list filter names no existing employee.
pub const UNKNOWN_EMPLOYEE_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
}

/// An attendance record joined with its employee's display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 10,
        "employee": 1,
        "employee_name": "Ann Smith",
        "employee_id_display": "EMP-001",
        "date": "2024-01-01",
        "status": "Present",
        "created_at": "2024-01-01T09:00:00Z"
    })
)]
pub struct Attendance {
    #[schema(example = 10)]
    pub id: u64,

    /// Internal id of the owning employee
    #[schema(example = 1)]
    pub employee: u64,

    #[schema(example = "Ann Smith")]
    pub employee_name: String,

    #[schema(example = "EMP-001")]
    pub employee_id_display: String,

    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub date: NaiveDate,

    pub status: AttendanceStatus,

    #[schema(example = "2024-01-01T09:00:00Z", value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

/// Raw mark payload, read field by field like [`CreateEmployee`](crate::model::employee::CreateEmployee).
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct CreateAttendance {
    #[schema(example = 1, value_type = u64)]
    pub employee: Option<Value>,
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub date: Option<Value>,
    /// Defaults to `Present`
    #[schema(example = "Present", value_type = AttendanceStatus)]
    pub status: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttendance {
    pub employee: u64,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

pub fn unknown_employee(pk: impl std::fmt::Display) -> String {
    format!("Invalid pk \"{pk}\" - object does not exist.")
}

impl CreateAttendance {
    pub fn validate(self) -> Result<NewAttendance, FieldErrors> {
        let mut errors = FieldErrors::default();

        let employee = match self.employee {
            None => {
                errors.add("employee", REQUIRED);
                None
            }
            Some(raw) => parse_pk(&mut errors, "employee", &raw),
        };

        let date = match self.date {
            None => {
                errors.add("date", REQUIRED);
                None
            }
            Some(Value::String(raw)) => parse_date(&mut errors, "date", raw.trim()),
            Some(_) => {
                errors.add("date", WRONG_DATE_FORMAT);
                None
            }
        };

        let status = match self.status {
            None => Some(AttendanceStatus::default()),
            Some(raw) => parse_status(&mut errors, "status", &choice_text(&raw)),
        };

        match (employee, date, status) {
            (Some(employee), Some(date), Some(status)) if errors.is_empty() => Ok(NewAttendance {
                employee,
                date,
                status,
            }),
            _ => Err(errors),
        }
    }
}

/// Accepts an id as a JSON number or a numeric string.
fn parse_pk(errors: &mut FieldErrors, field: &str, raw: &Value) -> Option<u64> {
    let received = match raw {
        Value::Number(number) => match (number.as_u64(), number.as_i64()) {
            (Some(pk), _) => return Some(pk),
            (None, Some(negative)) => {
                errors.add(field, unknown_employee(negative));
                return None;
            }
            _ => "float",
        },
        Value::String(text) => match text.trim().parse::<i64>() {
            Ok(pk) if pk >= 0 => return Some(pk as u64),
            Ok(negative) => {
                errors.add(field, unknown_employee(negative));
                return None;
            }
            Err(_) => "str",
        },
        Value::Bool(_) => "bool",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
        Value::Null => "null",
    };
    errors.add(
        field,
        format!("Incorrect type. Expected pk value, received {received}."),
    );
    None
}

/// Query string for the attendance listing. Empty values are ignored.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AttendanceQuery {
    /// Internal employee id
    #[param(example = 1, value_type = Option<u64>)]
    pub employee: Option<String>,
    /// Exact date, `YYYY-MM-DD`
    #[param(example = "2024-01-01", value_type = Option<String>)]
    pub date: Option<String>,
    #[param(example = "Present", value_type = Option<AttendanceStatus>)]
    pub status: Option<String>,
}

/// Validated listing filters, combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceFilter {
    pub employee: Option<u64>,
    pub date: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
}

impl AttendanceFilter {
    pub fn matches(&self, record: &Attendance) -> bool {
        self.employee.is_none_or(|employee| record.employee == employee)
            && self.date.is_none_or(|date| record.date == date)
            && self.status.is_none_or(|status| record.status == status)
    }
}

impl AttendanceQuery {
    pub fn validate(self) -> Result<AttendanceFilter, FieldErrors> {
        let mut errors = FieldErrors::default();
        let mut filter = AttendanceFilter::default();

        if let Some(raw) = non_empty(&self.employee) {
            match raw.parse::<u64>() {
                Ok(employee) => filter.employee = Some(employee),
                Err(_) => errors.add("employee", UNKNOWN_EMPLOYEE_CHOICE),
            }
        }
        if let Some(raw) = non_empty(&self.date) {
            filter.date = parse_date(&mut errors, "date", raw);
        }
        if let Some(raw) = non_empty(&self.status) {
            filter.status = parse_status(&mut errors, "status", raw);
        }

        errors.into_result().map(|()| filter)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(errors: &mut FieldErrors, field: &str, raw: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, WRONG_DATE_FORMAT);
            None
        }
    }
}

fn parse_status(errors: &mut FieldErrors, field: &str, raw: &str) -> Option<AttendanceStatus> {
    match raw.parse::<AttendanceStatus>() {
        Ok(status) => Some(status),
        Err(_) => {
            errors.add(field, invalid_choice(raw));
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceSummary {
    /// Internal employee id
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(example = "EMP-001")]
    pub employee_id_display: String,
    #[schema(example = "Ann Smith")]
    pub employee_name: String,
    #[schema(example = 20)]
    pub total_present: u64,
    #[schema(example = 2)]
    pub total_absent: u64,
}
