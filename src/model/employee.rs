use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;
use validator::ValidateEmail;

use super::{choice_text, field_text, invalid_choice, max_length, required_text};
use crate::error::{FieldErrors, REQUIRED};

pub const EMPLOYEE_ID_MAX_LEN: usize = 20;
pub const FULL_NAME_MAX_LEN: usize = 150;
pub const EMAIL_MAX_LEN: usize = 254;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
pub enum Department {
    Engineering,
    #[serde(rename = "HR")]
    #[strum(serialize = "HR")]
    Hr,
    Finance,
    Marketing,
    Operations,
    Sales,
    Support,
    Design,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_id": "EMP-001",
        "full_name": "Ann Smith",
        "email": "ann@company.com",
        "department": "Engineering",
        "created_at": "2024-01-01T09:00:00Z",
        "updated_at": "2024-01-01T09:00:00Z"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP-001")]
    pub employee_id: String,

    #[schema(example = "Ann Smith")]
    pub full_name: String,

    #[schema(example = "ann@company.com")]
    pub email: String,

    pub department: Department,

    #[schema(example = "2024-01-01T09:00:00Z", value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,

    #[schema(example = "2024-01-01T09:00:00Z", value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

/// Raw create payload. Fields are kept as loose JSON so that missing or
/// mistyped values are reported per field instead of failing the whole body.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "EMP-001", value_type = String)]
    pub employee_id: Option<Value>,
    #[schema(example = "Ann Smith", value_type = String)]
    pub full_name: Option<Value>,
    #[schema(example = "Ann@Company.com", format = "email", value_type = String)]
    pub email: Option<Value>,
    #[schema(example = "Engineering", value_type = Department)]
    pub department: Option<Value>,
}

/// A validated, normalized employee ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub employee_id: String,
    pub full_name: String,
    pub email: String,
    pub department: Department,
}

impl CreateEmployee {
    pub fn validate(self) -> Result<NewEmployee, FieldErrors> {
        let mut errors = FieldErrors::default();

        let employee_id =
            field_text(&mut errors, "employee_id", self.employee_id).and_then(|code| {
                if code.is_empty() {
                    errors.add("employee_id", "Employee ID cannot be blank.");
                    return None;
                }
                max_length(&mut errors, "employee_id", code, EMPLOYEE_ID_MAX_LEN)
            });

        let full_name = required_text(&mut errors, "full_name", self.full_name, FULL_NAME_MAX_LEN);

        let email = required_text(&mut errors, "email", self.email, EMAIL_MAX_LEN)
            .map(|email| email.to_lowercase())
            .filter(|email| {
                let valid = is_valid_email(email);
                if !valid {
                    errors.add("email", "Enter a valid email address.");
                }
                valid
            });

        let department = match self.department {
            None => {
                errors.add("department", REQUIRED);
                None
            }
            Some(raw) => {
                let raw = choice_text(&raw);
                match raw.parse::<Department>() {
                    Ok(department) => Some(department),
                    Err(_) => {
                        errors.add("department", invalid_choice(&raw));
                        None
                    }
                }
            }
        };

        match (employee_id, full_name, email, department) {
            (Some(employee_id), Some(full_name), Some(email), Some(department))
                if errors.is_empty() =>
            {
                Ok(NewEmployee {
                    employee_id,
                    full_name,
                    email,
                    department,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Address syntax is checked by `validator`. The domain must also end in a
/// top-level label of two or more characters that is not purely numeric,
/// unless it is `localhost`.
fn is_valid_email(email: &str) -> bool {
    if !email.validate_email() {
        return false;
    }
    let Some((_, domain)) = email.rsplit_once('@') else {
        return false;
    };
    domain == "localhost"
        || domain.rsplit_once('.').is_some_and(|(_, tld)| {
            tld.chars().count() >= 2 && !tld.chars().all(|c| c.is_ascii_digit())
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DepartmentCount {
    pub department: Department,
    #[schema(example = 3)]
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[schema(
    example = json!({
        "total_employees": 5,
        "departments": [
            { "department": "Engineering", "count": 3 },
            { "department": "HR", "count": 2 }
        ]
    })
)]
pub struct EmployeeSummary {
    pub total_employees: u64,
    pub departments: Vec<DepartmentCount>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BLANK;
    use serde_json::json;
    use strum::IntoEnumIterator;

    fn payload(employee_id: &str, email: &str) -> CreateEmployee {
        CreateEmployee {
            employee_id: Some(employee_id.into()),
            full_name: Some("Ann".into()),
            email: Some(email.into()),
            department: Some("Engineering".into()),
        }
    }

    #[test]
    fn email_is_trimmed_and_lowercased() {
        let new = payload("E1", "  Ann@X.com ").validate().unwrap();
        assert_eq!(new.email, "ann@x.com");
    }

    #[test]
    fn employee_id_is_trimmed() {
        let new = payload("  E1  ", "ann@x.com").validate().unwrap();
        assert_eq!(new.employee_id, "E1");
    }

    #[test]
    fn blank_employee_id_is_rejected() {
        let errors = payload("   ", "ann@x.com").validate().unwrap_err();
        assert_eq!(errors.get("employee_id"), Some("Employee ID cannot be blank."));
    }

    #[test]
    fn missing_fields_are_reported_individually() {
        let errors = CreateEmployee::default().validate().unwrap_err();
        for field in ["employee_id", "full_name", "email", "department"] {
            assert_eq!(errors.get(field), Some(REQUIRED), "field {field}");
        }
    }

    #[test]
    fn employee_id_length_is_bounded() {
        let errors = payload(&"E".repeat(21), "ann@x.com").validate().unwrap_err();
        assert_eq!(
            errors.get("employee_id"),
            Some("Ensure this field has no more than 20 characters.")
        );
    }

    #[test]
    fn malformed_email_is_rejected() {
        for email in [
            "ann",
            "ann@",
            "@x.com",
            "ann@x",
            "a b@x.com",
            "ann@x..com",
            "ann@x.1",
            "ann@x.c",
            "ann@123.456",
        ] {
            let errors = payload("E1", email).validate().unwrap_err();
            assert_eq!(
                errors.get("email"),
                Some("Enter a valid email address."),
                "email {email}"
            );
        }
    }

    #[test]
    fn localhost_and_international_domains_are_accepted() {
        for email in ["ann@localhost", "ann@bücher.de", "ann.smith+hr@mail.company.io"] {
            let new = payload("E1", email).validate().unwrap();
            assert_eq!(new.email, email);
        }
    }

    #[test]
    fn blank_text_is_not_the_same_as_missing() {
        let mut raw = payload("E1", "  ");
        raw.full_name = Some(" ".into());
        let errors = raw.validate().unwrap_err();
        assert_eq!(errors.get("full_name"), Some(BLANK));
        assert_eq!(errors.get("email"), Some(BLANK));

        let mut raw = payload("E1", "ann@x.com");
        raw.full_name = None;
        let errors = raw.validate().unwrap_err();
        assert_eq!(errors.get("full_name"), Some(REQUIRED));
    }

    #[test]
    fn numbers_are_read_as_text_and_other_types_rejected() {
        let mut raw = payload("E1", "ann@x.com");
        raw.employee_id = Some(json!(1001));
        raw.full_name = Some(json!(["Ann"]));
        raw.department = Some(json!(5));
        let errors = raw.validate().unwrap_err();
        assert_eq!(errors.get("employee_id"), None);
        assert_eq!(errors.get("full_name"), Some("Not a valid string."));
        assert_eq!(errors.get("department"), Some("\"5\" is not a valid choice."));

        let mut raw = payload("", "ann@x.com");
        raw.employee_id = Some(json!(1001));
        assert_eq!(raw.validate().unwrap().employee_id, "1001");
    }

    #[test]
    fn unknown_department_is_an_invalid_choice() {
        let mut raw = payload("E1", "ann@x.com");
        raw.department = Some("Legal".into());
        let errors = raw.validate().unwrap_err();
        assert_eq!(errors.get("department"), Some("\"Legal\" is not a valid choice."));
    }

    #[test]
    fn department_names_round_trip_through_strings() {
        for department in Department::iter() {
            let text = department.to_string();
            assert_eq!(text.parse::<Department>().unwrap(), department);
            assert_eq!(serde_json::to_value(department).unwrap(), text);
        }
        assert_eq!(Department::Hr.to_string(), "HR");
    }
}
