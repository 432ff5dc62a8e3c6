pub mod attendance;
pub mod employee;

use serde_json::Value;

use crate::error::{BLANK, FieldErrors, REQUIRED};

const NOT_A_STRING: &str = "Not a valid string.";

/// Trimmed text of a required field. Numbers are read as their literal text;
/// a missing value or any other JSON type is recorded under `field`.
pub(crate) fn field_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<Value>,
) -> Option<String> {
    match value {
        None => {
            errors.add(field, REQUIRED);
            None
        }
        Some(Value::String(text)) => Some(text.trim().to_string()),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(_) => {
            errors.add(field, NOT_A_STRING);
            None
        }
    }
}

/// A required, non-blank text field of at most `max_len` characters.
pub(crate) fn required_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<Value>,
    max_len: usize,
) -> Option<String> {
    let text = field_text(errors, field, value)?;
    if text.is_empty() {
        errors.add(field, BLANK);
        return None;
    }
    max_length(errors, field, text, max_len)
}

pub(crate) fn max_length(
    errors: &mut FieldErrors,
    field: &str,
    text: String,
    max_len: usize,
) -> Option<String> {
    if text.chars().count() > max_len {
        errors.add(
            field,
            format!("Ensure this field has no more than {max_len} characters."),
        );
        return None;
    }
    Some(text)
}

/// The text a choice field compares against its options.
pub(crate) fn choice_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.trim().to_string(),
        other => other.to_string(),
    }
}

pub(crate) fn invalid_choice(value: &str) -> String {
    format!("\"{value}\" is not a valid choice.")
}
