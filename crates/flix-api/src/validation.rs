//! Request payload validation
//!
//! Registration and profile updates share one payload. Rules are declared
//! with `validator` derives and every failure is collected, so one 422
//! response lists all of them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

pub const USERNAME_TOO_SHORT: &str = "Username must be at least 5 characters.";
pub const USERNAME_NOT_ALPHANUMERIC: &str =
    "Username contains non alphanumeric characters - not allowed.";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters.";
pub const EMAIL_INVALID: &str = "Email is not valid";
pub const BIRTHDAY_INVALID: &str = "Birthday is not valid";

/// Field order used when reporting violations
const FIELD_ORDER: [&str; 4] = ["Username", "Password", "Email", "Birthday"];

/// Accepted birthday layouts
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Registration / update body
///
/// Absent fields deserialize as empty strings so they fail validation
/// rather than the JSON extractor.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UserPayload {
    #[serde(rename = "Username")]
    #[validate(
        length(min = 5, message = "Username must be at least 5 characters."),
        custom(function = "validate_alphanumeric")
    )]
    pub username: String,

    #[serde(rename = "Password")]
    #[validate(length(min = 8, message = "Password must be at least 8 characters."))]
    pub password: String,

    #[serde(rename = "Email")]
    #[validate(email(message = "Email is not valid"))]
    pub email: String,

    #[serde(rename = "Birthday")]
    #[validate(custom(function = "validate_birthday"))]
    pub birthday: String,
}

/// Login body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginPayload {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Password")]
    pub password: String,
}

/// One failed rule, in the shape clients already parse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub param: String,
    pub msg: String,
    pub location: String,
}

impl FieldViolation {
    fn body(param: &str, msg: impl Into<String>) -> Self {
        Self {
            param: param.to_string(),
            msg: msg.into(),
            location: "body".to_string(),
        }
    }
}

/// A payload that passed every rule
#[derive(Debug, Clone)]
pub struct ValidatedUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub birthday: NaiveDate,
}

impl UserPayload {
    /// Check every rule and convert into typed values
    pub fn into_validated(self) -> Result<ValidatedUser, Vec<FieldViolation>> {
        if let Err(errors) = self.validate() {
            return Err(collect_violations(&errors));
        }

        let birthday = parse_birthday(&self.birthday)
            .ok_or_else(|| vec![FieldViolation::body("Birthday", BIRTHDAY_INVALID)])?;

        Ok(ValidatedUser {
            username: self.username,
            password: self.password,
            email: self.email,
            birthday,
        })
    }
}

/// Parse `YYYY-MM-DD` or `YYYY/MM/DD` into a calendar date
pub fn parse_birthday(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

fn validate_alphanumeric(value: &str) -> Result<(), ValidationError> {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Ok(());
    }
    Err(rule_error("alphanumeric", USERNAME_NOT_ALPHANUMERIC))
}

fn validate_birthday(value: &str) -> Result<(), ValidationError> {
    match parse_birthday(value) {
        Some(_) => Ok(()),
        None => Err(rule_error("date", BIRTHDAY_INVALID)),
    }
}

fn rule_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Length rules are reported before format rules on the same field
fn rule_rank(code: &str) -> u8 {
    match code {
        "length" => 0,
        _ => 1,
    }
}

fn collect_violations(errors: &ValidationErrors) -> Vec<FieldViolation> {
    let field_errors = errors.field_errors();
    let mut violations = Vec::new();

    for param in FIELD_ORDER {
        let Some((_, errs)) = field_errors
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(param))
        else {
            continue;
        };

        let mut errs: Vec<&ValidationError> = errs.iter().collect();
        errs.sort_by_key(|e| rule_rank(&e.code));

        for error in errs {
            let msg = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("{param} is not valid"));
            violations.push(FieldViolation::body(param, msg));
        }
    }

    violations
}
