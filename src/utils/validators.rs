use chrono::NaiveTime;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::FieldErrors;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static REG_NO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]{6,12}$").expect("valid reg no regex"));
static STAFF_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]{4,10}$").expect("valid staff id regex"));

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn validate_reg_no(reg_no: &str) -> bool {
    REG_NO_RE.is_match(reg_no)
}

pub fn validate_staff_id(staff_id: &str) -> bool {
    STAFF_ID_RE.is_match(staff_id)
}

pub fn validate_required(value: &str) -> bool {
    !value.trim().is_empty()
}

pub fn validate_min_length(value: &str, min_length: usize) -> bool {
    value.chars().count() >= min_length
}

/// `HH:MM`, 24 hour clock
pub fn validate_time(value: &str) -> bool {
    value.len() == 5 && NaiveTime::parse_from_str(value, "%H:%M").is_ok()
}

/// Collects per-field messages; the first message for a field wins.
#[derive(Debug, Default)]
pub struct Checks {
    errors: FieldErrors,
}

impl Checks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &'static str, message: &str) -> &mut Self {
        if !ok {
            self.errors.entry(field).or_insert_with(|| message.to_string());
        }
        self
    }

    pub fn required(&mut self, value: &str, field: &'static str, message: &str) -> &mut Self {
        self.check(validate_required(value), field, message)
    }

    pub fn required_opt(
        &mut self,
        value: Option<&str>,
        field: &'static str,
        message: &str,
    ) -> &mut Self {
        self.check(value.is_some_and(validate_required), field, message)
    }

    pub fn finish(&mut self) -> Result<(), crate::error::ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(crate::error::ApiError::Validation(std::mem::take(
                &mut self.errors,
            )))
        }
    }
}
