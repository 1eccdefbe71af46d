//! Field checks shared by the request-facing services.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static PERSON_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z\s'\-.]+$").unwrap());
static BUSINESS_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9\s.,&'\-()!?@#+$%:;]+$").unwrap());
static PHONE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+?1?\d{10,15}$").unwrap());
static EMAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static STATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z]{2}$").unwrap());
static ZIP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{5}(-\d{4})?$").unwrap());

/// One or more rejected fields, reported together.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", .0.join("; "))]
pub struct ValidationError(pub Vec<String>);

impl ValidationError {
    pub fn single(message: impl Into<String>) -> Self {
        Self(vec![message.into()])
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }
}

/// Collects failures so a request reports every bad field at once.
#[derive(Debug, Default)]
pub struct Checks {
    errors: Vec<String>,
}

impl Checks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(&mut self, ok: bool, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.errors.push(message.into());
        }
        self
    }

    pub fn len_between(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let len = value.chars().count();
        self.require(
            (min..=max).contains(&len),
            format!("{field} must be between {min} and {max} characters"),
        )
    }

    pub fn max_len(&mut self, field: &str, value: Option<&str>, max: usize) -> &mut Self {
        let ok = value.is_none_or(|v| v.chars().count() <= max);
        self.require(ok, format!("{field} must be at most {max} characters"))
    }

    pub fn person_name(&mut self, field: &str, value: &str) -> &mut Self {
        self.len_between(field, value, 2, 100);
        self.require(
            PERSON_NAME.is_match(value),
            format!("{field} must contain only letters, spaces, hyphens, apostrophes, and periods"),
        )
    }

    pub fn business_name(&mut self, value: &str) -> &mut Self {
        self.len_between("businessName", value, 2, 100);
        self.require(
            BUSINESS_NAME.is_match(value),
            "Business name contains invalid characters",
        )
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        self.require(
            value.len() <= 255 && EMAIL.is_match(value),
            format!("{field} must be a valid email address"),
        )
    }

    pub fn phone(&mut self, field: &str, value: &str) -> &mut Self {
        self.require(
            PHONE.is_match(value),
            format!("{field} must be 10-15 digits with optional country code"),
        )
    }

    pub fn state(&mut self, value: &str) -> &mut Self {
        self.require(
            STATE.is_match(value),
            "State must be a 2-letter uppercase code",
        )
    }

    pub fn zip(&mut self, value: &str) -> &mut Self {
        self.require(ZIP.is_match(value), "ZIP must be 5 digits or 5+4 format")
    }

    pub fn http_url(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        let ok = value.is_none_or(|v| {
            v.len() <= 500
                && url::Url::parse(v).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
        });
        self.require(ok, format!("{field} must be an http(s) URL of at most 500 characters"))
    }

    pub fn finish(&mut self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError(std::mem::take(&mut self.errors)))
        }
    }
}
