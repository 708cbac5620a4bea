//! Request-body validation.
//!
//! Bodies are first deserialized into the loose `*Body` types (unknown fields and
//! wrong JSON types are rejected there), then checked field by field into the
//! typed requests with defaults applied. All field failures are collected so the
//! client sees every problem at once.

use crate::errors::{AppError, FieldError};
use crate::models::*;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::str::FromStr;

const MAX_TEXT_LEN: usize = 255;
const MAX_KEYWORD_LEN: usize = 200;
const MAX_MESSAGE_LEN: usize = 5000;
const MAX_EMAIL_LEN: usize = 254;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    )
    .expect("email regex is valid")
});

static DATE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date regex is valid"));

/// A request body that can be checked into its typed, defaulted form.
pub trait Validate {
    type Output;

    fn validate(self) -> Result<Self::Output, AppError>;
}

/// Decodes a raw request body. An empty body counts as `{}`.
pub fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    let value: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice(body).map_err(|e| {
            AppError::validation(vec![FieldError::new(
                "body",
                format!("must be valid JSON: {}", e),
            )])
        })?
    };

    if !value.is_object() {
        return Err(AppError::validation(vec![FieldError::new(
            "body",
            "must be a JSON object",
        )]));
    }

    serde_json::from_value(value)
        .map_err(|e| AppError::validation(vec![FieldError::new("body", e.to_string())]))
}

/// Checks the format of an email address.
pub fn is_valid_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LEN && EMAIL_REGEX.is_match(email)
}

#[derive(Default)]
struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    fn non_negative(&mut self, field: &str, value: Option<i64>) -> Option<u32> {
        let value = value?;
        if value < 0 {
            self.fail(field, "must be greater than or equal to 0");
            return None;
        }
        match u32::try_from(value) {
            Ok(v) => Some(v),
            Err(_) => {
                self.fail(field, format!("must be less than or equal to {}", u32::MAX));
                None
            }
        }
    }

    fn non_negative_number(&mut self, field: &str, value: Option<f64>) -> Option<f64> {
        let value = value?;
        if !value.is_finite() || value < 0.0 {
            self.fail(field, "must be a number greater than or equal to 0");
            return None;
        }
        Some(value)
    }

    fn int_in_range(&mut self, field: &str, value: Option<i64>, default: i64, min: i64, max: i64) -> u32 {
        let value = value.unwrap_or(default);
        if value < min || value > max {
            self.fail(field, format!("must be between {} and {}", min, max));
            return default as u32;
        }
        value as u32
    }

    fn ordered<T: PartialOrd>(&mut self, min_field: &str, max_field: &str, min: Option<T>, max: Option<T>) {
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                self.fail(
                    min_field,
                    format!("must be less than or equal to {}", max_field),
                );
            }
        }
    }

    /// Trimmed text; blank counts as absent.
    fn text(&mut self, field: &str, value: Option<String>, max_len: usize) -> Option<String> {
        let value = value?.trim().to_string();
        if value.is_empty() {
            return None;
        }
        if value.chars().count() > max_len {
            self.fail(field, format!("must be at most {} characters", max_len));
            return None;
        }
        Some(value)
    }

    fn required_text(&mut self, field: &str, value: Option<String>, max_len: usize) -> Option<String> {
        let present = value.as_deref().is_some_and(|v| !v.trim().is_empty());
        if !present {
            self.fail(field, "is required");
            return None;
        }
        self.text(field, value, max_len)
    }

    fn list(&mut self, field: &str, values: Option<Vec<String>>) -> Vec<String> {
        let mut out = Vec::new();
        for (i, value) in values.unwrap_or_default().into_iter().enumerate() {
            let value = value.trim();
            if value.is_empty() {
                self.fail(&format!("{}[{}]", field, i), "must not be empty");
            } else if value.chars().count() > MAX_TEXT_LEN {
                self.fail(
                    &format!("{}[{}]", field, i),
                    format!("must be at most {} characters", MAX_TEXT_LEN),
                );
            } else {
                out.push(value.to_string());
            }
        }
        out
    }

    fn date(&mut self, field: &str, value: Option<String>) -> Option<NaiveDate> {
        let value = value?;
        let value = value.trim();
        if !DATE_REGEX.is_match(value) {
            self.fail(field, "must be a date in YYYY-MM-DD format");
            return None;
        }
        match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                self.fail(field, "must be a valid calendar date");
                None
            }
        }
    }

    fn choice<T: FromStr>(&mut self, field: &str, value: Option<String>, variants: &[&str]) -> Option<T> {
        let value = value?;
        match value.trim().parse::<T>() {
            Ok(v) => Some(v),
            Err(_) => {
                self.fail(field, format!("must be one of [{}]", variants.join(", ")));
                None
            }
        }
    }

    fn paging(&mut self, page: Option<i64>, page_size: Option<i64>) -> Paging {
        Paging {
            page: self.int_in_range("page", page, DEFAULT_PAGE, 1, u32::MAX as i64),
            page_size: self.int_in_range("page_size", page_size, DEFAULT_PAGE_SIZE, 1, MAX_PAGE_SIZE),
        }
    }

    fn finish<T>(self, value: T) -> Result<T, AppError> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(AppError::validation(self.errors))
        }
    }
}

impl Validate for RentalSearchBody {
    type Output = RentalSearch;

    fn validate(self) -> Result<RentalSearch, AppError> {
        let mut c = Checker::default();

        let beds_min = c.non_negative("beds_min", self.beds_min);
        let beds_max = c.non_negative("beds_max", self.beds_max);
        c.ordered("beds_min", "beds_max", beds_min, beds_max);

        let baths_min = c.non_negative_number("baths_min", self.baths_min);
        let baths_max = c.non_negative_number("baths_max", self.baths_max);
        c.ordered("baths_min", "baths_max", baths_min, baths_max);

        let rent_min = c.non_negative("rent_min", self.rent_min);
        let rent_max = c.non_negative("rent_max", self.rent_max);
        c.ordered("rent_min", "rent_max", rent_min, rent_max);

        let availability_start = c.date("availability_start", self.availability_start);
        let availability_end = c.date("availability_end", self.availability_end);
        c.ordered(
            "availability_start",
            "availability_end",
            availability_start,
            availability_end,
        );

        let request = RentalSearch {
            beds_min,
            beds_max,
            baths_min,
            baths_max,
            rent_min,
            rent_max,
            neighborhoods: c.list("neighborhoods", self.neighborhoods),
            availability_start,
            availability_end,
            fee: c.choice("fee", self.fee, Fee::VARIANTS),
            keyword: c.text("keyword", self.keyword, MAX_KEYWORD_LEN),
            order_by: c.choice("order_by", self.order_by, OrderBy::VARIANTS),
            include_photos: self.include_photos.unwrap_or(true),
            paging: c.paging(self.page, self.page_size),
        };

        c.finish(request)
    }
}

impl Validate for AgentSearchBody {
    type Output = AgentSearch;

    fn validate(self) -> Result<AgentSearch, AppError> {
        let mut c = Checker::default();

        let request = AgentSearch {
            id: c.text("id", self.id, MAX_TEXT_LEN),
            name: c.text("name", self.name, MAX_TEXT_LEN),
            email: c.text("email", self.email, MAX_EMAIL_LEN),
            active_only: self.active_only.unwrap_or(true),
            paging: c.paging(self.page, self.page_size),
        };

        c.finish(request)
    }
}

impl Validate for LandlordSearchBody {
    type Output = LandlordSearch;

    fn validate(self) -> Result<LandlordSearch, AppError> {
        let mut c = Checker::default();

        let request = LandlordSearch {
            landlord_ids: c.list("landlord_ids", self.landlord_ids),
            name: c.text("name", self.name, MAX_TEXT_LEN),
            city: c.text("city", self.city, MAX_TEXT_LEN),
            paging: c.paging(self.page, self.page_size),
        };

        c.finish(request)
    }
}

impl Validate for LeadBody {
    type Output = Lead;

    fn validate(self) -> Result<Lead, AppError> {
        let mut c = Checker::default();

        let first_name = c.required_text("first_name", self.first_name, MAX_TEXT_LEN);
        let email = c.required_text("email", self.email, MAX_EMAIL_LEN);
        if let Some(ref email) = email {
            if !is_valid_email(email) {
                c.fail("email", "must be a valid email");
            }
        }

        let last_name = c.text("last_name", self.last_name, MAX_TEXT_LEN);
        let phone = c.text("phone", self.phone, MAX_TEXT_LEN);
        let message = c.text("message", self.message, MAX_MESSAGE_LEN);
        let source = c
            .text("source", self.source, MAX_TEXT_LEN)
            .unwrap_or_else(|| DEFAULT_LEAD_SOURCE.to_string());

        match (first_name, email) {
            (Some(first_name), Some(email)) => c.finish(Lead {
                first_name,
                last_name,
                email,
                phone,
                message,
                source,
            }),
            _ => Err(AppError::validation(c.errors)),
        }
    }
}
