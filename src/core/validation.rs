//! Field-level validation helpers shared by the core operations.

use crate::errors::{Error, Result};
use sea_orm::prelude::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Message used when a required field is absent or blank.
pub const REQUIRED: &str = "This field is required.";

/// Validation messages keyed by field name.
///
/// Serializes as a plain JSON object, e.g. `{"city": ["This field is required."]}`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Records a message against `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Returns the messages recorded for `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// True when no field has a message.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `Ok(())` when empty, otherwise a [`Error::Validation`].
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation { errors: self })
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{field}: {}", messages.join(" "))?;
        }
        Ok(())
    }
}

/// Checks a required text field: present, non-blank, and at most `max_len` characters.
///
/// Returns the trimmed value when valid.
pub fn required_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    max_len: usize,
) -> Option<String> {
    let trimmed = value.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        errors.add(field, REQUIRED);
        return None;
    }
    if trimmed.chars().count() > max_len {
        errors.add(
            field,
            format!("Ensure this field has no more than {max_len} characters."),
        );
        return None;
    }
    Some(trimmed.to_string())
}

/// Checks that a decimal amount is non-negative and fits `max_digits` / `decimal_places`.
pub fn check_decimal(
    errors: &mut FieldErrors,
    field: &str,
    value: Decimal,
    max_digits: u32,
    decimal_places: u32,
) {
    if value.is_sign_negative() && !value.is_zero() {
        errors.add(field, "Ensure this value is greater than or equal to 0.");
        return;
    }
    let normalized = value.normalize();
    if normalized.scale() > decimal_places {
        errors.add(
            field,
            format!("Ensure that there are no more than {decimal_places} decimal places."),
        );
        return;
    }
    let whole_digits = normalized.trunc().abs().to_string().trim_start_matches('0').len();
    let max_whole = (max_digits - decimal_places) as usize;
    if whole_digits > max_whole {
        errors.add(
            field,
            format!("Ensure that there are no more than {max_digits} digits in total."),
        );
    }
}
