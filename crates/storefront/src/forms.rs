//! Form validation helpers shared by the HTML form handlers.
//!
//! Form structs derive [`validator::Validate`] for length and email rules;
//! the checks `validator` has no attribute for (required fields, username
//! characters, password rules) are added by hand. Either way the result is a
//! [`FormErrors`] that templates render next to each field.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use validator::ValidationErrors;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";

/// Field-level and form-level validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
    non_field: Vec<String>,
}

impl FormErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the messages of a derived `Validate` run.
    #[must_use]
    pub fn from_validation(errors: &ValidationErrors) -> Self {
        let mut form_errors = Self::new();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map_or_else(|| error.code.to_string(), ToString::to_string);
                form_errors.add(field.as_ref(), message);
            }
        }
        form_errors
    }

    /// Run the derived validation and collect its messages.
    #[must_use]
    pub fn validate(form: &impl validator::Validate) -> Self {
        form.validate()
            .err()
            .map(|errors| Self::from_validation(&errors))
            .unwrap_or_default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    /// Flag a blank value as required, replacing any other message on the
    /// field. Returns whether the value was present.
    pub fn require(&mut self, field: &str, value: &str) -> bool {
        if value.trim().is_empty() {
            self.fields.insert(field.to_owned(), vec![REQUIRED.to_owned()]);
            false
        } else {
            true
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    /// Messages for one field (empty when the field is valid).
    #[must_use]
    pub fn get(&self, field: &str) -> &[String] {
        self.fields.get(field).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    #[must_use]
    pub fn non_field(&self) -> &[String] {
        &self.non_field
    }

    /// `Ok(value)` when no errors were recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` when any message was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// Trimmed copy of a submitted text value.
#[must_use]
pub fn clean(value: &str) -> String {
    value.trim().to_owned()
}

/// `None` for blank input, trimmed text otherwise.
#[must_use]
pub fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// An HTML checkbox is submitted only when ticked.
#[must_use]
pub const fn checkbox(value: Option<&String>) -> bool {
    value.is_some()
}

/// Parse a money amount with at most two decimal places and at most ten
/// digits overall (`NUMERIC(10, 2)`).
///
/// # Errors
///
/// Returns a user-facing message when the value is not a valid amount.
pub fn parse_money(value: &str) -> Result<Decimal, &'static str> {
    let amount: Decimal = value
        .trim()
        .replace(',', ".")
        .parse()
        .map_err(|_| "Enter a number.")?;
    if amount.is_sign_negative() {
        return Err("Ensure this value is greater than or equal to 0.");
    }
    if amount.scale() > 2 && amount != amount.round_dp(2) {
        return Err("Ensure that there are no more than 2 decimal places.");
    }
    if amount >= Decimal::from(100_000_000) {
        return Err("Ensure that there are no more than 10 digits in total.");
    }
    Ok(amount.round_dp(2))
}

/// Parse a non-negative whole number.
///
/// # Errors
///
/// Returns a user-facing message when the value is not a valid count.
pub fn parse_count(value: &str) -> Result<i32, &'static str> {
    let count: i32 = value.trim().parse().map_err(|_| "Enter a whole number.")?;
    if count < 0 {
        return Err("Ensure this value is greater than or equal to 0.");
    }
    Ok(count)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;
    use validator::Validate;

    use super::*;

    #[derive(Debug, Default, Deserialize, Validate)]
    struct SampleForm {
        #[validate(length(max = 5, message = "Too long."))]
        name: String,
        #[validate(email(message = "Enter a valid email address."))]
        email: String,
    }

    #[test]
    fn test_validate_collects_field_messages() {
        let form = SampleForm {
            name: "toolong".to_owned(),
            email: "nope".to_owned(),
        };
        let errors = FormErrors::validate(&form);
        assert_eq!(errors.get("name"), ["Too long."]);
        assert_eq!(errors.get("email"), [INVALID_EMAIL]);
        assert!(errors.get("other").is_empty());
    }

    #[test]
    fn test_require_replaces_other_messages() {
        let form = SampleForm {
            name: String::new(),
            email: String::new(),
        };
        let mut errors = FormErrors::validate(&form);
        assert!(!errors.require("email", &form.email));
        assert_eq!(errors.get("email"), [REQUIRED]);
    }

    #[test]
    fn test_into_result() {
        assert_eq!(FormErrors::new().into_result(3).unwrap(), 3);
        let mut errors = FormErrors::new();
        errors.add_non_field("Nope.");
        assert_eq!(errors.into_result(3).unwrap_err().non_field(), ["Nope."]);
    }

    #[test]
    fn test_parse_money() {
        assert_eq!(parse_money("2499").unwrap(), "2499".parse::<Decimal>().unwrap());
        assert_eq!(parse_money(" 19,90 ").unwrap(), "19.90".parse::<Decimal>().unwrap());
        assert!(parse_money("-1").is_err());
        assert!(parse_money("1.999").is_err());
        assert!(parse_money("abc").is_err());
        assert!(parse_money("100000000").is_err());
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("50").unwrap(), 50);
        assert!(parse_count("-3").is_err());
        assert!(parse_count("2.5").is_err());
    }

    #[test]
    fn test_optional_and_checkbox() {
        assert_eq!(optional("  "), None);
        assert_eq!(optional(" x "), Some("x".to_owned()));
        assert!(checkbox(Some(&"on".to_owned())));
        assert!(!checkbox(None));
    }
}
