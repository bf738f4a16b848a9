use serde_json::json;

use crate::api::FieldError;

/// Collector for request-body field violations.
///
/// Handlers run their checks, then call [`Violations::check`] and bubble the
/// collected entries up as a validation error.
#[derive(Debug, Default)]
pub struct Violations {
    errors: Vec<FieldError>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a non-blank string value.
    pub fn require(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.reject(field, "must not be blank", Some(json!(value)));
        }
        self
    }

    pub fn reject(
        &mut self,
        field: &str,
        message: &str,
        rejected_value: Option<serde_json::Value>,
    ) -> &mut Self {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.to_string(),
            rejected_value,
        });
        self
    }

    pub fn check(self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_input_passes() {
        let mut v = Violations::new();
        v.require("email", "user@example.com");
        assert!(v.check().is_ok());
    }

    #[test]
    fn blank_field_is_named_in_the_error() {
        let mut v = Violations::new();
        v.require("email", "   ");
        v.require("full_name", "Alice");
        let errors = v.check().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "email");
        assert_eq!(errors[0].rejected_value, Some(json!("   ")));
    }

    #[test]
    fn violations_accumulate() {
        let mut v = Violations::new();
        v.require("email", "");
        v.reject("status", "unknown value", None);
        let errors = v.check().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["email", "status"]);
    }
}
