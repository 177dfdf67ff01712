//! HTML form payloads and their validation.
//!
//! A form either cleans into typed values for the service layer or comes
//! back as the submitted values plus per-field messages, which the view
//! re-renders without touching the database.

pub mod auth;
pub mod comment;
pub mod group;
pub mod post;

use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;
use validator::ValidationErrors;

pub const REQUIRED: &str = "This field is required.";

/// Field name to messages. `__all__` holds errors not tied to one field.
#[derive(Debug, Default, Clone, PartialEq, Serialize, ToSchema)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub const NON_FIELD: &'static str = "__all__";

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn from_validation(errors: &ValidationErrors) -> Self {
        let mut out = Self::default();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({})", error.code));
                out.add(&field, message);
            }
        }
        out
    }

    /// One-line summary for the response envelope.
    pub fn summary(&self) -> String {
        self.0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect::<Vec<_>>()
            .join("; ")
    }
}
