// Validation utilities module
// Custom validator functions and the form-style error map shared by the wizard and the API

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{ValidationError, ValidationErrors};

pub const REQUIRED: &str = "This field is required.";

/// Field name to messages, in field order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.0.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// `Ok(())` when no error was recorded
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut field_errors = FieldErrors::new();
        for (field, errors) in errors.field_errors() {
            for error in errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| default_message(&error.code).to_string());
                field_errors.add(field, message);
            }
        }
        field_errors
    }
}

fn default_message(code: &str) -> &'static str {
    match code {
        "email" => "Enter a valid email address.",
        "length" => "Ensure this value has the correct length.",
        "invalid_language" => "Select a valid choice.",
        "invalid_account_number" => "Enter a valid account number.",
        _ => "Enter a valid value.",
    }
}

/// Languages a certificate batch can be issued in
pub const LANGUAGES: [&str; 2] = ["en", "fr"];

pub fn validate_language(language: &str) -> Result<(), ValidationError> {
    if LANGUAGES.contains(&language) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_language"))
    }
}

/// Account numbers accepted by the programmatic API: 1 to 10 alphanumerics
pub fn validate_account_number(account_number: &str) -> Result<(), ValidationError> {
    static ACCOUNT_NUMBER: OnceLock<Regex> = OnceLock::new();
    let pattern = ACCOUNT_NUMBER.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9]{1,10}$").expect("account number pattern is valid")
    });

    if pattern.is_match(account_number) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_account_number"))
    }
}

/// Strips surrounding whitespace and carriage returns from free text
pub fn sanitize_text(value: &str) -> String {
    value.trim().replace("\r\n", "\n").replace('\r', "")
}
