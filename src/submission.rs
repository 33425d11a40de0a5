//! Reader-submitted articles. The form is still validated, but accepted
//! submissions go nowhere while the site runs on the live feed.

use serde::{Deserialize, Serialize};

use crate::error::{Error, FieldErrors, Result};

pub const SUBMISSION_DISABLED: &str = "Submission is disabled.";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub category: String,
}

/// (field, minimum length, label used in the message)
const RULES: [(&str, usize, &str); 5] = [
    ("title", 5, "Title"),
    ("content", 20, "Content"),
    ("author", 2, "Author name"),
    ("location", 2, "Location"),
    ("category", 3, "Category"),
];

impl SubmissionForm {
    fn field(&self, name: &str) -> &str {
        match name {
            "title" => &self.title,
            "content" => &self.content,
            "author" => &self.author,
            "location" => &self.location,
            _ => &self.category,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        for (name, min, label) in RULES {
            if self.field(name).trim().chars().count() < min {
                errors.add(
                    name,
                    format!("{} must be at least {} characters long", label, min),
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(errors))
        }
    }
}

/// Response body for a submission attempt.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FormState {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl FormState {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: None,
        }
    }

    pub fn invalid(errors: FieldErrors) -> Self {
        Self {
            message: "Please correct the errors below.".to_string(),
            errors: Some(errors),
        }
    }
}
