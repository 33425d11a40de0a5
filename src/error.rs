use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// Field name to the messages describing why it was rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(pub BTreeMap<String, Vec<String>>);

impl FieldErrors {
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
        self.0.get(field).map(|v| v.as_slice())
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("News provider unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Model invocation failed: {0}")]
    ModelInvocation(String),

    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Search query is empty")]
    EmptyQuery,
}

pub type Result<T> = std::result::Result<T, Error>;
