use thiserror::Error;

/// A request body failed a validation rule before reaching the store.
///
/// Validation short-circuits on the first failing rule; `message` is the
/// client-facing text for the 400 response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    /// JSON field the rule applies to ("firstName", "maladyId", ...).
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ValidationError>;
