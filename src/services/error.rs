//! Errors shared by the resource services

use serde::Serialize;
use std::fmt;

/// What kind of rule a field broke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationKind {
    Required,
    TooLong,
    InvalidSlug,
    DuplicateSlug,
    BannedWord,
    InvalidUsername,
    UsernameTaken,
    PasswordMismatch,
    InvalidCredentials,
}

/// A rejected form field, rendered next to the field on re-display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub kind: ValidationKind,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, kind: ValidationKind, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn required(field: impl Into<String>) -> Self {
        Self::new(field, ValidationKind::Required, "Обязательное поле.")
    }

    pub fn too_long(field: impl Into<String>, max: usize, actual: usize) -> Self {
        Self::new(
            field,
            ValidationKind::TooLong,
            format!(
                "Убедитесь, что это значение содержит не более {} символов (сейчас {}).",
                max, actual
            ),
        )
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Error types for comment, note and news operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The caller must log in first
    #[error("Authentication required")]
    Unauthenticated,

    /// Missing, or owned by someone else. Callers cannot tell which.
    #[error("Not found")]
    NotFound,

    /// One or more fields were rejected; nothing was written
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<FieldError>),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn field(error: FieldError) -> Self {
        ServiceError::Validation(vec![error])
    }

    /// Field errors carried by a validation failure
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ServiceError::Validation(errors) => errors,
            _ => &[],
        }
    }
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_lists_fields() {
        let err = ServiceError::Validation(vec![
            FieldError::required("title"),
            FieldError::new("text", ValidationKind::BannedWord, "Не ругайтесь!"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("title: Обязательное поле."));
        assert!(msg.contains("text: Не ругайтесь!"));
        assert_eq!(err.field_errors().len(), 2);
    }

    #[test]
    fn test_field_errors_empty_for_other_variants() {
        assert!(ServiceError::NotFound.field_errors().is_empty());
        assert!(ServiceError::Unauthenticated.field_errors().is_empty());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_value(FieldError::required("slug")).unwrap();
        assert_eq!(json["kind"], "required");
        assert_eq!(json["field"], "slug");
    }
}
