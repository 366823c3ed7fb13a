use std::collections::BTreeMap;

use thiserror::Error;

/// Field name -> messages, as returned to ingestion clients.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub const INVALID_CREDENTIAL_MESSAGE: &str = "Invalid or inactive API key";
pub const MISSING_PROJECT_SELECTOR_MESSAGE: &str =
    "Either project or project_name must be provided";
pub const PROJECT_NOT_FOUND_MESSAGE: &str = "Project not found";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Too many requests. Please slow down.")]
    RateLimited,

    /// Unknown or inactive API key. Both cases share this variant so callers
    /// cannot probe which keys exist.
    #[error("{}", INVALID_CREDENTIAL_MESSAGE)]
    InvalidCredential,

    #[error("{}", MISSING_PROJECT_SELECTOR_MESSAGE)]
    MissingProjectSelector,

    #[error("{}", PROJECT_NOT_FOUND_MESSAGE)]
    ProjectNotFound,

    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing or invalid tenant session.
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Single-field validation error.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        AppError::Validation(errors)
    }

    /// Field-level view of ingestion errors; `None` for errors that aren't tied to a field.
    pub fn field_errors(&self) -> Option<FieldErrors> {
        let single = |field: &str, msg: &str| {
            let mut errors = FieldErrors::new();
            errors.insert(field.to_string(), vec![msg.to_string()]);
            errors
        };
        match self {
            AppError::InvalidCredential => Some(single("api_key", INVALID_CREDENTIAL_MESSAGE)),
            AppError::MissingProjectSelector => {
                Some(single("project", MISSING_PROJECT_SELECTOR_MESSAGE))
            }
            AppError::ProjectNotFound => Some(single("project", PROJECT_NOT_FOUND_MESSAGE)),
            AppError::Validation(errors) => Some(errors.clone()),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum ErrorCode {
    DatabaseError,
    RateLimited,
    InvalidCredential,
    MissingProjectSelector,
    ProjectNotFound,
    ValidationError,
    InvalidInput,
    Unauthorized,
    NotFound,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::InvalidCredential => "INVALID_CREDENTIAL",
            ErrorCode::MissingProjectSelector => "MISSING_PROJECT_SELECTOR",
            ErrorCode::ProjectNotFound => "PROJECT_NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
