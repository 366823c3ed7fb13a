use crate::app_error::{AppError, ErrorCode, FieldErrors};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Database(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "Request failed");
            }
            _ => tracing::debug!(error = %self, "Request rejected"),
        }

        let field_errors = self.field_errors();
        match self {
            AppError::Database(_) => error_resp(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::DatabaseError,
                None,
                None,
            ),
            AppError::RateLimited => error_resp(
                StatusCode::TOO_MANY_REQUESTS,
                ErrorCode::RateLimited,
                Some(self.to_string()),
                None,
            ),
            AppError::InvalidCredential => error_resp(
                StatusCode::BAD_REQUEST,
                ErrorCode::InvalidCredential,
                Some(self.to_string()),
                field_errors,
            ),
            AppError::MissingProjectSelector => error_resp(
                StatusCode::BAD_REQUEST,
                ErrorCode::MissingProjectSelector,
                Some(self.to_string()),
                field_errors,
            ),
            AppError::ProjectNotFound => error_resp(
                StatusCode::BAD_REQUEST,
                ErrorCode::ProjectNotFound,
                Some(self.to_string()),
                field_errors,
            ),
            AppError::Validation(_) => error_resp(
                StatusCode::BAD_REQUEST,
                ErrorCode::ValidationError,
                Some(self.to_string()),
                field_errors,
            ),
            AppError::InvalidInput(msg) => error_resp(
                StatusCode::BAD_REQUEST,
                ErrorCode::InvalidInput,
                Some(msg),
                None,
            ),
            AppError::Unauthorized => {
                error_resp(StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, None, None)
            }
            AppError::NotFound => {
                error_resp(StatusCode::NOT_FOUND, ErrorCode::NotFound, None, None)
            }
            AppError::Internal(_) => error_resp(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalError,
                None,
                None,
            ),
        }
    }
}

fn error_resp(
    status: StatusCode,
    code: ErrorCode,
    message: Option<String>,
    errors: Option<FieldErrors>,
) -> Response {
    let mut body = serde_json::json!({ "code": code.as_str() });
    if let Some(msg) = message {
        body["message"] = serde_json::Value::String(msg);
    }
    if let Some(errors) = errors {
        body["errors"] = serde_json::json!(errors);
    }
    (status, Json(body)).into_response()
}
