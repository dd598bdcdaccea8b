use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API-level error taxonomy. Every variant maps to a status and a stable
/// machine-readable code so clients can pattern-match outcomes instead of
/// scraping message text.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected before any write happened
    #[error("{0}")]
    Invalid(String),

    /// The request conflicts with current state (duplicate slug, illegal
    /// status transition, ...)
    #[error("{message}")]
    Conflict {
        code: &'static str,
        message: String,
    },

    /// Missing rows, and rows the caller is not allowed to see
    #[error("not found")]
    NotFound,

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "invalid_input",
            Self::Conflict { code, .. } => code,
            Self::NotFound => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Internal(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Pre-checks cover the common conflicts with specific codes; a
        // unique/check violation that still reaches the database surfaces
        // as a conflict rather than an internal error.
        let this = match self {
            Self::Internal(err) if filmcrew_db::is_constraint_violation(&err) => {
                Self::conflict("constraint_violation", "the change conflicts with existing data")
            }
            Self::Internal(err) => {
                error!("internal error: {:#}", err);
                Self::Internal(err)
            }
            other => other,
        };

        // Internal details are logged, never sent to the caller.
        let message = match &this {
            Self::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        };

        let status = this.status();
        let body = json!({
            "error": {
                "code": this.code(),
                "message": message,
            }
        });

        (status, Json(body)).into_response()
    }
}
