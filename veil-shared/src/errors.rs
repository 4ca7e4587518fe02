use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{range}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Profile errors
/// - E2xxx: Matching/discovery errors
/// - E3xxx: Conversation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    BadRequest,
    TokenExpired,
    TokenInvalid,

    // Profile (E1xxx)
    ProfileNotFound,
    ProfileIncomplete,

    // Matching (E2xxx)
    NotEligible,
    SelfAction,
    MatchNotFound,
    NotMatchParticipant,

    // Conversations (E3xxx)
    RoomNotFound,
    MessageNotFound,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::Forbidden => "E0005",
            Self::BadRequest => "E0006",
            Self::TokenExpired => "E0007",
            Self::TokenInvalid => "E0008",

            // Profile
            Self::ProfileNotFound => "E1001",
            Self::ProfileIncomplete => "E1002",

            // Matching
            Self::NotEligible => "E2001",
            Self::SelfAction => "E2002",
            Self::MatchNotFound => "E2003",
            Self::NotMatchParticipant => "E2004",

            // Conversations
            Self::RoomNotFound => "E3001",
            Self::MessageNotFound => "E3002",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError | Self::BadRequest | Self::NotEligible => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::ProfileNotFound | Self::MatchNotFound
            | Self::RoomNotFound | Self::MessageNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::TokenExpired | Self::TokenInvalid => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::ProfileIncomplete | Self::SelfAction
            | Self::NotMatchParticipant => StatusCode::FORBIDDEN,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message, details } => {
                let status = code.status_code();
                let mut resp = ApiErrorResponse::new(code.code(), message);
                if let Some(d) = details {
                    resp = resp.with_details(d.clone());
                }
                (status, resp)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "resource not found"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "database error"),
                    ),
                }
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::new("E0002", msg),
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_codes_are_stable() {
        assert_eq!(ErrorCode::ProfileIncomplete.code(), "E1002");
        assert_eq!(ErrorCode::NotEligible.code(), "E2001");
        assert_eq!(ErrorCode::SelfAction.code(), "E2002");
        assert_eq!(ErrorCode::RoomNotFound.code(), "E3001");
    }

    #[test]
    fn status_mapping() {
        assert_eq!(ErrorCode::ProfileIncomplete.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::NotEligible.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::SelfAction.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::NotMatchParticipant.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::MatchNotFound.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn idempotent_results_are_not_errors() {
        // "already liked" / "already revealed" travel as success payloads,
        // so the taxonomy carries no conflict-style code for them.
        let err = AppError::new(ErrorCode::NotEligible, "target must be 18+");
        assert_eq!(err.to_string(), "target must be 18+");
    }
}
