use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

use crate::actions::UnknownAction;
use crate::config::ConfigError;
use crate::lists::ListError;
use crate::tmdb::TmdbError;
use crate::trakt::TraktError;

/// Errors surfaced by the JSON API.
#[derive(Debug)]
pub enum ApiError {
    /// No usable bearer token, or Trakt rejected it.
    NeedLogin,
    Config(ConfigError),
    BadRequest(String),
    NotFound,
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NeedLogin => write!(f, "Unauthorized"),
            ApiError::Config(e) => write!(f, "{}", e),
            ApiError::BadRequest(msg) => write!(f, "{}", msg),
            ApiError::NotFound => write!(f, "Endpoint Not Found"),
            ApiError::Internal(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NeedLogin => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Unauthorized", "need_login": true })),
            )
                .into_response(),
            // Plain text, before any route logic runs.
            ApiError::Config(e) => {
                tracing::error!("Configuration error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Endpoint Not Found" })),
            )
                .into_response(),
            ApiError::Internal(msg) => {
                tracing::error!("Request failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": msg })),
                )
                    .into_response()
            }
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::Config(err)
    }
}

impl From<UnknownAction> for ApiError {
    fn from(err: UnknownAction) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<TraktError> for ApiError {
    fn from(err: TraktError) -> Self {
        match err {
            TraktError::Unauthorized => ApiError::NeedLogin,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<TmdbError> for ApiError {
    fn from(err: TmdbError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<ListError> for ApiError {
    fn from(err: ListError) -> Self {
        match err {
            ListError::Trakt(e) => e.into(),
            ListError::Tmdb(e) => e.into(),
        }
    }
}
