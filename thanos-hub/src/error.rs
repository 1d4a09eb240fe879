//! Error types for thanos-hub
//!
//! Nothing here is fatal to a running controller: decode problems are logged
//! and dropped inside the controller, and these variants only surface at the
//! HTTP edge or during startup.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thanos_common::api::ActionResponse;
use thiserror::Error;

/// Main error type for thanos-hub
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors bubbled up from thanos-common
    #[error(transparent)]
    Common(#[from] thanos_common::Error),

    /// MQTT client errors (publish/subscribe requests)
    #[error("Transport error: {0}")]
    Transport(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Clap pattern outside 1-4
    #[error("Unknown clap pattern: {0}")]
    UnknownPattern(i64),

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<rumqttc::ClientError> for Error {
    fn from(e: rumqttc::ClientError) -> Self {
        Error::Transport(e.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self {
            Error::BadRequest(_) | Error::UnknownPattern(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ActionResponse::error(&self))).into_response()
    }
}

/// Convenience Result type using thanos-hub Error
pub type Result<T> = std::result::Result<T, Error>;
