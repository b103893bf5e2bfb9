use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure of a single outbound call. Consumed by the fallback decisions,
/// never returned to clients.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP error: {0}")]
    Status(reqwest::StatusCode),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("malformed payload: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid listen address: {0}")]
    Address(#[from] std::net::AddrParseError),
}

/// Errors surfaced by route handlers as a 500 failure envelope.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Internal(String),
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "error": self.to_string() })),
        )
            .into_response()
    }
}
