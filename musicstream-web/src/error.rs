//! Error types for musicstream-web
//!
//! Handlers return `WebResult<T>`; errors render as HTML pages. JSON
//! endpoints build their own `{"success": false, ...}` bodies instead.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::views::escape;

/// HTTP-facing error type
#[derive(Debug, Error)]
pub enum WebError {
    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authenticated but not allowed (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Malformed request (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Filesystem error (media storage)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WebError {
    pub fn not_found(what: impl Into<String>) -> Self {
        WebError::NotFound(what.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            WebError::NotFound(_) => StatusCode::NOT_FOUND,
            WebError::Forbidden(_) => StatusCode::FORBIDDEN,
            WebError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();

        let detail = if status.is_server_error() {
            error!("Request failed: {}", self);
            "Something went wrong on our side.".to_string()
        } else {
            self.to_string()
        };

        let title = format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Error")
        );
        let body = format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>{title}</title><link rel="stylesheet" href="/assets/style.css"></head>
<body><main class="container error-page"><h1>{title}</h1><p>{detail}</p><p><a href="/">Back to home</a></p></main></body>
</html>"#,
            title = escape(&title),
            detail = escape(&detail),
        );

        (status, Html(body)).into_response()
    }
}

/// Result type for handlers
pub type WebResult<T> = Result<T, WebError>;
