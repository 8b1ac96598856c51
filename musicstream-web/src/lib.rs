//! musicstream-web library
//!
//! Server-rendered music and podcast site: uploads, browsing, playback
//! counters, profiles with follows, notifications and a staff admin area.
//! Exposes `AppState` and `build_router` for the binary and integration tests.

use axum::{extract::DefaultBodyLimit, Router};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub mod api;
pub mod db;
pub mod error;
pub mod forms;
pub mod media;
pub mod pagination;
pub mod session;
pub mod views;

pub use crate::error::{WebError, WebResult};
use crate::media::MediaStore;

/// Runtime settings resolved at startup from config and the settings table
#[derive(Debug, Clone)]
pub struct AppSettings {
    /// Session lifetime in hours
    pub session_ttl_hours: i64,
    /// Add `Secure` to the session cookie
    pub cookie_secure: bool,
    /// Request body limit, applies to uploads
    pub max_upload_bytes: usize,
    /// Number of suggested users on the home page
    pub suggested_users_count: usize,
    /// Rows per admin list page
    pub admin_list_per_page: i64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            session_ttl_hours: 24 * 14,
            cookie_secure: false,
            max_upload_bytes: 200 * 1024 * 1024,
            suggested_users_count: 4,
            admin_list_per_page: 100,
        }
    }
}

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Uploaded media on disk
    pub media: MediaStore,
    pub settings: Arc<AppSettings>,
}

impl AppState {
    pub fn new(db: SqlitePool, media: MediaStore, settings: AppSettings) -> Self {
        Self {
            db,
            media,
            settings: Arc::new(settings),
        }
    }
}

/// Build application router
///
/// `static_dir` is served at `/static/`, uploaded media at `/media/`.
pub fn build_router(state: AppState, static_dir: impl AsRef<std::path::Path>) -> Router {
    let media_dir = ServeDir::new(state.media.root());
    let static_dir = ServeDir::new(static_dir.as_ref());
    let body_limit = state.settings.max_upload_bytes;

    Router::new()
        .merge(api::music_routes())
        .merge(api::podcast_routes())
        .merge(api::search_routes())
        .merge(api::user_routes())
        .merge(api::admin_routes())
        .merge(api::asset_routes())
        .merge(api::health_routes())
        .nest_service("/media", media_dir)
        .nest_service("/static", static_dir)
        .fallback(api::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
