//! HTTP handlers and route tables

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::error::WebError;
use crate::AppState;

pub mod admin;
pub mod assets;
pub mod health;
pub mod music;
pub mod podcasts;
pub mod search;
pub mod users;

pub use assets::asset_routes;
pub use health::health_routes;

/// Numeric id from a single-segment path; anything else is a 404
#[derive(Debug, Clone, Copy)]
pub struct Id(pub i64);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Id {
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| WebError::not_found("No such page"))?;
        raw.parse::<i64>()
            .map(Id)
            .map_err(|_| WebError::not_found("No such page"))
    }
}

/// Any method other than POST on the play endpoints
pub async fn invalid_method() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({"success": false, "error": "Invalid request method"})),
    )
        .into_response()
}

/// Router fallback
pub async fn not_found() -> WebError {
    WebError::not_found("No such page")
}

pub fn music_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(music::home))
        .route("/discover/", get(music::discover))
        .route("/upload/", get(music::upload_song_form).post(music::upload_song))
        .route("/my-songs/", get(music::my_songs))
        .route("/song/:id/", get(music::song_detail))
        .route(
            "/song/:id/delete/",
            get(music::delete_song_confirm).post(music::delete_song),
        )
        .route(
            "/song/:id/play/",
            post(music::increment_play_count).fallback(invalid_method),
        )
}

pub fn podcast_routes() -> Router<AppState> {
    Router::new()
        .route("/podcasts/", get(podcasts::podcasts))
        .route(
            "/podcasts/upload/",
            get(podcasts::upload_podcast_form).post(podcasts::upload_podcast),
        )
        .route("/podcasts/my/", get(podcasts::my_podcasts))
        .route("/podcast/:id/", get(podcasts::podcast_detail))
        .route(
            "/podcast/:id/delete/",
            get(podcasts::delete_podcast_confirm).post(podcasts::delete_podcast),
        )
        .route(
            "/podcast/:id/episode/upload/",
            get(podcasts::upload_episode_form).post(podcasts::upload_episode),
        )
        .route("/episode/:id/", get(podcasts::episode_detail))
        .route(
            "/episode/:id/delete/",
            get(podcasts::delete_episode_confirm).post(podcasts::delete_episode),
        )
        .route(
            "/episode/:id/play/",
            post(podcasts::increment_episode_play_count).fallback(invalid_method),
        )
}

pub fn search_routes() -> Router<AppState> {
    Router::new().route("/search/", get(search::search_results))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/register/", get(users::register_form).post(users::register))
        .route("/users/login/", get(users::login_form).post(users::login))
        .route("/users/logout/", post(users::logout))
        .route("/users/profile/edit/", get(users::edit_profile_form).post(users::edit_profile))
        .route("/users/profile/:username/", get(users::profile))
        .route("/users/follow/:username/", post(users::toggle_follow))
        .route("/users/upload-image/", post(users::upload_profile_image))
        .route("/users/notifications/", get(users::notifications))
        .route("/users/notifications/read/", post(users::mark_notifications_read))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/", get(admin::dashboard))
        .route("/admin/songs/", get(admin::songs))
        .route(
            "/admin/songs/:id/",
            get(admin::song_change_form).post(admin::update_song),
        )
        .route("/admin/songs/:id/delete/", post(admin::delete_song))
        .route("/admin/podcasts/", get(admin::podcasts))
        .route(
            "/admin/podcasts/:id/",
            get(admin::podcast_change_form).post(admin::update_podcast),
        )
        .route("/admin/podcasts/:id/delete/", post(admin::delete_podcast))
        .route("/admin/users/", get(admin::users))
        .route("/admin/users/:id/profile/", post(admin::update_user_profile))
        .route(
            "/admin/notifications/",
            get(admin::notifications).post(admin::create_notification),
        )
        .route(
            "/admin/notifications/:id/",
            get(admin::notification_change_form).post(admin::update_notification),
        )
        .route(
            "/admin/notifications/:id/delete/",
            post(admin::delete_notification),
        )
}
