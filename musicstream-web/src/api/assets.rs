//! Stylesheet and player script compiled into the binary

use axum::{
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::AppState;

const STYLE_CSS: &str = include_str!("../../ui/style.css");
const PLAYER_JS: &str = include_str!("../../ui/player.js");

/// GET /assets/style.css
pub async fn serve_style_css() -> Response {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLE_CSS).into_response()
}

/// GET /assets/player.js
pub async fn serve_player_js() -> Response {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        PLAYER_JS,
    )
        .into_response()
}

pub fn asset_routes() -> Router<AppState> {
    Router::new()
        .route("/assets/style.css", get(serve_style_css))
        .route("/assets/player.js", get(serve_player_js))
}
