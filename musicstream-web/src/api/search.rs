//! Site-wide search

use axum::{
    extract::{Query, State},
    response::Html,
};
use serde::Deserialize;
use tracing::debug;

use crate::db::podcasts::PodcastQuery;
use crate::db::songs::SongQuery;
use crate::error::WebResult;
use crate::session::CurrentUser;
use crate::views::{self, PageContext};
use crate::{db, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// GET /search/?q=
///
/// Case-insensitive substring match over songs (title, artist, genre),
/// users (username, first and last name) and podcasts (title, description).
/// Only an empty query returns nothing; whitespace is matched as typed.
pub async fn search_results(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Query(query): Query<SearchQuery>,
) -> WebResult<Html<String>> {
    let ctx = PageContext::load(&state, session.as_ref()).await?;
    let q = query.q.unwrap_or_default();

    let (songs, users, podcasts) = if q.is_empty() {
        (Vec::new(), Vec::new(), Vec::new())
    } else {
        let songs = db::songs::list_songs(
            &state.db,
            &SongQuery {
                search: Some(q.clone()),
                ..Default::default()
            },
        )
        .await?;
        let users = db::users::search_users(&state.db, &q).await?;
        let podcasts = db::podcasts::list_podcasts(
            &state.db,
            &PodcastQuery {
                search: Some(q.clone()),
                ..Default::default()
            },
        )
        .await?;
        debug!(
            "Search '{}': {} songs, {} users, {} podcasts",
            q,
            songs.len(),
            users.len(),
            podcasts.len()
        );
        (songs, users, podcasts)
    };

    Ok(ctx.render(
        "Search",
        &views::music::search_page(&q, &songs, &users, &podcasts),
    ))
}
