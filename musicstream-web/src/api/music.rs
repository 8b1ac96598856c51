//! Songs: home, discover, upload, detail, delete and the play counter

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use super::Id;
use crate::db::podcasts::PodcastQuery;
use crate::db::songs::{NewSong, SongQuery, SongSort};
use crate::error::{WebError, WebResult};
use crate::forms::music::SongForm;
use crate::forms::{FormErrors, MultipartForm};
use crate::media::{MediaKind, MediaStore};
use crate::session::{flash, CurrentUser, RequireUser};
use crate::views::{self, cover_url, PageContext};
use crate::{db, AppState};

/// GET /
///
/// Latest songs and podcasts plus a random sample of users who have uploaded.
pub async fn home(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> WebResult<Html<String>> {
    let ctx = PageContext::load(&state, session.as_ref()).await?;

    let songs = db::songs::list_songs(&state.db, &SongQuery::default()).await?;
    let podcasts = db::podcasts::list_podcasts(&state.db, &PodcastQuery::default()).await?;
    let candidates = db::users::users_with_songs(&state.db).await?;
    let suggested: Vec<_> = candidates
        .choose_multiple(&mut rand::thread_rng(), state.settings.suggested_users_count)
        .cloned()
        .collect();

    Ok(ctx.render(
        "Home",
        &views::music::home_page(&songs, &podcasts, &suggested),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct DiscoverQuery {
    pub genre: Option<String>,
    pub sort: Option<String>,
}

/// GET /discover/?genre=&sort=
pub async fn discover(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Query(query): Query<DiscoverQuery>,
) -> WebResult<Html<String>> {
    let ctx = PageContext::load(&state, session.as_ref()).await?;

    let genre = query.genre.unwrap_or_default().trim().to_string();
    let sort = SongSort::parse(query.sort.as_deref());
    let songs = db::songs::list_songs(
        &state.db,
        &SongQuery {
            genre: Some(genre.clone()),
            sort,
            ..Default::default()
        },
    )
    .await?;
    let podcasts = db::podcasts::list_podcasts(&state.db, &PodcastQuery::default()).await?;
    let genres = db::songs::distinct_genres(&state.db).await?;

    Ok(ctx.render(
        "Discover",
        &views::music::discover_page(&songs, &podcasts, &genres, &genre, sort),
    ))
}

/// GET /upload/
pub async fn upload_song_form(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
) -> WebResult<Html<String>> {
    let ctx = PageContext::load(&state, Some(&session)).await?;
    Ok(ctx.render(
        "Upload a song",
        &views::music::upload_song_page(&SongForm::default(), &FormErrors::new()),
    ))
}

/// POST /upload/
pub async fn upload_song(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
    multipart: Multipart,
) -> WebResult<Response> {
    let form = SongForm::from_multipart(MultipartForm::read(multipart).await?);
    let errors = form.validate();

    let Some(audio) = form.audio_file.as_ref().filter(|_| errors.is_empty()) else {
        let ctx = PageContext::load(&state, Some(&session)).await?;
        return Ok(ctx
            .render("Upload a song", &views::music::upload_song_page(&form, &errors))
            .into_response());
    };

    let mut staged = state.media.stage();
    let audio_file = staged.save(MediaKind::Song, audio).await?;
    let cover_image = match &form.cover_image {
        Some(cover) => Some(staged.save(MediaKind::SongCover, cover).await?),
        None => None,
    };

    let inserted = db::songs::insert_song(
        &state.db,
        &NewSong {
            title: form.title.clone(),
            artist: form.artist.clone(),
            album: form.album.clone(),
            genre: form.genre.clone(),
            audio_file,
            cover_image,
            uploaded_by: session.user.id,
        },
    )
    .await;
    let id = match inserted {
        Ok(id) => id,
        Err(e) => {
            staged.rollback().await;
            return Err(e.into());
        }
    };
    staged.commit();

    info!("User {} uploaded song {} ({})", session.user.username, id, form.title);
    flash(&state, &session, "Song uploaded successfully!").await?;
    Ok(Redirect::to("/").into_response())
}

/// GET /my-songs/
pub async fn my_songs(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
) -> WebResult<Html<String>> {
    let ctx = PageContext::load(&state, Some(&session)).await?;
    let songs = db::songs::list_songs(&state.db, &SongQuery::by_uploader(session.user.id)).await?;
    Ok(ctx.render("My songs", &views::music::my_songs_page(&songs)))
}

/// GET /song/:id/
pub async fn song_detail(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Id(id): Id,
) -> WebResult<Html<String>> {
    let song = db::songs::get_song(&state.db, id)
        .await?
        .ok_or_else(|| WebError::not_found("Song not found"))?;
    let ctx = PageContext::load(&state, session.as_ref()).await?;

    let is_following = match &ctx.user {
        Some(viewer) if viewer.id != song.uploaded_by => {
            db::profiles::is_following(&state.db, song.uploaded_by, viewer.id).await?
        }
        _ => false,
    };

    Ok(ctx.render(
        &song.title,
        &views::music::song_detail_page(&song, ctx.user.as_ref(), is_following),
    ))
}

/// GET /song/:id/delete/
pub async fn delete_song_confirm(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
    Id(id): Id,
) -> WebResult<Html<String>> {
    let song = db::songs::get_owned_song(&state.db, id, session.user.id)
        .await?
        .ok_or_else(|| WebError::not_found("Song not found"))?;
    let ctx = PageContext::load(&state, Some(&session)).await?;
    Ok(ctx.render("Delete song", &views::music::delete_song_page(&song)))
}

/// POST /song/:id/delete/
///
/// Only the uploader can delete; anyone else gets a 404.
pub async fn delete_song(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
    Id(id): Id,
) -> WebResult<Redirect> {
    let song = db::songs::get_owned_song(&state.db, id, session.user.id)
        .await?
        .ok_or_else(|| WebError::not_found("Song not found"))?;

    db::songs::delete_song(&state.db, song.id).await?;
    remove_song_files(&state, &song.audio_file, song.cover_image.as_deref()).await;

    info!("User {} deleted song {}", session.user.username, song.id);
    flash(&state, &session, "Song deleted successfully!").await?;
    Ok(Redirect::to("/my-songs/"))
}

pub(crate) async fn remove_song_files(state: &AppState, audio_file: &str, cover: Option<&str>) {
    state.media.remove(audio_file).await;
    if let Some(cover) = cover {
        state.media.remove(cover).await;
    }
}

/// Player state returned by the song play endpoint
#[derive(Debug, Serialize)]
pub struct SongPlayback {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub audio_url: String,
    pub cover_url: String,
    pub duration: i64,
    pub play_count: i64,
    pub current_time: i64,
    pub is_playing: bool,
    pub playback_speed: f64,
}

/// POST /song/:id/play/
///
/// Counts one play and returns what the player needs to start the track.
pub async fn increment_play_count(State(state): State<AppState>, Id(id): Id) -> WebResult<Response> {
    let Some(play_count) = db::songs::increment_play_count(&state.db, id).await? else {
        warn!("Play requested for unknown song {}", id);
        return Ok(play_not_found("Song not found"));
    };
    let song = db::songs::get_song(&state.db, id)
        .await?
        .ok_or_else(|| WebError::not_found("Song not found"))?;

    let playback = SongPlayback {
        id: song.id,
        title: song.title,
        artist: song.artist,
        album: song.album,
        audio_url: MediaStore::url(&song.audio_file),
        cover_url: cover_url(song.cover_image.as_deref()),
        duration: 0,
        play_count,
        current_time: 0,
        is_playing: true,
        playback_speed: 1.0,
    };

    Ok(Json(json!({"success": true, "song": playback})).into_response())
}

pub(crate) fn play_not_found(message: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"success": false, "error": message})),
    )
        .into_response()
}
