//! Podcasts and episodes

use axum::{
    extract::{Multipart, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use super::music::play_not_found;
use super::Id;
use crate::db::episodes::NewEpisode;
use crate::db::podcasts::{NewPodcast, PodcastQuery, PodcastSort};
use crate::error::{WebError, WebResult};
use crate::forms::music::{EpisodeForm, PodcastForm};
use crate::forms::{FormErrors, MultipartForm};
use crate::media::{MediaKind, MediaStore};
use crate::session::{flash, CurrentUser, RequireUser};
use crate::views::{self, cover_url, PageContext};
use crate::{db, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct PodcastListQuery {
    pub search: Option<String>,
    pub sort: Option<String>,
}

/// GET /podcasts/?search=&sort=
pub async fn podcasts(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Query(query): Query<PodcastListQuery>,
) -> WebResult<Html<String>> {
    let ctx = PageContext::load(&state, session.as_ref()).await?;

    let search = query.search.unwrap_or_default().trim().to_string();
    let sort = PodcastSort::parse(query.sort.as_deref());
    let podcasts = db::podcasts::list_podcasts(
        &state.db,
        &PodcastQuery {
            search: Some(search.clone()),
            sort,
            ..Default::default()
        },
    )
    .await?;

    Ok(ctx.render(
        "Podcasts",
        &views::podcasts::podcasts_page(&podcasts, &search, sort),
    ))
}

/// GET /podcasts/upload/
pub async fn upload_podcast_form(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
) -> WebResult<Html<String>> {
    let ctx = PageContext::load(&state, Some(&session)).await?;
    Ok(ctx.render(
        "Start a podcast",
        &views::podcasts::upload_podcast_page(&PodcastForm::default(), &FormErrors::new()),
    ))
}

/// POST /podcasts/upload/
pub async fn upload_podcast(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
    multipart: Multipart,
) -> WebResult<Response> {
    let form = PodcastForm::from_multipart(MultipartForm::read(multipart).await?);
    let errors = form.validate();
    if !errors.is_empty() {
        let ctx = PageContext::load(&state, Some(&session)).await?;
        return Ok(ctx
            .render("Start a podcast", &views::podcasts::upload_podcast_page(&form, &errors))
            .into_response());
    }

    let mut staged = state.media.stage();
    let cover_image = match &form.cover_image {
        Some(cover) => Some(staged.save(MediaKind::PodcastCover, cover).await?),
        None => None,
    };
    let inserted = db::podcasts::insert_podcast(
        &state.db,
        &NewPodcast {
            title: form.title.clone(),
            description: form.description.clone(),
            cover_image,
            host_id: session.user.id,
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

    info!("User {} created podcast {} ({})", session.user.username, id, form.title);
    flash(&state, &session, "Podcast uploaded successfully!").await?;
    Ok(Redirect::to(&format!("/podcast/{}/", id)).into_response())
}

/// GET /podcasts/my/
pub async fn my_podcasts(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
) -> WebResult<Html<String>> {
    let ctx = PageContext::load(&state, Some(&session)).await?;
    let podcasts =
        db::podcasts::list_podcasts(&state.db, &PodcastQuery::by_host(session.user.id)).await?;
    Ok(ctx.render("My podcasts", &views::podcasts::my_podcasts_page(&podcasts)))
}

/// GET /podcast/:id/
pub async fn podcast_detail(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Id(id): Id,
) -> WebResult<Html<String>> {
    let podcast = db::podcasts::get_podcast(&state.db, id)
        .await?
        .ok_or_else(|| WebError::not_found("Podcast not found"))?;
    let episodes = db::episodes::list_for_podcast(&state.db, podcast.id).await?;
    let ctx = PageContext::load(&state, session.as_ref()).await?;

    let is_following = match &ctx.user {
        Some(viewer) if viewer.id != podcast.host_id => {
            db::profiles::is_following(&state.db, podcast.host_id, viewer.id).await?
        }
        _ => false,
    };

    Ok(ctx.render(
        &podcast.title,
        &views::podcasts::podcast_detail_page(&podcast, &episodes, ctx.user.as_ref(), is_following),
    ))
}

/// GET /podcast/:id/delete/
pub async fn delete_podcast_confirm(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
    Id(id): Id,
) -> WebResult<Html<String>> {
    let podcast = db::podcasts::get_hosted_podcast(&state.db, id, session.user.id)
        .await?
        .ok_or_else(|| WebError::not_found("Podcast not found"))?;
    let ctx = PageContext::load(&state, Some(&session)).await?;
    Ok(ctx.render("Delete podcast", &views::podcasts::delete_podcast_page(&podcast)))
}

/// POST /podcast/:id/delete/
///
/// Episodes are removed with the podcast.
pub async fn delete_podcast(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
    Id(id): Id,
) -> WebResult<Redirect> {
    let podcast = db::podcasts::get_hosted_podcast(&state.db, id, session.user.id)
        .await?
        .ok_or_else(|| WebError::not_found("Podcast not found"))?;

    remove_podcast(&state, podcast.id, podcast.cover_image.as_deref()).await?;

    info!("User {} deleted podcast {}", session.user.username, podcast.id);
    flash(&state, &session, "Podcast deleted successfully!").await?;
    Ok(Redirect::to("/podcasts/my/"))
}

/// Delete a podcast row (cascading to episodes) and then its files
pub(crate) async fn remove_podcast(state: &AppState, id: i64, cover: Option<&str>) -> WebResult<()> {
    let episode_files = db::episodes::audio_files_for_podcast(&state.db, id).await?;
    db::podcasts::delete_podcast(&state.db, id).await?;

    for file in &episode_files {
        state.media.remove(file).await;
    }
    if let Some(cover) = cover {
        state.media.remove(cover).await;
    }
    Ok(())
}

/// GET /podcast/:id/episode/upload/
pub async fn upload_episode_form(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
    Id(podcast_id): Id,
) -> WebResult<Html<String>> {
    let podcast = db::podcasts::get_hosted_podcast(&state.db, podcast_id, session.user.id)
        .await?
        .ok_or_else(|| WebError::not_found("Podcast not found"))?;
    let ctx = PageContext::load(&state, Some(&session)).await?;
    Ok(ctx.render(
        "New episode",
        &views::podcasts::upload_episode_page(&podcast, &EpisodeForm::default(), &FormErrors::new()),
    ))
}

/// POST /podcast/:id/episode/upload/
///
/// Only the podcast's host may add episodes.
pub async fn upload_episode(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
    Id(podcast_id): Id,
    multipart: Multipart,
) -> WebResult<Response> {
    let podcast = db::podcasts::get_hosted_podcast(&state.db, podcast_id, session.user.id)
        .await?
        .ok_or_else(|| WebError::not_found("Podcast not found"))?;

    let form = EpisodeForm::from_multipart(MultipartForm::read(multipart).await?);
    let errors = form.validate();
    let Some(audio) = form.audio_file.as_ref().filter(|_| errors.is_empty()) else {
        let ctx = PageContext::load(&state, Some(&session)).await?;
        return Ok(ctx
            .render(
                "New episode",
                &views::podcasts::upload_episode_page(&podcast, &form, &errors),
            )
            .into_response());
    };

    let mut staged = state.media.stage();
    let audio_file = staged.save(MediaKind::Episode, audio).await?;
    let inserted = db::episodes::insert_episode(
        &state.db,
        &NewEpisode {
            title: form.title.clone(),
            description: form.description.clone(),
            audio_file,
            podcast_id: podcast.id,
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

    info!("User {} uploaded episode {} to podcast {}", session.user.username, id, podcast.id);
    flash(&state, &session, "Episode uploaded successfully!").await?;
    Ok(Redirect::to(&format!("/podcast/{}/", podcast.id)).into_response())
}

/// GET /episode/:id/
pub async fn episode_detail(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Id(id): Id,
) -> WebResult<Html<String>> {
    let episode = db::episodes::get_episode(&state.db, id)
        .await?
        .ok_or_else(|| WebError::not_found("Episode not found"))?;
    let ctx = PageContext::load(&state, session.as_ref()).await?;
    Ok(ctx.render(
        &episode.title,
        &views::podcasts::episode_detail_page(&episode, ctx.user.as_ref()),
    ))
}

/// GET /episode/:id/delete/
pub async fn delete_episode_confirm(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
    Id(id): Id,
) -> WebResult<Html<String>> {
    let episode = db::episodes::get_hosted_episode(&state.db, id, session.user.id)
        .await?
        .ok_or_else(|| WebError::not_found("Episode not found"))?;
    let ctx = PageContext::load(&state, Some(&session)).await?;
    Ok(ctx.render("Delete episode", &views::podcasts::delete_episode_page(&episode)))
}

/// POST /episode/:id/delete/
pub async fn delete_episode(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
    Id(id): Id,
) -> WebResult<Redirect> {
    let episode = db::episodes::get_hosted_episode(&state.db, id, session.user.id)
        .await?
        .ok_or_else(|| WebError::not_found("Episode not found"))?;

    db::episodes::delete_episode(&state.db, episode.id).await?;
    state.media.remove(&episode.audio_file).await;

    info!("User {} deleted episode {}", session.user.username, episode.id);
    flash(&state, &session, "Episode deleted successfully!").await?;
    Ok(Redirect::to(&format!("/podcast/{}/", episode.podcast_id)))
}

/// Player state returned by the episode play endpoint
#[derive(Debug, Serialize)]
pub struct EpisodePlayback {
    pub id: i64,
    pub title: String,
    pub podcast: String,
    pub audio_url: String,
    pub cover_url: String,
    pub duration: i64,
    pub play_count: i64,
    pub current_time: i64,
    pub is_playing: bool,
    pub playback_speed: f64,
}

/// POST /episode/:id/play/
pub async fn increment_episode_play_count(
    State(state): State<AppState>,
    Id(id): Id,
) -> WebResult<Response> {
    let Some(play_count) = db::episodes::increment_play_count(&state.db, id).await? else {
        warn!("Play requested for unknown episode {}", id);
        return Ok(play_not_found("Episode not found"));
    };
    let episode = db::episodes::get_episode(&state.db, id)
        .await?
        .ok_or_else(|| WebError::not_found("Episode not found"))?;

    let playback = EpisodePlayback {
        id: episode.id,
        title: episode.title,
        podcast: episode.podcast_title,
        audio_url: MediaStore::url(&episode.audio_file),
        cover_url: cover_url(episode.podcast_cover_image.as_deref()),
        duration: 0,
        play_count,
        current_time: 0,
        is_playing: true,
        playback_speed: 1.0,
    };

    Ok(Json(json!({"success": true, "episode": playback})).into_response())
}
