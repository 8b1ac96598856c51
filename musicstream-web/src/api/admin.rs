//! Staff-only admin area
//!
//! Every handler takes `RequireStaff`: anonymous visitors are sent to the
//! login page and signed-in non-staff users get a 403.

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use chrono::Utc;
use musicstream_common::db::User;
use serde::Deserialize;
use tracing::info;

use super::music::remove_song_files;
use super::podcasts::remove_podcast;
use super::Id;
use crate::db::podcasts::{self as podcast_db, PodcastChange, PodcastQuery};
use crate::db::songs::{self as song_db, SongChange, SongQuery, UploadDateFilter};
use crate::error::{WebError, WebResult};
use crate::forms::music::{PodcastChangeForm, SongChangeForm};
use crate::forms::FormErrors;
use crate::pagination::{calculate_pagination, PageQuery};
use crate::session::{flash, RequireStaff, Session};
use crate::views::admin::{AdminCounts, NotificationFormValues, SongFilters};
use crate::views::{self, PageContext};
use crate::{db, AppState};

/// GET /admin/
pub async fn dashboard(
    State(state): State<AppState>,
    RequireStaff(session): RequireStaff,
) -> WebResult<Html<String>> {
    let counts = AdminCounts {
        users: db::users::count_users(&state.db).await?,
        songs: song_db::count_songs(&state.db, &SongQuery::default()).await?,
        podcasts: podcast_db::count_podcasts(&state.db, &PodcastQuery::default()).await?,
        episodes: db::episodes::count_episodes(&state.db).await?,
        notifications: db::notifications::count_all(&state.db).await?,
    };
    let ctx = PageContext::load(&state, Some(&session)).await?;
    Ok(ctx.render("Site administration", &views::admin::dashboard_page(&counts)))
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminSongQuery {
    pub q: Option<String>,
    pub genre: Option<String>,
    /// Kept as text so a malformed value is ignored rather than rejected
    pub uploaded_by: Option<String>,
    /// today, 7d, month or year; anything else means no date filter
    pub upload_date: Option<String>,
    pub page: Option<i64>,
}

/// GET /admin/songs/?q=&genre=&uploaded_by=&upload_date=&page=
pub async fn songs(
    State(state): State<AppState>,
    RequireStaff(session): RequireStaff,
    Query(query): Query<AdminSongQuery>,
) -> WebResult<Html<String>> {
    let filters = SongFilters {
        q: query.q.unwrap_or_default().trim().to_string(),
        genre: query.genre.unwrap_or_default().trim().to_string(),
        uploaded_by: query.uploaded_by.and_then(|v| v.trim().parse().ok()),
        upload_date: query.upload_date.as_deref().and_then(|v| UploadDateFilter::parse(v.trim())),
    };

    let mut song_query = SongQuery {
        search: Some(filters.q.clone()),
        search_columns: song_db::ADMIN_SEARCH_COLUMNS,
        genre: Some(filters.genre.clone()),
        uploaded_by: filters.uploaded_by,
        uploaded_since: filters.upload_date.map(|f| f.since(Utc::now())),
        ..Default::default()
    };
    let total = song_db::count_songs(&state.db, &song_query).await?;
    let pagination = calculate_pagination(
        total,
        query.page.unwrap_or(1),
        state.settings.admin_list_per_page,
    );
    song_query.limit = Some(pagination.page_size);
    song_query.offset = pagination.offset;

    let songs = song_db::list_songs(&state.db, &song_query).await?;
    let genres = song_db::distinct_genres(&state.db).await?;
    let uploaders = db::users::users_with_songs(&state.db).await?;

    let ctx = PageContext::load(&state, Some(&session)).await?;
    Ok(ctx.render(
        "Songs",
        &views::admin::songs_page(&songs, total, &pagination, &filters, &genres, &uploaders),
    ))
}

/// Resolve a username typed into a change form, recording an error when unknown
async fn lookup_user(
    state: &AppState,
    errors: &mut FormErrors,
    field: &str,
    username: &str,
) -> WebResult<Option<User>> {
    if !errors.field(field).is_empty() {
        return Ok(None);
    }
    let user = db::users::get_user_by_username(&state.db, username).await?;
    if user.is_none() {
        errors.add(field, "No user with that username.");
    }
    Ok(user)
}

/// GET /admin/songs/:id/
pub async fn song_change_form(
    State(state): State<AppState>,
    RequireStaff(session): RequireStaff,
    Id(id): Id,
) -> WebResult<Html<String>> {
    let song = song_db::get_song(&state.db, id)
        .await?
        .ok_or_else(|| WebError::not_found("Song not found"))?;
    let values = SongChangeForm {
        title: song.title.clone(),
        artist: song.artist.clone(),
        album: song.album.clone(),
        genre: song.genre.clone(),
        uploaded_by: song.uploader_username.clone(),
    };

    let ctx = PageContext::load(&state, Some(&session)).await?;
    Ok(ctx.render(
        "Change song",
        &views::admin::song_change_page(&song, &values, &FormErrors::new()),
    ))
}

/// POST /admin/songs/:id/
///
/// Play count, upload date and the stored files are never touched here.
pub async fn update_song(
    State(state): State<AppState>,
    RequireStaff(session): RequireStaff,
    Id(id): Id,
    Form(form): Form<SongChangeForm>,
) -> WebResult<Response> {
    let song = song_db::get_song(&state.db, id)
        .await?
        .ok_or_else(|| WebError::not_found("Song not found"))?;

    let values = form.trimmed();
    let mut errors = values.validate();
    let uploader = lookup_user(&state, &mut errors, "uploaded_by", &values.uploaded_by).await?;

    let Some(uploader) = uploader.filter(|_| errors.is_empty()) else {
        let ctx = PageContext::load(&state, Some(&session)).await?;
        return Ok(ctx
            .render("Change song", &views::admin::song_change_page(&song, &values, &errors))
            .into_response());
    };

    let change = SongChange {
        title: values.title,
        artist: values.artist,
        album: values.album,
        genre: values.genre,
        uploaded_by: uploader.id,
    };
    song_db::update_song(&state.db, song.id, &change).await?;

    info!("Staff {} changed song {} ({})", session.user.username, song.id, change.title);
    flash(&state, &session, &format!("The song \"{}\" was changed successfully.", change.title)).await?;
    Ok(Redirect::to("/admin/songs/").into_response())
}

/// POST /admin/songs/:id/delete/
pub async fn delete_song(
    State(state): State<AppState>,
    RequireStaff(session): RequireStaff,
    Id(id): Id,
) -> WebResult<Redirect> {
    let song = song_db::get_song(&state.db, id)
        .await?
        .ok_or_else(|| WebError::not_found("Song not found"))?;

    song_db::delete_song(&state.db, song.id).await?;
    remove_song_files(&state, &song.audio_file, song.cover_image.as_deref()).await;

    info!("Staff {} deleted song {} ({})", session.user.username, song.id, song.title);
    flash(&state, &session, &format!("The song \"{}\" was deleted successfully.", song.title)).await?;
    Ok(Redirect::to("/admin/songs/"))
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminPodcastQuery {
    pub q: Option<String>,
    pub page: Option<i64>,
}

/// GET /admin/podcasts/?q=&page=
pub async fn podcasts(
    State(state): State<AppState>,
    RequireStaff(session): RequireStaff,
    Query(query): Query<AdminPodcastQuery>,
) -> WebResult<Html<String>> {
    let q = query.q.unwrap_or_default().trim().to_string();

    let mut podcast_query = PodcastQuery {
        search: Some(q.clone()),
        search_columns: podcast_db::ADMIN_SEARCH_COLUMNS,
        ..Default::default()
    };
    let total = podcast_db::count_podcasts(&state.db, &podcast_query).await?;
    let pagination = calculate_pagination(
        total,
        query.page.unwrap_or(1),
        state.settings.admin_list_per_page,
    );
    podcast_query.limit = Some(pagination.page_size);
    podcast_query.offset = pagination.offset;
    let podcasts = podcast_db::list_podcasts(&state.db, &podcast_query).await?;

    let ctx = PageContext::load(&state, Some(&session)).await?;
    Ok(ctx.render(
        "Podcasts",
        &views::admin::podcasts_page(&podcasts, total, &pagination, &q),
    ))
}

/// GET /admin/podcasts/:id/
pub async fn podcast_change_form(
    State(state): State<AppState>,
    RequireStaff(session): RequireStaff,
    Id(id): Id,
) -> WebResult<Html<String>> {
    let podcast = podcast_db::get_podcast(&state.db, id)
        .await?
        .ok_or_else(|| WebError::not_found("Podcast not found"))?;
    let values = PodcastChangeForm {
        title: podcast.title.clone(),
        description: podcast.description.clone(),
        host: podcast.host_username.clone(),
    };

    let ctx = PageContext::load(&state, Some(&session)).await?;
    Ok(ctx.render(
        "Change podcast",
        &views::admin::podcast_change_page(&podcast, &values, &FormErrors::new()),
    ))
}

/// POST /admin/podcasts/:id/
pub async fn update_podcast(
    State(state): State<AppState>,
    RequireStaff(session): RequireStaff,
    Id(id): Id,
    Form(form): Form<PodcastChangeForm>,
) -> WebResult<Response> {
    let podcast = podcast_db::get_podcast(&state.db, id)
        .await?
        .ok_or_else(|| WebError::not_found("Podcast not found"))?;

    let values = form.trimmed();
    let mut errors = values.validate();
    let host = lookup_user(&state, &mut errors, "host", &values.host).await?;

    let Some(host) = host.filter(|_| errors.is_empty()) else {
        let ctx = PageContext::load(&state, Some(&session)).await?;
        return Ok(ctx
            .render(
                "Change podcast",
                &views::admin::podcast_change_page(&podcast, &values, &errors),
            )
            .into_response());
    };

    let change = PodcastChange {
        title: values.title,
        description: values.description,
        host_id: host.id,
    };
    podcast_db::update_podcast(&state.db, podcast.id, &change).await?;

    info!("Staff {} changed podcast {} ({})", session.user.username, podcast.id, change.title);
    flash(
        &state,
        &session,
        &format!("The podcast \"{}\" was changed successfully.", change.title),
    )
    .await?;
    Ok(Redirect::to("/admin/podcasts/").into_response())
}

/// POST /admin/podcasts/:id/delete/
pub async fn delete_podcast(
    State(state): State<AppState>,
    RequireStaff(session): RequireStaff,
    Id(id): Id,
) -> WebResult<Redirect> {
    let podcast = podcast_db::get_podcast(&state.db, id)
        .await?
        .ok_or_else(|| WebError::not_found("Podcast not found"))?;

    remove_podcast(&state, podcast.id, podcast.cover_image.as_deref()).await?;

    info!("Staff {} deleted podcast {} ({})", session.user.username, podcast.id, podcast.title);
    flash(
        &state,
        &session,
        &format!("The podcast \"{}\" was deleted successfully.", podcast.title),
    )
    .await?;
    Ok(Redirect::to("/admin/podcasts/"))
}

/// GET /admin/users/
pub async fn users(
    State(state): State<AppState>,
    RequireStaff(session): RequireStaff,
    Query(query): Query<PageQuery>,
) -> WebResult<Html<String>> {
    let total = db::users::count_users(&state.db).await?;
    let pagination = calculate_pagination(total, query.page, state.settings.admin_list_per_page);
    let users = db::users::list_users(&state.db, pagination.page_size, pagination.offset).await?;

    let mut rows = Vec::with_capacity(users.len());
    for user in users {
        if let Some(profile) = db::profiles::get_profile(&state.db, user.id).await? {
            rows.push((user, profile));
        }
    }

    let ctx = PageContext::load(&state, Some(&session)).await?;
    Ok(ctx.render("Users", &views::admin::users_page(&rows, &pagination)))
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminProfileForm {
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub location: String,
    /// Present ("on") only when the checkbox is ticked
    pub is_staff: Option<String>,
}

/// POST /admin/users/:id/profile/
pub async fn update_user_profile(
    State(state): State<AppState>,
    RequireStaff(session): RequireStaff,
    Id(id): Id,
    Form(form): Form<AdminProfileForm>,
) -> WebResult<Redirect> {
    let user = db::users::get_user(&state.db, id)
        .await?
        .ok_or_else(|| WebError::not_found("User not found"))?;

    let is_staff = form.is_staff.is_some();
    db::profiles::update_bio_location(&state.db, user.id, form.bio.trim(), form.location.trim())
        .await?;
    db::users::set_staff(&state.db, user.id, is_staff).await?;

    info!(
        "Staff {} updated user {} (staff: {})",
        session.user.username, user.username, is_staff
    );
    flash(
        &state,
        &session,
        &format!("The user \"{}\" was changed successfully.", user.username),
    )
    .await?;
    Ok(Redirect::to("/admin/users/"))
}

/// GET /admin/notifications/
pub async fn notifications(
    State(state): State<AppState>,
    RequireStaff(session): RequireStaff,
    Query(query): Query<PageQuery>,
) -> WebResult<Html<String>> {
    render_notifications(&state, &session, query.page, &NotificationFormValues::default(), &FormErrors::new())
        .await
}

async fn render_notifications(
    state: &AppState,
    session: &Session,
    page: i64,
    values: &NotificationFormValues,
    errors: &FormErrors,
) -> WebResult<Html<String>> {
    let total = db::notifications::count_all(&state.db).await?;
    let pagination = calculate_pagination(total, page, state.settings.admin_list_per_page);
    let notifications =
        db::notifications::list_all(&state.db, pagination.page_size, pagination.offset).await?;

    let ctx = PageContext::load(state, Some(session)).await?;
    Ok(ctx.render(
        "Notifications",
        &views::admin::notifications_page(&notifications, &pagination, values, errors),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct NotificationForm {
    #[serde(default)]
    pub recipient: String,
    #[serde(default)]
    pub message: String,
}

/// POST /admin/notifications/
pub async fn create_notification(
    State(state): State<AppState>,
    RequireStaff(session): RequireStaff,
    Form(form): Form<NotificationForm>,
) -> WebResult<Response> {
    let values = NotificationFormValues {
        recipient: form.recipient.trim().to_string(),
        message: form.message.trim().to_string(),
    };

    let mut errors = FormErrors::new();
    errors.check_text("recipient", &values.recipient, true, None);
    errors.check_text("message", &values.message, true, None);

    let mut recipient: Option<User> = None;
    if errors.is_empty() {
        recipient = db::users::get_user_by_username(&state.db, &values.recipient).await?;
        if recipient.is_none() {
            errors.add("recipient", "No user with that username.");
        }
    }

    let Some(recipient) = recipient.filter(|_| errors.is_empty()) else {
        return Ok(render_notifications(&state, &session, 1, &values, &errors)
            .await?
            .into_response());
    };

    db::notifications::create_notification(
        &state.db,
        recipient.id,
        Some(session.user.id),
        &values.message,
    )
    .await?;

    info!("Staff {} notified {}", session.user.username, recipient.username);
    flash(&state, &session, "Notification sent.").await?;
    Ok(Redirect::to("/admin/notifications/").into_response())
}

/// GET /admin/notifications/:id/
pub async fn notification_change_form(
    State(state): State<AppState>,
    RequireStaff(session): RequireStaff,
    Id(id): Id,
) -> WebResult<Html<String>> {
    let notification = db::notifications::get_notification(&state.db, id)
        .await?
        .ok_or_else(|| WebError::not_found("Notification not found"))?;

    let ctx = PageContext::load(&state, Some(&session)).await?;
    Ok(ctx.render(
        "Change notification",
        &views::admin::notification_change_page(
            &notification,
            &notification.message,
            notification.is_read,
            &FormErrors::new(),
        ),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct NotificationChangeForm {
    #[serde(default)]
    pub message: String,
    /// Present ("on") only when the checkbox is ticked
    pub is_read: Option<String>,
}

/// POST /admin/notifications/:id/
pub async fn update_notification(
    State(state): State<AppState>,
    RequireStaff(session): RequireStaff,
    Id(id): Id,
    Form(form): Form<NotificationChangeForm>,
) -> WebResult<Response> {
    let notification = db::notifications::get_notification(&state.db, id)
        .await?
        .ok_or_else(|| WebError::not_found("Notification not found"))?;

    let message = form.message.trim();
    let is_read = form.is_read.is_some();
    let mut errors = FormErrors::new();
    errors.check_text("message", message, true, None);
    if !errors.is_empty() {
        let ctx = PageContext::load(&state, Some(&session)).await?;
        return Ok(ctx
            .render(
                "Change notification",
                &views::admin::notification_change_page(&notification, message, is_read, &errors),
            )
            .into_response());
    }

    db::notifications::update_notification(&state.db, notification.id, message, is_read).await?;
    info!("Staff {} changed notification {}", session.user.username, notification.id);
    flash(&state, &session, "Notification changed.").await?;
    Ok(Redirect::to("/admin/notifications/").into_response())
}

/// POST /admin/notifications/:id/delete/
pub async fn delete_notification(
    State(state): State<AppState>,
    RequireStaff(session): RequireStaff,
    Id(id): Id,
) -> WebResult<Redirect> {
    if !db::notifications::delete_notification(&state.db, id).await? {
        return Err(WebError::not_found("Notification not found"));
    }
    flash(&state, &session, "Notification deleted.").await?;
    Ok(Redirect::to("/admin/notifications/"))
}

