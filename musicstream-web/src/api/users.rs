//! Registration, login, profiles, follows and notifications

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use musicstream_common::auth::verify_password;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::db::podcasts::PodcastQuery;
use crate::db::songs::SongQuery;
use crate::db::users::NewUser;
use crate::error::{WebError, WebResult};
use crate::forms::users::{
    LoginForm, ProfileForm, ProfileImageForm, RegistrationForm, INVALID_LOGIN, USERNAME_TAKEN,
};
use crate::forms::{FormErrors, MultipartForm};
use crate::media::{MediaKind, MediaStore};
use crate::session::{clear_session_cookie, flash, login_redirect, safe_next, CurrentUser, RequireUser};
use crate::views::users::{FollowStats, ProfileFormValues};
use crate::views::{self, PageContext};
use crate::{db, AppState};

/// GET /users/register/
pub async fn register_form(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> WebResult<Html<String>> {
    let ctx = PageContext::load(&state, session.as_ref()).await?;
    Ok(ctx.render(
        "Sign up",
        &views::users::register_page(&RegistrationForm::default(), &FormErrors::new()),
    ))
}

/// POST /users/register/
///
/// Creates the account with an empty profile and signs the new user in.
pub async fn register(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Form(form): Form<RegistrationForm>,
) -> WebResult<Response> {
    let mut errors = form.validate();
    let username = form.username.trim();

    if errors.field("username").is_empty() && db::users::username_taken(&state.db, username).await? {
        errors.add("username", USERNAME_TAKEN);
    }

    if !errors.is_empty() {
        let ctx = PageContext::load(&state, session.as_ref()).await?;
        return Ok(ctx
            .render("Sign up", &views::users::register_page(&form, &errors))
            .into_response());
    }

    let user_id = db::users::create_user(
        &state.db,
        &NewUser {
            username,
            email: form.email.trim(),
            password: &form.password1,
            ..Default::default()
        },
    )
    .await?;

    info!("Registered user {} ({})", username, user_id);
    login_redirect(&state, user_id, "/").await
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// GET /users/login/?next=
pub async fn login_form(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Query(query): Query<NextQuery>,
) -> WebResult<Html<String>> {
    let ctx = PageContext::load(&state, session.as_ref()).await?;
    let next = safe_next(query.next.as_deref());
    Ok(ctx.render(
        "Log in",
        &views::users::login_page("", next, &FormErrors::new()),
    ))
}

/// POST /users/login/
pub async fn login(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Form(form): Form<LoginForm>,
) -> WebResult<Response> {
    let next = safe_next(form.next.as_deref()).to_string();
    let mut errors = form.validate();

    if errors.is_empty() {
        let username = form.username.trim();
        match db::users::get_user_by_username(&state.db, username).await? {
            Some(user) if verify_password(&form.password, &user.password_hash, &user.password_salt) => {
                info!("User {} logged in", user.username);
                return login_redirect(&state, user.id, &next).await;
            }
            _ => {
                warn!("Failed login for '{}'", username);
                errors.add(FormErrors::NON_FIELD, INVALID_LOGIN);
            }
        }
    }

    let ctx = PageContext::load(&state, session.as_ref()).await?;
    Ok(ctx
        .render("Log in", &views::users::login_page(form.username.trim(), &next, &errors))
        .into_response())
}

/// POST /users/logout/
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> WebResult<Response> {
    if let Some(session) = session {
        db::sessions::delete_session(&state.db, &session.token).await?;
        info!("User {} logged out", session.user.username);
    }
    Ok(([(header::SET_COOKIE, clear_session_cookie())], Redirect::to("/")).into_response())
}

/// GET /users/profile/:username/
pub async fn profile(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(username): Path<String>,
) -> WebResult<Html<String>> {
    let user = db::users::get_user_by_username(&state.db, &username)
        .await?
        .ok_or_else(|| WebError::not_found("User not found"))?;
    let profile = db::profiles::get_profile(&state.db, user.id)
        .await?
        .ok_or_else(|| WebError::not_found("Profile not found"))?;
    let ctx = PageContext::load(&state, session.as_ref()).await?;

    let songs = db::songs::list_songs(&state.db, &SongQuery::by_uploader(user.id)).await?;
    let podcasts = db::podcasts::list_podcasts(&state.db, &PodcastQuery::by_host(user.id)).await?;

    let is_following = match &ctx.user {
        Some(viewer) if viewer.id != user.id => {
            db::profiles::is_following(&state.db, user.id, viewer.id).await?
        }
        _ => false,
    };
    let stats = FollowStats {
        followers: db::profiles::followers_count(&state.db, user.id).await?,
        following: db::profiles::following_count(&state.db, user.id).await?,
        is_following,
    };

    Ok(ctx.render(
        &user.username,
        &views::users::profile_page(&user, &profile, &songs, &podcasts, stats, ctx.user.as_ref()),
    ))
}

/// GET /users/profile/edit/
pub async fn edit_profile_form(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
) -> WebResult<Html<String>> {
    let profile = db::profiles::get_profile(&state.db, session.user.id)
        .await?
        .ok_or_else(|| WebError::not_found("Profile not found"))?;
    let ctx = PageContext::load(&state, Some(&session)).await?;
    Ok(ctx.render(
        "Edit profile",
        &views::users::edit_profile_page(&ProfileFormValues::from(&profile), &FormErrors::new()),
    ))
}

/// POST /users/profile/edit/
pub async fn edit_profile(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
    multipart: Multipart,
) -> WebResult<Response> {
    let form = ProfileForm::from_multipart(MultipartForm::read(multipart).await?);

    let update = match form.validate() {
        Ok(update) => update,
        Err(errors) => {
            let values = ProfileFormValues {
                bio: form.bio.clone(),
                location: form.location.clone(),
                birth_date: form.birth_date.clone(),
            };
            let ctx = PageContext::load(&state, Some(&session)).await?;
            return Ok(ctx
                .render("Edit profile", &views::users::edit_profile_page(&values, &errors))
                .into_response());
        }
    };

    // The image goes first so a failed write leaves the profile untouched
    if let Some(image) = &form.profile_image {
        replace_profile_image(&state, session.user.id, image).await?;
    }
    db::profiles::update_profile(&state.db, session.user.id, &update).await?;

    flash(&state, &session, "Profile updated successfully!").await?;
    Ok(Redirect::to(&format!("/users/profile/{}/", session.user.username)).into_response())
}

async fn replace_profile_image(
    state: &AppState,
    user_id: i64,
    image: &crate::media::UploadedFile,
) -> WebResult<String> {
    let mut staged = state.media.stage();
    let stored = staged.save(MediaKind::ProfileImage, image).await?;
    let previous = match db::profiles::set_profile_image(&state.db, user_id, &stored).await {
        Ok(previous) => previous,
        Err(e) => {
            staged.rollback().await;
            return Err(e.into());
        }
    };
    staged.commit();
    if let Some(previous) = previous {
        state.media.remove(&previous).await;
    }
    Ok(stored)
}

/// POST /users/follow/:username/
///
/// Toggles following and reports the new state as JSON.
pub async fn toggle_follow(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
    Path(username): Path<String>,
) -> WebResult<Response> {
    let Some(target) = db::users::get_user_by_username(&state.db, &username).await? else {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(json!({"success": false, "error": "User not found"})),
        )
            .into_response());
    };

    if target.id == session.user.id {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "error": "You cannot follow yourself"})),
        )
            .into_response());
    }

    let is_following = db::profiles::toggle_follow(&state.db, target.id, session.user.id).await?;
    if is_following {
        let message = format!("{} started following you.", session.user.username);
        db::notifications::create_notification(&state.db, target.id, Some(session.user.id), &message)
            .await?;
    }
    let followers_count = db::profiles::followers_count(&state.db, target.id).await?;

    info!(
        "User {} {} {}",
        session.user.username,
        if is_following { "followed" } else { "unfollowed" },
        target.username
    );

    Ok(Json(json!({
        "success": true,
        "is_following": is_following,
        "followers_count": followers_count,
    }))
    .into_response())
}

/// POST /users/upload-image/
pub async fn upload_profile_image(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
    multipart: Multipart,
) -> WebResult<Response> {
    let form = ProfileImageForm::from_multipart(MultipartForm::read(multipart).await?);
    let errors = form.validate();

    let Some(image) = form.profile_image.as_ref().filter(|_| errors.is_empty()) else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "errors": errors.as_map()})),
        )
            .into_response());
    };

    let stored = replace_profile_image(&state, session.user.id, image).await?;
    Ok(Json(json!({"success": true, "image_url": MediaStore::url(&stored)})).into_response())
}

/// GET /users/notifications/
pub async fn notifications(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
) -> WebResult<Html<String>> {
    let ctx = PageContext::load(&state, Some(&session)).await?;
    let notifications = db::notifications::list_for_user(&state.db, session.user.id).await?;
    Ok(ctx.render(
        "Notifications",
        &views::users::notifications_page(&notifications),
    ))
}

/// POST /users/notifications/read/
pub async fn mark_notifications_read(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
) -> WebResult<Redirect> {
    let changed = db::notifications::mark_all_read(&state.db, session.user.id).await?;
    debug!("Marked {} notifications read for {}", changed, session.user.username);
    Ok(Redirect::to("/users/notifications/"))
}
