//! Account, profile and notification pages

use musicstream_common::db::{Notification, Podcast, Profile, Song, User};

use super::music::song_grid;
use super::podcasts::podcast_grid;
use super::{
    empty_state, escape, file_input, follow_button, format_date, non_field_errors, text_input,
    textarea,
};
use crate::forms::users::RegistrationForm;
use crate::forms::FormErrors;
use crate::media::MediaStore;

pub fn register_page(form: &RegistrationForm, errors: &FormErrors) -> String {
    format!(
        r#"<h1>Sign up</h1>
<form method="post" action="/users/register/" class="stacked">
{non_field}
{username}
<p class="help">150 characters or fewer. Letters, digits and @/./+/-/_ only.</p>
{email}
{password1}
<p class="help">At least 8 characters, not entirely numeric, not a common password.</p>
{password2}
<button type="submit">Create account</button>
</form>
<p>Already have an account? <a href="/users/login/">Log in</a></p>"#,
        non_field = non_field_errors(errors),
        username = text_input("username", "Username", "text", &form.username, errors, true),
        email = text_input("email", "Email", "email", &form.email, errors, false),
        password1 = text_input("password1", "Password", "password", "", errors, true),
        password2 = text_input("password2", "Password confirmation", "password", "", errors, true),
    )
}

pub fn login_page(username: &str, next: &str, errors: &FormErrors) -> String {
    format!(
        r#"<h1>Log in</h1>
<form method="post" action="/users/login/" class="stacked">
{non_field}
<input type="hidden" name="next" value="{next}">
{username}
{password}
<button type="submit">Log in</button>
</form>
<p>New here? <a href="/users/register/">Create an account</a></p>"#,
        non_field = non_field_errors(errors),
        next = escape(next),
        username = text_input("username", "Username", "text", username, errors, true),
        password = text_input("password", "Password", "password", "", errors, true),
    )
}

/// Counts and follow state shown on a profile
#[derive(Debug, Clone, Copy, Default)]
pub struct FollowStats {
    pub followers: i64,
    pub following: i64,
    pub is_following: bool,
}

pub fn profile_image_url(profile: &Profile) -> Option<String> {
    profile
        .profile_image
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(MediaStore::url)
}

pub fn profile_page(
    user: &User,
    profile: &Profile,
    songs: &[Song],
    podcasts: &[Podcast],
    stats: FollowStats,
    viewer: Option<&User>,
) -> String {
    let is_self = viewer.map(|v| v.id == user.id).unwrap_or(false);

    let avatar = match profile_image_url(profile) {
        Some(url) => format!(r#"<img src="{}" alt="" class="avatar" id="profile-image">"#, escape(&url)),
        None => r#"<div class="avatar placeholder" id="profile-image"></div>"#.to_string(),
    };
    let actions = if is_self {
        r#"<a href="/users/profile/edit/" class="button">Edit profile</a>
<form class="inline image-upload" method="post" action="/users/upload-image/" enctype="multipart/form-data">
    <input type="file" name="profile_image" accept="image/*">
    <button type="submit">Change photo</button>
</form>"#
            .to_string()
    } else if viewer.is_some() {
        follow_button(&user.username, stats.is_following)
    } else {
        String::new()
    };

    let mut details = String::new();
    if !profile.location.is_empty() {
        details.push_str(&format!("<dt>Location</dt><dd>{}</dd>", escape(&profile.location)));
    }
    if let Some(birth_date) = profile.birth_date {
        details.push_str(&format!("<dt>Born</dt><dd>{}</dd>", birth_date.format("%b %-d, %Y")));
    }
    details.push_str(&format!("<dt>Joined</dt><dd>{}</dd>", format_date(&user.date_joined)));

    format!(
        r#"<section class="profile">
    {avatar}
    <div>
        <h1>{name}</h1>
        <p class="muted">@{username}</p>
        <p>{bio}</p>
        <p><span class="followers-count">{followers}</span> followers · {following} following</p>
        <dl>{details}</dl>
        {actions}
    </div>
</section>
<section><h2>Songs</h2>{songs}</section>
<section><h2>Podcasts</h2>{podcasts}</section>"#,
        avatar = avatar,
        name = escape(&user.display_name()),
        username = escape(&user.username),
        bio = escape(&profile.bio),
        followers = stats.followers,
        following = stats.following,
        details = details,
        actions = actions,
        songs = song_grid(songs, "No songs yet."),
        podcasts = podcast_grid(podcasts, "No podcasts yet."),
    )
}

/// Values shown in the edit form
#[derive(Debug, Clone, Default)]
pub struct ProfileFormValues {
    pub bio: String,
    pub location: String,
    pub birth_date: String,
}

impl From<&Profile> for ProfileFormValues {
    fn from(profile: &Profile) -> Self {
        Self {
            bio: profile.bio.clone(),
            location: profile.location.clone(),
            birth_date: profile
                .birth_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        }
    }
}

pub fn edit_profile_page(values: &ProfileFormValues, errors: &FormErrors) -> String {
    format!(
        r#"<h1>Edit profile</h1>
<form method="post" action="/users/profile/edit/" enctype="multipart/form-data" class="stacked">
{non_field}
{bio}
{location}
{birth_date}
{image}
<button type="submit">Save</button>
</form>"#,
        non_field = non_field_errors(errors),
        bio = textarea("bio", "Bio", &values.bio, errors, false),
        location = text_input("location", "Location", "text", &values.location, errors, false),
        birth_date = text_input("birth_date", "Birth date", "date", &values.birth_date, errors, false),
        image = file_input("profile_image", "Profile image", "image/*", errors, false),
    )
}

pub fn notifications_page(notifications: &[Notification]) -> String {
    if notifications.is_empty() {
        return format!("<h1>Notifications</h1>{}", empty_state("No notifications yet."));
    }

    let items: String = notifications
        .iter()
        .map(|n| {
            format!(
                r#"<li class="{class}">{message} <span class="muted">{date}</span></li>"#,
                class = if n.is_read { "read" } else { "unread" },
                message = escape(&n.message),
                date = format_date(&n.created_at),
            )
        })
        .collect();

    format!(
        r#"<h1>Notifications</h1>
<form method="post" action="/users/notifications/read/"><button type="submit">Mark all as read</button></form>
<ul class="notifications">{}</ul>"#,
        items
    )
}
