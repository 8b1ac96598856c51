//! Server-rendered HTML
//!
//! Pages are assembled with `format!` into a shared layout. Every value that
//! came from a user or the database goes through [`escape`].

use axum::response::Html;
use chrono::{DateTime, Utc};
use musicstream_common::db::User;

use crate::error::WebResult;
use crate::forms::FormErrors;
use crate::media::{MediaStore, DEFAULT_COVER_URL};
use crate::session::Session;
use crate::{db, AppState};

pub mod admin;
pub mod music;
pub mod podcasts;
pub mod users;

/// HTML-escape text for element content and quoted attributes
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Per-request layout data: who is signed in and what to announce
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<User>,
    pub flash: Option<String>,
    pub unread_notifications: i64,
}

impl PageContext {
    /// Consumes the session's pending flash message
    pub async fn load(state: &AppState, session: Option<&Session>) -> WebResult<Self> {
        let Some(session) = session else {
            return Ok(Self::default());
        };

        let flash = db::sessions::take_flash(&state.db, &session.token).await?;
        let unread_notifications =
            db::notifications::unread_count(&state.db, session.user.id).await?;

        Ok(Self {
            user: Some(session.user.clone()),
            flash,
            unread_notifications,
        })
    }

    /// Wrap `body` in the site layout
    pub fn render(&self, title: &str, body: &str) -> Html<String> {
        let flash = self
            .flash
            .as_deref()
            .map(|message| {
                format!(
                    r#"<div class="flash" role="status">{}</div>"#,
                    escape(message)
                )
            })
            .unwrap_or_default();

        Html(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} | MusicStream</title>
    <link rel="stylesheet" href="/assets/style.css">
</head>
<body>
{nav}
<main class="container">
{flash}
{body}
</main>
<div id="player" class="player" hidden>
    <img id="player-cover" src="{default_cover}" alt="">
    <div class="player-meta"><strong id="player-title"></strong><span id="player-subtitle"></span></div>
    <audio id="player-audio" controls></audio>
</div>
<footer class="site-footer">MusicStream v{version} ({git_hash})</footer>
<script src="/assets/player.js"></script>
</body>
</html>"#,
            title = escape(title),
            nav = self.nav(),
            flash = flash,
            body = body,
            default_cover = DEFAULT_COVER_URL,
            version = env!("CARGO_PKG_VERSION"),
            git_hash = env!("GIT_HASH"),
        ))
    }

    fn nav(&self) -> String {
        let account = match &self.user {
            Some(user) => {
                let staff = if user.is_staff {
                    r#"<a href="/admin/">Admin</a>"#
                } else {
                    ""
                };
                let badge = if self.unread_notifications > 0 {
                    format!(r#" <span class="badge">{}</span>"#, self.unread_notifications)
                } else {
                    String::new()
                };
                format!(
                    r#"<a href="/upload/">Upload</a>
        <a href="/my-songs/">My Songs</a>
        <a href="/podcasts/my/">My Podcasts</a>
        <a href="/users/notifications/">Notifications{badge}</a>
        <a href="/users/profile/{username_url}/">{username}</a>
        {staff}
        <form method="post" action="/users/logout/" class="inline"><button type="submit" class="link-button">Log out</button></form>"#,
                    badge = badge,
                    username_url = escape(&user.username),
                    username = escape(&user.username),
                    staff = staff,
                )
            }
            None => r#"<a href="/users/login/">Log in</a>
        <a href="/users/register/">Sign up</a>"#
                .to_string(),
        };

        format!(
            r#"<header class="site-header">
    <a href="/" class="brand">MusicStream</a>
    <nav>
        <a href="/discover/">Discover</a>
        <a href="/podcasts/">Podcasts</a>
        <form method="get" action="/search/" class="inline search"><input type="search" name="q" placeholder="Search"></form>
        {account}
    </nav>
</header>"#,
            account = account
        )
    }
}

/// Public URL of a stored cover, or the default artwork
pub fn cover_url(cover: Option<&str>) -> String {
    match cover {
        Some(path) if !path.is_empty() => MediaStore::url(path),
        _ => DEFAULT_COVER_URL.to_string(),
    }
}

pub fn format_date(at: &DateTime<Utc>) -> String {
    at.format("%b %-d, %Y").to_string()
}

/// `<ul class="errors">` for one field, empty when it has none
pub fn field_errors(errors: &FormErrors, field: &str) -> String {
    error_list(errors.field(field))
}

pub fn non_field_errors(errors: &FormErrors) -> String {
    error_list(errors.non_field())
}

fn error_list(messages: &[String]) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let items: String = messages
        .iter()
        .map(|m| format!("<li>{}</li>", escape(m)))
        .collect();
    format!(r#"<ul class="errors">{}</ul>"#, items)
}

/// Labelled text input with its errors
pub fn text_input(
    name: &str,
    label: &str,
    input_type: &str,
    value: &str,
    errors: &FormErrors,
    required: bool,
) -> String {
    format!(
        r#"<p class="field"><label for="id_{name}">{label}</label>
<input type="{input_type}" name="{name}" id="id_{name}" value="{value}" class="form-control"{required}>
{errors}</p>"#,
        name = name,
        label = escape(label),
        input_type = input_type,
        value = escape(value),
        required = if required { " required" } else { "" },
        errors = field_errors(errors, name),
    )
}

pub fn textarea(name: &str, label: &str, value: &str, errors: &FormErrors, required: bool) -> String {
    format!(
        r#"<p class="field"><label for="id_{name}">{label}</label>
<textarea name="{name}" id="id_{name}" rows="4" class="form-control"{required}>{value}</textarea>
{errors}</p>"#,
        name = name,
        label = escape(label),
        value = escape(value),
        required = if required { " required" } else { "" },
        errors = field_errors(errors, name),
    )
}

/// File inputs never echo a value back
pub fn file_input(name: &str, label: &str, accept: &str, errors: &FormErrors, required: bool) -> String {
    format!(
        r#"<p class="field"><label for="id_{name}">{label}</label>
<input type="file" name="{name}" id="id_{name}" accept="{accept}" class="form-control"{required}>
{errors}</p>"#,
        name = name,
        label = escape(label),
        accept = accept,
        required = if required { " required" } else { "" },
        errors = field_errors(errors, name),
    )
}

/// Play button picked up by `player.js`
pub fn play_button(play_url: &str) -> String {
    format!(
        r#"<button type="button" class="play-button" data-play-url="{}">&#9654; Play</button>"#,
        escape(play_url)
    )
}

/// Follow toggle picked up by `player.js`
pub fn follow_button(username: &str, is_following: bool) -> String {
    format!(
        r#"<button type="button" class="follow-button" data-follow-url="/users/follow/{}/">{}</button>"#,
        escape(username),
        if is_following { "Unfollow" } else { "Follow" }
    )
}

pub fn empty_state(message: &str) -> String {
    format!(r#"<p class="empty">{}</p>"#, escape(message))
}
