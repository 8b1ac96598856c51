//! Staff admin pages

use musicstream_common::db::{Notification, Podcast, Profile, Song, User};

use super::{empty_state, escape, format_date, non_field_errors, text_input, textarea};
use crate::db::songs::UploadDateFilter;
use crate::forms::music::{PodcastChangeForm, SongChangeForm};
use crate::forms::FormErrors;
use crate::pagination::Pagination;
use crate::session::encode_query_value;

/// Row counts on the dashboard
#[derive(Debug, Clone, Copy, Default)]
pub struct AdminCounts {
    pub users: i64,
    pub songs: i64,
    pub podcasts: i64,
    pub episodes: i64,
    pub notifications: i64,
}

pub fn dashboard_page(counts: &AdminCounts) -> String {
    format!(
        r#"<h1>Site administration</h1>
<table class="list">
<tr><td><a href="/admin/users/">Users</a></td><td>{users}</td></tr>
<tr><td><a href="/admin/songs/">Songs</a></td><td>{songs}</td></tr>
<tr><td><a href="/admin/podcasts/">Podcasts</a></td><td>{podcasts}</td></tr>
<tr><td>Episodes</td><td>{episodes}</td></tr>
<tr><td><a href="/admin/notifications/">Notifications</a></td><td>{notifications}</td></tr>
</table>"#,
        users = counts.users,
        songs = counts.songs,
        podcasts = counts.podcasts,
        episodes = counts.episodes,
        notifications = counts.notifications,
    )
}

/// Previous/next links keeping the other query parameters
fn pager(path: &str, params: &[(&str, String)], p: &Pagination) -> String {
    if p.total_pages <= 1 {
        return String::new();
    }
    let link = |page: i64, label: &str| {
        let mut query: Vec<String> = params
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| format!("{}={}", k, encode_query_value(v)))
            .collect();
        query.push(format!("page={}", page));
        format!(r#"<a href="{}?{}">{}</a>"#, path, escape(&query.join("&")), label)
    };

    let mut out = String::from(r#"<nav class="pager">"#);
    if p.has_previous() {
        out.push_str(&link(p.page - 1, "&laquo; Previous"));
    }
    out.push_str(&format!(" Page {} of {} ", p.page, p.total_pages));
    if p.has_next() {
        out.push_str(&link(p.page + 1, "Next &raquo;"));
    }
    out.push_str("</nav>");
    out
}

/// Current admin song filters
#[derive(Debug, Clone, Default)]
pub struct SongFilters {
    pub q: String,
    pub genre: String,
    pub uploaded_by: Option<i64>,
    pub upload_date: Option<UploadDateFilter>,
}

pub fn songs_page(
    songs: &[Song],
    total: i64,
    pagination: &Pagination,
    filters: &SongFilters,
    genres: &[String],
    uploaders: &[User],
) -> String {
    let genre_links: String = std::iter::once((String::new(), "All".to_string()))
        .chain(genres.iter().map(|g| (g.clone(), g.clone())))
        .map(|(value, label)| {
            let class = if value.eq_ignore_ascii_case(&filters.genre) { "selected" } else { "" };
            format!(
                r#"<li class="{}"><a href="/admin/songs/?genre={}">{}</a></li>"#,
                class,
                encode_query_value(&value),
                escape(&label)
            )
        })
        .collect();
    let uploader_links: String = std::iter::once((None, "All".to_string()))
        .chain(uploaders.iter().map(|u| (Some(u.id), u.username.clone())))
        .map(|(id, label)| {
            let class = if id == filters.uploaded_by { "selected" } else { "" };
            let href = match id {
                Some(id) => format!("/admin/songs/?uploaded_by={}", id),
                None => "/admin/songs/".to_string(),
            };
            format!(r#"<li class="{}"><a href="{}">{}</a></li>"#, class, href, escape(&label))
        })
        .collect();
    let date_links: String = std::iter::once((None, "Any date"))
        .chain(UploadDateFilter::ALL.iter().map(|f| (Some(*f), f.label())))
        .map(|(filter, label)| {
            let class = if filter == filters.upload_date { "selected" } else { "" };
            let href = match filter {
                Some(f) => format!("/admin/songs/?upload_date={}", f.as_str()),
                None => "/admin/songs/".to_string(),
            };
            format!(r#"<li class="{}"><a href="{}">{}</a></li>"#, class, href, label)
        })
        .collect();

    let rows: String = songs
        .iter()
        .map(|s| {
            format!(
                r#"<tr><td><a href="/admin/songs/{id}/">{title}</a></td><td>{artist}</td><td>{album}</td><td>{genre}</td><td>{uploader}</td><td>{date}</td><td>{plays}</td>
<td><form method="post" action="/admin/songs/{id}/delete/" class="inline"><button type="submit" class="danger">Delete</button></form></td></tr>"#,
                id = s.id,
                title = escape(&s.title),
                artist = escape(&s.artist),
                album = escape(&s.album),
                genre = escape(&s.genre),
                uploader = escape(&s.uploader_username),
                date = format_date(&s.upload_date),
                plays = s.play_count,
            )
        })
        .collect();

    let params = [
        ("q", filters.q.clone()),
        ("genre", filters.genre.clone()),
        (
            "uploaded_by",
            filters.uploaded_by.map(|id| id.to_string()).unwrap_or_default(),
        ),
        (
            "upload_date",
            filters.upload_date.map(|f| f.as_str().to_string()).unwrap_or_default(),
        ),
    ];

    format!(
        r#"<h1>Songs <span class="muted">({total})</span></h1>
<form method="get" action="/admin/songs/" class="filters">
    <input type="search" name="q" value="{q}" placeholder="Title, artist or album">
    <button type="submit">Search</button>
</form>
<div class="admin-layout">
<table class="list"><thead><tr><th>Title</th><th>Artist</th><th>Album</th><th>Genre</th><th>Uploaded by</th><th>Upload date</th><th>Play count</th><th></th></tr></thead>
<tbody>{rows}</tbody></table>
<aside class="admin-filters"><h3>By genre</h3><ul>{genre_links}</ul><h3>By uploaded by</h3><ul>{uploader_links}</ul><h3>By upload date</h3><ul>{date_links}</ul></aside>
</div>
{pager}"#,
        total = total,
        q = escape(&filters.q),
        rows = rows,
        genre_links = genre_links,
        uploader_links = uploader_links,
        date_links = date_links,
        pager = pager("/admin/songs/", &params, pagination),
    )
}

pub fn podcasts_page(podcasts: &[Podcast], total: i64, pagination: &Pagination, q: &str) -> String {
    let rows: String = podcasts
        .iter()
        .map(|p| {
            format!(
                r#"<tr><td><a href="/admin/podcasts/{id}/">{title}</a></td><td>{host}</td><td>{date}</td>
<td><form method="post" action="/admin/podcasts/{id}/delete/" class="inline"><button type="submit" class="danger">Delete</button></form></td></tr>"#,
                id = p.id,
                title = escape(&p.title),
                host = escape(&p.host_username),
                date = format_date(&p.created_at),
            )
        })
        .collect();

    format!(
        r#"<h1>Podcasts <span class="muted">({total})</span></h1>
<form method="get" action="/admin/podcasts/" class="filters">
    <input type="search" name="q" value="{q}" placeholder="Title">
    <button type="submit">Search</button>
</form>
<table class="list"><thead><tr><th>Title</th><th>Host</th><th>Created</th><th></th></tr></thead>
<tbody>{rows}</tbody></table>
{pager}"#,
        total = total,
        q = escape(q),
        rows = rows,
        pager = pager("/admin/podcasts/", &[("q", q.to_string())], pagination),
    )
}

/// Users with their profile edited inline
pub fn users_page(users: &[(User, Profile)], pagination: &Pagination) -> String {
    let rows: String = users
        .iter()
        .map(|(user, profile)| {
            format!(
                r#"<tr><td><a href="/users/profile/{username}/">{username}</a></td><td>{email}</td><td>{joined}</td>
<td><form method="post" action="/admin/users/{id}/profile/" class="inline-edit">
    <input type="text" name="location" value="{location}" placeholder="Location">
    <textarea name="bio" rows="2" placeholder="Bio">{bio}</textarea>
    <label><input type="checkbox" name="is_staff" value="on"{staff}> Staff</label>
    <button type="submit">Save</button>
</form></td></tr>"#,
                id = user.id,
                username = escape(&user.username),
                email = escape(&user.email),
                joined = format_date(&user.date_joined),
                location = escape(&profile.location),
                bio = escape(&profile.bio),
                staff = if user.is_staff { " checked" } else { "" },
            )
        })
        .collect();

    format!(
        r#"<h1>Users</h1>
<table class="list"><thead><tr><th>Username</th><th>Email</th><th>Joined</th><th>Profile</th></tr></thead>
<tbody>{rows}</tbody></table>
{pager}"#,
        rows = rows,
        pager = pager("/admin/users/", &[], pagination),
    )
}

/// Values of the create-notification form
#[derive(Debug, Clone, Default)]
pub struct NotificationFormValues {
    pub recipient: String,
    pub message: String,
}

pub fn notifications_page(
    notifications: &[Notification],
    pagination: &Pagination,
    values: &NotificationFormValues,
    errors: &FormErrors,
) -> String {
    let rows = if notifications.is_empty() {
        empty_state("No notifications.")
    } else {
        let rows: String = notifications
            .iter()
            .map(|n| {
                format!(
                    r#"<tr><td>{recipient}</td><td>{actor}</td><td><a href="/admin/notifications/{id}/">{message}</a></td><td>{read}</td><td>{date}</td>
<td><form method="post" action="/admin/notifications/{id}/delete/" class="inline"><button type="submit" class="danger">Delete</button></form></td></tr>"#,
                    id = n.id,
                    recipient = escape(&n.recipient_username),
                    actor = n.actor_username.as_deref().map(escape).unwrap_or_default(),
                    message = escape(&n.message),
                    read = if n.is_read { "yes" } else { "no" },
                    date = format_date(&n.created_at),
                )
            })
            .collect();
        format!(
            r#"<table class="list"><thead><tr><th>Recipient</th><th>Actor</th><th>Message</th><th>Read</th><th>Created</th><th></th></tr></thead><tbody>{}</tbody></table>"#,
            rows
        )
    };

    format!(
        r#"<h1>Notifications</h1>
<form method="post" action="/admin/notifications/" class="stacked">
{non_field}
{recipient}
{message}
<button type="submit">Send</button>
</form>
{rows}
{pager}"#,
        non_field = non_field_errors(errors),
        recipient = text_input("recipient", "Recipient username", "text", &values.recipient, errors, true),
        message = textarea("message", "Message", &values.message, errors, true),
        rows = rows,
        pager = pager("/admin/notifications/", &[], pagination),
    )
}

/// Read-only rows shown above a change form
fn readonly_rows(rows: &[(&str, String)]) -> String {
    let rows: String = rows
        .iter()
        .map(|(label, value)| format!("<tr><th>{}</th><td>{}</td></tr>", label, value))
        .collect();
    format!(r#"<table class="readonly">{}</table>"#, rows)
}

pub fn song_change_page(song: &Song, values: &SongChangeForm, errors: &FormErrors) -> String {
    format!(
        r#"<h1>Change song</h1>
{readonly}
<form method="post" action="/admin/songs/{id}/" class="stacked">
{non_field}
{title}
{artist}
{album}
{genre}
{uploaded_by}
<button type="submit">Save</button>
<a href="/admin/songs/">Cancel</a>
</form>"#,
        readonly = readonly_rows(&[
            ("Audio file", escape(&song.audio_file)),
            ("Upload date", format_date(&song.upload_date)),
            ("Play count", song.play_count.to_string()),
        ]),
        id = song.id,
        non_field = non_field_errors(errors),
        title = text_input("title", "Title", "text", &values.title, errors, true),
        artist = text_input("artist", "Artist", "text", &values.artist, errors, true),
        album = text_input("album", "Album", "text", &values.album, errors, false),
        genre = text_input("genre", "Genre", "text", &values.genre, errors, false),
        uploaded_by = text_input("uploaded_by", "Uploaded by (username)", "text", &values.uploaded_by, errors, true),
    )
}

pub fn podcast_change_page(podcast: &Podcast, values: &PodcastChangeForm, errors: &FormErrors) -> String {
    format!(
        r#"<h1>Change podcast</h1>
{readonly}
<form method="post" action="/admin/podcasts/{id}/" class="stacked">
{non_field}
{title}
{description}
{host}
<button type="submit">Save</button>
<a href="/admin/podcasts/">Cancel</a>
</form>"#,
        readonly = readonly_rows(&[("Created", format_date(&podcast.created_at))]),
        id = podcast.id,
        non_field = non_field_errors(errors),
        title = text_input("title", "Title", "text", &values.title, errors, true),
        description = textarea("description", "Description", &values.description, errors, true),
        host = text_input("host", "Host (username)", "text", &values.host, errors, true),
    )
}

pub fn notification_change_page(
    notification: &Notification,
    message: &str,
    is_read: bool,
    errors: &FormErrors,
) -> String {
    format!(
        r#"<h1>Change notification</h1>
{readonly}
<form method="post" action="/admin/notifications/{id}/" class="stacked">
{non_field}
{message}
<p class="field"><label><input type="checkbox" name="is_read" value="on"{checked}> Read</label></p>
<button type="submit">Save</button>
<a href="/admin/notifications/">Cancel</a>
</form>"#,
        readonly = readonly_rows(&[
            ("Recipient", escape(&notification.recipient_username)),
            (
                "Actor",
                notification.actor_username.as_deref().map(escape).unwrap_or_default(),
            ),
            ("Created", format_date(&notification.created_at)),
        ]),
        id = notification.id,
        non_field = non_field_errors(errors),
        message = textarea("message", "Message", message, errors, true),
        checked = if is_read { " checked" } else { "" },
    )
}
