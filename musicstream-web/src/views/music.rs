//! Song pages, home, discover and search

use musicstream_common::db::{Podcast, Song, User};

use super::podcasts::podcast_grid;
use super::{
    cover_url, empty_state, escape, file_input, follow_button, format_date, non_field_errors,
    play_button, text_input,
};
use crate::db::songs::SongSort;
use crate::forms::music::SongForm;
use crate::forms::FormErrors;

pub fn song_card(song: &Song) -> String {
    format!(
        r#"<article class="card song-card">
    <a href="/song/{id}/"><img src="{cover}" alt="" class="cover"></a>
    <h3><a href="/song/{id}/">{title}</a></h3>
    <p class="muted">{artist}</p>
    {play}
</article>"#,
        id = song.id,
        cover = escape(&cover_url(song.cover_image.as_deref())),
        title = escape(&song.title),
        artist = escape(&song.artist),
        play = play_button(&format!("/song/{}/play/", song.id)),
    )
}

pub fn song_grid(songs: &[Song], empty: &str) -> String {
    if songs.is_empty() {
        return empty_state(empty);
    }
    let cards: String = songs.iter().map(song_card).collect();
    format!(r#"<div class="grid">{}</div>"#, cards)
}

fn user_chip(user: &User) -> String {
    format!(
        r#"<li><a href="/users/profile/{username}/">{name}</a> <span class="muted">@{username}</span></li>"#,
        username = escape(&user.username),
        name = escape(&user.display_name()),
    )
}

pub fn home_page(songs: &[Song], podcasts: &[Podcast], suggested: &[User]) -> String {
    let suggested = if suggested.is_empty() {
        String::new()
    } else {
        let items: String = suggested.iter().map(user_chip).collect();
        format!(
            r#"<section><h2>Artists to follow</h2><ul class="people">{}</ul></section>"#,
            items
        )
    };

    format!(
        r#"<section><h2>Latest songs</h2>{songs}</section>
<section><h2>Latest podcasts</h2>{podcasts}</section>
{suggested}"#,
        songs = song_grid(songs, "No songs uploaded yet."),
        podcasts = podcast_grid(podcasts, "No podcasts yet."),
        suggested = suggested,
    )
}

pub fn discover_page(
    songs: &[Song],
    podcasts: &[Podcast],
    genres: &[String],
    genre: &str,
    sort: SongSort,
) -> String {
    let genre_options: String = std::iter::once(String::new())
        .chain(genres.iter().cloned())
        .map(|g| {
            let selected = if g.eq_ignore_ascii_case(genre) { " selected" } else { "" };
            let label = if g.is_empty() { "All genres".to_string() } else { escape(&g) };
            format!(r#"<option value="{}"{}>{}</option>"#, escape(&g), selected, label)
        })
        .collect();

    let sort_options: String = [
        (SongSort::Newest, "Newest"),
        (SongSort::Oldest, "Oldest"),
        (SongSort::Popular, "Most played"),
        (SongSort::Title, "Title"),
    ]
    .iter()
    .map(|(value, label)| {
        let selected = if *value == sort { " selected" } else { "" };
        format!(
            r#"<option value="{}"{}>{}</option>"#,
            value.as_str(),
            selected,
            label
        )
    })
    .collect();

    format!(
        r#"<h1>Discover</h1>
<form method="get" action="/discover/" class="filters">
    <select name="genre">{genre_options}</select>
    <select name="sort">{sort_options}</select>
    <button type="submit">Apply</button>
</form>
<section><h2>Songs</h2>{songs}</section>
<section><h2>Podcasts</h2>{podcasts}</section>"#,
        genre_options = genre_options,
        sort_options = sort_options,
        songs = song_grid(songs, "No songs match these filters."),
        podcasts = podcast_grid(podcasts, "No podcasts yet."),
    )
}

pub fn upload_song_page(form: &SongForm, errors: &FormErrors) -> String {
    format!(
        r#"<h1>Upload a song</h1>
<form method="post" action="/upload/" enctype="multipart/form-data" class="stacked">
{non_field}
{title}
{artist}
{album}
{genre}
{audio}
{cover}
<button type="submit">Upload</button>
</form>"#,
        non_field = non_field_errors(errors),
        title = text_input("title", "Title", "text", &form.title, errors, true),
        artist = text_input("artist", "Artist", "text", &form.artist, errors, true),
        album = text_input("album", "Album", "text", &form.album, errors, false),
        genre = text_input("genre", "Genre", "text", &form.genre, errors, false),
        audio = file_input("audio_file", "Audio file", "audio/*", errors, true),
        cover = file_input("cover_image", "Cover image", "image/*", errors, false),
    )
}

pub fn my_songs_page(songs: &[Song]) -> String {
    let rows: String = songs
        .iter()
        .map(|song| {
            format!(
                r#"<tr><td><a href="/song/{id}/">{title}</a></td><td>{artist}</td><td>{plays}</td><td>{date}</td><td><a href="/song/{id}/delete/">Delete</a></td></tr>"#,
                id = song.id,
                title = escape(&song.title),
                artist = escape(&song.artist),
                plays = song.play_count,
                date = format_date(&song.upload_date),
            )
        })
        .collect();

    let table = if songs.is_empty() {
        empty_state("You have not uploaded any songs yet.")
    } else {
        format!(
            r#"<table class="list"><thead><tr><th>Title</th><th>Artist</th><th>Plays</th><th>Uploaded</th><th></th></tr></thead><tbody>{}</tbody></table>"#,
            rows
        )
    };

    format!(
        r#"<h1>My songs</h1><p><a href="/upload/" class="button">Upload a song</a></p>{}"#,
        table
    )
}

pub fn song_detail_page(song: &Song, viewer: Option<&User>, is_following: bool) -> String {
    let follow = match viewer {
        Some(v) if v.id != song.uploaded_by => follow_button(&song.uploader_username, is_following),
        _ => String::new(),
    };
    let owner_actions = match viewer {
        Some(v) if v.id == song.uploaded_by => {
            format!(r#"<a href="/song/{}/delete/">Delete</a>"#, song.id)
        }
        _ => String::new(),
    };
    let album = if song.album.is_empty() {
        String::new()
    } else {
        format!("<dt>Album</dt><dd>{}</dd>", escape(&song.album))
    };
    let genre = if song.genre.is_empty() {
        String::new()
    } else {
        format!(
            r#"<dt>Genre</dt><dd><a href="/discover/?genre={}">{}</a></dd>"#,
            crate::session::encode_query_value(&song.genre),
            escape(&song.genre)
        )
    };

    format!(
        r#"<article class="detail">
    <img src="{cover}" alt="" class="cover large">
    <div>
        <h1>{title}</h1>
        <p class="muted">{artist}</p>
        <dl>{album}{genre}<dt>Uploaded by</dt><dd><a href="/users/profile/{uploader}/">{uploader}</a> {follow}</dd>
        <dt>Uploaded</dt><dd>{date}</dd><dt>Plays</dt><dd class="play-count">{plays}</dd></dl>
        {play} {owner_actions}
    </div>
</article>"#,
        cover = escape(&cover_url(song.cover_image.as_deref())),
        title = escape(&song.title),
        artist = escape(&song.artist),
        album = album,
        genre = genre,
        uploader = escape(&song.uploader_username),
        follow = follow,
        date = format_date(&song.upload_date),
        plays = song.play_count,
        play = play_button(&format!("/song/{}/play/", song.id)),
        owner_actions = owner_actions,
    )
}

pub fn delete_song_page(song: &Song) -> String {
    format!(
        r#"<h1>Delete song</h1>
<p>Are you sure you want to delete "{title}" by {artist}?</p>
<form method="post" action="/song/{id}/delete/">
    <button type="submit" class="danger">Delete</button>
    <a href="/my-songs/">Cancel</a>
</form>"#,
        id = song.id,
        title = escape(&song.title),
        artist = escape(&song.artist),
    )
}

pub fn search_page(query: &str, songs: &[Song], users: &[User], podcasts: &[Podcast]) -> String {
    let results = if query.is_empty() {
        empty_state("Type something to search for songs, people and podcasts.")
    } else {
        let people = if users.is_empty() {
            empty_state("No people found.")
        } else {
            let items: String = users.iter().map(user_chip).collect();
            format!(r#"<ul class="people">{}</ul>"#, items)
        };
        format!(
            r#"<section><h2>Songs ({song_count})</h2>{songs}</section>
<section><h2>People ({user_count})</h2>{people}</section>
<section><h2>Podcasts ({podcast_count})</h2>{podcasts}</section>"#,
            song_count = songs.len(),
            songs = song_grid(songs, "No songs found."),
            user_count = users.len(),
            people = people,
            podcast_count = podcasts.len(),
            podcasts = podcast_grid(podcasts, "No podcasts found."),
        )
    };

    format!(
        r#"<h1>Search</h1>
<form method="get" action="/search/" class="filters">
    <input type="search" name="q" value="{q}" placeholder="Songs, people, podcasts">
    <button type="submit">Search</button>
</form>
{results}"#,
        q = escape(query),
        results = results,
    )
}
