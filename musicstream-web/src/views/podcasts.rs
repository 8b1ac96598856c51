//! Podcast and episode pages

use musicstream_common::db::{Episode, Podcast, User};

use super::{
    cover_url, empty_state, escape, file_input, follow_button, format_date, non_field_errors,
    play_button, text_input, textarea,
};
use crate::db::podcasts::PodcastSort;
use crate::forms::music::{EpisodeForm, PodcastForm};
use crate::forms::FormErrors;

pub fn podcast_card(podcast: &Podcast) -> String {
    format!(
        r#"<article class="card podcast-card">
    <a href="/podcast/{id}/"><img src="{cover}" alt="" class="cover"></a>
    <h3><a href="/podcast/{id}/">{title}</a></h3>
    <p class="muted">by {host}</p>
</article>"#,
        id = podcast.id,
        cover = escape(&cover_url(podcast.cover_image.as_deref())),
        title = escape(&podcast.title),
        host = escape(&podcast.host_username),
    )
}

pub fn podcast_grid(podcasts: &[Podcast], empty: &str) -> String {
    if podcasts.is_empty() {
        return empty_state(empty);
    }
    let cards: String = podcasts.iter().map(podcast_card).collect();
    format!(r#"<div class="grid">{}</div>"#, cards)
}

pub fn podcasts_page(podcasts: &[Podcast], search: &str, sort: PodcastSort) -> String {
    let sort_options: String = [
        (PodcastSort::Newest, "Newest"),
        (PodcastSort::Oldest, "Oldest"),
        (PodcastSort::Title, "Title"),
    ]
    .iter()
    .map(|(value, label)| {
        format!(
            r#"<option value="{}"{}>{}</option>"#,
            value.as_str(),
            if *value == sort { " selected" } else { "" },
            label
        )
    })
    .collect();

    format!(
        r#"<h1>Podcasts</h1>
<p><a href="/podcasts/upload/" class="button">Start a podcast</a></p>
<form method="get" action="/podcasts/" class="filters">
    <input type="search" name="search" value="{search}" placeholder="Search podcasts">
    <select name="sort">{sort_options}</select>
    <button type="submit">Apply</button>
</form>
{grid}"#,
        search = escape(search),
        sort_options = sort_options,
        grid = podcast_grid(podcasts, "No podcasts found."),
    )
}

pub fn upload_podcast_page(form: &PodcastForm, errors: &FormErrors) -> String {
    format!(
        r#"<h1>Start a podcast</h1>
<form method="post" action="/podcasts/upload/" enctype="multipart/form-data" class="stacked">
{non_field}
{title}
{description}
{cover}
<button type="submit">Create</button>
</form>"#,
        non_field = non_field_errors(errors),
        title = text_input("title", "Title", "text", &form.title, errors, true),
        description = textarea("description", "Description", &form.description, errors, true),
        cover = file_input("cover_image", "Cover image", "image/*", errors, false),
    )
}

pub fn my_podcasts_page(podcasts: &[Podcast]) -> String {
    format!(
        r#"<h1>My podcasts</h1><p><a href="/podcasts/upload/" class="button">Start a podcast</a></p>{}"#,
        podcast_grid(podcasts, "You are not hosting any podcasts yet.")
    )
}

fn episode_row(episode: &Episode, can_manage: bool) -> String {
    let manage = if can_manage {
        format!(r#" <a href="/episode/{}/delete/">Delete</a>"#, episode.id)
    } else {
        String::new()
    };
    format!(
        r#"<li class="episode"><a href="/episode/{id}/">{title}</a> <span class="muted">{date} · {plays} plays</span> {play}{manage}</li>"#,
        id = episode.id,
        title = escape(&episode.title),
        date = format_date(&episode.published_date),
        plays = episode.play_count,
        play = play_button(&format!("/episode/{}/play/", episode.id)),
        manage = manage,
    )
}

pub fn podcast_detail_page(
    podcast: &Podcast,
    episodes: &[Episode],
    viewer: Option<&User>,
    is_following: bool,
) -> String {
    let is_host = viewer.map(|v| v.id == podcast.host_id).unwrap_or(false);

    let follow = match viewer {
        Some(_) if !is_host => follow_button(&podcast.host_username, is_following),
        _ => String::new(),
    };
    let host_actions = if is_host {
        format!(
            r#"<p><a href="/podcast/{id}/episode/upload/" class="button">Upload episode</a> <a href="/podcast/{id}/delete/">Delete podcast</a></p>"#,
            id = podcast.id
        )
    } else {
        String::new()
    };
    let episodes = if episodes.is_empty() {
        empty_state("No episodes yet.")
    } else {
        let rows: String = episodes.iter().map(|e| episode_row(e, is_host)).collect();
        format!(r#"<ol class="episodes">{}</ol>"#, rows)
    };

    format!(
        r#"<article class="detail">
    <img src="{cover}" alt="" class="cover large">
    <div>
        <h1>{title}</h1>
        <p class="muted">Hosted by <a href="/users/profile/{host}/">{host}</a> {follow}</p>
        <p>{description}</p>
        {host_actions}
    </div>
</article>
<section><h2>Episodes</h2>{episodes}</section>"#,
        cover = escape(&cover_url(podcast.cover_image.as_deref())),
        title = escape(&podcast.title),
        host = escape(&podcast.host_username),
        follow = follow,
        description = escape(&podcast.description),
        host_actions = host_actions,
        episodes = episodes,
    )
}

pub fn delete_podcast_page(podcast: &Podcast) -> String {
    format!(
        r#"<h1>Delete podcast</h1>
<p>Are you sure you want to delete "{title}"? All of its episodes will be deleted too.</p>
<form method="post" action="/podcast/{id}/delete/">
    <button type="submit" class="danger">Delete</button>
    <a href="/podcast/{id}/">Cancel</a>
</form>"#,
        id = podcast.id,
        title = escape(&podcast.title),
    )
}

pub fn upload_episode_page(podcast: &Podcast, form: &EpisodeForm, errors: &FormErrors) -> String {
    format!(
        r#"<h1>New episode of {podcast_title}</h1>
<form method="post" action="/podcast/{id}/episode/upload/" enctype="multipart/form-data" class="stacked">
{non_field}
{title}
{description}
{audio}
<button type="submit">Upload</button>
</form>"#,
        podcast_title = escape(&podcast.title),
        id = podcast.id,
        non_field = non_field_errors(errors),
        title = text_input("title", "Title", "text", &form.title, errors, true),
        description = textarea("description", "Description", &form.description, errors, true),
        audio = file_input("audio_file", "Audio file", "audio/*", errors, true),
    )
}

pub fn episode_detail_page(episode: &Episode, viewer: Option<&User>) -> String {
    let host_actions = match viewer {
        Some(v) if v.id == episode.host_id => {
            format!(r#"<a href="/episode/{}/delete/">Delete</a>"#, episode.id)
        }
        _ => String::new(),
    };

    format!(
        r#"<article class="detail">
    <img src="{cover}" alt="" class="cover large">
    <div>
        <h1>{title}</h1>
        <p class="muted">From <a href="/podcast/{podcast_id}/">{podcast_title}</a> · {date}</p>
        <p>{description}</p>
        <p>Plays: <span class="play-count">{plays}</span></p>
        {play} {host_actions}
    </div>
</article>"#,
        cover = escape(&cover_url(episode.podcast_cover_image.as_deref())),
        title = escape(&episode.title),
        podcast_id = episode.podcast_id,
        podcast_title = escape(&episode.podcast_title),
        date = format_date(&episode.published_date),
        description = escape(&episode.description),
        plays = episode.play_count,
        play = play_button(&format!("/episode/{}/play/", episode.id)),
        host_actions = host_actions,
    )
}

pub fn delete_episode_page(episode: &Episode) -> String {
    format!(
        r#"<h1>Delete episode</h1>
<p>Are you sure you want to delete "{title}" from {podcast_title}?</p>
<form method="post" action="/episode/{id}/delete/">
    <button type="submit" class="danger">Delete</button>
    <a href="/podcast/{podcast_id}/">Cancel</a>
</form>"#,
        id = episode.id,
        title = escape(&episode.title),
        podcast_title = escape(&episode.podcast_title),
        podcast_id = episode.podcast_id,
    )
}
