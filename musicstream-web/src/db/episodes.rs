//! Podcast episodes

use musicstream_common::db::Episode;
use sqlx::SqlitePool;

const EPISODE_SELECT: &str = r#"
    SELECT e.id, e.title, e.description, e.audio_file, e.podcast_id,
           p.title AS podcast_title, p.cover_image AS podcast_cover_image,
           p.host_id, e.published_date, e.play_count
    FROM episodes e
    JOIN podcasts p ON p.id = e.podcast_id
"#;

#[derive(Debug, Clone)]
pub struct NewEpisode {
    pub title: String,
    pub description: String,
    pub audio_file: String,
    pub podcast_id: i64,
}

pub async fn insert_episode(pool: &SqlitePool, episode: &NewEpisode) -> sqlx::Result<i64> {
    sqlx::query_scalar(
        "INSERT INTO episodes (title, description, audio_file, podcast_id) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(&episode.title)
    .bind(&episode.description)
    .bind(&episode.audio_file)
    .bind(episode.podcast_id)
    .fetch_one(pool)
    .await
}

pub async fn get_episode(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Episode>> {
    sqlx::query_as::<_, Episode>(&format!("{} WHERE e.id = ?", EPISODE_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Episode lookup restricted to podcasts hosted by `host_id`
pub async fn get_hosted_episode(
    pool: &SqlitePool,
    id: i64,
    host_id: i64,
) -> sqlx::Result<Option<Episode>> {
    sqlx::query_as::<_, Episode>(&format!(
        "{} WHERE e.id = ? AND p.host_id = ?",
        EPISODE_SELECT
    ))
    .bind(id)
    .bind(host_id)
    .fetch_optional(pool)
    .await
}

/// Episodes of one podcast, newest first
pub async fn list_for_podcast(pool: &SqlitePool, podcast_id: i64) -> sqlx::Result<Vec<Episode>> {
    sqlx::query_as::<_, Episode>(&format!(
        "{} WHERE e.podcast_id = ? ORDER BY e.published_date DESC, e.id DESC",
        EPISODE_SELECT
    ))
    .bind(podcast_id)
    .fetch_all(pool)
    .await
}

/// Audio paths of a podcast's episodes, collected before a cascading delete
pub async fn audio_files_for_podcast(pool: &SqlitePool, podcast_id: i64) -> sqlx::Result<Vec<String>> {
    sqlx::query_scalar("SELECT audio_file FROM episodes WHERE podcast_id = ?")
        .bind(podcast_id)
        .fetch_all(pool)
        .await
}

pub async fn count_episodes(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM episodes")
        .fetch_one(pool)
        .await
}

/// Atomically add one play; `None` when the episode does not exist
pub async fn increment_play_count(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<i64>> {
    sqlx::query_scalar(
        "UPDATE episodes SET play_count = play_count + 1 WHERE id = ? RETURNING play_count",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn delete_episode(pool: &SqlitePool, id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM episodes WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
