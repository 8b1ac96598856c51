//! Podcasts

use musicstream_common::db::Podcast;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::contains_pattern;

const PODCAST_SELECT: &str = r#"
    SELECT p.id, p.title, p.description, p.cover_image, p.host_id,
           u.username AS host_username, p.created_at
    FROM podcasts p
    JOIN users u ON u.id = p.host_id
"#;

pub const PUBLIC_SEARCH_COLUMNS: &[&str] = &["p.title", "p.description"];
pub const ADMIN_SEARCH_COLUMNS: &[&str] = &["p.title"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PodcastSort {
    #[default]
    Newest,
    Oldest,
    Title,
}

impl PodcastSort {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("oldest") => PodcastSort::Oldest,
            Some("title") => PodcastSort::Title,
            _ => PodcastSort::Newest,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PodcastSort::Newest => "newest",
            PodcastSort::Oldest => "oldest",
            PodcastSort::Title => "title",
        }
    }

    fn order_by(self) -> &'static str {
        match self {
            PodcastSort::Newest => " ORDER BY p.created_at DESC, p.id DESC",
            PodcastSort::Oldest => " ORDER BY p.created_at ASC, p.id ASC",
            PodcastSort::Title => " ORDER BY p.title COLLATE NOCASE ASC, p.id ASC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PodcastQuery {
    pub search: Option<String>,
    pub search_columns: &'static [&'static str],
    pub host_id: Option<i64>,
    pub sort: PodcastSort,
    pub limit: Option<i64>,
    pub offset: i64,
}

impl Default for PodcastQuery {
    fn default() -> Self {
        Self {
            search: None,
            search_columns: PUBLIC_SEARCH_COLUMNS,
            host_id: None,
            sort: PodcastSort::Newest,
            limit: None,
            offset: 0,
        }
    }
}

impl PodcastQuery {
    pub fn by_host(user_id: i64) -> Self {
        Self {
            host_id: Some(user_id),
            ..Default::default()
        }
    }

    fn push_filters(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE 1 = 1");

        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = contains_pattern(search);
            let mut separated = qb.separated(" OR ");
            separated.push_unseparated(" AND (");
            for column in self.search_columns {
                separated
                    .push(*column)
                    .push_unseparated(" LIKE ")
                    .push_bind_unseparated(pattern.clone())
                    .push_unseparated(" ESCAPE '\\'");
            }
            separated.push_unseparated(")");
        }

        if let Some(host_id) = self.host_id {
            qb.push(" AND p.host_id = ").push_bind(host_id);
        }
    }
}

pub async fn list_podcasts(pool: &SqlitePool, query: &PodcastQuery) -> sqlx::Result<Vec<Podcast>> {
    let mut qb = QueryBuilder::<Sqlite>::new(PODCAST_SELECT);
    query.push_filters(&mut qb);
    qb.push(query.sort.order_by());

    if let Some(limit) = query.limit {
        qb.push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(query.offset);
    }

    qb.build_query_as::<Podcast>().fetch_all(pool).await
}

pub async fn count_podcasts(pool: &SqlitePool, query: &PodcastQuery) -> sqlx::Result<i64> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM podcasts p");
    query.push_filters(&mut qb);
    qb.build_query_scalar::<i64>().fetch_one(pool).await
}

#[derive(Debug, Clone)]
pub struct NewPodcast {
    pub title: String,
    pub description: String,
    pub cover_image: Option<String>,
    pub host_id: i64,
}

pub async fn insert_podcast(pool: &SqlitePool, podcast: &NewPodcast) -> sqlx::Result<i64> {
    sqlx::query_scalar(
        "INSERT INTO podcasts (title, description, cover_image, host_id) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(&podcast.title)
    .bind(&podcast.description)
    .bind(&podcast.cover_image)
    .bind(podcast.host_id)
    .fetch_one(pool)
    .await
}

pub async fn get_podcast(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Podcast>> {
    sqlx::query_as::<_, Podcast>(&format!("{} WHERE p.id = ?", PODCAST_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Podcast lookup restricted to one host
pub async fn get_hosted_podcast(
    pool: &SqlitePool,
    id: i64,
    host_id: i64,
) -> sqlx::Result<Option<Podcast>> {
    sqlx::query_as::<_, Podcast>(&format!(
        "{} WHERE p.id = ? AND p.host_id = ?",
        PODCAST_SELECT
    ))
    .bind(id)
    .bind(host_id)
    .fetch_optional(pool)
    .await
}

/// Staff edit of a podcast's text fields and host
#[derive(Debug, Clone)]
pub struct PodcastChange {
    pub title: String,
    pub description: String,
    pub host_id: i64,
}

pub async fn update_podcast(pool: &SqlitePool, id: i64, change: &PodcastChange) -> sqlx::Result<bool> {
    let result = sqlx::query("UPDATE podcasts SET title = ?, description = ?, host_id = ? WHERE id = ?")
        .bind(&change.title)
        .bind(&change.description)
        .bind(change.host_id)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Deletes the podcast; its episodes go with it through the foreign key
pub async fn delete_podcast(pool: &SqlitePool, id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM podcasts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_clause_shape() {
        let query = PodcastQuery {
            search: Some("talk".into()),
            host_id: Some(7),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM podcasts p");
        query.push_filters(&mut qb);

        assert!(qb.sql().contains(
            "AND (p.title LIKE ? ESCAPE '\\' OR p.description LIKE ? ESCAPE '\\')"
        ));
        assert!(qb.sql().ends_with("AND p.host_id = ?"));
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!(PodcastSort::parse(Some("title")), PodcastSort::Title);
        assert_eq!(PodcastSort::parse(Some("popular")), PodcastSort::Newest);
    }
}
