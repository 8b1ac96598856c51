//! Songs
//!
//! List queries are assembled with `QueryBuilder` from a [`SongQuery`] so
//! the home page, discover page, search and admin list share one code path.

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};
use musicstream_common::db::Song;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{contains_pattern, sql_timestamp};

const SONG_SELECT: &str = r#"
    SELECT s.id, s.title, s.artist, s.album, s.genre, s.audio_file, s.cover_image,
           s.uploaded_by, u.username AS uploader_username, s.upload_date, s.play_count
    FROM songs s
    JOIN users u ON u.id = s.uploaded_by
"#;

/// Columns matched by the site-wide search box
pub const PUBLIC_SEARCH_COLUMNS: &[&str] = &["s.title", "s.artist", "s.genre"];
/// Columns matched by the admin song search
pub const ADMIN_SEARCH_COLUMNS: &[&str] = &["s.title", "s.artist", "s.album"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SongSort {
    #[default]
    Newest,
    Oldest,
    Popular,
    Title,
}

impl SongSort {
    /// Unknown or missing values sort newest first
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("oldest") => SongSort::Oldest,
            Some("popular") => SongSort::Popular,
            Some("title") => SongSort::Title,
            _ => SongSort::Newest,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SongSort::Newest => "newest",
            SongSort::Oldest => "oldest",
            SongSort::Popular => "popular",
            SongSort::Title => "title",
        }
    }

    fn order_by(self) -> &'static str {
        match self {
            SongSort::Newest => " ORDER BY s.upload_date DESC, s.id DESC",
            SongSort::Oldest => " ORDER BY s.upload_date ASC, s.id ASC",
            SongSort::Popular => " ORDER BY s.play_count DESC, s.upload_date DESC, s.id DESC",
            SongSort::Title => " ORDER BY s.title COLLATE NOCASE ASC, s.id ASC",
        }
    }
}

/// Admin upload-date filter, relative to the current UTC date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadDateFilter {
    Today,
    PastWeek,
    ThisMonth,
    ThisYear,
}

impl UploadDateFilter {
    pub const ALL: [UploadDateFilter; 4] = [
        UploadDateFilter::Today,
        UploadDateFilter::PastWeek,
        UploadDateFilter::ThisMonth,
        UploadDateFilter::ThisYear,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "today" => Some(UploadDateFilter::Today),
            "7d" => Some(UploadDateFilter::PastWeek),
            "month" => Some(UploadDateFilter::ThisMonth),
            "year" => Some(UploadDateFilter::ThisYear),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UploadDateFilter::Today => "today",
            UploadDateFilter::PastWeek => "7d",
            UploadDateFilter::ThisMonth => "month",
            UploadDateFilter::ThisYear => "year",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UploadDateFilter::Today => "Today",
            UploadDateFilter::PastWeek => "Past 7 days",
            UploadDateFilter::ThisMonth => "This month",
            UploadDateFilter::ThisYear => "This year",
        }
    }

    /// Earliest upload time the filter keeps
    pub fn since(self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive();
        let start = match self {
            UploadDateFilter::Today => today,
            UploadDateFilter::PastWeek => today - Duration::days(7),
            UploadDateFilter::ThisMonth => today.with_day(1).unwrap_or(today),
            UploadDateFilter::ThisYear => today.with_ordinal(1).unwrap_or(today),
        };
        Utc.from_utc_datetime(&start.and_time(NaiveTime::default()))
    }
}

/// Filters for [`list_songs`] and [`count_songs`]
#[derive(Debug, Clone)]
pub struct SongQuery {
    /// Substring matched case-insensitively against `search_columns`
    pub search: Option<String>,
    pub search_columns: &'static [&'static str],
    /// Exact genre, case-insensitive
    pub genre: Option<String>,
    pub uploaded_by: Option<i64>,
    /// Only songs uploaded at or after this time
    pub uploaded_since: Option<DateTime<Utc>>,
    pub sort: SongSort,
    pub limit: Option<i64>,
    pub offset: i64,
}

impl Default for SongQuery {
    fn default() -> Self {
        Self {
            search: None,
            search_columns: PUBLIC_SEARCH_COLUMNS,
            genre: None,
            uploaded_by: None,
            uploaded_since: None,
            sort: SongSort::Newest,
            limit: None,
            offset: 0,
        }
    }
}

impl SongQuery {
    pub fn by_uploader(user_id: i64) -> Self {
        Self {
            uploaded_by: Some(user_id),
            ..Default::default()
        }
    }

    fn push_filters(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE 1 = 1");

        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = contains_pattern(search);
            qb.push(" AND (");
            for (i, column) in self.search_columns.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push(*column)
                    .push(" LIKE ")
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\'");
            }
            qb.push(")");
        }

        if let Some(genre) = self.genre.as_deref().filter(|g| !g.is_empty()) {
            qb.push(" AND s.genre = ")
                .push_bind(genre.to_string())
                .push(" COLLATE NOCASE");
        }

        if let Some(user_id) = self.uploaded_by {
            qb.push(" AND s.uploaded_by = ").push_bind(user_id);
        }

        if let Some(since) = self.uploaded_since {
            qb.push(" AND s.upload_date >= ").push_bind(sql_timestamp(since));
        }
    }
}

pub async fn list_songs(pool: &SqlitePool, query: &SongQuery) -> sqlx::Result<Vec<Song>> {
    let mut qb = QueryBuilder::<Sqlite>::new(SONG_SELECT);
    query.push_filters(&mut qb);
    qb.push(query.sort.order_by());

    if let Some(limit) = query.limit {
        qb.push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(query.offset);
    }

    qb.build_query_as::<Song>().fetch_all(pool).await
}

/// Row count for `query`, ignoring its limit and offset
pub async fn count_songs(pool: &SqlitePool, query: &SongQuery) -> sqlx::Result<i64> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM songs s");
    query.push_filters(&mut qb);
    qb.build_query_scalar::<i64>().fetch_one(pool).await
}

/// Fields of a new song; file paths are relative to the media root
#[derive(Debug, Clone)]
pub struct NewSong {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    pub audio_file: String,
    pub cover_image: Option<String>,
    pub uploaded_by: i64,
}

pub async fn insert_song(pool: &SqlitePool, song: &NewSong) -> sqlx::Result<i64> {
    sqlx::query_scalar(
        r#"
        INSERT INTO songs (title, artist, album, genre, audio_file, cover_image, uploaded_by)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&song.title)
    .bind(&song.artist)
    .bind(&song.album)
    .bind(&song.genre)
    .bind(&song.audio_file)
    .bind(&song.cover_image)
    .bind(song.uploaded_by)
    .fetch_one(pool)
    .await
}

pub async fn get_song(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Song>> {
    sqlx::query_as::<_, Song>(&format!("{} WHERE s.id = ?", SONG_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Song lookup restricted to one uploader
pub async fn get_owned_song(pool: &SqlitePool, id: i64, user_id: i64) -> sqlx::Result<Option<Song>> {
    sqlx::query_as::<_, Song>(&format!(
        "{} WHERE s.id = ? AND s.uploaded_by = ?",
        SONG_SELECT
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Atomically add one play; `None` when the song does not exist
pub async fn increment_play_count(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<i64>> {
    sqlx::query_scalar(
        "UPDATE songs SET play_count = play_count + 1 WHERE id = ? RETURNING play_count",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn delete_song(pool: &SqlitePool, id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM songs WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Staff edit of a song's descriptive fields; files, upload date and
/// play count are left alone
#[derive(Debug, Clone)]
pub struct SongChange {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    pub uploaded_by: i64,
}

pub async fn update_song(pool: &SqlitePool, id: i64, change: &SongChange) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "UPDATE songs SET title = ?, artist = ?, album = ?, genre = ?, uploaded_by = ? WHERE id = ?",
    )
    .bind(&change.title)
    .bind(&change.artist)
    .bind(&change.album)
    .bind(&change.genre)
    .bind(change.uploaded_by)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Distinct non-blank genres, for filter menus
pub async fn distinct_genres(pool: &SqlitePool) -> sqlx::Result<Vec<String>> {
    sqlx::query_scalar(
        "SELECT DISTINCT genre FROM songs WHERE genre != '' ORDER BY genre COLLATE NOCASE",
    )
    .fetch_all(pool)
    .await
}
