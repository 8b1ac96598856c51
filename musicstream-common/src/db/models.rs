//! Database models
//!
//! Rows as read by the web crate. Song, podcast, episode and notification
//! rows carry a few joined display columns (owner usernames, parent titles)
//! so list pages render without extra lookups.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub password_salt: String,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// "First Last", or the username when no name is set
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub user_id: i64,
    pub bio: String,
    pub location: String,
    pub birth_date: Option<NaiveDate>,
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Song {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    /// Path relative to the media root
    pub audio_file: String,
    /// Path relative to the media root
    pub cover_image: Option<String>,
    pub uploaded_by: i64,
    /// Joined from users
    pub uploader_username: String,
    pub upload_date: DateTime<Utc>,
    pub play_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Podcast {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub cover_image: Option<String>,
    pub host_id: i64,
    /// Joined from users
    pub host_username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Episode {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub audio_file: String,
    pub podcast_id: i64,
    /// Joined from podcasts
    pub podcast_title: String,
    /// Joined from podcasts
    pub podcast_cover_image: Option<String>,
    /// Joined from podcasts
    pub host_id: i64,
    pub published_date: DateTime<Utc>,
    pub play_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    pub recipient_id: i64,
    /// Joined from users
    pub recipient_username: String,
    pub actor_id: Option<i64>,
    /// Joined from users
    pub actor_username: Option<String>,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
