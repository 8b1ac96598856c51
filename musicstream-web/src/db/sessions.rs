//! Login sessions
//!
//! A session row maps an opaque cookie token to a user until `expires_at`.
//! It also carries at most one pending flash message.

use chrono::{Duration, Utc};
use musicstream_common::auth::generate_session_token;
use musicstream_common::config::clamp_session_ttl_hours;
use musicstream_common::db::User;
use sqlx::SqlitePool;
use tracing::debug;

use super::sql_timestamp;

/// Create a session for `user_id` and return its token
pub async fn create_session(pool: &SqlitePool, user_id: i64, ttl_hours: i64) -> sqlx::Result<String> {
    let token = generate_session_token();
    let expires_at = sql_timestamp(Utc::now() + Duration::hours(clamp_session_ttl_hours(ttl_hours)));

    sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES (?, ?, ?)")
        .bind(&token)
        .bind(user_id)
        .bind(expires_at)
        .execute(pool)
        .await?;

    debug!("Created session for user {}", user_id);
    Ok(token)
}

/// The user owning an unexpired session
pub async fn get_session_user(pool: &SqlitePool, token: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.username, u.email, u.first_name, u.last_name,
               u.password_hash, u.password_salt, u.is_staff, u.date_joined
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token = ? AND s.expires_at > ?
        "#,
    )
    .bind(token)
    .bind(sql_timestamp(Utc::now()))
    .fetch_optional(pool)
    .await
}

pub async fn delete_session(pool: &SqlitePool, token: &str) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

/// Queue a message for the next rendered page, replacing any pending one
pub async fn set_flash(pool: &SqlitePool, token: &str, message: &str) -> sqlx::Result<()> {
    sqlx::query("UPDATE sessions SET flash = ? WHERE token = ?")
        .bind(message)
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

/// Read and clear the pending flash message
pub async fn take_flash(pool: &SqlitePool, token: &str) -> sqlx::Result<Option<String>> {
    let mut tx = pool.begin().await?;

    let flash: Option<Option<String>> =
        sqlx::query_scalar("SELECT flash FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(&mut *tx)
            .await?;
    let flash = flash.flatten();

    if flash.is_some() {
        sqlx::query("UPDATE sessions SET flash = NULL WHERE token = ?")
            .bind(token)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(flash)
}

/// Remove expired sessions; returns how many were deleted
pub async fn purge_expired(pool: &SqlitePool) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(sql_timestamp(Utc::now()))
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
