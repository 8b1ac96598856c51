//! Notifications

use musicstream_common::db::Notification;
use sqlx::SqlitePool;

const NOTIFICATION_SELECT: &str = r#"
    SELECT n.id, n.recipient_id, r.username AS recipient_username,
           n.actor_id, a.username AS actor_username,
           n.message, n.is_read, n.created_at
    FROM notifications n
    JOIN users r ON r.id = n.recipient_id
    LEFT JOIN users a ON a.id = n.actor_id
"#;

pub async fn create_notification(
    pool: &SqlitePool,
    recipient_id: i64,
    actor_id: Option<i64>,
    message: &str,
) -> sqlx::Result<i64> {
    sqlx::query_scalar(
        "INSERT INTO notifications (recipient_id, actor_id, message) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(recipient_id)
    .bind(actor_id)
    .bind(message)
    .fetch_one(pool)
    .await
}

/// A user's notifications, newest first
pub async fn list_for_user(pool: &SqlitePool, user_id: i64) -> sqlx::Result<Vec<Notification>> {
    sqlx::query_as::<_, Notification>(&format!(
        "{} WHERE n.recipient_id = ? ORDER BY n.created_at DESC, n.id DESC",
        NOTIFICATION_SELECT
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn unread_count(pool: &SqlitePool, user_id: i64) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE recipient_id = ? AND is_read = 0")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

/// Returns the number of notifications changed
pub async fn mark_all_read(pool: &SqlitePool, user_id: i64) -> sqlx::Result<u64> {
    let result =
        sqlx::query("UPDATE notifications SET is_read = 1 WHERE recipient_id = ? AND is_read = 0")
            .bind(user_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}

/// All notifications for the admin list
pub async fn list_all(pool: &SqlitePool, limit: i64, offset: i64) -> sqlx::Result<Vec<Notification>> {
    sqlx::query_as::<_, Notification>(&format!(
        "{} ORDER BY n.created_at DESC, n.id DESC LIMIT ? OFFSET ?",
        NOTIFICATION_SELECT
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_all(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM notifications")
        .fetch_one(pool)
        .await
}

pub async fn get_notification(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Notification>> {
    sqlx::query_as::<_, Notification>(&format!("{} WHERE n.id = ?", NOTIFICATION_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update_notification(
    pool: &SqlitePool,
    id: i64,
    message: &str,
    is_read: bool,
) -> sqlx::Result<bool> {
    let result = sqlx::query("UPDATE notifications SET message = ?, is_read = ? WHERE id = ?")
        .bind(message)
        .bind(is_read)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_notification(pool: &SqlitePool, id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
