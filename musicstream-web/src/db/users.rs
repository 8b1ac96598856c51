//! User accounts
//!
//! Every user owns exactly one `profiles` row, created in the same
//! transaction as the account.

use musicstream_common::auth::hash_password;
use musicstream_common::db::User;
use sqlx::SqlitePool;

use super::contains_pattern;

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, password_hash, \
                            password_salt, is_staff, date_joined";

/// Fields of a new account; the password is hashed on insert
#[derive(Debug, Clone, Default)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password: &'a str,
    pub is_staff: bool,
}

/// Insert a user and its empty profile, returning the user id
pub async fn create_user(pool: &SqlitePool, new_user: &NewUser<'_>) -> sqlx::Result<i64> {
    let (hash, salt) = hash_password(new_user.password);

    let mut tx = pool.begin().await?;

    let user_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO users (username, email, first_name, last_name, password_hash, password_salt, is_staff)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(new_user.username)
    .bind(new_user.email)
    .bind(new_user.first_name)
    .bind(new_user.last_name)
    .bind(&hash)
    .bind(&salt)
    .bind(new_user.is_staff)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO profiles (user_id) VALUES (?)")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(user_id)
}

pub async fn get_user(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Exact (case-sensitive) username lookup
pub async fn get_user_by_username(pool: &SqlitePool, username: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE username = ?",
        USER_COLUMNS
    ))
    .bind(username)
    .fetch_optional(pool)
    .await
}

/// Registration treats usernames differing only by case as taken
pub async fn username_taken(pool: &SqlitePool, username: &str) -> sqlx::Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ? COLLATE NOCASE")
            .bind(username)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

/// Users whose username, first or last name contains `query`
pub async fn search_users(pool: &SqlitePool, query: &str) -> sqlx::Result<Vec<User>> {
    let pattern = contains_pattern(query);
    sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT {} FROM users
        WHERE username LIKE ?1 ESCAPE '\'
           OR first_name LIKE ?1 ESCAPE '\'
           OR last_name LIKE ?1 ESCAPE '\'
        ORDER BY username
        "#,
        USER_COLUMNS
    ))
    .bind(pattern)
    .fetch_all(pool)
    .await
}

/// Users with at least one uploaded song
pub async fn users_with_songs(pool: &SqlitePool) -> sqlx::Result<Vec<User>> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT {} FROM users
        WHERE EXISTS (SELECT 1 FROM songs WHERE songs.uploaded_by = users.id)
        ORDER BY username
        "#,
        USER_COLUMNS
    ))
    .fetch_all(pool)
    .await
}

pub async fn list_users(pool: &SqlitePool, limit: i64, offset: i64) -> sqlx::Result<Vec<User>> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users ORDER BY username LIMIT ? OFFSET ?",
        USER_COLUMNS
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_users(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
}

/// Returns false when no such user exists
pub async fn set_staff(pool: &SqlitePool, user_id: i64, is_staff: bool) -> sqlx::Result<bool> {
    let result = sqlx::query("UPDATE users SET is_staff = ? WHERE id = ?")
        .bind(is_staff)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Replace a user's password (used by `create-admin` on an existing account)
pub async fn set_password(pool: &SqlitePool, user_id: i64, password: &str) -> sqlx::Result<()> {
    let (hash, salt) = hash_password(password);
    sqlx::query("UPDATE users SET password_hash = ?, password_salt = ? WHERE id = ?")
        .bind(hash)
        .bind(salt)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
