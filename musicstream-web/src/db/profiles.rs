//! Profiles and the follower relation

use chrono::NaiveDate;
use musicstream_common::db::Profile;
use sqlx::SqlitePool;

pub async fn get_profile(pool: &SqlitePool, user_id: i64) -> sqlx::Result<Option<Profile>> {
    sqlx::query_as::<_, Profile>(
        "SELECT user_id, bio, location, birth_date, profile_image FROM profiles WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Editable profile fields
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub bio: String,
    pub location: String,
    pub birth_date: Option<NaiveDate>,
}

pub async fn update_profile(
    pool: &SqlitePool,
    user_id: i64,
    update: &ProfileUpdate,
) -> sqlx::Result<()> {
    sqlx::query("UPDATE profiles SET bio = ?, location = ?, birth_date = ? WHERE user_id = ?")
        .bind(&update.bio)
        .bind(&update.location)
        .bind(update.birth_date)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Admin inline edit: bio and location only
pub async fn update_bio_location(
    pool: &SqlitePool,
    user_id: i64,
    bio: &str,
    location: &str,
) -> sqlx::Result<()> {
    sqlx::query("UPDATE profiles SET bio = ?, location = ? WHERE user_id = ?")
        .bind(bio)
        .bind(location)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Set the profile image, returning the previous one so its file can be removed
pub async fn set_profile_image(
    pool: &SqlitePool,
    user_id: i64,
    image: &str,
) -> sqlx::Result<Option<String>> {
    let mut tx = pool.begin().await?;

    let previous: Option<Option<String>> =
        sqlx::query_scalar("SELECT profile_image FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;

    sqlx::query("UPDATE profiles SET profile_image = ? WHERE user_id = ?")
        .bind(image)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(previous.flatten())
}

pub async fn is_following(
    pool: &SqlitePool,
    profile_user_id: i64,
    follower_id: i64,
) -> sqlx::Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM profile_followers WHERE profile_user_id = ? AND follower_id = ?",
    )
    .bind(profile_user_id)
    .bind(follower_id)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

/// Follow if not following, unfollow otherwise; returns the new state
///
/// Self-follow is rejected by the table's CHECK constraint, so callers
/// must test for it before calling.
pub async fn toggle_follow(
    pool: &SqlitePool,
    profile_user_id: i64,
    follower_id: i64,
) -> sqlx::Result<bool> {
    let mut tx = pool.begin().await?;

    let removed = sqlx::query(
        "DELETE FROM profile_followers WHERE profile_user_id = ? AND follower_id = ?",
    )
    .bind(profile_user_id)
    .bind(follower_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if removed == 0 {
        sqlx::query("INSERT INTO profile_followers (profile_user_id, follower_id) VALUES (?, ?)")
            .bind(profile_user_id)
            .bind(follower_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(removed == 0)
}

pub async fn followers_count(pool: &SqlitePool, user_id: i64) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM profile_followers WHERE profile_user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

pub async fn following_count(pool: &SqlitePool, user_id: i64) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM profile_followers WHERE follower_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await
}
