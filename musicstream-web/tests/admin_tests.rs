//! Integration tests for the staff admin area

mod helpers;

use axum::http::StatusCode;
use helpers::*;
use musicstream_web::db::podcasts::{insert_podcast, NewPodcast};
use musicstream_web::AppSettings;

#[tokio::test]
async fn test_admin_access_control() {
    let app = TestApp::new().await;
    let member = app.create_user("member", false).await;
    let staff = app.create_user("boss", true).await;

    let response = app.send(get("/admin/", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/users/login/?next=/admin/");

    let cookie = app.login(member).await;
    let response = app.send(get("/admin/songs/", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let cookie = app.login(staff).await;
    let response = app.send(get("/admin/", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_song_filters() {
    let app = TestApp::new().await;
    let staff = app.create_user("boss", true).await;
    let alice = app.create_user("alice", false).await;
    let bob = app.create_user("bob", false).await;
    app.insert_song(alice, "Morning Coffee", "Alice", "Jazz").await;
    app.insert_song(bob, "Evening Tea", "Bob", "Folk").await;
    let cookie = app.login(staff).await;

    let html = body_text(app.send(get("/admin/songs/?q=coffee", Some(&cookie))).await).await;
    assert!(html.contains("Morning Coffee"));
    assert!(!html.contains("Evening Tea"));

    let html = body_text(app.send(get("/admin/songs/?genre=folk", Some(&cookie))).await).await;
    assert!(!html.contains("Morning Coffee"));
    assert!(html.contains("Evening Tea"));

    let uri = format!("/admin/songs/?uploaded_by={}", alice);
    let html = body_text(app.send(get(&uri, Some(&cookie))).await).await;
    assert!(html.contains("Morning Coffee"));
    assert!(!html.contains("Evening Tea"));

    // A malformed uploader filter is ignored
    let response = app.send(get("/admin/songs/?uploaded_by=abc", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Morning Coffee"));
    assert!(html.contains("Evening Tea"));
}

#[tokio::test]
async fn test_admin_song_list_paginates() {
    let settings = AppSettings {
        admin_list_per_page: 2,
        ..AppSettings::default()
    };
    let app = TestApp::with_settings(settings).await;
    let staff = app.create_user("boss", true).await;
    for title in ["Track A", "Track B", "Track C"] {
        app.insert_song(staff, title, "Boss", "").await;
    }
    let cookie = app.login(staff).await;

    let html = body_text(app.send(get("/admin/songs/", Some(&cookie))).await).await;
    assert!(html.contains("Track C"));
    assert!(html.contains("Track B"));
    assert!(!html.contains("Track A"));

    let html = body_text(app.send(get("/admin/songs/?page=2", Some(&cookie))).await).await;
    assert!(html.contains("Track A"));
    assert!(!html.contains("Track C"));
}

#[tokio::test]
async fn test_admin_deletes_any_song() {
    let app = TestApp::new().await;
    let staff = app.create_user("boss", true).await;
    let kay = app.create_user("kay", false).await;
    let song = app.insert_song(kay, "Removed", "Kay", "").await;
    let cookie = app.login(staff).await;

    let response = app
        .send(post(&format!("/admin/songs/{}/delete/", song), Some(&cookie)))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/songs/");
    assert_eq!(app.count("songs").await, 0);

    let html = body_text(app.send(get("/admin/songs/", Some(&cookie))).await).await;
    assert!(html.contains("was deleted successfully."));

    let response = app
        .send(post(&format!("/admin/songs/{}/delete/", song), Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_deletes_podcast() {
    let app = TestApp::new().await;
    let staff = app.create_user("boss", true).await;
    let host = app.create_user("host", false).await;
    let podcast = insert_podcast(
        &app.state.db,
        &NewPodcast {
            title: "Gone Soon".to_string(),
            description: "Brief".to_string(),
            cover_image: None,
            host_id: host,
        },
    )
    .await
    .unwrap();
    let cookie = app.login(staff).await;

    let html = body_text(app.send(get("/admin/podcasts/?q=gone", Some(&cookie))).await).await;
    assert!(html.contains("Gone Soon"));

    let response = app
        .send(post(&format!("/admin/podcasts/{}/delete/", podcast), Some(&cookie)))
        .await;
    assert_eq!(location(&response), "/admin/podcasts/");
    assert_eq!(app.count("podcasts").await, 0);
}

#[tokio::test]
async fn test_admin_updates_user_profile() {
    let app = TestApp::new().await;
    let staff = app.create_user("boss", true).await;
    let kay = app.create_user("kay", false).await;
    let cookie = app.login(staff).await;

    let response = app
        .send(post_form(
            &format!("/admin/users/{}/profile/", kay),
            Some(&cookie),
            "bio=Moderated&location=Oslo&is_staff=on",
        ))
        .await;
    assert_eq!(location(&response), "/admin/users/");

    let (bio, location_text, is_staff): (String, String, bool) = sqlx::query_as(
        "SELECT p.bio, p.location, u.is_staff FROM profiles p JOIN users u ON u.id = p.user_id WHERE u.id = ?",
    )
    .bind(kay)
    .fetch_one(&app.state.db)
    .await
    .unwrap();
    assert_eq!(bio, "Moderated");
    assert_eq!(location_text, "Oslo");
    assert!(is_staff);

    let html = body_text(app.send(get("/admin/users/", Some(&cookie))).await).await;
    assert!(html.contains("Moderated"));
}

#[tokio::test]
async fn test_admin_creates_and_deletes_notification() {
    let app = TestApp::new().await;
    let staff = app.create_user("boss", true).await;
    let kay = app.create_user("kay", false).await;
    let cookie = app.login(staff).await;

    let response = app
        .send(post_form(
            "/admin/notifications/",
            Some(&cookie),
            "recipient=nobody&message=Hello",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("No user with that username."));
    assert_eq!(app.count("notifications").await, 0);

    let response = app
        .send(post_form(
            "/admin/notifications/",
            Some(&cookie),
            "recipient=kay&message=Welcome+aboard",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let kay_cookie = app.login(kay).await;
    let html = body_text(app.send(get("/users/notifications/", Some(&kay_cookie))).await).await;
    assert!(html.contains("Welcome aboard"));

    let id: i64 = sqlx::query_scalar("SELECT id FROM notifications")
        .fetch_one(&app.state.db)
        .await
        .unwrap();
    let response = app
        .send(post(&format!("/admin/notifications/{}/delete/", id), Some(&cookie)))
        .await;
    assert_eq!(location(&response), "/admin/notifications/");
    assert_eq!(app.count("notifications").await, 0);
}

#[tokio::test]
async fn test_admin_song_upload_date_filter() {
    let app = TestApp::new().await;
    let staff = app.create_user("boss", true).await;
    app.insert_song(staff, "Fresh Cut", "Boss", "").await;
    let old = app.insert_song(staff, "Dusty Reel", "Boss", "").await;
    sqlx::query("UPDATE songs SET upload_date = '2001-05-04 10:00:00' WHERE id = ?")
        .bind(old)
        .execute(&app.state.db)
        .await
        .unwrap();
    let cookie = app.login(staff).await;

    for filter in ["today", "7d", "month", "year"] {
        let uri = format!("/admin/songs/?upload_date={}", filter);
        let html = body_text(app.send(get(&uri, Some(&cookie))).await).await;
        assert!(html.contains("Fresh Cut"), "{}", filter);
        assert!(!html.contains("Dusty Reel"), "{}", filter);
    }

    // Unknown values fall back to every date
    let html = body_text(app.send(get("/admin/songs/?upload_date=decade", Some(&cookie))).await).await;
    assert!(html.contains("Fresh Cut"));
    assert!(html.contains("Dusty Reel"));
}

#[tokio::test]
async fn test_admin_changes_song() {
    let app = TestApp::new().await;
    let staff = app.create_user("boss", true).await;
    let kay = app.create_user("kay", false).await;
    app.create_user("lee", false).await;
    let song = app.insert_song(kay, "Draft Title", "Kay", "Pop").await;
    sqlx::query("UPDATE songs SET play_count = 9 WHERE id = ?")
        .bind(song)
        .execute(&app.state.db)
        .await
        .unwrap();
    let cookie = app.login(staff).await;
    let uri = format!("/admin/songs/{}/", song);

    let html = body_text(app.send(get(&uri, Some(&cookie))).await).await;
    assert!(html.contains(r#"value="Draft Title""#));
    assert!(html.contains(r#"value="kay""#));
    assert!(html.contains("<th>Play count</th><td>9</td>"));

    let response = app
        .send(post_form(&uri, Some(&cookie), "title=&artist=Kay&uploaded_by=kay"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("This field is required."));

    let response = app
        .send(post_form(&uri, Some(&cookie), "title=Final&artist=Kay&uploaded_by=ghost"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("No user with that username."));

    let response = app
        .send(post_form(
            &uri,
            Some(&cookie),
            "title=Final+Title&artist=Kay+%26+Lee&album=Live&genre=Soul&uploaded_by=lee",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/songs/");

    let (title, artist, album, genre, uploader, plays): (String, String, String, String, String, i64) =
        sqlx::query_as(
            "SELECT s.title, s.artist, s.album, s.genre, u.username, s.play_count
             FROM songs s JOIN users u ON u.id = s.uploaded_by WHERE s.id = ?",
        )
        .bind(song)
        .fetch_one(&app.state.db)
        .await
        .unwrap();
    assert_eq!(title, "Final Title");
    assert_eq!(artist, "Kay & Lee");
    assert_eq!(album, "Live");
    assert_eq!(genre, "Soul");
    assert_eq!(uploader, "lee");
    assert_eq!(plays, 9);

    let html = body_text(app.send(get("/admin/songs/", Some(&cookie))).await).await;
    assert!(html.contains("The song &quot;Final Title&quot; was changed successfully."));

    let response = app.send(get("/admin/songs/999/", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_changes_podcast() {
    let app = TestApp::new().await;
    let staff = app.create_user("boss", true).await;
    let host = app.create_user("host", false).await;
    app.create_user("cohost", false).await;
    let podcast = insert_podcast(
        &app.state.db,
        &NewPodcast {
            title: "Working Title".to_string(),
            description: "Pilot".to_string(),
            cover_image: None,
            host_id: host,
        },
    )
    .await
    .unwrap();
    let cookie = app.login(staff).await;
    let uri = format!("/admin/podcasts/{}/", podcast);

    let html = body_text(app.send(get(&uri, Some(&cookie))).await).await;
    assert!(html.contains(r#"value="Working Title""#));

    let response = app
        .send(post_form(&uri, Some(&cookie), "title=Renamed&description=&host=host"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .send(post_form(&uri, Some(&cookie), "title=Renamed&description=Season+two&host=cohost"))
        .await;
    assert_eq!(location(&response), "/admin/podcasts/");

    let (title, description, host_name): (String, String, String) = sqlx::query_as(
        "SELECT p.title, p.description, u.username FROM podcasts p JOIN users u ON u.id = p.host_id WHERE p.id = ?",
    )
    .bind(podcast)
    .fetch_one(&app.state.db)
    .await
    .unwrap();
    assert_eq!(title, "Renamed");
    assert_eq!(description, "Season two");
    assert_eq!(host_name, "cohost");
}

#[tokio::test]
async fn test_admin_changes_notification() {
    let app = TestApp::new().await;
    let staff = app.create_user("boss", true).await;
    app.create_user("kay", false).await;
    let cookie = app.login(staff).await;
    app.send(post_form(
        "/admin/notifications/",
        Some(&cookie),
        "recipient=kay&message=Typo+here",
    ))
    .await;
    let id: i64 = sqlx::query_scalar("SELECT id FROM notifications")
        .fetch_one(&app.state.db)
        .await
        .unwrap();
    let uri = format!("/admin/notifications/{}/", id);

    let html = body_text(app.send(get(&uri, Some(&cookie))).await).await;
    assert!(html.contains("Typo here"));

    let response = app.send(post_form(&uri, Some(&cookie), "message=&is_read=on")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("This field is required."));

    let response = app
        .send(post_form(&uri, Some(&cookie), "message=Fixed+typo&is_read=on"))
        .await;
    assert_eq!(location(&response), "/admin/notifications/");

    let (message, is_read): (String, bool) =
        sqlx::query_as("SELECT message, is_read FROM notifications WHERE id = ?")
            .bind(id)
            .fetch_one(&app.state.db)
            .await
            .unwrap();
    assert_eq!(message, "Fixed typo");
    assert!(is_read);

    // An unticked checkbox marks it unread again
    app.send(post_form(&uri, Some(&cookie), "message=Fixed+typo")).await;
    let is_read: bool = sqlx::query_scalar("SELECT is_read FROM notifications WHERE id = ?")
        .bind(id)
        .fetch_one(&app.state.db)
        .await
        .unwrap();
    assert!(!is_read);
}
