//! Integration tests for accounts, profiles, follows and notifications

mod helpers;

use axum::http::{header, StatusCode};
use helpers::*;

fn set_cookie(response: &axum::http::Response<axum::body::Body>) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// `name=value` part of a `Set-Cookie` header
fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap_or_default().to_string()
}

#[tokio::test]
async fn test_register_signs_in_and_creates_profile() {
    let app = TestApp::new().await;

    let response = app
        .send(post_form(
            "/users/register/",
            None,
            "username=newbie&email=newbie%40example.com&password1=violet-harbor-71&password2=violet-harbor-71",
        ))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    let cookie = set_cookie(&response);
    assert!(cookie.starts_with("musicstream_session="));
    assert!(cookie.contains("HttpOnly"));

    assert_eq!(app.count("users").await, 1);
    assert_eq!(app.count("profiles").await, 1);

    let html = body_text(app.send(get("/", Some(&cookie_pair(&cookie)))).await).await;
    assert!(html.contains("/users/logout/"));
    assert!(html.contains(">newbie</a>"));
}

#[tokio::test]
async fn test_register_duplicate_username_case_insensitive() {
    let app = TestApp::new().await;
    app.create_user("Taken", false).await;

    let response = app
        .send(post_form(
            "/users/register/",
            None,
            "username=taken&password1=violet-harbor-71&password2=violet-harbor-71",
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("A user with that username already exists."));
    assert_eq!(app.count("users").await, 1);
}

#[tokio::test]
async fn test_register_rejects_weak_password() {
    let app = TestApp::new().await;

    let response = app
        .send(post_form(
            "/users/register/",
            None,
            "username=someone&password1=12345678&password2=12345678",
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("This password is too common."));
    assert!(html.contains("This password is entirely numeric."));
    assert_eq!(app.count("users").await, 0);
}

#[tokio::test]
async fn test_login_with_bad_password() {
    let app = TestApp::new().await;
    app.create_user("kay", false).await;

    let response = app
        .send(post_form("/users/login/", None, "username=kay&password=wrong-guess-99"))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let html = body_text(response).await;
    assert!(html.contains("Please enter a correct username and password."));
    assert!(html.contains(r#"value="kay""#));
}

#[tokio::test]
async fn test_login_honors_next() {
    let app = TestApp::new().await;
    app.create_user("kay", false).await;

    let body = format!("username=kay&password={}&next=%2Fmy-songs%2F", PASSWORD);
    let response = app.send(post_form("/users/login/", None, &body)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/my-songs/");

    let cookie = cookie_pair(&set_cookie(&response));
    let response = app.send(get("/my-songs/", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_ignores_offsite_next() {
    let app = TestApp::new().await;
    app.create_user("kay", false).await;

    let body = format!(
        "username=kay&password={}&next=https%3A%2F%2Fevil.example%2F",
        PASSWORD
    );
    let response = app.send(post_form("/users/login/", None, &body)).await;

    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = TestApp::new().await;
    let kay = app.create_user("kay", false).await;
    let cookie = app.login(kay).await;

    let response = app.send(post("/users/logout/", Some(&cookie))).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(set_cookie(&response).contains("Max-Age=0"));
    assert_eq!(app.count("sessions").await, 0);

    let response = app.send(get("/my-songs/", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_profile_page_and_unknown_user() {
    let app = TestApp::new().await;
    let kay = app.create_user("kay", false).await;
    app.insert_song(kay, "Signature", "Kay", "").await;

    let response = app.send(get("/users/profile/kay/", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Signature"));

    let response = app.send(get("/users/profile/ghost/", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_edit_profile() {
    let app = TestApp::new().await;
    let kay = app.create_user("kay", false).await;
    let cookie = app.login(kay).await;

    let response = app
        .send(post_multipart(
            "/users/profile/edit/",
            Some(&cookie),
            &[("bio", "Makes noise"), ("location", "Lisbon")],
            &[],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/users/profile/kay/");

    let html = body_text(app.send(get("/users/profile/kay/", Some(&cookie))).await).await;
    assert!(html.contains("Makes noise"));
    assert!(html.contains("Lisbon"));
    assert!(html.contains("Profile updated successfully!"));
}

#[tokio::test]
async fn test_edit_profile_failed_image_write_keeps_old_text() {
    let app = TestApp::new().await;
    let kay = app.create_user("kay", false).await;
    let cookie = app.login(kay).await;
    // A plain file where the profile image folder belongs makes the write fail
    let media_root = app.state.media.root().to_path_buf();
    std::fs::create_dir_all(&media_root).unwrap();
    std::fs::write(media_root.join("profile_images"), b"").unwrap();

    let response = app
        .send(post_multipart(
            "/users/profile/edit/",
            Some(&cookie),
            &[("bio", "Never saved"), ("location", "Nowhere")],
            &[("profile_image", "me.png", PNG_BYTES)],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let (bio, image): (String, Option<String>) =
        sqlx::query_as("SELECT bio, profile_image FROM profiles WHERE user_id = ?")
            .bind(kay)
            .fetch_one(&app.state.db)
            .await
            .unwrap();
    assert_eq!(bio, "");
    assert!(image.is_none());
}

#[tokio::test]
async fn test_follow_toggle_creates_notification() {
    let app = TestApp::new().await;
    let kay = app.create_user("kay", false).await;
    let fan = app.create_user("fan", false).await;
    let fan_cookie = app.login(fan).await;

    let response = app.send(post("/users/follow/kay/", Some(&fan_cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["is_following"], true);
    assert_eq!(json["followers_count"], 1);
    assert_eq!(app.count("notifications").await, 1);

    let kay_cookie = app.login(kay).await;
    let html = body_text(app.send(get("/users/notifications/", Some(&kay_cookie))).await).await;
    assert!(html.contains("fan started following you."));
    assert!(html.contains(r#"class="unread""#));

    let response = app.send(post("/users/notifications/read/", Some(&kay_cookie))).await;
    assert_eq!(location(&response), "/users/notifications/");
    let html = body_text(app.send(get("/users/notifications/", Some(&kay_cookie))).await).await;
    assert!(!html.contains(r#"class="unread""#));

    // Second toggle unfollows without another notification
    let json = body_json(app.send(post("/users/follow/kay/", Some(&fan_cookie))).await).await;
    assert_eq!(json["is_following"], false);
    assert_eq!(json["followers_count"], 0);
    assert_eq!(app.count("notifications").await, 1);
}

#[tokio::test]
async fn test_follow_self_and_unknown() {
    let app = TestApp::new().await;
    let kay = app.create_user("kay", false).await;
    let cookie = app.login(kay).await;

    let response = app.send(post("/users/follow/kay/", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], false);

    let response = app.send(post("/users/follow/nobody/", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_follow_requires_login() {
    let app = TestApp::new().await;
    app.create_user("kay", false).await;

    let response = app.send(post("/users/follow/kay/", None)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/users/login/?next="));
}

#[tokio::test]
async fn test_profile_image_upload() {
    let app = TestApp::new().await;
    let kay = app.create_user("kay", false).await;
    let cookie = app.login(kay).await;

    let response = app
        .send(post_multipart(
            "/users/upload-image/",
            Some(&cookie),
            &[],
            &[("profile_image", "me.txt", b"definitely not an image")],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["errors"]["profile_image"].is_array());

    let response = app
        .send(post_multipart(
            "/users/upload-image/",
            Some(&cookie),
            &[],
            &[("profile_image", "me.png", PNG_BYTES)],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    let url = json["image_url"].as_str().unwrap();
    assert!(url.starts_with("/media/profile_images/"));
}
