//! Integration tests for podcasts and episodes

mod helpers;

use axum::http::StatusCode;
use helpers::*;
use musicstream_web::db::episodes::{self, NewEpisode};
use musicstream_web::db::podcasts::{self, NewPodcast};

async fn insert_podcast(app: &TestApp, host_id: i64, title: &str) -> i64 {
    podcasts::insert_podcast(
        &app.state.db,
        &NewPodcast {
            title: title.to_string(),
            description: format!("About {}", title),
            cover_image: None,
            host_id,
        },
    )
    .await
    .unwrap()
}

async fn insert_episode(app: &TestApp, podcast_id: i64, title: &str) -> i64 {
    episodes::insert_episode(
        &app.state.db,
        &NewEpisode {
            title: title.to_string(),
            description: "Episode notes".to_string(),
            audio_file: format!("episodes/{}.mp3", title.replace(' ', "_")),
            podcast_id,
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_create_podcast_redirects_to_detail() {
    let app = TestApp::new().await;
    let host = app.create_user("host", false).await;
    let cookie = app.login(host).await;

    let response = app
        .send(post_multipart(
            "/podcasts/upload/",
            Some(&cookie),
            &[("title", "Deep Dives"), ("description", "Long talks")],
            &[],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let target = location(&response);
    assert!(target.starts_with("/podcast/"));

    let html = body_text(app.send(get(&target, Some(&cookie))).await).await;
    assert!(html.contains("Deep Dives"));
    assert!(html.contains("Podcast uploaded successfully!"));
}

#[tokio::test]
async fn test_create_podcast_requires_description() {
    let app = TestApp::new().await;
    let host = app.create_user("host", false).await;
    let cookie = app.login(host).await;

    let response = app
        .send(post_multipart(
            "/podcasts/upload/",
            Some(&cookie),
            &[("title", "Deep Dives")],
            &[],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("This field is required."));
    assert_eq!(app.count("podcasts").await, 0);
}

#[tokio::test]
async fn test_podcast_list_search() {
    let app = TestApp::new().await;
    let host = app.create_user("host", false).await;
    insert_podcast(&app, host, "Garden Hour").await;
    insert_podcast(&app, host, "Space Chat").await;

    let html = body_text(app.send(get("/podcasts/?search=garden", None)).await).await;

    assert!(html.contains("Garden Hour"));
    assert!(!html.contains("Space Chat"));
}

#[tokio::test]
async fn test_episode_upload_by_non_host_is_not_found() {
    let app = TestApp::new().await;
    let host = app.create_user("host", false).await;
    let stranger = app.create_user("stranger", false).await;
    let podcast = insert_podcast(&app, host, "Mine").await;
    let cookie = app.login(stranger).await;

    let uri = format!("/podcast/{}/episode/upload/", podcast);
    assert_eq!(app.send(get(&uri, Some(&cookie))).await.status(), StatusCode::NOT_FOUND);

    let response = app
        .send(post_multipart(
            &uri,
            Some(&cookie),
            &[("title", "Hijack"), ("description", "nope")],
            &[("audio_file", "hijack.mp3", b"ID3")],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.count("episodes").await, 0);
}

#[tokio::test]
async fn test_host_uploads_episode() {
    let app = TestApp::new().await;
    let host = app.create_user("host", false).await;
    let podcast = insert_podcast(&app, host, "Mine").await;
    let cookie = app.login(host).await;

    let response = app
        .send(post_multipart(
            &format!("/podcast/{}/episode/upload/", podcast),
            Some(&cookie),
            &[("title", "Pilot"), ("description", "First one")],
            &[("audio_file", "pilot.ogg", b"OggS")],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/podcast/{}/", podcast));

    let audio_file: String = sqlx::query_scalar("SELECT audio_file FROM episodes WHERE podcast_id = ?")
        .bind(podcast)
        .fetch_one(&app.state.db)
        .await
        .unwrap();
    assert!(audio_file.starts_with("episodes/"));
    assert!(app.state.media.root().join(&audio_file).is_file());
}

#[tokio::test]
async fn test_delete_podcast_cascades_to_episodes() {
    let app = TestApp::new().await;
    let host = app.create_user("host", false).await;
    let podcast = insert_podcast(&app, host, "Short Lived").await;
    insert_episode(&app, podcast, "One").await;
    insert_episode(&app, podcast, "Two").await;
    let cookie = app.login(host).await;

    let response = app
        .send(post(&format!("/podcast/{}/delete/", podcast), Some(&cookie)))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/podcasts/my/");
    assert_eq!(app.count("podcasts").await, 0);
    assert_eq!(app.count("episodes").await, 0);
}

#[tokio::test]
async fn test_delete_podcast_of_other_user_is_not_found() {
    let app = TestApp::new().await;
    let host = app.create_user("host", false).await;
    let other = app.create_user("other", false).await;
    let podcast = insert_podcast(&app, host, "Keep").await;
    let cookie = app.login(other).await;

    let response = app
        .send(post(&format!("/podcast/{}/delete/", podcast), Some(&cookie)))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.count("podcasts").await, 1);
}

#[tokio::test]
async fn test_delete_episode_returns_to_podcast() {
    let app = TestApp::new().await;
    let host = app.create_user("host", false).await;
    let podcast = insert_podcast(&app, host, "Show").await;
    let episode = insert_episode(&app, podcast, "Cut").await;
    let cookie = app.login(host).await;

    let response = app
        .send(post(&format!("/episode/{}/delete/", episode), Some(&cookie)))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/podcast/{}/", podcast));
    assert_eq!(app.count("episodes").await, 0);
    assert_eq!(app.count("podcasts").await, 1);
}

#[tokio::test]
async fn test_episode_play_payload() {
    let app = TestApp::new().await;
    let host = app.create_user("host", false).await;
    let podcast = insert_podcast(&app, host, "Night Radio").await;
    let episode = insert_episode(&app, podcast, "Static").await;

    let response = app
        .send(post(&format!("/episode/{}/play/", episode), None))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["episode"]["podcast"], "Night Radio");
    assert_eq!(json["episode"]["play_count"], 1);
    assert_eq!(json["episode"]["audio_url"], "/media/episodes/Static.mp3");
    assert_eq!(json["episode"]["cover_url"], "/static/images/default-album-art.jpg");
}

#[tokio::test]
async fn test_episode_cover_falls_back_to_podcast_cover() {
    let app = TestApp::new().await;
    let host = app.create_user("host", false).await;
    let podcast = podcasts::insert_podcast(
        &app.state.db,
        &NewPodcast {
            title: "Framed".to_string(),
            description: "Has art".to_string(),
            cover_image: Some("podcast_covers/x.png".to_string()),
            host_id: host,
        },
    )
    .await
    .unwrap();
    let episode = insert_episode(&app, podcast, "Pilot").await;

    let json = body_json(
        app.send(post(&format!("/episode/{}/play/", episode), None))
            .await,
    )
    .await;

    assert_eq!(json["episode"]["cover_url"], "/media/podcast_covers/x.png");
}

#[tokio::test]
async fn test_my_podcasts_lists_only_own() {
    let app = TestApp::new().await;
    let host = app.create_user("host", false).await;
    let other = app.create_user("other", false).await;
    insert_podcast(&app, host, "Mine One").await;
    insert_podcast(&app, host, "Mine Two").await;
    insert_podcast(&app, other, "Not Mine").await;

    let response = app.send(get("/podcasts/my/", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let cookie = app.login(host).await;
    let html = body_text(app.send(get("/podcasts/my/", Some(&cookie))).await).await;
    assert!(html.contains("Mine One"));
    assert!(html.contains("Mine Two"));
    assert!(!html.contains("Not Mine"));

    let cookie = app.login(app.create_user("lurker", false).await).await;
    let html = body_text(app.send(get("/podcasts/my/", Some(&cookie))).await).await;
    assert!(html.contains("You are not hosting any podcasts yet."));
}

#[tokio::test]
async fn test_episode_play_method_and_missing() {
    let app = TestApp::new().await;

    let response = app.send(get("/episode/1/play/", None)).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = app.send(post("/episode/42/play/", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn test_episode_detail_page() {
    let app = TestApp::new().await;
    let host = app.create_user("host", false).await;
    let podcast = insert_podcast(&app, host, "Show").await;
    let episode = insert_episode(&app, podcast, "Opening").await;

    let response = app.send(get(&format!("/episode/{}/", episode), None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Opening"));
    assert!(html.contains(&format!("/episode/{}/play/", episode)));
}
