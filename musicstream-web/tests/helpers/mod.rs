//! Shared helpers for router-level integration tests
//!
//! Each test builds its own app over a fresh database in a temp dir and
//! drives it with `oneshot`.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use musicstream_common::db::init_database;
use musicstream_web::db::songs::NewSong;
use musicstream_web::db::users::NewUser;
use musicstream_web::media::MediaStore;
use musicstream_web::{build_router, db, AppSettings, AppState};
use serde_json::Value;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

pub const PASSWORD: &str = "violet-harbor-71";
pub const BOUNDARY: &str = "musicstream-test-boundary";

/// Minimal PNG header, enough for content sniffing
pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
];

pub struct TestApp {
    pub dir: TempDir,
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_settings(AppSettings::default()).await
    }

    pub async fn with_settings(settings: AppSettings) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let pool = init_database(&dir.path().join("test.db"))
            .await
            .expect("database init");
        let media = MediaStore::new(dir.path().join("media"));
        let state = AppState::new(pool, media, settings);
        let router = build_router(state.clone(), dir.path().join("static"));
        Self { dir, state, router }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn create_user(&self, username: &str, is_staff: bool) -> i64 {
        db::users::create_user(
            &self.state.db,
            &NewUser {
                username,
                password: PASSWORD,
                is_staff,
                ..Default::default()
            },
        )
        .await
        .expect("create user")
    }

    /// `Cookie` header value for a fresh session of `user_id`
    pub async fn login(&self, user_id: i64) -> String {
        let token = db::sessions::create_session(&self.state.db, user_id, 1)
            .await
            .expect("create session");
        format!("musicstream_session={}", token)
    }

    pub async fn insert_song(&self, user_id: i64, title: &str, artist: &str, genre: &str) -> i64 {
        db::songs::insert_song(
            &self.state.db,
            &NewSong {
                title: title.to_string(),
                artist: artist.to_string(),
                album: String::new(),
                genre: genre.to_string(),
                audio_file: format!("songs/{}.mp3", title.replace(' ', "_")),
                cover_image: None,
                uploaded_by: user_id,
            },
        )
        .await
        .expect("insert song")
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.state.db)
            .await
            .expect("count rows")
    }
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post(uri: &str, cookie: Option<&str>) -> Request<Body> {
    post_form(uri, cookie, "")
}

pub fn post_form(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Hand-built `multipart/form-data` body
pub fn post_multipart(
    uri: &str,
    cookie: Option<&str>,
    fields: &[(&str, &str)],
    files: &[(&str, &str, &[u8])],
) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    for (name, file_name, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, name, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    let mut builder = Request::builder().method("POST").uri(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={}", BOUNDARY),
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("JSON body")
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
