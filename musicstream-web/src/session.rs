//! Cookie sessions and the login extractors
//!
//! `CurrentUser` never rejects. `RequireUser` redirects anonymous requests
//! to the login page with a `next` parameter. `RequireStaff` additionally
//! answers 403 to signed-in users without the staff flag.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect, Response},
};
use musicstream_common::config::clamp_session_ttl_hours;
use musicstream_common::db::User;
use tracing::warn;

use crate::error::{WebError, WebResult};
use crate::{db, AppSettings, AppState};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "musicstream_session";

/// Login page path
pub const LOGIN_PATH: &str = "/users/login/";

/// An authenticated session
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// The signed-in user, if any
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<Session>);

/// A signed-in user; anonymous requests are sent to the login page
#[derive(Debug, Clone)]
pub struct RequireUser(pub Session);

/// A signed-in staff user
#[derive(Debug, Clone)]
pub struct RequireStaff(pub Session);

/// Rejection for the login-required extractors
pub enum AuthRejection {
    Login { next: String },
    Forbidden,
    Error(WebError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::Login { next } => Redirect::to(&login_url(&next)).into_response(),
            AuthRejection::Forbidden => {
                WebError::Forbidden("Staff access required".to_string()).into_response()
            }
            AuthRejection::Error(e) => e.into_response(),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(&parts.headers) else {
            return Ok(CurrentUser(None));
        };

        let session = db::sessions::get_session_user(&state.db, &token)
            .await?
            .map(|user| Session { token, user });
        Ok(CurrentUser(session))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(session) = CurrentUser::from_request_parts(parts, state)
            .await
            .map_err(AuthRejection::Error)?;

        match session {
            Some(session) => Ok(RequireUser(session)),
            None => Err(AuthRejection::Login {
                next: request_path(parts),
            }),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let RequireUser(session) = RequireUser::from_request_parts(parts, state).await?;
        if session.user.is_staff {
            Ok(RequireStaff(session))
        } else {
            warn!("Non-staff user {} denied admin access", session.user.username);
            Err(AuthRejection::Forbidden)
        }
    }
}

fn request_path(parts: &Parts) -> String {
    parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string())
}

/// Session token from the `Cookie` header(s)
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value establishing a session
pub fn session_cookie(token: &str, settings: &AppSettings) -> WebResult<HeaderValue> {
    let max_age = clamp_session_ttl_hours(settings.session_ttl_hours) * 3600;
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age
    );
    if settings.cookie_secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).map_err(|e| WebError::BadRequest(e.to_string()))
}

/// `Set-Cookie` value removing the session cookie
pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("musicstream_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Create a session for `user_id` and redirect to `to` with the cookie set
pub async fn login_redirect(state: &AppState, user_id: i64, to: &str) -> WebResult<Response> {
    let token = db::sessions::create_session(&state.db, user_id, state.settings.session_ttl_hours).await?;
    let cookie = session_cookie(&token, &state.settings)?;
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(to)).into_response())
}

/// Queue a one-shot message on the session
pub async fn flash(state: &AppState, session: &Session, message: &str) -> WebResult<()> {
    db::sessions::set_flash(&state.db, &session.token, message).await?;
    Ok(())
}

/// Login URL carrying the page to return to
pub fn login_url(next: &str) -> String {
    format!("{}?next={}", LOGIN_PATH, encode_query_value(next))
}

/// Accept only local absolute paths as redirect targets
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(n) if n.starts_with('/') && !n.starts_with("//") && !n.contains('\\') => n,
        _ => "/",
    }
}

/// Percent-encode everything outside the URL-safe unreserved set and `/`
pub fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~' | b'/') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use musicstream_common::config::MAX_SESSION_TTL_HOURS;

    #[test]
    fn test_session_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; musicstream_session=abc123; other=1"),
        );
        assert_eq!(session_token(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn test_session_token_missing_or_empty() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        headers.insert(header::COOKIE, HeaderValue::from_static("musicstream_session="));
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn test_session_cookie_flags() {
        let mut settings = AppSettings::default();
        let cookie = session_cookie("tok", &settings).unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("musicstream_session=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(!cookie.contains("Secure"));

        settings.cookie_secure = true;
        let cookie = session_cookie("tok", &settings).unwrap();
        assert!(cookie.to_str().unwrap().ends_with("; Secure"));
    }

    #[test]
    fn test_session_cookie_max_age_bounded() {
        let mut settings = AppSettings {
            session_ttl_hours: i64::MAX,
            ..AppSettings::default()
        };
        let cookie = session_cookie("tok", &settings).unwrap();
        let expected = format!("Max-Age={}", MAX_SESSION_TTL_HOURS * 3600);
        assert!(cookie.to_str().unwrap().contains(&expected));

        settings.session_ttl_hours = 0;
        let cookie = session_cookie("tok", &settings).unwrap();
        assert!(cookie.to_str().unwrap().contains("Max-Age=3600;"));
    }

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/my-songs/")), "/my-songs/");
        assert_eq!(safe_next(Some("https://evil.example/")), "/");
        assert_eq!(safe_next(Some("//evil.example/")), "/");
        assert_eq!(safe_next(Some("/\\evil")), "/");
        assert_eq!(safe_next(None), "/");
    }

    #[test]
    fn test_login_url_encodes_query() {
        assert_eq!(
            login_url("/admin/songs/?q=a b&page=2"),
            "/users/login/?next=/admin/songs/%3Fq%3Da%20b%26page%3D2"
        );
    }
}
