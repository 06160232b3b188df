//! 세션 쿠키.
//!
//! access_token 은 모든 경로(`/`), refresh_token 은 인증 경로에서만 전송됩니다.
//! 삭제 쿠키는 원래 쿠키와 같은 경로를 가져야 브라우저가 지웁니다.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use crate::auth::{TokenPair, ACCESS_TOKEN_COOKIE};
use crate::state::CookieSettings;

/// refresh_token 쿠키 이름.
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// 인증 라우트 경로 (refresh_token 쿠키 범위).
pub const AUTH_PATH: &str = "/api/v1/auth";

fn session_cookie(
    name: &'static str,
    value: String,
    path: &'static str,
    max_age: Duration,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path(path)
        .max_age(max_age)
        .build()
}

fn removal_cookie(name: &'static str, path: &'static str, secure: bool) -> Cookie<'static> {
    Cookie::build((name, ""))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path(path)
        .max_age(Duration::ZERO)
        .build()
}

/// 토큰 쌍을 쿠키로 설정합니다.
pub fn set_session_cookies(jar: CookieJar, pair: &TokenPair, settings: &CookieSettings) -> CookieJar {
    jar.add(session_cookie(
        ACCESS_TOKEN_COOKIE,
        pair.access_token.clone(),
        "/",
        settings.access_max_age,
        settings.secure,
    ))
    .add(session_cookie(
        REFRESH_TOKEN_COOKIE,
        pair.refresh_token.clone(),
        AUTH_PATH,
        settings.refresh_max_age,
        settings.secure,
    ))
}

/// 두 세션 쿠키를 삭제합니다.
///
/// 요청에 쿠키가 없어도 삭제 쿠키를 내려보냅니다.
pub fn clear_session_cookies(jar: CookieJar, settings: &CookieSettings) -> CookieJar {
    jar.add(removal_cookie(ACCESS_TOKEN_COOKIE, "/", settings.secure))
        .add(removal_cookie(REFRESH_TOKEN_COOKIE, AUTH_PATH, settings.secure))
}

/// 요청 쿠키의 refresh_token.
pub fn refresh_token_from(jar: &CookieJar) -> Option<String> {
    jar.get(REFRESH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}
