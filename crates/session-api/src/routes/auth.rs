//! 인증 endpoint.
//!
//! - `POST /api/v1/auth/register` - 회원가입
//! - `POST /api/v1/auth/login` - 로그인, 세션 쿠키 설정
//! - `POST /api/v1/auth/refresh` - refresh token 회전
//! - `POST /api/v1/auth/logout` - refresh token 회수, 세션 쿠키 삭제

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use session_core::{Principal, PrincipalId};
use tracing::debug;
use utoipa::ToSchema;
use validator::Validate;

use super::cookies::{clear_session_cookies, refresh_token_from, set_session_cookies};
use crate::auth::{AuthError, TokenPair};
use crate::error::ApiErrorResponse;
use crate::state::AppState;

/// 회원가입 요청.
#[derive(Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email(message = "올바른 이메일 형식이 아닙니다"))]
    pub email: String,
    #[validate(length(min = 8, message = "비밀번호는 8자 이상이어야 합니다"))]
    pub password: String,
}

/// 로그인 요청.
///
/// 형식 검증은 하지 않습니다. 어떤 실패든 같은 401 응답입니다.
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// 쿠키 대신 본문으로 전달하는 refresh token.
#[derive(Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// 회원가입 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    #[schema(value_type = i64)]
    pub id: PrincipalId,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<Principal> for RegisterResponse {
    fn from(principal: Principal) -> Self {
        Self {
            id: principal.id,
            email: principal.email,
            created_at: principal.created_at,
        }
    }
}

/// 로그아웃 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogoutResponse {
    pub message: String,
}

/// 회원가입.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "등록 완료", body = RegisterResponse),
        (status = 400, description = "입력값 오류", body = ApiErrorResponse),
        (status = 409, description = "이메일 중복", body = ApiErrorResponse)
    )
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Response {
    if let Err(errors) = request.validate() {
        debug!("회원가입 입력값 오류");
        return ApiErrorResponse::with_details(
            "VALIDATION_ERROR",
            "입력값이 올바르지 않습니다",
            serde_json::to_value(&errors).unwrap_or_default(),
        )
        .into_response_with(StatusCode::BAD_REQUEST);
    }

    match state.service.register(&request.email, &request.password).await {
        Ok(principal) => {
            (StatusCode::CREATED, Json(RegisterResponse::from(principal))).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// 로그인.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "로그인 성공, 세션 쿠키 설정", body = TokenPair),
        (status = 401, description = "이메일 또는 비밀번호 불일치", body = ApiErrorResponse)
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<TokenPair>), AuthError> {
    let pair = state.service.login(&request.email, &request.password).await?;
    let jar = set_session_cookies(jar, &pair, &state.cookies);
    Ok((jar, Json(pair)))
}

/// refresh token 회전.
///
/// 쿠키를 우선 사용하고, 없으면 JSON 본문 `{"refresh_token": ...}` 을 사용합니다.
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "auth",
    request_body(content = RefreshRequest, description = "쿠키가 없을 때만 사용"),
    responses(
        (status = 200, description = "새 토큰 쌍", body = TokenPair),
        (status = 401, description = "유효하지 않거나 만료된 세션", body = ApiErrorResponse)
    )
)]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, Json<TokenPair>), AuthError> {
    let token = presented_token(&jar, &body).ok_or(AuthError::TokenInvalid)?;

    let pair = state.service.refresh(&token).await?;
    let jar = set_session_cookies(jar, &pair, &state.cookies);
    Ok((jar, Json(pair)))
}

/// 로그아웃.
///
/// 회수 성공 여부와 관계없이 세션 쿠키는 항상 삭제합니다.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "auth",
    request_body(content = RefreshRequest, description = "쿠키가 없을 때만 사용"),
    responses(
        (status = 200, description = "로그아웃 완료", body = LogoutResponse),
        (status = 401, description = "유효하지 않은 토큰", body = ApiErrorResponse),
        (status = 500, description = "장부 오류", body = ApiErrorResponse)
    )
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Bytes,
) -> (CookieJar, Result<Json<LogoutResponse>, AuthError>) {
    let result = match presented_token(&jar, &body) {
        Some(token) => state.service.logout(&token).await,
        None => Err(AuthError::TokenInvalid),
    };

    let jar = clear_session_cookies(jar, &state.cookies);
    let response = result.map(|()| {
        Json(LogoutResponse {
            message: "로그아웃되었습니다".to_string(),
        })
    });
    (jar, response)
}

fn presented_token(jar: &CookieJar, body: &[u8]) -> Option<String> {
    refresh_token_from(jar).or_else(|| {
        serde_json::from_slice::<RefreshRequest>(body)
            .ok()
            .map(|request| request.refresh_token)
            .filter(|token| !token.is_empty())
    })
}

/// 인증 라우터 생성.
pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            email: "a@x.com".into(),
            password: "password123".into(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = RegisterRequest {
            email: "not-an-email".into(),
            password: "password123".into(),
        };
        assert!(bad_email.validate().is_err());

        let short_password = RegisterRequest {
            email: "a@x.com".into(),
            password: "short".into(),
        };
        let errors = short_password.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_presented_token_prefers_cookie() {
        use axum_extra::extract::cookie::Cookie;

        let body = br#"{"refresh_token":"from-body"}"#;
        let jar = CookieJar::new().add(Cookie::new("refresh_token", "from-cookie"));
        assert_eq!(presented_token(&jar, body).as_deref(), Some("from-cookie"));

        assert_eq!(
            presented_token(&CookieJar::new(), body).as_deref(),
            Some("from-body")
        );
        assert_eq!(presented_token(&CookieJar::new(), b""), None);
        assert_eq!(presented_token(&CookieJar::new(), b"not json"), None);
    }
}
