//! Gatekeeper: Axum용 access token 인증.
//!
//! `Authorization: Bearer <token>` 헤더를 우선 사용하고, 헤더가 없으면
//! `access_token` 쿠키로 대체합니다. 검증은 서명과 만료만 확인하며
//! 장부는 조회하지 않습니다. access token 은 만료 전까지 개별 회수되지 않습니다.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use session_core::{Principal, PrincipalId};
use tracing::debug;

use super::jwt::TokenCodec;
use crate::error::ApiErrorResponse;
use crate::metrics::record_auth_event;

/// access token 쿠키 이름.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// 인증된 사용자.
///
/// [`require_auth`] 미들웨어가 요청 extension 에 넣거나,
/// 핸들러 추출기로 직접 검증해 얻습니다.
///
/// ```rust,ignore
/// async fn protected_handler(subject: AuthSubject) -> impl IntoResponse {
///     format!("Authenticated user: {}", subject.principal_id)
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSubject {
    pub principal_id: PrincipalId,
    pub expires_at: DateTime<Utc>,
}

/// Gatekeeper 거절 사유.
#[derive(Debug, thiserror::Error)]
pub enum GatekeeperError {
    #[error("인증 토큰이 필요합니다")]
    MissingToken,
    #[error("잘못된 Authorization 헤더 형식")]
    InvalidAuthHeader,
    #[error("유효하지 않거나 만료된 토큰")]
    InvalidToken,
}

impl GatekeeperError {
    fn code(&self) -> &'static str {
        match self {
            GatekeeperError::MissingToken => "MISSING_TOKEN",
            GatekeeperError::InvalidAuthHeader => "INVALID_AUTH_HEADER",
            GatekeeperError::InvalidToken => "INVALID_TOKEN",
        }
    }
}

impl IntoResponse for GatekeeperError {
    fn into_response(self) -> Response {
        ApiErrorResponse::new(self.code(), self.to_string())
            .into_response_with(StatusCode::UNAUTHORIZED)
    }
}

/// access token 검증기.
#[derive(Clone)]
pub struct Gatekeeper {
    codec: Arc<TokenCodec>,
}

impl Gatekeeper {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }

    /// 요청 헤더에서 access token 을 찾아 검증합니다.
    pub fn check(&self, headers: &HeaderMap) -> Result<AuthSubject, GatekeeperError> {
        let result = self.check_inner(headers);
        record_auth_event("gatekeeper", if result.is_ok() { "success" } else { "rejected" });
        result
    }

    fn check_inner(&self, headers: &HeaderMap) -> Result<AuthSubject, GatekeeperError> {
        let token = extract_token(headers)?;

        let claims = self.codec.verify_access(&token).map_err(|_| {
            debug!("access token 검증 실패");
            GatekeeperError::InvalidToken
        })?;

        let principal_id =
            Principal::parse_subject(&claims.subject).ok_or(GatekeeperError::InvalidToken)?;

        Ok(AuthSubject {
            principal_id,
            expires_at: claims.expires_at,
        })
    }
}

/// 헤더 우선, 쿠키 대체.
fn extract_token(headers: &HeaderMap) -> Result<String, GatekeeperError> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| GatekeeperError::InvalidAuthHeader)?;

        return match value.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(GatekeeperError::InvalidAuthHeader),
        };
    }

    CookieJar::from_headers(headers)
        .get(ACCESS_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
        .ok_or(GatekeeperError::MissingToken)
}

impl<S> FromRequestParts<S> for AuthSubject
where
    Gatekeeper: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = GatekeeperError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // require_auth 가 이미 검증한 경우
        if let Some(subject) = parts.extensions.get::<AuthSubject>() {
            return Ok(subject.clone());
        }

        Gatekeeper::from_ref(state).check(&parts.headers)
    }
}

/// 보호 라우트용 미들웨어.
///
/// 검증에 실패하면 핸들러를 실행하지 않고 401을 반환합니다.
pub async fn require_auth(
    State(gatekeeper): State<Gatekeeper>,
    mut request: Request,
    next: Next,
) -> Result<Response, GatekeeperError> {
    let subject = gatekeeper.check(request.headers())?;
    request.extensions_mut().insert(subject);
    Ok(next.run(request).await)
}
