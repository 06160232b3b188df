//! OpenAPI 문서화 설정.
//!
//! utoipa를 사용하여 REST API의 OpenAPI 3.0 스펙을 생성하고
//! `/api-docs/openapi.json` 경로로 제공합니다.
//!
//! 새로운 엔드포인트를 추가할 때:
//!
//! 1. 응답/요청 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가

use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

use crate::auth::TokenPair;
use crate::error::ApiErrorResponse;
use crate::routes::{
    ComponentHealth, ComponentStatus, HealthResponse, LoginRequest, LogoutResponse, MeResponse,
    PrincipalView, RefreshRequest, RegisterRequest, RegisterResponse,
};

/// Session API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Session API",
        description = "회원가입, 로그인, refresh token 회전, 로그아웃을 제공하는 세션 API입니다."
    ),
    paths(
        crate::routes::health::health_check,
        crate::routes::health::health_ready,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::refresh,
        crate::routes::auth::logout,
        crate::routes::me::me,
    ),
    components(schemas(
        ApiErrorResponse,
        TokenPair,
        RegisterRequest,
        RegisterResponse,
        LoginRequest,
        RefreshRequest,
        LogoutResponse,
        MeResponse,
        PrincipalView,
        HealthResponse,
        ComponentHealth,
        ComponentStatus,
    )),
    tags(
        (name = "auth", description = "인증 및 세션"),
        (name = "health", description = "헬스 체크")
    )
)]
pub struct ApiDoc;

/// OpenAPI JSON 라우터.
pub fn openapi_router() -> Router {
    Router::new().route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
}
