//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/api/v1/auth` - 회원가입 / 로그인 / 갱신 / 로그아웃
//! - `/api/v1/me` - 인증된 사용자 정보 (Gatekeeper 보호)

pub mod auth;
pub mod cookies;
pub mod health;
pub mod me;

pub use auth::{auth_router, LoginRequest, LogoutResponse, RefreshRequest, RegisterRequest, RegisterResponse};
pub use cookies::{AUTH_PATH, REFRESH_TOKEN_COOKIE};
pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};
pub use me::{me_router, MeResponse, PrincipalView};

use axum::Router;
use std::sync::Arc;

use crate::auth::Gatekeeper;
use crate::state::AppState;

/// 전체 API 라우터 생성.
pub fn create_api_router(gatekeeper: Gatekeeper) -> Router<Arc<AppState>> {
    Router::new()
        // 헬스 체크 엔드포인트
        .nest("/health", health_router())
        // API v1 엔드포인트
        .nest(AUTH_PATH, auth_router())
        .nest("/api/v1/me", me_router(gatekeeper))
}
