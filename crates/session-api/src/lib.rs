//! 세션 토큰 수명 관리 및 REST API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Argon2id 비밀번호 해싱
//! - HS256 access / refresh token 서명 및 검증
//! - 단일 사용 refresh token 회전과 회수 (세션 서비스)
//! - 보호 라우트용 Gatekeeper
//! - Axum 기반 REST API, 헬스 체크, Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`auth`]: 세션 서비스, 토큰 코덱, 비밀번호 해셔, Gatekeeper
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`metrics`]: Prometheus 메트릭 수집
//! - [`middleware`]: HTTP 미들웨어
//! - [`openapi`]: OpenAPI 문서

pub mod auth;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use auth::{AuthError, AuthSubject, Gatekeeper, SessionService, TokenCodec, TokenPair};
pub use error::ApiErrorResponse;
pub use metrics::setup_metrics_recorder;
pub use middleware::metrics_layer;
pub use state::AppState;

#[cfg(test)]
pub use state::create_test_state;

/// /metrics 엔드포인트 핸들러.
async fn metrics_handler(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}

/// 전체 라우터 생성.
///
/// 요청 처리 시간이 `request_timeout` 을 넘으면 핸들러 future 가 drop 되고 408 을 반환합니다.
pub fn create_router(
    state: Arc<AppState>,
    metrics_handle: Option<PrometheusHandle>,
    request_timeout: Duration,
) -> Router {
    let api_router = routes::create_api_router(state.gatekeeper.clone()).with_state(state);

    let mut router = Router::new()
        .merge(api_router)
        .merge(openapi::openapi_router());

    // 메트릭 라우터 (별도 상태)
    if let Some(handle) = metrics_handle {
        router = router.merge(
            Router::new()
                .route("/metrics", get(metrics_handler))
                .with_state(handle),
        );
    }

    router
        // 메트릭 미들웨어 (모든 요청에 적용)
        .layer(axum::middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        // 전역 타임아웃 - 408 상태 코드 반환
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
}
