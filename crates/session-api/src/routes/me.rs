//! 인증된 사용자 정보 endpoint.

use std::sync::Arc;

use axum::{extract::State, middleware, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use session_core::{Principal, PrincipalId};
use utoipa::ToSchema;

use crate::auth::{require_auth, AuthError, AuthSubject, Gatekeeper};
use crate::state::AppState;

/// 사용자 공개 정보.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PrincipalView {
    #[schema(value_type = i64)]
    pub id: PrincipalId,
    pub email: String,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Principal> for PrincipalView {
    fn from(principal: Principal) -> Self {
        Self {
            id: principal.id,
            email: principal.email,
            verified: principal.verified,
            created_at: principal.created_at,
        }
    }
}

/// `GET /api/v1/me` 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    /// 토큰의 사용자 ID
    #[schema(value_type = i64)]
    pub principal_id: PrincipalId,
    /// access token 만료 시각
    pub token_expires_at: DateTime<Utc>,
    /// 저장소에서 찾은 사용자 (삭제된 경우 없음)
    pub principal: Option<PrincipalView>,
}

/// 현재 사용자 조회.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    tag = "auth",
    responses(
        (status = 200, description = "인증된 사용자", body = MeResponse),
        (status = 401, description = "인증 실패", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    subject: AuthSubject,
) -> Result<Json<MeResponse>, AuthError> {
    let principal = state.service.find_principal(subject.principal_id).await?;

    Ok(Json(MeResponse {
        principal_id: subject.principal_id,
        token_expires_at: subject.expires_at,
        principal: principal.map(PrincipalView::from),
    }))
}

/// 보호 라우터 생성.
///
/// 모든 라우트가 Gatekeeper 를 거칩니다.
pub fn me_router(gatekeeper: Gatekeeper) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(me))
        .route_layer(middleware::from_fn_with_state(gatekeeper, require_auth))
}
