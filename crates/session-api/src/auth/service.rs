//! 세션 서비스.
//!
//! 회원가입, 로그인, 토큰 갱신, 로그아웃을 두 외부 저장소
//! ([`CredentialStore`], [`TokenLedger`]) 위에서 조합합니다.
//!
//! # Refresh Token 회전
//!
//! 1. 서명/만료 검증 (실패 시 [`AuthError::TokenInvalid`])
//! 2. 장부에서 `jti` 조회, 없거나 subject 가 다르면 [`AuthError::RefreshTokenRevoked`]
//! 3. 새 토큰 쌍 서명
//! 4. 장부에서 이전 `jti` 를 새 `jti` 로 교체. 이전 키가 이미 사라졌으면
//!    다른 요청이 먼저 회수한 것이므로 [`AuthError::RefreshTokenRevoked`]
//!
//! 4단계의 교체가 원자적이므로 같은 토큰으로 동시에 갱신을 시도하면 하나만 성공합니다.
//! 요청이 중간에 취소되어도 이미 저장소에 반영된 효과는 되돌리지 않습니다.

use std::sync::Arc;

use chrono::Duration;
use session_core::{AuthConfig, NewPrincipal, Principal, PrincipalId};
use session_data::{CredentialStore, TokenLedger};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::error::AuthError;
use super::jwt::{TokenCodec, TokenPair};
use super::password::PasswordHasher;
use crate::metrics::record_auth_event;

/// 토큰 수명.
#[derive(Debug, Clone, Copy)]
pub struct TokenTtl {
    pub access: Duration,
    pub refresh: Duration,
}

impl TokenTtl {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            access: config.access_ttl(),
            refresh: config.refresh_ttl(),
        }
    }

    /// 장부 TTL (refresh 수명과 동일).
    fn ledger(&self) -> std::time::Duration {
        self.refresh.to_std().unwrap_or_default()
    }
}

/// 세션 서비스.
///
/// 요청 간 공유되는 가변 상태가 없으므로 `Arc` 로 감싸 그대로 공유합니다.
pub struct SessionService {
    credentials: Arc<dyn CredentialStore>,
    ledger: Arc<dyn TokenLedger>,
    hasher: Arc<PasswordHasher>,
    codec: Arc<TokenCodec>,
    ttl: TokenTtl,
}

impl SessionService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        ledger: Arc<dyn TokenLedger>,
        hasher: PasswordHasher,
        codec: Arc<TokenCodec>,
        ttl: TokenTtl,
    ) -> Self {
        Self {
            credentials,
            ledger,
            hasher: Arc::new(hasher),
            codec,
            ttl,
        }
    }

    pub fn codec(&self) -> &Arc<TokenCodec> {
        &self.codec
    }

    pub fn ttl(&self) -> TokenTtl {
        self.ttl
    }

    /// 회원가입.
    ///
    /// 이메일 사전 조회는 최선 노력일 뿐이며, 동시 가입 경쟁은 저장소의
    /// 고유 제약 위반을 [`AuthError::EmailTaken`] 으로 변환해 처리합니다.
    #[instrument(skip_all)]
    pub async fn register(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        let result = self.register_inner(email, password).await;
        observe("register", &result);
        result
    }

    async fn register_inner(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        if self.credentials.find_by_email(email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let hasher = self.hasher.clone();
        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;

        let principal = self
            .credentials
            .insert(NewPrincipal::new(email, password_hash))
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    AuthError::EmailTaken
                } else {
                    AuthError::Store(e)
                }
            })?;

        info!(principal_id = principal.id, "사용자 등록 완료");
        Ok(principal)
    }

    /// 로그인.
    ///
    /// 존재하지 않는 이메일도 더미 해시와 비교해 응답 시간을 맞춥니다.
    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let result = self.login_inner(email, password).await;
        observe("login", &result);
        result
    }

    async fn login_inner(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let principal = self.credentials.find_by_email(email).await?;

        let hasher = self.hasher.clone();
        let password = password.to_string();

        let Some(principal) = principal else {
            tokio::task::spawn_blocking(move || hasher.verify_dummy(&password)).await?;
            debug!("로그인 실패: 사용자 없음");
            return Err(AuthError::UserNotFound);
        };

        let stored_hash = principal.password_hash.clone();
        let matched =
            tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash)).await??;
        if !matched {
            debug!(principal_id = principal.id, "로그인 실패: 비밀번호 불일치");
            return Err(AuthError::InvalidPassword);
        }

        let subject = principal.subject();
        let token_id = new_token_id();
        let pair = self.sign_pair(&subject, &token_id)?;

        self.ledger
            .set(&token_id, &subject, self.ttl.ledger())
            .await?;

        info!(principal_id = principal.id, jti = %token_id, "로그인 성공");
        Ok(pair)
    }

    /// Refresh Token 회전.
    ///
    /// 성공하면 제시된 토큰은 영구히 사용할 수 없게 되고 새 토큰 쌍이 발급됩니다.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let result = self.refresh_inner(refresh_token).await;
        observe("refresh", &result);
        result
    }

    async fn refresh_inner(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.codec.verify_refresh(refresh_token)?;
        let old_id = claims.token_id;

        match self.ledger.get(&old_id).await? {
            Some(recorded) if recorded == claims.subject => {}
            _ => {
                warn!(jti = %old_id, "회수되었거나 알 수 없는 refresh token");
                return Err(AuthError::RefreshTokenRevoked);
            }
        }

        let new_id = new_token_id();
        let pair = self.sign_pair(&claims.subject, &new_id)?;

        let rotated = self
            .ledger
            .rotate(&old_id, &new_id, &claims.subject, self.ttl.ledger())
            .await?;
        if !rotated {
            // 조회와 교체 사이에 다른 요청이 먼저 회수함
            warn!(jti = %old_id, "refresh token 동시 사용 감지");
            return Err(AuthError::RefreshTokenRevoked);
        }

        info!(subject = %claims.subject, old_jti = %old_id, new_jti = %new_id, "refresh token 회전");
        Ok(pair)
    }

    /// 로그아웃.
    ///
    /// 장부에 키가 없어도 성공으로 처리합니다 (멱등).
    #[instrument(skip_all)]
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let result = self.logout_inner(refresh_token).await;
        observe("logout", &result);
        result
    }

    async fn logout_inner(&self, refresh_token: &str) -> Result<(), AuthError> {
        let claims = self.codec.verify_refresh(refresh_token)?;
        let token_id = claims.token_id;

        let existed = self.ledger.delete(&token_id).await?;
        debug!(jti = %token_id, existed, "refresh token 회수");
        Ok(())
    }

    /// ID로 사용자를 조회합니다.
    pub async fn find_principal(&self, id: PrincipalId) -> Result<Option<Principal>, AuthError> {
        Ok(self.credentials.find_by_id(id).await?)
    }

    fn sign_pair(&self, subject: &str, token_id: &str) -> Result<TokenPair, AuthError> {
        let access = self.codec.sign_access(subject, self.ttl.access)?;
        let refresh = self.codec.sign_refresh(subject, self.ttl.refresh, token_id)?;
        Ok(TokenPair::bearer(access, refresh, self.ttl.access))
    }
}

fn new_token_id() -> String {
    Uuid::new_v4().to_string()
}

fn observe<T>(event: &'static str, result: &Result<T, AuthError>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(e) => e.outward().outcome(),
    };
    record_auth_event(event, outcome);
}
