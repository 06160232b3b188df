//! 저장소 추상화.
//!
//! 세션 서비스는 구체 저장소가 아닌 이 trait들에 의존합니다.
//! 각 구현은 여러 요청 워커가 동시에 호출해도 안전해야 합니다.

use std::time::Duration;

use async_trait::async_trait;
use session_core::{NewPrincipal, Principal, PrincipalId};

use crate::error::Result;

/// 사용자 레코드 영속 저장소.
///
/// 이메일 고유성은 저장소 수준에서 보장되어야 합니다.
/// 사전 조회 없이 중복 삽입을 시도하면 [`StoreError::UniqueViolation`] 을 반환합니다.
///
/// [`StoreError::UniqueViolation`]: crate::StoreError::UniqueViolation
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// 새 사용자를 삽입하고 저장소가 할당한 ID/타임스탬프를 포함한 레코드를 반환합니다.
    async fn insert(&self, principal: NewPrincipal) -> Result<Principal>;

    /// 이메일로 사용자를 조회합니다.
    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>>;

    /// ID로 사용자를 조회합니다.
    async fn find_by_id(&self, id: PrincipalId) -> Result<Option<Principal>>;
}

/// Refresh Token 식별자 장부.
///
/// `jti → subject` 매핑을 TTL과 함께 보관합니다.
#[async_trait]
pub trait TokenLedger: Send + Sync {
    /// 키를 기록합니다. 기존 값은 덮어씁니다.
    async fn set(&self, key: &str, subject: &str, ttl: Duration) -> Result<()>;

    /// 키에 기록된 subject 를 조회합니다. 없거나 만료되었으면 `None`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// 키를 삭제합니다.
    ///
    /// 키가 존재했으면 `true`. 저장소 수준에서 원자적이어야 하며,
    /// 동시에 같은 키를 삭제하는 호출 중 하나만 `true` 를 받습니다.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// `old_key` 를 `new_key` 로 교체합니다.
    ///
    /// `old_key` 가 같은 `subject` 로 존재했을 때만 `new_key` 를 기록하고 `true` 를 반환합니다.
    /// 기본 구현은 get, delete, set 세 단계이며, 단계 사이에 장애가 나면
    /// 사용자에게 유효한 refresh token 이 남지 않을 수 있습니다.
    /// 저장소가 지원하면 단일 원자 연산으로 재정의합니다.
    async fn rotate(
        &self,
        old_key: &str,
        new_key: &str,
        subject: &str,
        ttl: Duration,
    ) -> Result<bool> {
        if self.get(old_key).await?.as_deref() != Some(subject) {
            return Ok(false);
        }
        if !self.delete(old_key).await? {
            return Ok(false);
        }
        self.set(new_key, subject, ttl).await?;
        Ok(true)
    }
}
