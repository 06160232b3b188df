//! 세션 서비스 통합 테스트.
//!
//! 인메모리 저장소 위에서 공개 API만 사용합니다:
//! - register() / login() / refresh() / logout()
//! - Gatekeeper::check()
//!
//! 동시 갱신, 동시 가입, 장부 장애 상황도 함께 검증합니다.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap, HeaderValue};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Duration;
use proptest::prelude::*;
use secrecy::SecretString;
use session_api::auth::{
    AuthError, Gatekeeper, OutwardError, PasswordHasher, SessionService, TokenCodec, TokenTtl,
};
use session_core::PasswordConfig;
use session_data::{
    CredentialStore, MemoryCredentialStore, MemoryTokenLedger, StoreError, TokenLedger,
};

// ============================================================================
// 테스트 헬퍼 함수
// ============================================================================

const TEST_SECRET: &str = "integration-test-secret-key-minimum-32-chars";

fn fast_hasher() -> PasswordHasher {
    PasswordHasher::new(&PasswordConfig {
        memory_kib: 256,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap()
}

fn default_ttl() -> TokenTtl {
    TokenTtl {
        access: Duration::minutes(15),
        refresh: Duration::minutes(10080),
    }
}

fn build_service(
    credentials: Arc<dyn CredentialStore>,
    ledger: Arc<dyn TokenLedger>,
    ttl: TokenTtl,
) -> SessionService {
    SessionService::new(
        credentials,
        ledger,
        fast_hasher(),
        Arc::new(TokenCodec::new(&SecretString::new(TEST_SECRET.into()))),
        ttl,
    )
}

struct Harness {
    service: Arc<SessionService>,
    credentials: Arc<MemoryCredentialStore>,
    ledger: Arc<MemoryTokenLedger>,
}

fn harness() -> Harness {
    let credentials = Arc::new(MemoryCredentialStore::new());
    let ledger = Arc::new(MemoryTokenLedger::new());
    let service = build_service(credentials.clone(), ledger.clone(), default_ttl());

    Harness {
        service: Arc::new(service),
        credentials,
        ledger,
    }
}

fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
    headers
}

/// 조회는 되지만 쓰기(삭제/교체)는 실패하는 장부
struct ReadOnlyLedger(MemoryTokenLedger);

#[async_trait]
impl TokenLedger for ReadOnlyLedger {
    async fn set(
        &self,
        key: &str,
        subject: &str,
        ttl: std::time::Duration,
    ) -> session_data::Result<()> {
        self.0.set(key, subject, ttl).await
    }

    async fn get(&self, key: &str) -> session_data::Result<Option<String>> {
        self.0.get(key).await
    }

    async fn delete(&self, _key: &str) -> session_data::Result<bool> {
        Err(StoreError::Cache("READONLY You can't write against a read only replica".into()))
    }

    async fn rotate(
        &self,
        _old_key: &str,
        _new_key: &str,
        _subject: &str,
        _ttl: std::time::Duration,
    ) -> session_data::Result<bool> {
        Err(StoreError::Cache("READONLY You can't write against a read only replica".into()))
    }
}

// ============================================================================
// 시나리오
// ============================================================================

#[tokio::test]
async fn test_full_session_lifecycle() {
    let h = harness();

    let principal = h.service.register("a@x.com", "password123").await.unwrap();
    assert_eq!(principal.id, 1);
    assert_eq!(principal.email, "a@x.com");

    let (a1, r1) = {
        let pair = h.service.login("a@x.com", "password123").await.unwrap();
        (pair.access_token, pair.refresh_token)
    };

    let second = h.service.refresh(&r1).await.unwrap();
    assert_ne!(second.access_token, a1);
    assert_ne!(second.refresh_token, r1);

    // R1 은 이미 사용됨
    let replay = h.service.refresh(&r1).await.unwrap_err();
    assert!(matches!(replay, AuthError::RefreshTokenRevoked));

    h.service.logout(&second.refresh_token).await.unwrap();

    let after_logout = h.service.refresh(&second.refresh_token).await.unwrap_err();
    assert!(matches!(after_logout, AuthError::RefreshTokenRevoked));
    assert_eq!(h.ledger.live_count().await, 0);
}

#[tokio::test]
async fn test_register_twice_creates_single_record() {
    let h = harness();
    h.service.register("a@x.com", "password123").await.unwrap();

    let err = h.service.register("a@x.com", "password456").await.unwrap_err();
    assert_eq!(err.outward(), OutwardError::EmailTaken);
    assert_eq!(h.credentials.len().await, 1);
}

#[tokio::test]
async fn test_login_outcomes_are_indistinguishable() {
    let h = harness();
    h.service.register("a@x.com", "password123").await.unwrap();

    let wrong_password = h.service.login("a@x.com", "password124").await.unwrap_err();
    let unknown_email = h.service.login("nobody@x.com", "password123").await.unwrap_err();

    assert_eq!(wrong_password.outward(), OutwardError::InvalidCredentials);
    assert_eq!(wrong_password.outward(), unknown_email.outward());
}

#[tokio::test]
async fn test_tampered_refresh_token_rejected() {
    let h = harness();
    h.service.register("a@x.com", "password123").await.unwrap();
    h.service.register("b@x.com", "password123").await.unwrap();
    let pair = h.service.login("a@x.com", "password123").await.unwrap();

    // 서명 변조
    let mut chars: Vec<char> = pair.refresh_token.chars().collect();
    let target = chars.len() - 10;
    chars[target] = if chars[target] == 'A' { 'B' } else { 'A' };
    let forged_signature: String = chars.into_iter().collect();

    // subject 를 다른 사용자로 변경 (서명은 원본 유지)
    let parts: Vec<&str> = pair.refresh_token.split('.').collect();
    let mut claims: serde_json::Value =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
    claims["sub"] = serde_json::json!("2");
    let forged_subject = format!(
        "{}.{}.{}",
        parts[0],
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap()),
        parts[2]
    );

    for token in [forged_signature, forged_subject] {
        let err = h.service.refresh(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid));
        assert_eq!(err.outward(), OutwardError::InvalidSession);
    }

    // 원본은 여전히 유효
    assert!(h.service.refresh(&pair.refresh_token).await.is_ok());
}

#[tokio::test]
async fn test_logout_twice_is_not_an_error() {
    let h = harness();
    h.service.register("a@x.com", "password123").await.unwrap();
    let pair = h.service.login("a@x.com", "password123").await.unwrap();

    h.service.logout(&pair.refresh_token).await.unwrap();
    h.service.logout(&pair.refresh_token).await.unwrap();
}

#[tokio::test]
async fn test_gatekeeper_accepts_access_token_until_expiry() {
    let credentials = Arc::new(MemoryCredentialStore::new());
    let service = build_service(
        credentials,
        Arc::new(MemoryTokenLedger::new()),
        TokenTtl {
            access: Duration::seconds(1),
            refresh: Duration::minutes(60),
        },
    );
    let gatekeeper = Gatekeeper::new(service.codec().clone());

    let principal = service.register("a@x.com", "password123").await.unwrap();
    let pair = service.login("a@x.com", "password123").await.unwrap();

    let subject = gatekeeper.check(&bearer(&pair.access_token)).unwrap();
    assert_eq!(subject.principal_id, principal.id);

    // 로그아웃해도 access token 은 만료 전까지 유효
    service.logout(&pair.refresh_token).await.unwrap();
    assert!(gatekeeper.check(&bearer(&pair.access_token)).is_ok());

    tokio::time::sleep(std::time::Duration::from_millis(2100)).await;
    assert!(gatekeeper.check(&bearer(&pair.access_token)).is_err());
}

// ============================================================================
// 동시성
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_refresh_has_single_winner() {
    let h = harness();
    h.service.register("a@x.com", "password123").await.unwrap();
    let pair = h.service.login("a@x.com", "password123").await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = h.service.clone();
            let token = pair.refresh_token.clone();
            tokio::spawn(async move { service.refresh(&token).await })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(e) => assert!(matches!(e, AuthError::RefreshTokenRevoked)),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(h.ledger.live_count().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_register_has_single_winner() {
    let h = harness();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let service = h.service.clone();
            tokio::spawn(async move {
                service
                    .register("race@x.com", &format!("password-{}", i))
                    .await
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(e) => assert!(matches!(e, AuthError::EmailTaken)),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(h.credentials.len().await, 1);
}

// ============================================================================
// 장부 장애
// ============================================================================

#[tokio::test]
async fn test_failed_revoke_issues_no_tokens() {
    let ledger = Arc::new(ReadOnlyLedger(MemoryTokenLedger::new()));
    let service = build_service(
        Arc::new(MemoryCredentialStore::new()),
        ledger.clone(),
        default_ttl(),
    );

    service.register("a@x.com", "password123").await.unwrap();
    let pair = service.login("a@x.com", "password123").await.unwrap();

    let err = service.refresh(&pair.refresh_token).await.unwrap_err();
    assert!(matches!(err, AuthError::Store(_)));
    assert_eq!(err.outward(), OutwardError::Internal);

    // 새 키가 기록되지 않았고 원래 키는 그대로
    assert_eq!(ledger.0.live_count().await, 1);

    let err = service.logout(&pair.refresh_token).await.unwrap_err();
    assert_eq!(err.outward(), OutwardError::Internal);
}

// ============================================================================
// 속성 테스트
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn prop_register_then_login_succeeds(
        local in "[a-z]{1,12}",
        domain in "[a-z]{1,8}",
        password in "[A-Za-z0-9!@#]{8,24}",
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let h = harness();
            let email = format!("{}@{}.com", local, domain);

            let principal = h.service.register(&email, &password).await.unwrap();
            let pair = h.service.login(&email, &password).await.unwrap();

            let claims = h.service.codec().verify_access(&pair.access_token).unwrap();
            assert_eq!(claims.subject, principal.id.to_string());
            assert!(h.service.refresh(&pair.refresh_token).await.is_ok());
        });
    }
}
