//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 `Arc` 로 래핑되어 여러 요청 간에 공유됩니다.
//! 시작 후에는 변경되지 않습니다.

use std::sync::Arc;

use axum::extract::FromRef;
use session_core::AppConfig;
use session_data::{CredentialStore, Database, RedisTokenLedger, TokenLedger};

use crate::auth::{
    Gatekeeper, PasswordError, PasswordHasher, SessionService, TokenCodec, TokenTtl,
};

/// 세션 쿠키 설정.
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    /// `Secure` 속성 여부
    pub secure: bool,
    /// access_token 쿠키 max-age
    pub access_max_age: time::Duration,
    /// refresh_token 쿠키 max-age
    pub refresh_max_age: time::Duration,
}

impl CookieSettings {
    pub fn new(secure: bool, ttl: TokenTtl) -> Self {
        Self {
            secure,
            access_max_age: time::Duration::seconds(ttl.access.num_seconds()),
            refresh_max_age: time::Duration::seconds(ttl.refresh.num_seconds()),
        }
    }
}

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 세션 서비스 - 회원가입, 로그인, 갱신, 로그아웃
    pub service: Arc<SessionService>,

    /// 보호 라우트용 access token 검증기
    pub gatekeeper: Gatekeeper,

    /// 세션 쿠키 설정
    pub cookies: CookieSettings,

    /// 데이터베이스 연결 (readiness 확인용, 인메모리 모드에서는 None)
    pub db: Option<Database>,

    /// Redis 장부 (readiness 확인용, 인메모리 모드에서는 None)
    pub redis: Option<RedisTokenLedger>,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 설정과 저장소로 상태를 구성합니다.
    ///
    /// 서명 키는 여기서 한 번 읽혀 코덱에 주입되며,
    /// 서비스와 Gatekeeper 가 같은 코덱을 공유합니다.
    pub fn new(
        config: &AppConfig,
        credentials: Arc<dyn CredentialStore>,
        ledger: Arc<dyn TokenLedger>,
    ) -> Result<Self, PasswordError> {
        let codec = Arc::new(TokenCodec::new(&config.auth.jwt_secret));
        let ttl = TokenTtl::from_config(&config.auth);
        let hasher = PasswordHasher::new(&config.password)?;

        let service = SessionService::new(credentials, ledger, hasher, codec.clone(), ttl);

        Ok(Self {
            service: Arc::new(service),
            gatekeeper: Gatekeeper::new(codec),
            cookies: CookieSettings::new(config.auth.cookie_secure, ttl),
            db: None,
            redis: None,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// 데이터베이스 연결 설정.
    pub fn with_db(mut self, db: Database) -> Self {
        self.db = Some(db);
        self
    }

    /// Redis 장부 설정.
    pub fn with_redis(mut self, redis: RedisTokenLedger) -> Self {
        self.redis = Some(redis);
        self
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        (chrono::Utc::now() - self.started_at).num_seconds()
    }

    /// 데이터베이스 연결 상태 확인.
    pub async fn is_db_healthy(&self) -> bool {
        match &self.db {
            Some(db) => db.health_check().await.unwrap_or(false),
            None => false,
        }
    }

    /// Redis 연결 상태 확인.
    pub async fn is_redis_healthy(&self) -> bool {
        match &self.redis {
            Some(redis) => redis.health_check().await.unwrap_or(false),
            None => false,
        }
    }
}

impl FromRef<Arc<AppState>> for Gatekeeper {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.gatekeeper.clone()
    }
}

/// 테스트용 AppState 생성.
///
/// 인메모리 저장소와 낮은 Argon2 작업 계수를 사용합니다.
#[cfg(test)]
pub fn create_test_state() -> AppState {
    use secrecy::SecretString;
    use session_data::{MemoryCredentialStore, MemoryTokenLedger};

    let mut config = AppConfig::default();
    config.auth.jwt_secret = SecretString::new("test-secret-key-for-session-api-minimum-32".into());
    config.auth.cookie_secure = false;
    config.password.memory_kib = 256;
    config.password.iterations = 1;

    AppState::new(
        &config,
        Arc::new(MemoryCredentialStore::new()),
        Arc::new(MemoryTokenLedger::new()),
    )
    .expect("test password params are valid")
}
