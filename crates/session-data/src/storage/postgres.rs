//! PostgreSQL 사용자 저장소.
//!
//! `users` 테이블의 `users_email_key` 고유 제약이 이메일 중복을 최종적으로 막습니다.

use std::time::Duration;

use async_trait::async_trait;
use session_core::{DatabaseConfig, NewPrincipal, Principal, PrincipalId};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info, instrument};

use crate::error::{Result, StoreError};
use crate::traits::CredentialStore;

/// 데이터베이스 연결 풀 래퍼.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 새로운 데이터베이스 연결 풀을 생성합니다.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        info!("Database connection established");

        Ok(Self { pool })
    }

    /// 기존 연결 풀에서 Database 인스턴스를 생성합니다.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 내부 연결 풀을 반환합니다.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 데이터베이스 마이그레이션을 실행합니다.
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations...");

        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        info!("Migrations completed successfully");
        Ok(())
    }

    /// 데이터베이스 상태를 확인합니다.
    pub async fn health_check(&self) -> Result<bool> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(true)
    }
}

/// PostgreSQL 기반 [`CredentialStore`].
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    #[instrument(skip(self, principal), fields(email = %principal.email))]
    async fn insert(&self, principal: NewPrincipal) -> Result<Principal> {
        let record = sqlx::query_as::<_, Principal>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, verified, created_at, updated_at
            "#,
        )
        .bind(&principal.email)
        .bind(&principal.password_hash)
        .fetch_one(&self.pool)
        .await?;

        debug!(principal_id = record.id, "User row inserted");
        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>> {
        let record = sqlx::query_as::<_, Principal>(
            r#"
            SELECT id, email, password_hash, verified, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_by_id(&self, id: PrincipalId) -> Result<Option<Principal>> {
        let record = sqlx::query_as::<_, Principal>(
            r#"
            SELECT id, email, password_hash, verified, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}
