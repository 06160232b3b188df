//! 저장소 오류 타입.

use thiserror::Error;

/// PostgreSQL 고유 제약 조건 위반 SQLSTATE.
const PG_UNIQUE_VIOLATION: &str = "23505";

/// 저장소 관련 오류.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 고유 제약 조건 위반 (예: 이메일 중복)
    #[error("Unique violation: {0}")]
    UniqueViolation(String),

    /// 데이터베이스 연결 오류
    #[error("Database connection error: {0}")]
    Connection(String),

    /// 쿼리 실행 오류
    #[error("Query error: {0}")]
    Query(String),

    /// 캐시(ledger) 오류
    #[error("Cache error: {0}")]
    Cache(String),

    /// 마이그레이션 오류
    #[error("Migration error: {0}")]
    Migration(String),
}

impl StoreError {
    /// 고유 제약 조건 위반인지 확인합니다.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::Connection(err.to_string())
            }
            sqlx::Error::Io(e) => StoreError::Connection(e.to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.code().as_deref() == Some(PG_UNIQUE_VIOLATION) {
                    StoreError::UniqueViolation(db_err.message().to_string())
                } else {
                    StoreError::Query(db_err.message().to_string())
                }
            }
            _ => StoreError::Query(err.to_string()),
        }
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Cache(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
