//! Redis refresh token 장부.
//!
//! 키는 `{prefix}{jti}`, 값은 사용자 ID 문자열이며 `SET EX` 로 TTL을 부여합니다.
//! 회수는 `DEL` 의 삭제 개수로 판정하므로 같은 토큰에 대한 동시 회수 중
//! 하나만 성공합니다.

use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, Script};
use session_core::RedisConfig;
use tracing::{debug, info, instrument};

use crate::error::{Result, StoreError};
use crate::traits::TokenLedger;

/// 이전 키가 같은 subject 로 존재할 때만 새 키로 교체하는 스크립트.
///
/// subject 가 다르면 이전 키도 그대로 둡니다.
const ROTATE_SCRIPT: &str = r#"
if redis.call('GET', KEYS[1]) ~= ARGV[1] then
    return 0
end
redis.call('DEL', KEYS[1])
redis.call('SET', KEYS[2], ARGV[1], 'EX', ARGV[2])
return 1
"#;

/// Redis 기반 [`TokenLedger`].
#[derive(Clone)]
pub struct RedisTokenLedger {
    connection: ConnectionManager,
    key_prefix: String,
    rotate_script: Script,
}

impl RedisTokenLedger {
    /// 새로운 Redis 연결을 생성합니다.
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        info!("Connecting to Redis...");

        let client = Client::open(config.url.as_str())?;
        let connection = ConnectionManager::new(client).await?;

        info!("Redis connection established");

        Ok(Self {
            connection,
            key_prefix: config.key_prefix.clone(),
            rotate_script: Script::new(ROTATE_SCRIPT),
        })
    }

    /// Redis 상태를 확인합니다.
    pub async fn health_check(&self) -> Result<bool> {
        let mut conn = self.connection.clone();
        let result: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(result == "PONG")
    }

    fn key(&self, jti: &str) -> String {
        format!("{}{}", self.key_prefix, jti)
    }
}

/// `SET EX 0` 은 오류이므로 최소 1초.
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl TokenLedger for RedisTokenLedger {
    #[instrument(skip(self, subject))]
    async fn set(&self, key: &str, subject: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.connection.clone();
        let _: () = conn.set_ex(self.key(key), subject, ttl_secs(ttl)).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(self.key(key)).await?;
        Ok(value)
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection.clone();
        let deleted: i64 = conn.del(self.key(key)).await?;
        debug!(existed = deleted > 0, "Ledger key deleted");
        Ok(deleted > 0)
    }

    #[instrument(skip(self, subject))]
    async fn rotate(
        &self,
        old_key: &str,
        new_key: &str,
        subject: &str,
        ttl: Duration,
    ) -> Result<bool> {
        let mut conn = self.connection.clone();
        let rotated: i64 = self
            .rotate_script
            .key(self.key(old_key))
            .key(self.key(new_key))
            .arg(subject)
            .arg(ttl_secs(ttl))
            .invoke_async(&mut conn)
            .await
            .map_err(|e| StoreError::Cache(e.to_string()))?;

        Ok(rotated == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_secs_has_floor() {
        assert_eq!(ttl_secs(Duration::from_millis(10)), 1);
        assert_eq!(ttl_secs(Duration::from_secs(600)), 600);
    }

    #[tokio::test]
    #[ignore = "requires running Redis (REDIS_URL)"]
    async fn test_redis_single_use_delete() {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379/0".into());
        let config = RedisConfig {
            url,
            key_prefix: "test:refresh:".to_string(),
        };
        let ledger = RedisTokenLedger::connect(&config).await.unwrap();

        ledger.set("jti-1", "7", Duration::from_secs(60)).await.unwrap();
        assert_eq!(ledger.get("jti-1").await.unwrap().as_deref(), Some("7"));

        assert!(ledger
            .rotate("jti-1", "jti-2", "7", Duration::from_secs(60))
            .await
            .unwrap());
        assert!(!ledger
            .rotate("jti-1", "jti-3", "7", Duration::from_secs(60))
            .await
            .unwrap());
        assert_eq!(ledger.get("jti-3").await.unwrap(), None);

        // 다른 subject 로는 교체되지 않고 원래 키도 유지
        assert!(!ledger
            .rotate("jti-2", "jti-4", "8", Duration::from_secs(60))
            .await
            .unwrap());
        assert_eq!(ledger.get("jti-2").await.unwrap().as_deref(), Some("7"));
        assert_eq!(ledger.get("jti-4").await.unwrap(), None);

        assert!(ledger.delete("jti-2").await.unwrap());
        assert!(!ledger.delete("jti-2").await.unwrap());
    }
}
