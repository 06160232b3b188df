//! TokenLedger 계약 통합 테스트
//!
//! 동시 회수 시 단 하나의 호출만 성공하는지, 기본 rotate 구현이
//! subject 확인과 delete 결과를 따르는지 확인합니다.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use session_data::{MemoryTokenLedger, Result, TokenLedger};

/// rotate 를 재정의하지 않는 래퍼 (기본 구현 검증용)
struct DefaultRotateLedger(MemoryTokenLedger);

#[async_trait]
impl TokenLedger for DefaultRotateLedger {
    async fn set(&self, key: &str, subject: &str, ttl: Duration) -> Result<()> {
        self.0.set(key, subject, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.0.get(key).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.0.delete(key).await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_delete_has_single_winner() {
    let ledger = Arc::new(MemoryTokenLedger::new());
    ledger.set("jti", "1", Duration::from_secs(60)).await.unwrap();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.delete("jti").await.unwrap() })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_rotate_has_single_winner() {
    let ledger = Arc::new(MemoryTokenLedger::new());
    ledger.set("old", "1", Duration::from_secs(60)).await.unwrap();

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                let new_key = format!("new-{}", i);
                ledger
                    .rotate("old", &new_key, "1", Duration::from_secs(60))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
    assert_eq!(ledger.live_count().await, 1);
}

#[tokio::test]
async fn test_default_rotate_follows_delete() {
    let ledger = DefaultRotateLedger(MemoryTokenLedger::new());
    ledger.set("old", "1", Duration::from_secs(60)).await.unwrap();

    assert!(ledger
        .rotate("old", "new", "1", Duration::from_secs(60))
        .await
        .unwrap());
    assert_eq!(ledger.get("new").await.unwrap().as_deref(), Some("1"));

    assert!(!ledger
        .rotate("old", "newer", "1", Duration::from_secs(60))
        .await
        .unwrap());
    assert_eq!(ledger.get("newer").await.unwrap(), None);
}

#[tokio::test]
async fn test_default_rotate_requires_matching_subject() {
    let ledger = DefaultRotateLedger(MemoryTokenLedger::new());
    ledger.set("old", "1", Duration::from_secs(60)).await.unwrap();

    assert!(!ledger
        .rotate("old", "new", "2", Duration::from_secs(60))
        .await
        .unwrap());
    assert_eq!(ledger.get("old").await.unwrap().as_deref(), Some("1"));
    assert_eq!(ledger.get("new").await.unwrap(), None);
}
