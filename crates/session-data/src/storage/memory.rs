//! 인메모리 저장소.
//!
//! 외부 저장소와 동일한 의미(이메일 고유성, TTL 만료, 원자적 삭제)를
//! 프로세스 내부에서 제공합니다. 테스트와 `--memory` 개발 모드에서 사용합니다.
//!
//! 만료 판정은 `tokio::time::Instant` 기준이므로 테스트에서
//! `tokio::time::pause()` / `advance()` 로 시간을 조작할 수 있습니다.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use session_core::{NewPrincipal, Principal, PrincipalId};
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use crate::error::{Result, StoreError};
use crate::traits::{CredentialStore, TokenLedger};

#[derive(Default)]
struct CredentialTable {
    last_id: PrincipalId,
    by_id: HashMap<PrincipalId, Principal>,
    by_email: HashMap<String, PrincipalId>,
}

/// 인메모리 [`CredentialStore`].
#[derive(Default)]
pub struct MemoryCredentialStore {
    table: RwLock<CredentialTable>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 사용자 수.
    pub async fn len(&self) -> usize {
        self.table.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn insert(&self, principal: NewPrincipal) -> Result<Principal> {
        let mut table = self.table.write().await;

        if table.by_email.contains_key(&principal.email) {
            return Err(StoreError::UniqueViolation(
                "users_email_key".to_string(),
            ));
        }

        table.last_id += 1;
        let now = Utc::now();
        let record = Principal {
            id: table.last_id,
            email: principal.email,
            password_hash: principal.password_hash,
            verified: false,
            created_at: now,
            updated_at: now,
        };

        table.by_email.insert(record.email.clone(), record.id);
        table.by_id.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>> {
        let table = self.table.read().await;
        Ok(table
            .by_email
            .get(email)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: PrincipalId) -> Result<Option<Principal>> {
        Ok(self.table.read().await.by_id.get(&id).cloned())
    }
}

struct LedgerEntry {
    subject: String,
    expires_at: Instant,
}

impl LedgerEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// 인메모리 [`TokenLedger`].
///
/// 만료된 항목은 해당 키 접근 시, 그리고 쓰기(`set`, `rotate`) 때마다 일괄 제거합니다.
#[derive(Default)]
pub struct MemoryTokenLedger {
    entries: Mutex<HashMap<String, LedgerEntry>>,
}

impl MemoryTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 만료되지 않은 키 수.
    pub async fn live_count(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .values()
            .filter(|e| e.is_live(now))
            .count()
    }
}

#[async_trait]
impl TokenLedger for MemoryTokenLedger {
    async fn set(&self, key: &str, subject: &str, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        purge_expired(&mut entries, now);

        entries.insert(
            key.to_string(),
            LedgerEntry {
                subject: subject.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.subject.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let now = Instant::now();
        Ok(self
            .entries
            .lock()
            .await
            .remove(key)
            .is_some_and(|entry| entry.is_live(now)))
    }

    async fn rotate(
        &self,
        old_key: &str,
        new_key: &str,
        subject: &str,
        ttl: Duration,
    ) -> Result<bool> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        let owned = entries
            .get(old_key)
            .is_some_and(|entry| entry.is_live(now) && entry.subject == subject);
        if !owned {
            return Ok(false);
        }
        entries.remove(old_key);
        purge_expired(&mut entries, now);

        entries.insert(
            new_key.to_string(),
            LedgerEntry {
                subject: subject.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }
}

fn purge_expired(entries: &mut HashMap<String, LedgerEntry>, now: Instant) {
    entries.retain(|_, entry| entry.is_live(now));
}
