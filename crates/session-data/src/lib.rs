//! # Session Data
//!
//! 세션 서비스가 사용하는 두 외부 저장소의 계약과 어댑터를 제공합니다.
//!
//! - [`CredentialStore`]: 사용자 레코드의 영속 저장소 (PostgreSQL)
//! - [`TokenLedger`]: Refresh Token 식별자 → 사용자 ID 의 휘발성 저장소 (Redis)
//!
//! 테스트와 개발 모드를 위해 동일한 의미를 갖는 인메모리 구현도 포함합니다.

pub mod error;
pub mod storage;
pub mod traits;

pub use error::{Result, StoreError};
pub use storage::memory::{MemoryCredentialStore, MemoryTokenLedger};
pub use storage::postgres::{Database, PgCredentialStore};
pub use storage::redis::RedisTokenLedger;
pub use traits::{CredentialStore, TokenLedger};
