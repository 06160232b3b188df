//! 저장소 구현.
//!
//! - [`postgres`]: sqlx 기반 사용자 저장소
//! - [`redis`]: Redis 기반 refresh token 장부
//! - [`memory`]: 테스트/개발용 인메모리 구현

pub mod memory;
pub mod postgres;
pub mod redis;
