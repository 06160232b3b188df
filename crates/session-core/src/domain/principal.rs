//! 사용자(Principal) 레코드.
//!
//! 인증 가능한 등록된 신원을 나타냅니다.
//! 비밀번호는 평문이 아닌 해시 문자열로만 보관됩니다.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// 사용자 식별자 (저장소가 할당).
pub type PrincipalId = i64;

/// 등록된 사용자 레코드.
#[derive(Clone, Serialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Principal {
    /// 고유 식별자
    pub id: PrincipalId,
    /// 이메일 (저장된 그대로, 대소문자 구분)
    pub email: String,
    /// PHC 형식 비밀번호 해시
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// 이메일 인증 여부
    pub verified: bool,
    /// 생성 시각
    pub created_at: DateTime<Utc>,
    /// 마지막 수정 시각
    pub updated_at: DateTime<Utc>,
}

impl Principal {
    /// 토큰 subject 로 사용되는 문자열 식별자.
    pub fn subject(&self) -> String {
        self.id.to_string()
    }

    /// 토큰 subject 문자열을 사용자 ID로 변환합니다.
    ///
    /// 숫자가 아니면 `None`.
    pub fn parse_subject(subject: &str) -> Option<PrincipalId> {
        subject.parse().ok()
    }
}

// 해시 값도 로그에 남기지 않는다.
impl std::fmt::Debug for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Principal")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("verified", &self.verified)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// 신규 사용자 입력.
///
/// ID와 타임스탬프는 저장소가 채웁니다.
#[derive(Clone)]
pub struct NewPrincipal {
    pub email: String,
    pub password_hash: String,
}

impl NewPrincipal {
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password_hash: password_hash.into(),
        }
    }
}

impl std::fmt::Debug for NewPrincipal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewPrincipal")
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Principal {
        let now = Utc::now();
        Principal {
            id: 42,
            email: "a@x.com".to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_subject_roundtrip() {
        let principal = sample();
        assert_eq!(principal.subject(), "42");
        assert_eq!(Principal::parse_subject(&principal.subject()), Some(42));
    }

    #[test]
    fn test_parse_subject_rejects_non_numeric() {
        assert_eq!(Principal::parse_subject("abc"), None);
        assert_eq!(Principal::parse_subject(""), None);
    }

    #[test]
    fn test_debug_redacts_hash() {
        let principal = sample();
        let debug = format!("{:?}", principal);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("argon2id"));

        let new = NewPrincipal::new("b@x.com", "$argon2id$secret");
        assert!(!format!("{:?}", new).contains("argon2id"));
    }

    #[test]
    fn test_serialization_skips_hash() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "a@x.com");
    }
}
