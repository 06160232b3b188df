//! JWT 토큰 처리.
//!
//! Access Token 및 Refresh Token 서명/검증 로직.
//!
//! 두 토큰은 같은 HS256 비밀 키로 서명되며 `token_type` 클레임으로 구분됩니다.
//! 모든 토큰은 고유한 `jti` 를 가지므로 같은 초에 발급된 토큰도 서로 다릅니다.
//! 장부에 기록되는 것은 Refresh Token 의 `jti` 뿐입니다.
//! 검증 실패 원인(서명, 알고리즘, 형식, 만료)은 호출자에게 구분하지 않고
//! [`TokenError::Invalid`] 하나로 돌려줍니다.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 토큰 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT 페이로드.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 사용자 ID
    pub sub: String,
    /// Issued At - 토큰 발급 시간 (Unix timestamp)
    pub iat: i64,
    /// Expiration - 토큰 만료 시간 (Unix timestamp)
    pub exp: i64,
    /// JWT ID - 토큰 고유 식별자
    pub jti: String,
    /// Token type
    pub token_type: TokenKind,
}

impl Claims {
    /// 새로운 Claims 생성.
    pub fn new(
        subject: impl Into<String>,
        kind: TokenKind,
        ttl: Duration,
        token_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            sub: subject.into(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: token_id.into(),
            token_type: kind,
        }
    }
}

/// 검증된 토큰 정보.
///
/// 디코딩된 원본 구조 대신 고정된 필드만 노출합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClaims {
    /// 사용자 ID 문자열
    pub subject: String,
    /// 토큰 식별자 (`jti`)
    pub token_id: String,
    /// 만료 시각
    pub expires_at: DateTime<Utc>,
    /// 토큰 종류
    pub kind: TokenKind,
}

/// JWT 토큰 에러.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("토큰 서명 실패: {0}")]
    Signing(String),
    #[error("유효하지 않은 토큰")]
    Invalid,
}

/// HS256 토큰 서명/검증기.
///
/// 비밀 키는 시작 시 한 번 주입되며 이후 변경되지 않습니다.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// 비밀 키로 코덱을 생성합니다.
    pub fn new(secret: &SecretString) -> Self {
        let secret = secret.expose_secret().as_bytes();

        // HS256 외 알고리즘은 헤더에 있어도 거부
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Access Token 서명. `jti` 는 매번 새로 생성합니다.
    pub fn sign_access(&self, subject: &str, ttl: Duration) -> Result<String, TokenError> {
        let token_id = Uuid::new_v4().to_string();
        self.sign(&Claims::new(subject, TokenKind::Access, ttl, token_id))
    }

    /// Refresh Token 서명.
    ///
    /// # Arguments
    ///
    /// * `subject` - 사용자 ID 문자열
    /// * `ttl` - 만료까지 남은 시간
    /// * `token_id` - 장부에 기록될 식별자
    pub fn sign_refresh(
        &self,
        subject: &str,
        ttl: Duration,
        token_id: &str,
    ) -> Result<String, TokenError> {
        self.sign(&Claims::new(subject, TokenKind::Refresh, ttl, token_id))
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// 토큰 검증.
    ///
    /// 서명, 알고리즘, 형식, 만료 중 하나라도 실패하면 [`TokenError::Invalid`].
    pub fn verify(&self, token: &str) -> Result<VerifiedClaims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| TokenError::Invalid)?;
        let claims = data.claims;

        if claims.jti.is_empty() {
            return Err(TokenError::Invalid);
        }

        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or(TokenError::Invalid)?;

        Ok(VerifiedClaims {
            subject: claims.sub,
            token_id: claims.jti,
            expires_at,
            kind: claims.token_type,
        })
    }

    /// Access Token 검증 (서명 + 만료만, 장부 조회 없음).
    pub fn verify_access(&self, token: &str) -> Result<VerifiedClaims, TokenError> {
        self.verify(token)
            .and_then(|claims| expect_kind(claims, TokenKind::Access))
    }

    /// Refresh Token 검증 (서명 + 만료). 장부 확인은 호출자가 합니다.
    pub fn verify_refresh(&self, token: &str) -> Result<VerifiedClaims, TokenError> {
        self.verify(token)
            .and_then(|claims| expect_kind(claims, TokenKind::Refresh))
    }
}

fn expect_kind(claims: VerifiedClaims, kind: TokenKind) -> Result<VerifiedClaims, TokenError> {
    if claims.kind == kind {
        Ok(claims)
    } else {
        Err(TokenError::Invalid)
    }
}

/// Access Token + Refresh Token 페어.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TokenPair {
    /// Access Token
    pub access_token: String,
    /// Refresh Token
    pub refresh_token: String,
    /// Access Token 만료 시간 (초)
    pub expires_in: i64,
    /// 토큰 타입 (항상 "Bearer")
    pub token_type: String,
}

impl TokenPair {
    pub fn bearer(access_token: String, refresh_token: String, access_ttl: Duration) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_in: access_ttl.num_seconds(),
            token_type: "Bearer".to_string(),
        }
    }
}
