//! 인증 및 세션 관리.
//!
//! # 구성 요소
//!
//! - [`PasswordHasher`]: Argon2id 비밀번호 해싱
//! - [`TokenCodec`]: HS256 access / refresh token 서명 및 검증
//! - [`SessionService`]: 회원가입 / 로그인 / 갱신 / 로그아웃
//! - [`Gatekeeper`]: 보호 라우트 진입 시 access token 검증
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! // 보호된 라우트에서 AuthSubject 추출기 사용
//! async fn protected_handler(subject: AuthSubject) -> impl IntoResponse {
//!     format!("Hello, {}!", subject.principal_id)
//! }
//! ```

mod error;
mod jwt;
mod middleware;
mod password;
mod service;

pub use error::{AuthError, OutwardError};
pub use jwt::{Claims, TokenCodec, TokenError, TokenKind, TokenPair, VerifiedClaims};
pub use middleware::{require_auth, AuthSubject, Gatekeeper, GatekeeperError, ACCESS_TOKEN_COOKIE};
pub use password::{PasswordError, PasswordHasher};
pub use service::{SessionService, TokenTtl};
