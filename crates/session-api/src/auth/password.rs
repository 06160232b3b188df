//! 비밀번호 해싱.
//!
//! Argon2id 기반 비밀번호 해싱 및 검증. 작업 계수는 설정에서 받습니다.
//! 해시 문자열(PHC 형식)에 알고리즘, 작업 계수, 솔트가 모두 포함되므로
//! 검증은 해시에 기록된 파라미터로 다시 계산합니다.

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use session_core::PasswordConfig;

/// 비밀번호 처리 에러.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("비밀번호 해싱 실패")]
    HashingFailed,
    #[error("비밀번호 검증 실패")]
    VerificationFailed,
    #[error("잘못된 해시 형식")]
    InvalidHashFormat,
    #[error("잘못된 Argon2 파라미터: {0}")]
    InvalidParams(String),
}

/// 설정된 작업 계수를 갖는 Argon2id 해셔.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    /// 존재하지 않는 사용자 로그인 시 비교용 해시
    dummy_hash: String,
}

impl PasswordHasher {
    /// 작업 계수로 해셔를 생성합니다.
    ///
    /// 응답 시간 비교 기준이 되는 더미 해시를 한 번 계산합니다.
    pub fn new(config: &PasswordConfig) -> Result<Self, PasswordError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let dummy_hash = hash_with(&argon2, "dummy-password-for-timing")?;

        Ok(Self { argon2, dummy_hash })
    }

    /// 비밀번호 해싱.
    ///
    /// 솔트는 자동으로 생성됩니다.
    ///
    /// # Returns
    ///
    /// PHC 형식의 해시 문자열 (솔트 포함)
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let hash = hasher.hash("my_secure_password")?;
    /// // "$argon2id$v=19$m=19456,t=2,p=1$..."
    /// ```
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        hash_with(&self.argon2, password)
    }

    /// 비밀번호 검증.
    ///
    /// 일치하면 `Ok(true)`, 불일치하면 `Ok(false)`.
    /// 해시 비교는 상수 시간으로 수행됩니다.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(_) => Err(PasswordError::VerificationFailed),
        }
    }

    /// 더미 해시와 비교합니다. 결과는 항상 버립니다.
    ///
    /// 존재하지 않는 이메일과 틀린 비밀번호의 응답 시간을 맞추기 위해 사용합니다.
    pub fn verify_dummy(&self, password: &str) {
        let _ = self.verify(password, &self.dummy_hash);
    }
}

fn hash_with(argon2: &Argon2<'_>, password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| PasswordError::HashingFailed)?;

    Ok(hash.to_string())
}
