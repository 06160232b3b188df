//! 인증 에러.
//!
//! 내부 에러는 원인을 구분하지만, 외부로 나가는 응답은 [`OutwardError`] 로
//! 접어서 어떤 세부 조건(모르는 이메일/틀린 비밀번호, 만료/회수/위조)이
//! 거절을 일으켰는지 드러내지 않습니다.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use session_data::StoreError;
use tracing::error;

use super::jwt::TokenError;
use super::password::PasswordError;
use crate::error::ApiErrorResponse;

/// 세션 서비스 에러.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("이미 등록된 이메일")]
    EmailTaken,
    #[error("사용자를 찾을 수 없음")]
    UserNotFound,
    #[error("비밀번호 불일치")]
    InvalidPassword,
    #[error("유효하지 않은 토큰")]
    TokenInvalid,
    #[error("회수되었거나 존재하지 않는 refresh token")]
    RefreshTokenRevoked,

    #[error("저장소 에러: {0}")]
    Store(#[from] StoreError),
    #[error("비밀번호 처리 에러: {0}")]
    Password(#[from] PasswordError),
    #[error("토큰 발급 에러: {0}")]
    Token(TokenError),
    #[error("작업 실행 실패: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Invalid => AuthError::TokenInvalid,
            other => AuthError::Token(other),
        }
    }
}

/// 외부로 노출되는 에러 분류.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutwardError {
    /// 로그인 실패 (모르는 이메일 / 틀린 비밀번호)
    InvalidCredentials,
    /// refresh / logout 실패 (위조 / 만료 / 회수)
    InvalidSession,
    /// 회원가입 이메일 중복
    EmailTaken,
    /// 인프라 장애
    Internal,
}

impl OutwardError {
    pub fn status(self) -> StatusCode {
        match self {
            OutwardError::InvalidCredentials | OutwardError::InvalidSession => {
                StatusCode::UNAUTHORIZED
            }
            OutwardError::EmailTaken => StatusCode::CONFLICT,
            OutwardError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            OutwardError::InvalidCredentials => "INVALID_CREDENTIALS",
            OutwardError::InvalidSession => "INVALID_SESSION",
            OutwardError::EmailTaken => "EMAIL_TAKEN",
            OutwardError::Internal => "INTERNAL_ERROR",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            OutwardError::InvalidCredentials => "이메일 또는 비밀번호가 올바르지 않습니다",
            OutwardError::InvalidSession => "유효하지 않거나 만료된 세션입니다",
            OutwardError::EmailTaken => "이미 등록된 이메일입니다",
            OutwardError::Internal => "요청을 처리할 수 없습니다",
        }
    }

    /// 메트릭 라벨용 결과 이름.
    pub fn outcome(self) -> &'static str {
        match self {
            OutwardError::InvalidCredentials => "invalid_credentials",
            OutwardError::InvalidSession => "invalid_session",
            OutwardError::EmailTaken => "email_taken",
            OutwardError::Internal => "error",
        }
    }
}

impl AuthError {
    /// 외부 응답용 분류로 접습니다.
    pub fn outward(&self) -> OutwardError {
        match self {
            AuthError::EmailTaken => OutwardError::EmailTaken,
            AuthError::UserNotFound | AuthError::InvalidPassword => {
                OutwardError::InvalidCredentials
            }
            AuthError::TokenInvalid | AuthError::RefreshTokenRevoked => {
                OutwardError::InvalidSession
            }
            AuthError::Store(_)
            | AuthError::Password(_)
            | AuthError::Token(_)
            | AuthError::Task(_) => OutwardError::Internal,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let outward = self.outward();
        if outward == OutwardError::Internal {
            error!(error = %self, "인증 처리 중 내부 오류");
        }

        ApiErrorResponse::new(outward.code(), outward.message()).into_response_with(outward.status())
    }
}
