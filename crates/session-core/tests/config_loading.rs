//! 설정 로드 통합 테스트
//!
//! TOML 파일과 `SESSION__*` 환경 변수의 적용 순서를 확인합니다.
//! 환경 변수를 바꾸는 테스트는 하나뿐이므로 병렬 실행과 충돌하지 않습니다.

use std::path::PathBuf;

use secrecy::ExposeSecret;
use session_core::{AppConfig, LogFormat};

// ============================================================================
// 테스트 헬퍼 함수
// ============================================================================

const SECRET: &str = "config-loading-test-secret-minimum-32-bytes";

fn write_config(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("session-{}-{}.toml", name, std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

// ============================================================================
// 테스트
// ============================================================================

#[test]
fn test_file_then_env_override() {
    let path = write_config(
        "layered",
        &format!(
            r#"
            [server]
            port = 9090

            [auth]
            jwt_secret = "{}"
            access_token_ttl_minutes = 5

            [logging]
            format = "json"
            "#,
            SECRET
        ),
    );

    std::env::set_var("SESSION__AUTH__ACCESS_TOKEN_TTL_MINUTES", "30");
    let loaded = AppConfig::load(&path);
    std::env::remove_var("SESSION__AUTH__ACCESS_TOKEN_TTL_MINUTES");
    let _ = std::fs::remove_file(&path);

    let config = loaded.unwrap();
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.auth.jwt_secret.expose_secret(), SECRET);
    // 환경 변수가 파일 값보다 우선
    assert_eq!(config.auth.access_token_ttl_minutes, 30);
    assert_eq!(config.auth.refresh_token_ttl_minutes, 10080);
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn test_invalid_file_values_refuse_to_load() {
    // 32바이트 미만 비밀 키
    let path = write_config("invalid", "[auth]\njwt_secret = \"too-short\"\n");

    let loaded = AppConfig::load(&path);
    let _ = std::fs::remove_file(&path);

    assert!(loaded.is_err());
}
