//! 세션 API 서버.
//!
//! 설정을 읽고 저장소에 연결한 뒤 Axum 서버를 시작합니다.
//!
//! # 실행 옵션
//!
//! - `--memory`: PostgreSQL / Redis 대신 인메모리 저장소 사용 (개발용)
//! - `--export-openapi`: OpenAPI JSON 을 stdout 으로 출력하고 종료

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use session_core::{init_logging, AppConfig};
use session_data::{
    CredentialStore, Database, MemoryCredentialStore, MemoryTokenLedger, PgCredentialStore,
    RedisTokenLedger, TokenLedger,
};
use tracing::{error, info, warn};

use session_api::metrics::setup_metrics_recorder;
use session_api::state::AppState;

/// OpenAPI 스펙 내보내기 처리.
///
/// `--export-openapi` 플래그가 있으면 스펙을 출력하고 `true` 를 반환합니다.
fn handle_export_openapi() -> anyhow::Result<bool> {
    use session_api::openapi::ApiDoc;
    use utoipa::OpenApi as _;

    if !std::env::args().any(|arg| arg == "--export-openapi") {
        return Ok(false);
    }

    let json = serde_json::to_string_pretty(&ApiDoc::openapi())?;
    println!("{}", json);
    Ok(true)
}

fn use_memory_stores() -> bool {
    std::env::args().any(|arg| arg == "--memory")
}

/// 저장소 연결 후 AppState 생성.
async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    if use_memory_stores() {
        warn!("인메모리 저장소 사용 (재시작 시 모든 사용자/세션 소실)");
        let credentials: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
        let ledger: Arc<dyn TokenLedger> = Arc::new(MemoryTokenLedger::new());
        return AppState::new(config, credentials, ledger).context("Argon2 설정 오류");
    }

    let db = Database::connect(&config.database)
        .await
        .context("PostgreSQL 연결 실패")?;
    db.migrate().await.context("마이그레이션 실패")?;

    let redis = RedisTokenLedger::connect(&config.redis)
        .await
        .context("Redis 연결 실패")?;

    let credentials: Arc<dyn CredentialStore> = Arc::new(PgCredentialStore::new(db.pool().clone()));
    let ledger: Arc<dyn TokenLedger> = Arc::new(redis.clone());

    Ok(AppState::new(config, credentials, ledger)
        .context("Argon2 설정 오류")?
        .with_db(db)
        .with_redis(redis))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    if handle_export_openapi()? {
        return Ok(());
    }

    let config = AppConfig::load_default().context("설정 로드 실패")?;
    init_logging(&config.logging)?;

    info!("Starting Session API server...");

    let metrics_handle = setup_metrics_recorder().context("Prometheus 레코더 설치 실패")?;
    info!("Prometheus metrics recorder initialized");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| {
            error!(
                host = %config.server.host,
                port = config.server.port,
                error = %e,
                "소켓 주소 설정이 유효하지 않습니다. SESSION__SERVER__HOST, SESSION__SERVER__PORT 를 확인하세요."
            );
            e
        })?;

    let state = Arc::new(create_app_state(&config).await?);
    info!(
        version = %state.version,
        has_db = state.db.is_some(),
        has_redis = state.redis.is_some(),
        access_ttl_minutes = config.auth.access_token_ttl_minutes,
        refresh_ttl_minutes = config.auth.refresh_token_ttl_minutes,
        "Application state initialized"
    );

    let app = session_api::create_router(
        state,
        Some(metrics_handle),
        Duration::from_secs(config.server.request_timeout_secs),
    );

    info!(%addr, "API server listening");
    info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);
    info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");
    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 반환합니다.
/// 진행 중인 요청은 완료될 때까지 기다립니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Ctrl+C 핸들러 설치 실패");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "SIGTERM 핸들러 설치 실패");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
