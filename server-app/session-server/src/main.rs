use axum::http::{header, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use session_api::handlers::token::ISSUER_KEY_HEADER;
use session_api::{create_router, AppState};
use session_core::audit::{AuditInterceptor, AuditSink};
use session_core::clock::{Clock, SystemClock};
use session_core::repositories::{SessionBackend, UserDirectory};
use session_core::services::{SessionService, SessionValidator, TokenIssuer};
use session_core::store::{SessionStore, StorePolicy};
use session_infrastructure::{
    create_pool, create_redis_pool, PgUserDirectory, QueuedAuditSink, RedisSessionBackend,
    TracingAuditWriter,
};
use session_security::JwtService;
use session_shared::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Initialize telemetry
    session_shared::telemetry::init_telemetry();

    info!("Session server starting...");

    // Load configuration
    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // User directory
    info!("Connecting to database...");
    let pool = create_pool(&config.database).await?;
    info!("Database connection established.");
    let directory: Arc<dyn UserDirectory> = Arc::new(PgUserDirectory::new(pool));

    // Session store: Redis primary when enabled, process-local fallback always
    let primary: Option<Arc<dyn SessionBackend>> = if config.redis.enabled {
        let redis_pool = create_redis_pool(&config.redis)?;
        let backend = RedisSessionBackend::new(redis_pool, config.session.key_prefix.clone());
        match backend.ping().await {
            Ok(()) => info!("Redis session backend reachable."),
            Err(e) => warn!("Redis session backend not reachable at startup: {}", e),
        }
        Some(Arc::new(backend) as Arc<dyn SessionBackend>)
    } else {
        warn!("Redis disabled; sessions are local to this instance");
        None
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = Arc::new(SessionStore::new(
        primary,
        clock.clone(),
        StorePolicy::from(&config.session),
    ));

    // Audit queue
    let (audit_sink, _audit_worker) = QueuedAuditSink::spawn(
        config.session.audit_queue_capacity,
        Arc::new(TracingAuditWriter),
    );
    let audit: Arc<dyn AuditSink> = Arc::new(audit_sink);

    // Services
    let jwt = Arc::new(JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expiry,
    ));
    let sessions = Arc::new(SessionService::new(store, audit.clone()));
    let validator = Arc::new(SessionValidator::new(
        jwt.clone(),
        sessions.clone(),
        directory.clone(),
        config.session.allow_unbound_tokens,
    ));
    let issuer = Arc::new(TokenIssuer::new(sessions.clone(), jwt));

    let issuer_key = config.session.issuer_key().map(Arc::<str>::from);
    if issuer_key.is_none() {
        warn!("session.issuer_key not set; token issuance endpoint disabled");
    }

    let state = AppState {
        validator,
        sessions,
        issuer,
        directory,
        auditor: AuditInterceptor::new(audit, clock),
        issuer_key,
    };

    // Build router
    let app = create_router(state).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::HeaderName::from_static(ISSUER_KEY_HEADER),
            ]),
    );

    // Bind address
    let host: std::net::IpAddr = config.app.host.parse()?;
    let addr = SocketAddr::from((host, config.app.port));
    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Session server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    info!("Shutdown signal received");
}
