//! HTTP server bootstrap.
//!
//! This module wires together:
//! - configuration
//! - database pool and migrations
//! - templates, mail transport and field encryption
//! - the public pages and the staff API router

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use crate::auth::{ApiKeyValidator, AuthMiddlewareState, Authenticator, StaffKeyRecord};
use crate::infra::sqlite::SqliteStaffKeyStore;
use crate::infra::{
    ConsoleMailTransport, Database, FieldEncryption, MailTransport, MemoryMailTransport,
    SmtpConfig, SmtpMailTransport,
};
use crate::services::{
    Mailer, Notifier, RegistrationService, Roster, SensitiveDataService, DEFAULT_RETENTION_DAYS,
};
use crate::templates::{Templates, DEFAULT_TEMPLATE_DIR};

/// Where outgoing email goes.
#[derive(Debug, Clone)]
pub enum MailBackend {
    Smtp(SmtpConfig),
    Console,
    Memory,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection URL.
    pub database_url: String,
    /// Server listen address.
    pub listen_addr: SocketAddr,
    /// Maximum database connections.
    pub max_connections: u32,
    pub migrate_on_startup: bool,
    pub template_dir: String,
    /// Absolute base of links placed in emails.
    pub site_url: String,
    pub default_from_email: String,
    pub mail_backend: MailBackend,
    pub require_auth: bool,
    pub bootstrap_admin_api_key: Option<String>,
    pub retention_days: i64,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| {
            !matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "off" | "no"
            )
        })
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env_or("DATABASE_URL", "sqlite://rejs.db?mode=rwc");

        let port: u16 = env_parse("PORT").unwrap_or(8000);
        let host = env_or("HOST", "0.0.0.0");
        let listen_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid listen address {host}:{port}: {e}"))?;

        let max_connections: u32 = env_parse("MAX_DB_CONNECTIONS").unwrap_or(5);

        let mail_backend = match env_or("MAIL_BACKEND", "console").trim() {
            "smtp" => MailBackend::Smtp(SmtpConfig {
                host: std::env::var("SMTP_HOST")
                    .map_err(|_| anyhow::anyhow!("MAIL_BACKEND=smtp requires SMTP_HOST"))?,
                port: env_parse("SMTP_PORT").unwrap_or(587),
                username: std::env::var("SMTP_USERNAME").ok(),
                password: std::env::var("SMTP_PASSWORD").ok(),
                starttls: env_flag("SMTP_STARTTLS", true),
            }),
            "console" => MailBackend::Console,
            "memory" => MailBackend::Memory,
            other => anyhow::bail!("Unknown MAIL_BACKEND {other:?}; use smtp, console or memory"),
        };

        let retention_days =
            env_parse("SENSITIVE_DATA_RETENTION_DAYS").unwrap_or(DEFAULT_RETENTION_DAYS);
        if retention_days < 0 {
            anyhow::bail!("SENSITIVE_DATA_RETENTION_DAYS must not be negative");
        }

        Ok(Self {
            database_url,
            listen_addr,
            max_connections,
            migrate_on_startup: env_flag("DB_MIGRATE_ON_STARTUP", true),
            template_dir: env_or("TEMPLATE_DIR", DEFAULT_TEMPLATE_DIR),
            site_url: env_or("SITE_URL", &format!("http://localhost:{port}")),
            default_from_email: env_or("DEFAULT_FROM_EMAIL", "noreply@zobaczyc.morze"),
            mail_backend,
            require_auth: env_or("AUTH_MODE", "required") != "disabled",
            bootstrap_admin_api_key: std::env::var("BOOTSTRAP_ADMIN_API_KEY").ok(),
            retention_days,
        })
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub templates: Arc<Templates>,
    pub registrations: RegistrationService,
    pub roster: Roster,
    pub sensitive_data: SensitiveDataService,
}

impl AppState {
    pub fn new(
        db: Database,
        encryption: FieldEncryption,
        templates: Arc<Templates>,
        transport: Arc<dyn MailTransport>,
        from_email: &str,
        site_url: &str,
    ) -> Self {
        let mailer = Mailer::new(transport, templates.clone(), from_email);
        let notifier = Notifier::new(mailer, site_url);
        Self {
            registrations: RegistrationService::new(
                db.clone(),
                encryption.clone(),
                notifier.clone(),
            ),
            roster: Roster::new(db.clone(), notifier),
            sensitive_data: SensitiveDataService::new(db.clone(), encryption),
            templates,
            db,
        }
    }
}

/// Build the mail transport selected by `MAIL_BACKEND`.
pub fn mail_transport(backend: &MailBackend) -> anyhow::Result<Arc<dyn MailTransport>> {
    Ok(match backend {
        MailBackend::Smtp(config) => Arc::new(SmtpMailTransport::new(config)?),
        MailBackend::Console => Arc::new(ConsoleMailTransport),
        MailBackend::Memory => Arc::new(MemoryMailTransport::new()),
    })
}

/// Start the HTTP server.
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting rejs v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!("Configuration loaded");
    info!("  Listen address: {}", config.listen_addr);
    info!("  Max connections: {}", config.max_connections);
    info!("  Site URL: {}", config.site_url);

    let db = Database::connect(&config.database_url, config.max_connections).await?;
    info!("Connected to SQLite");

    if config.migrate_on_startup {
        info!("Running database migrations...");
        db.migrate().await?;
        info!("Database migrations applied");
    } else {
        info!("DB migrations skipped (DB_MIGRATE_ON_STARTUP=0)");
    }

    let auth_state = auth_state(&config, &db)?;

    let encryption = FieldEncryption::from_env()?;
    info!(keys = encryption.key_count(), "Field encryption keyring loaded");

    let templates = Arc::new(Templates::load(&config.template_dir)?);
    let transport = mail_transport(&config.mail_backend)?;
    info!(backend = transport.name(), "Mail transport ready");

    let state = AppState::new(
        db,
        encryption,
        templates,
        transport,
        &config.default_from_email,
        &config.site_url,
    );

    let mut app = build_router(state, auth_state);
    if let Some(cors_layer) = cors_layer_from_env()? {
        app = app.layer(cors_layer);
    }

    info!("Starting HTTP server on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;

    info!("rejs is ready to accept connections");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

fn auth_state(config: &Config, db: &Database) -> anyhow::Result<AuthMiddlewareState> {
    let api_key_validator = Arc::new(ApiKeyValidator::new());

    if let Some(bootstrap_key) = &config.bootstrap_admin_api_key {
        api_key_validator.register_key(StaffKeyRecord::new(
            ApiKeyValidator::hash_key(bootstrap_key),
            "admin",
        ));
        info!("Bootstrap admin API key is configured");
    } else if config.require_auth {
        info!("No bootstrap key; staff keys are read from the database only");
    }

    if !config.require_auth {
        warn!("AUTH_MODE=disabled: the staff API is open to everyone");
    }

    let authenticator = Authenticator::new(api_key_validator)
        .with_store(Arc::new(SqliteStaffKeyStore::new(db.clone())));

    Ok(AuthMiddlewareState {
        authenticator: Arc::new(authenticator),
        require_auth: config.require_auth,
    })
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

/// Public pages, the staff API under `/admin/api/v1`, and health probes.
pub fn build_router(state: AppState, auth_state: AuthMiddlewareState) -> Router {
    let admin = crate::api::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        crate::auth::auth_middleware,
    ));

    Router::new()
        .merge(crate::api::pages_router())
        .nest("/admin/api/v1", admin)
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .fallback(crate::api::page_not_found)
        .layer(axum::middleware::map_response_with_state(
            state.clone(),
            crate::api::render_error_page,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer_from_env() -> anyhow::Result<Option<CorsLayer>> {
    let origins = match std::env::var("CORS_ALLOW_ORIGINS") {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };

    let origins = origins.trim();
    if origins.is_empty() {
        return Ok(None);
    }

    let allow_origin = if origins == "*" {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin {s:?}: {e}"))
            })
            .collect::<anyhow::Result<_>>()?;
        AllowOrigin::list(origins)
    };

    Ok(Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
            ])
            .allow_headers([
                axum::http::header::AUTHORIZATION,
                axum::http::header::CONTENT_TYPE,
            ]),
    ))
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl-C handler");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

/// Health check endpoint.
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "rejs",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness check endpoint.
async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    match state.db.ping().await {
        Ok(()) => Ok(Json(serde_json::json!({
            "status": "ready",
            "database": "connected",
        }))),
        Err(e) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            format!("Database unavailable: {e}"),
        )),
    }
}
