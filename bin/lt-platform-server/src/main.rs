//! LogiTrack Platform Server
//!
//! Production server for the platform REST APIs under `/api/v1`:
//! - Auth: register, login, current caller
//! - Admin: API key issuance and deactivation, request metrics
//! - Integration: shipment feed for `X-API-Key` callers
//!
//! A second listener serves Prometheus metrics and health probes.
//! Settings come from `lt-config` (TOML file plus `LT_*` overrides).
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LT_CONFIG_PATH` | `config/logitrack.toml` | Optional TOML config file |
//! | `LT_LOG_FORMAT` | `text` | `json` for structured log lines |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use mongodb::{bson::doc, Database};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tokio::{net::TcpListener, signal};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use lt_config::{AppConfig, StoreKind};
use lt_platform::api::{platform_router, AppState, PlatformApiDoc};
use lt_platform::repository::{
    ensure_indexes, ApiKeyRepository, ApiKeyStore, InMemoryCredentialStore, InMemoryShipmentFeed,
    ShipmentFeed, ShipmentRepository, UserRepository, UserStore,
};
use lt_platform::service::{AuthConfig, PasswordService, TokenService};
use lt_platform::DevDataSeeder;

/// Stores the services run on
struct Stores {
    users: Arc<dyn UserStore>,
    keys: Arc<dyn ApiKeyStore>,
    shipments: Arc<dyn ShipmentFeed>,
    db: Option<Database>,
}

#[derive(Clone)]
struct OpsState {
    prometheus: PrometheusHandle,
    db: Option<Database>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LT_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn open_stores(config: &AppConfig) -> Result<Stores> {
    match config.store.kind {
        StoreKind::Memory => {
            warn!("Using in-memory credential store; data is lost on restart");
            let store = Arc::new(InMemoryCredentialStore::new());
            Ok(Stores {
                users: store.clone(),
                keys: store,
                shipments: Arc::new(InMemoryShipmentFeed::new()),
                db: None,
            })
        }
        StoreKind::Mongo => {
            info!("Connecting to MongoDB: {}/{}", config.store.mongo_url, config.store.mongo_db);
            let client = mongodb::Client::with_uri_str(&config.store.mongo_url)
                .await
                .context("failed to connect to MongoDB")?;
            let db = client.database(&config.store.mongo_db);
            ensure_indexes(&db).await.context("failed to create indexes")?;

            Ok(Stores {
                users: Arc::new(UserRepository::new(&db)),
                keys: Arc::new(ApiKeyRepository::new(&db)),
                shipments: Arc::new(ShipmentRepository::new(&db)),
                db: Some(db),
            })
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    info!("Starting LogiTrack Platform Server");

    // Missing signing key or bad values stop the boot here
    let config = AppConfig::load().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")?;

    let tokens = Arc::new(TokenService::new(AuthConfig::from(&config.jwt))?);
    let passwords = Arc::new(PasswordService::default());
    let stores = open_stores(&config).await?;

    if config.seed.enabled {
        let seeder = DevDataSeeder::new(stores.users.clone(), passwords.clone(), &config.seed);
        match seeder.run().await {
            Ok(created) => info!(created, "Development accounts seeded"),
            Err(e) => warn!("Dev data seeding skipped: {}", e),
        }
    }

    let state = AppState::new(
        tokens,
        passwords,
        stores.users,
        stores.keys,
        stores.shipments,
    );

    let app = platform_router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/q/openapi", PlatformApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    // Metrics and probes
    let metrics_addr = format!("0.0.0.0:{}", config.server.metrics_port);
    info!("Metrics server listening on http://{}/metrics", metrics_addr);

    let ops_app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .with_state(OpsState {
            prometheus,
            db: stores.db,
        });

    let metrics_listener = TcpListener::bind(&metrics_addr).await?;
    let metrics_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(metrics_listener, ops_app).await {
            error!("Metrics server failed: {}", e);
        }
    });

    // API server
    let api_addr = format!("0.0.0.0:{}", config.server.api_port);
    info!("API server listening on http://{}", api_addr);
    info!("Press Ctrl+C to shutdown");

    let api_listener = TcpListener::bind(&api_addr).await?;
    axum::serve(api_listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    metrics_task.abort();
    info!("LogiTrack Platform Server shutdown complete");
    Ok(())
}

async fn metrics_handler(State(ops): State<OpsState>) -> String {
    ops.prometheus.render()
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn ready_handler(State(ops): State<OpsState>) -> (StatusCode, Json<serde_json::Value>) {
    if let Some(db) = &ops.db {
        if let Err(e) = db.run_command(doc! { "ping": 1 }, None).await {
            warn!("Readiness check failed: {}", e);
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "DOWN" })),
            );
        }
    }
    (StatusCode::OK, Json(serde_json::json!({ "status": "READY" })))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received...");
}
