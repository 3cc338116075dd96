//! CopyVault API Gateway
//!
//! The main entry point for all external API requests.
//! Handles:
//! - Bearer token resolution to the current viewer
//! - Rate limiting
//! - Request routing for copies, categories, challenges and EcoVerse play
//! - Observability (logging, metrics, tracing)

mod handlers;
mod middleware;
mod viewer;

#[cfg(test)]
mod tests;

use axum::{
    body::Body,
    extract::FromRef,
    http::Request,
    routing::{delete, get, post},
    Router,
};
use copyvault_common::{
    auth::JwtManager,
    cache::{KeyValueStore, MemoryStore, RedisStore},
    config::AppConfig,
    db::{schema, DbPool},
    ecoverse::EcoVerse,
    metrics,
    storage::{BucketStorage, FileStorage},
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::{signal, sync::watch};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, info_span, warn};
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub jwt: Arc<JwtManager>,
    pub kv: Arc<dyn KeyValueStore>,
    pub storage: Arc<dyn FileStorage>,
    pub eco: Arc<EcoVerse>,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool, kv: Arc<dyn KeyValueStore>) -> Self {
        let secret = match config.auth.jwt_secret.clone() {
            Some(secret) => secret,
            None => {
                warn!("No JWT secret configured, tokens will not survive a restart");
                uuid::Uuid::new_v4().to_string()
            }
        };

        Self {
            jwt: Arc::new(JwtManager::new(&secret, config.auth.jwt_expiration_secs)),
            storage: Arc::new(BucketStorage::new(&config.storage, kv.clone())),
            eco: Arc::new(EcoVerse::new(kv.clone())),
            config: Arc::new(config),
            db,
            kv,
        }
    }
}

impl FromRef<AppState> for Arc<JwtManager> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize tracing
    init_tracing(&config);

    info!(
        service = %config.observability.service_name,
        "Starting CopyVault API Gateway v{}",
        copyvault_common::VERSION
    );

    // Initialize metrics
    if config.observability.metrics_port != 0 {
        PrometheusBuilder::new()
            .with_http_listener(SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port)))
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                metrics::LATENCY_BUCKETS,
            )?
            .install()?;
        info!(port = config.observability.metrics_port, "Prometheus exporter listening");
    }
    metrics::register_metrics();

    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;
    if config.database.auto_migrate {
        schema::create_schema(db.write()).await?;
    }

    // Key-value store for EcoVerse state
    let kv: Arc<dyn KeyValueStore> = match config.redis.url.as_deref() {
        Some(url) => {
            info!("Connecting to Redis...");
            Arc::new(RedisStore::connect(url, &config.redis).await?)
        }
        None => {
            warn!("No Redis URL configured, EcoVerse state and storage ids are kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let shutdown_timeout = config.shutdown_timeout();
    let state = AppState::new(config, db, kv);

    // Build the router
    let app = create_router(state);

    // Start the server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    serve(listener, app, shutdown_signal(), shutdown_timeout).await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Serve until `signal` resolves, then give in-flight requests `grace` to finish
pub async fn serve(
    listener: tokio::net::TcpListener,
    app: Router,
    signal: impl Future<Output = ()> + Send + 'static,
    grace: Duration,
) -> std::io::Result<()> {
    let (signalled_tx, mut signalled_rx) = watch::channel(false);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            signal.await;
            let _ = signalled_tx.send(true);
        })
        .into_future();

    tokio::select! {
        result = server => result,
        _ = async {
            if signalled_rx.wait_for(|signalled| *signalled).await.is_ok() {
                tokio::time::sleep(grace).await;
            } else {
                std::future::pending::<()>().await;
            }
        } => {
            warn!(timeout = ?grace, "Graceful shutdown timed out, dropping open connections");
            Ok(())
        }
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let service_name = state.config.observability.service_name.clone();
    let trace = TraceLayer::new_for_http().make_span_with(move |request: &Request<Body>| {
        info_span!(
            "request",
            service = %service_name,
            method = %request.method(),
            uri = %request.uri(),
        )
    });

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // API routes
    let api_routes = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))

        // Identity
        .route("/auth/anonymous", post(handlers::auth::sign_in_anonymously))
        .route("/users/me", get(handlers::auth::me))

        // Category endpoints
        .route(
            "/categories",
            post(handlers::categories::create_category).get(handlers::categories::list_categories),
        )
        .route("/categories/{id}", delete(handlers::categories::remove_category))

        // Copy endpoints
        .route(
            "/copies",
            post(handlers::copies::create_copy).get(handlers::copies::list_copies),
        )
        .route(
            "/copies/{id}",
            get(handlers::copies::get_copy)
                .patch(handlers::copies::update_copy)
                .delete(handlers::copies::remove_copy),
        )
        .route("/copies/{id}/views", post(handlers::copies::increment_views))
        .route("/copies/{id}/like", post(handlers::copies::toggle_like))

        // Challenge endpoints
        .route("/challenges", get(handlers::challenges::list_challenges))
        .route("/challenges/seed", post(handlers::challenges::ensure_seeded))
        .route("/challenges/submissions/mine", get(handlers::challenges::my_submissions))
        .route("/challenges/{id}/submissions", post(handlers::challenges::submit))

        // File storage endpoints
        .route("/storage/upload-url", post(handlers::storage::generate_upload_url))
        .route("/storage/{id}/url", get(handlers::storage::get_url))

        // EcoVerse endpoints
        .route("/eco/state", get(handlers::eco::dashboard))
        .route("/eco/actions/{id}", post(handlers::eco::complete_action))
        .route("/eco/world-boss/contribute", post(handlers::eco::contribute))
        .route("/eco/quizzes", get(handlers::eco::list_quizzes))
        .route("/eco/quizzes/{id}", get(handlers::eco::open_quiz))
        .route("/eco/quizzes/{id}/submit", post(handlers::eco::submit_quiz))
        .route("/eco/lessons", get(handlers::eco::list_lessons))
        .route("/eco/lessons/{id}", get(handlers::eco::get_lesson))
        .route("/eco/lessons/{id}/sections/{index}", post(handlers::eco::complete_section))
        .route("/eco/lessons/{id}/finish", post(handlers::eco::finish_lesson))
        .route("/eco/leaderboard", get(handlers::eco::leaderboard))
        .route("/eco/rewards", get(handlers::eco::list_rewards))
        .route("/eco/rewards/{id}/redeem", post(handlers::eco::redeem_reward))

        .route_layer(axum::middleware::from_fn(middleware::request_metrics::track_metrics));

    let mut app = Router::new().nest("/v1", api_routes);

    let rate_limit = &state.config.rate_limit;
    if rate_limit.enabled {
        let limiter = middleware::rate_limit::create_rate_limiter(
            rate_limit.requests_per_second,
            rate_limit.burst,
        );
        app = app.layer(axum::middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit::rate_limit_middleware,
        ));
    }

    // Compose the app
    app.layer(TimeoutLayer::new(state.config.request_timeout()))
        .layer(CompressionLayer::new())
        .layer(trace)
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
