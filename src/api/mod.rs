// HTTP API server module

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::http::{header, Method};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

pub mod error;
pub mod gemini;
pub mod groq;
mod guards;
mod handlers;

use crate::config::AppConfig;
use crate::ratelimit::store::{CounterStore, RedisCounterStore};
use crate::ratelimit::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub groq: Arc<groq::GroqClient>,
    pub limiter: Option<Arc<RateLimiter>>,
}

impl AppState {
    /// Bind the counter store named by the config. No store configured
    /// means rate limiting is disabled.
    pub fn new(config: AppConfig) -> Result<Self> {
        let store: Option<Arc<dyn CounterStore>> = match &config.redis_url {
            Some(url) => Some(Arc::new(RedisCounterStore::new(url)?)),
            None => None,
        };
        Self::with_store(config, store)
    }

    pub fn with_store(config: AppConfig, store: Option<Arc<dyn CounterStore>>) -> Result<Self> {
        let limiter = store.map(|store| Arc::new(RateLimiter::new(store, config.rate_limit_quota)));
        let groq = Arc::new(groq::GroqClient::new(
            config.groq_base_url.clone(),
            Duration::from_secs(config.upstream_timeout_secs),
        )?);
        Ok(Self {
            config: Arc::new(config),
            groq,
            limiter,
        })
    }
}

/// Browser clients can only read responses that carry these headers, so
/// the layer sits outermost and stamps every exit path, error or not.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route(
            "/api/generate",
            post(handlers::generate).options(handlers::preflight),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guards::payload_guard,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guards::origin_guard,
        ))
        .layer(cors_layer())
        .with_state(state)
}

pub async fn start_server(config: AppConfig) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Proxy listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    tracing::info!("Shutdown signal received");
}
