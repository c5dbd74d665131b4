/*
 * Responsibility
 * - Config loading → dependency wiring → Router assembly
 * - Layer order (outermost first): CORS → http (request-id, trace, timeout, body limit) → pipeline
 * - axum::serve() with peer address info (rate limiter keys)
 */
use std::net::SocketAddr;
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::middleware;
use crate::services::cache::{CacheClient, MemoryCacheClient, ValkeyClient};
use crate::services::upstream::HttpUpstream;
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,edge_gateway=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panics via tracing so they don't get lost.
        tracing::error!(?info, "panic");

        // Development: fail fast. Production: default behaviour, keep serving.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting gateway in {:?} mode on {} (upstream {})",
        config.app_env,
        config.addr,
        config.upstream_base_url
    );
    if !config.auth_enabled {
        tracing::warn!("AUTH_ENABLED=false: authentication and authorization are disabled");
    }

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let cache: Arc<dyn CacheClient> = match config.cache_url.as_deref() {
        Some(url) => Arc::new(
            ValkeyClient::new(url)
                .await
                .context("failed to connect to cache backend")?,
        ),
        None => {
            tracing::warn!("CACHE_URL not set; using in-process auth context cache");
            Arc::new(MemoryCacheClient::new())
        }
    };
    tracing::info!(backend = cache.backend_name(), "auth context cache ready");

    let upstream = HttpUpstream::new(config.upstream_base_url.clone(), config.request_timeout)?;

    Ok(AppState::new(config, cache, Arc::new(upstream)))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .nest("/internal/v1", api::v1::routes())
        .fallback(api::forward::forward);

    let router = middleware::pipeline::apply(router, state.clone()).with_state(state);
    let router = middleware::http::apply(router, config);
    middleware::cors::apply(router, config)
}
