mod api;
mod middleware;
mod store;

use std::sync::Arc;

use dankmaps_core::{Environment, StoreRecord};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
    store::StoreRepository,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(dankmaps_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let stores = load_seed(&config.seed_path, &config.env)?;
    tracing::info!(count = stores.len(), path = %config.seed_path.display(), "seeded store directory");

    let auth = AuthState::from_env(matches!(config.env, Environment::Development))?;
    let state = AppState {
        stores: Arc::new(StoreRepository::new(stores)),
    };
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "dankmaps-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// A missing seed file starts an empty directory in development and is an
/// error elsewhere.
fn load_seed(path: &std::path::Path, env: &Environment) -> anyhow::Result<Vec<StoreRecord>> {
    if !path.exists() && *env == Environment::Development {
        tracing::warn!(path = %path.display(), "seed file not found; starting with no stores");
        return Ok(Vec::new());
    }
    Ok(dankmaps_core::load_stores(path)?.stores)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
