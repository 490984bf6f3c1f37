use std::sync::Arc;

use anyhow::Context;
use reverie::{auth::AuthService, backend::Backend, config::Config, store::SiteStore, AppState};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("reverie=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env().context("reading configuration")?;
    let backend = Backend::from_config(&config).context("building the backend client")?;
    let auth = AuthService::new(backend.auth.clone());
    let store = SiteStore::load(backend).await;

    let mut events = auth.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => tracing::debug!(?event, "session event"),
                Err(RecvError::Lagged(missed)) => tracing::warn!(missed, "session events dropped"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let bind = config.bind;
    let app = reverie::app(AppState {
        store,
        auth,
        config: Arc::new(config),
    });

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    tracing::info!(%bind, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
