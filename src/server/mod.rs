//! HTTP surface: the embedded chat page and the API it talks to.

mod error;
mod handlers;
mod routes;

pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use handlers::MessageRequest;
pub use routes::{create_router, AppState};

use crate::session::SessionStore;
use std::net::SocketAddr;
use std::time::Duration;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Serves the playground on `addr` until Ctrl-C. Sessions idle for longer
/// than `session_ttl` are evicted; `None` keeps them for the process lifetime.
pub async fn serve(
    state: AppState,
    addr: SocketAddr,
    session_ttl: Option<Duration>,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(address = %listener.local_addr()?, "playground listening");

    let sweeper = session_ttl.map(|ttl| spawn_session_sweeper(state.sessions.clone(), ttl));

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

fn spawn_session_sweeper(sessions: SessionStore, ttl: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticks = tokio::time::interval(SWEEP_INTERVAL.min(ttl).max(Duration::from_secs(1)));
        loop {
            ticks.tick().await;
            let evicted = sessions.prune_idle(ttl).await;
            if evicted > 0 {
                let remaining = sessions.len().await;
                tracing::debug!(evicted, remaining, "session sweep");
            }
        }
    })
}
