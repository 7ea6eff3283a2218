//! Listener setup and the serve loop.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::api::{ApiSettings, AppState, router};
use crate::store::{MemoryStore, StoreError, TaskStore};

/// Errors that can occur while starting the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Neither the preferred port nor its fallback could be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was attempted last.
        addr: String,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The task store could not be opened.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Listener I/O failure.
    #[error("server I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Binds `host:port`, falling back to `port + 1` once if the port is taken.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the chosen address cannot be bound.
pub async fn bind_with_fallback(host: &str, port: u16) -> Result<TcpListener, ServerError> {
    match TcpListener::bind((host, port)).await {
        Ok(listener) => Ok(listener),
        Err(e) if e.kind() == io::ErrorKind::AddrInUse && port != 0 => {
            let Some(next) = port.checked_add(1) else {
                return Err(ServerError::Bind {
                    addr: format!("{host}:{port}"),
                    source: e,
                });
            };
            tracing::warn!(port, next, "port in use, trying the next one");
            TcpListener::bind((host, next))
                .await
                .map_err(|source| ServerError::Bind {
                    addr: format!("{host}:{next}"),
                    source,
                })
        }
        Err(source) => Err(ServerError::Bind {
            addr: format!("{host}:{port}"),
            source,
        }),
    }
}

/// Serves the API on `listener` until `shutdown` resolves.
///
/// Returns the bound address and a join handle. In-flight requests finish
/// before the handle completes.
///
/// # Errors
///
/// Returns an error if the listener's local address cannot be read.
pub fn start_server<S, F>(
    listener: TcpListener,
    state: Arc<AppState<S>>,
    shutdown: F,
) -> Result<(SocketAddr, JoinHandle<()>), ServerError>
where
    S: TaskStore,
    F: Future<Output = ()> + Send + 'static,
{
    let bound_addr = listener.local_addr()?;
    let app = router(state);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
        {
            tracing::error!(error = %e, "server error");
        }
    });

    Ok((bound_addr, handle))
}

/// Starts a server over a fresh [`MemoryStore`] that runs until aborted.
///
/// Used by tests and local experiments; bind `127.0.0.1:0` for an
/// OS-assigned port.
///
/// # Errors
///
/// Returns an error if `addr` cannot be bound.
pub async fn start_in_memory(addr: &str) -> Result<(SocketAddr, JoinHandle<()>), ServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })?;
    let state = Arc::new(AppState::new(MemoryStore::new(), ApiSettings::default()));
    start_server(listener, state, std::future::pending())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
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
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received ctrl-c"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
