//! Server startup and lifecycle

use crate::{routes, AppState, EmulatorConfig};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Serve on an already bound listener until the process exits
///
/// Binding to port 0 and passing the listener in lets callers learn the
/// actual address before the first request.
pub async fn serve(listener: TcpListener, config: EmulatorConfig) -> anyhow::Result<()> {
    serve_with_shutdown(listener, config, std::future::pending()).await
}

/// Bind the configured address and run until `shutdown_signal` resolves
pub async fn run_server_with_shutdown(
    config: EmulatorConfig,
    shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind_addr()).await?;
    serve_with_shutdown(listener, config, shutdown_signal).await
}

async fn serve_with_shutdown(
    listener: TcpListener,
    config: EmulatorConfig,
    shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    let state = Arc::new(AppState::new(config));
    let app = routes::create_router(state);

    info!("🚀 B2 emulator listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("👋 Emulator shutdown complete");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_shutdown_signal_stops_server() {
        let config = EmulatorConfig {
            port: 0,
            ..Default::default()
        };
        let (tx, rx) = oneshot::channel::<()>();

        let server = tokio::spawn(run_server_with_shutdown(config, async {
            rx.await.ok();
        }));

        tx.send(()).unwrap();
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
