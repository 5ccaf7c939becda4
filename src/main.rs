use std::net::SocketAddr;

use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use room_relay::config::Config;
use room_relay::AppState;

#[tokio::main]
async fn main() {
    // Load .env file (silently skip if missing — env vars may be set externally)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let mut port = config.port;
    let state = AppState::new(config);

    let app = room_relay::gateway::server::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    // Bind, stepping to the next port when the requested one is taken.
    let listener = loop {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => break listener,
            Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::warn!(%port, "port already in use, trying the next one");
                port += 1;
            }
            Err(err) => {
                tracing::error!(?err, %port, "failed to bind");
                std::process::exit(1);
            }
        }
    };

    tracing::info!(%port, "room-relay listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .expect("server error");

    tracing::info!("server closed");
}

/// Resolves on SIGINT or SIGTERM. Live connections get a 1001 close frame
/// before the server future is allowed to finish.
async fn shutdown_signal(state: AppState) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install sigterm handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!(connections = state.clients.len(), "shutting down");
    state.clients.close_all(1001, "Server shutting down");
}
