//! WA Relay web server.
//!
//! This binary:
//! - Answers the WhatsApp subscription handshake on `GET /webhook`
//! - Receives message notifications on `POST /webhook`
//! - Forwards text messages to the downstream chat service, one at a time
//! - Always acknowledges well-formed deliveries with 200

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wa_relay::{router, AppState, Config, Forwarder};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config = Config::from_env();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.port,
        default_verify_token = config.uses_default_verify_token(),
        forward_url = %config.chat_url(),
        forward_timeout_ms = config.forward_timeout.as_millis() as u64,
        cors_origins = ?config.cors_allow_origins,
        "relay_starting"
    );

    let forwarder = Forwarder::from_config(&config).context("Failed to build HTTP client")?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = router(AppState::new(config, forwarder));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind relay to {addr}"))?;
    info!(address = %addr, "relay_listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let signal = wait_for_shutdown().await;
            info!(signal = signal, "relay_draining");
        })
        .await
        .context("Relay server error")?;

    info!("relay_stopped");
    Ok(())
}

/// JSON logs, filtered by `RUST_LOG` (default `info`).
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();
}

/// Resolve with the name of the first shutdown signal received.
///
/// A handler that cannot be installed is logged and never fires, so the
/// relay keeps serving on the remaining one.
async fn wait_for_shutdown() -> &'static str {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "relay_sigint_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "relay_sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}
