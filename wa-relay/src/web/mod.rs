//! Web server module for the WhatsApp webhook.
//!
//! Routes:
//! - `GET /`: service info
//! - `GET /webhook`: subscription handshake
//! - `POST /webhook`: event delivery, forwarding text messages downstream

pub mod handlers;
pub mod verify;

use axum::{http::HeaderValue, routing::get, Router};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub use handlers::{
    health, receive_webhook, verify_webhook, AppState, HealthResponse, WebhookAck,
};
pub use verify::{verify_subscription, Verification, VerifyQuery};

/// Path the platform is configured to call.
pub const WEBHOOK_PATH: &str = "/webhook";

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(state.config.cors_allow_origins.as_deref());

    Router::new()
        .route("/", get(health))
        .route(WEBHOOK_PATH, get(verify_webhook).post(receive_webhook))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Any origin unless an allow list is configured.
fn cors_layer(origins: Option<&[String]>) -> CorsLayer {
    let origins = match origins {
        Some(list) if !list.is_empty() => list,
        _ => return CorsLayer::permissive(),
    };

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "cors_origin_invalid");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
