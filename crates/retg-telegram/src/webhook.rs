//! Webhook transport: Telegram POSTs each update to `/webhook/{token}`.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{Method, StatusCode},
    routing::any,
    Router,
};
use teloxide::types::Update;
use tracing::{info, warn};

use retg_core::{errors::Error, handler::UpdateHandler};

use crate::convert::convert_update;

/// State shared with the webhook handler.
#[derive(Clone)]
pub struct WebhookState {
    pub token: Arc<str>,
    pub handler: Arc<dyn UpdateHandler>,
}

/// Build the axum router for the webhook endpoint.
pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/webhook/:token", any(handle_update))
        .with_state(state)
}

pub async fn serve(
    addr: SocketAddr,
    token: String,
    handler: Arc<dyn UpdateHandler>,
) -> anyhow::Result<()> {
    let app = router(WebhookState {
        token: token.into(),
        handler,
    });

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening for updates (webhook)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
    }
}

/// Status codes: 405 for non-POST, 404 for a wrong token, 400 for an
/// undecodable body and 500 when handling fails. Unrecognized update kinds
/// are logged and acknowledged so Telegram does not redeliver them.
async fn handle_update(
    method: Method,
    Path(token): Path<String>,
    State(state): State<WebhookState>,
    body: Bytes,
) -> StatusCode {
    if method != Method::POST {
        warn!(%method, "webhook called with unsupported method");
        return StatusCode::METHOD_NOT_ALLOWED;
    }

    if token != *state.token {
        warn!("webhook called with wrong token");
        return StatusCode::NOT_FOUND;
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!(error = %e, "failed to decode incoming update");
            return StatusCode::BAD_REQUEST;
        }
    };

    match state.handler.handle_update(convert_update(&update)).await {
        Ok(()) => StatusCode::OK,
        Err(Error::UnrecognizedUpdate(kind)) => {
            warn!(update_id = update.id, %kind, "ignoring unrecognized update");
            StatusCode::OK
        }
        Err(e) => {
            warn!(update_id = update.id, error = %e, "failed to handle update");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
