//! HTTP transport: `POST /mcp` carries one JSON-RPC message per body.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Json as AxumJson, Response},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::dispatch;
use crate::protocol::ProtocolHandler;
use crate::registry::CapabilityKind;
use crate::types::{McpError, McpResult, RequestId};

use super::framing;

/// Shared server state passed to all handlers via axum State.
pub struct ServerState {
    pub token: Option<String>,
    pub handler: Arc<ProtocolHandler>,
}

pub struct HttpTransport {
    state: Arc<ServerState>,
}

impl HttpTransport {
    pub fn new(handler: ProtocolHandler) -> Self {
        Self::with_token(handler, None)
    }

    /// Require `Authorization: Bearer <token>` on `/mcp` when `token` is set.
    pub fn with_token(handler: ProtocolHandler, token: Option<String>) -> Self {
        Self {
            state: Arc::new(ServerState {
                token,
                handler: Arc::new(handler),
            }),
        }
    }

    /// The axum application, without binding a socket.
    pub fn router(&self) -> Router {
        let state = self.state.clone();

        Router::new()
            .route("/mcp", post(handle_request))
            .layer(middleware::from_fn_with_state(state.clone(), auth_layer))
            .route("/health", get(handle_health))
            .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
            .with_state(state)
    }

    /// Serve on `addr` until ctrl-c; in-flight requests are drained.
    pub async fn run(&self, addr: &str) -> McpResult<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(McpError::Io)?;

        tracing::info!("HTTP transport listening on {addr}");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Interrupt received, draining HTTP transport");
                }
            })
            .await
            .map_err(|e| McpError::Transport(e.to_string()))?;

        Ok(())
    }
}

fn error_reply(status: StatusCode, id: RequestId, error: &McpError) -> Response {
    let body = dispatch::Response::from_error(id, error).to_value();
    (status, AxumJson(body)).into_response()
}

/// Auth middleware: checks the bearer token if configured.
/// /health is routed outside this layer.
async fn auth_layer(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    request: axum::extract::Request,
    next: middleware::Next,
) -> Response {
    if let Some(expected) = &state.token {
        let authorized = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected);

        if !authorized {
            return error_reply(StatusCode::UNAUTHORIZED, RequestId::Null, &McpError::Unauthorized);
        }
    }

    next.run(request).await
}

/// Protocol errors travel in a 200 body; only undecodable bodies get 400.
async fn handle_request(State(state): State<Arc<ServerState>>, body: Bytes) -> Response {
    let text = match std::str::from_utf8(&body) {
        Ok(text) => text,
        Err(_) => {
            let err = McpError::ParseError("Body is not valid UTF-8".to_string());
            return error_reply(StatusCode::BAD_REQUEST, RequestId::Null, &err);
        }
    };

    let msg = match framing::parse_message(text) {
        Ok(msg) => msg,
        Err((id, e)) => {
            tracing::warn!("Rejected HTTP body: {e}");
            return error_reply(StatusCode::BAD_REQUEST, id, &e);
        }
    };

    match state.handler.handle_message(msg).await {
        Some(response) => (StatusCode::OK, AxumJson(response.to_value())).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Health check endpoint: no auth required.
async fn handle_health(State(state): State<Arc<ServerState>>) -> AxumJson<serde_json::Value> {
    let registry = state.handler.dispatcher().registry();
    AxumJson(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "tools": registry.list(CapabilityKind::Tool).len(),
        "resources": registry.list(CapabilityKind::Resource).len(),
        "prompts": registry.list(CapabilityKind::Prompt).len(),
    }))
}
