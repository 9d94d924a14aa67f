//! Facebook Page post server
//!
//! Single-binary demo service that:
//! 1. Loads the app registration, Graph endpoint, and demo post config
//! 2. Listens for incoming requests
//! 3. Runs the validated publish workflow on GET /publish
//! 4. Answers the webhook verification handshake on GET /webhook

mod config;
mod webhook;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use common::Secret;
use graph_client::GraphClient;
use page_publisher::{PagePublisher, PublishError, PublishOutcome, PublishRequest};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// Shared application state accessible from all handlers
#[derive(Clone)]
struct AppState {
    app_id: String,
    app_secret: Secret,
    access_token: Secret,
    webhook_verify_token: String,
    base_url: String,
    version: String,
    demo: Arc<PublishRequest>,
}

impl AppState {
    fn from_config(config: &Config) -> Result<Self> {
        let app_secret = config
            .app
            .app_secret
            .clone()
            .context("app secret not resolved")?;
        let access_token = config
            .demo
            .access_token
            .clone()
            .context("access token not resolved")?;

        Ok(AppState {
            app_id: config.app.app_id.clone(),
            app_secret,
            access_token,
            webhook_verify_token: config.app.webhook_verify_token.clone(),
            base_url: config.graph.base_url.clone(),
            version: config.graph.version.clone(),
            demo: Arc::new(PublishRequest {
                page_id: config.demo.page_id.clone(),
                message: config.demo.message.clone(),
                photo_urls: config.demo.photo_urls.clone(),
                video_url: config.demo.video_url.clone(),
            }),
        })
    }
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/publish", get(publish_handler))
        .route("/health", get(health_handler))
        .route("/webhook", get(webhook_handler))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting facebook-post-server");

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        listen_addr = %config.server.listen_addr,
        base_url = %config.graph.base_url,
        version = %config.graph.version,
        page_id = %config.demo.page_id,
        "configuration loaded"
    );

    let state = AppState::from_config(&config)?;
    let app = build_router(state);

    let listener = TcpListener::bind(config.server.listen_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.server.listen_addr))?;

    info!(addr = %config.server.listen_addr, "accepting requests");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutdown complete");
    Ok(())
}

/// Run the publish workflow with the configured post. A fresh publisher
/// is built per request: the workflow swaps the credential it holds,
/// and that swap must not leak into the next request.
async fn publish_handler(State(state): State<AppState>) -> Response {
    let graph = match GraphClient::with_base_url(
        state.access_token.expose(),
        state.version.as_str(),
        state.base_url.as_str(),
    ) {
        Ok(graph) => graph,
        Err(e) => {
            error!(error = %e, "could not build Graph client");
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    };
    let mut publisher = PagePublisher::new(graph, state.app_id.as_str(), state.app_secret.clone());

    match publisher.publish(&state.demo).await {
        Ok(PublishOutcome::Video(media)) => axum::Json(serde_json::json!({
            "outcome": "video",
            "video_id": media.id,
        }))
        .into_response(),
        Ok(PublishOutcome::Feed(post)) => axum::Json(serde_json::json!({
            "outcome": "feed",
            "post": post,
        }))
        .into_response(),
        Err(e) => {
            error!(error = %e, page_id = %state.demo.page_id, "publish failed");
            let status = match &e {
                PublishError::InvalidToken
                | PublishError::MissingScope(_)
                | PublishError::WrongTarget { .. } => StatusCode::FORBIDDEN,
                PublishError::PageNotFound(_) => StatusCode::NOT_FOUND,
                PublishError::AppToken | PublishError::Graph(_) => StatusCode::BAD_GATEWAY,
            };
            (status, e.to_string()).into_response()
        }
    }
}

async fn health_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

/// Webhook verification handshake: echo `hub.challenge` when the mode
/// is `subscribe` and the verify token matches, 403 otherwise.
async fn webhook_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let challenge = webhook::verify_subscription(
        params.get("hub.mode").map(String::as_str),
        params.get("hub.verify_token").map(String::as_str),
        params.get("hub.challenge").map(String::as_str),
        &state.webhook_verify_token,
    );
    match challenge {
        Some(challenge) => (StatusCode::OK, challenge.to_owned()).into_response(),
        None => (StatusCode::FORBIDDEN, "verification failed").into_response(),
    }
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
