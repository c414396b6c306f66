//! HTTP daemon.
//!
//! Serves the router over a small JSON API. The document index lives
//! behind an `RwLock<Arc<_>>`: every request clones the `Arc` and works
//! against an immutable snapshot, and a reindex builds the replacement
//! off to the side before swapping it in — in-flight questions finish
//! against the index they started with.

use std::sync::Arc;

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::{signal, sync::RwLock};

use crate::config::Config;
use crate::context::EmployeeContext;
use crate::corpus::{self, CorpusError};
use crate::router::{QueryRouter, RoutingDecision};
use crate::semantic::DocumentIndex;

pub struct SharedState {
    router: QueryRouter,
    ctx: EmployeeContext,
    index: RwLock<Arc<DocumentIndex>>,
    config: Config,
    /// Model the corpus must have been vectorized with.
    model_id: String,
}

impl SharedState {
    pub fn new(
        router: QueryRouter,
        ctx: EmployeeContext,
        index: DocumentIndex,
        config: Config,
    ) -> Self {
        let model_id = index.model_id().to_string();
        Self {
            router,
            ctx,
            index: RwLock::new(Arc::new(index)),
            config,
            model_id,
        }
    }
}

#[derive(Debug)]
struct HttpError(CorpusError);

impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        log::error!("{self:?}");
        (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": self.0.to_string()}).to_string(),
        )
            .into_response()
    }
}

impl From<CorpusError> for HttpError {
    fn from(err: CorpusError) -> Self {
        Self(err)
    }
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

async fn ask(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<AskRequest>,
) -> Json<RoutingDecision> {
    log::debug!("question: {:?}", payload.question);

    let index = state.index.read().await.clone();
    let decision = state
        .router
        .route(&payload.question, &state.ctx, &index)
        .await;

    Json(decision)
}

/// Reload the prebuilt corpus file and swap the index. Readers keep
/// their snapshot; the lock is only held for the pointer swap.
async fn reindex(
    State(state): State<Arc<SharedState>>,
) -> Result<Json<serde_json::Value>, HttpError> {
    let path = std::path::PathBuf::from(&state.config.corpus_path);
    let model_id = state.model_id.clone();

    let fresh = tokio::task::spawn_blocking(move || corpus::load_prebuilt(&path, &model_id))
        .await
        .map_err(|e| CorpusError::Malformed(e.to_string()))??;

    let count = fresh.len();
    *state.index.write().await = Arc::new(fresh);

    log::info!("reindexed: {count} passages");
    Ok(Json(json!({ "indexed": count })))
}

async fn health(State(state): State<Arc<SharedState>>) -> Json<serde_json::Value> {
    let index = state.index.read().await.clone();
    Json(json!({
        "status": "ok",
        "indexed": index.len(),
        "model": index.model_id(),
    }))
}

pub fn api_router(state: Arc<SharedState>) -> Router {
    Router::new()
        .route("/api/ask", post(ask))
        .route("/api/reindex", post(reindex))
        .route("/api/health", get(health))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(state)
}

async fn start_app(state: SharedState) {
    let listen_addr = state.config.listen_addr.clone();
    let app = api_router(Arc::new(state));

    async fn shutdown_signal() {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("failed to install Ctrl+C handler");
        };

        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("failed to install signal handler")
                .recv()
                .await;
        };

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    }

    let listener = tokio::net::TcpListener::bind(&listen_addr).await.unwrap();
    log::info!("listening on {listen_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

pub fn start_daemon(state: SharedState) {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(async { start_app(state).await });
}
