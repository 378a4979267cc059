//! HTTP and WebSocket surface
//!
//! - `GET /api/concepts` (also `/concepts`) lists the catalog
//! - `GET /api/concepts/{id}` returns one concept or 404
//! - `GET /ws` streams `THREAD_UPDATE` frames for one connection
//! - `GET /health` liveness probe

pub mod concepts;
pub mod ws;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;

use crate::catalog::{ConceptCatalog, InMemoryCatalog};
use crate::connection::SessionSettings;
use crate::core::config::ServerConfig;
use crate::core::error::{Result, TutorError};

/// State shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn ConceptCatalog>,
    pub settings: SessionSettings,
    connections: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(catalog: Arc<dyn ConceptCatalog>, settings: SessionSettings) -> Self {
        Self {
            catalog,
            settings,
            connections: Arc::new(AtomicU64::new(0)),
        }
    }

    fn next_connection_id(&self) -> u64 {
        self.connections.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl IntoResponse for TutorError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            TutorError::ConceptNotFound(_) => (StatusCode::NOT_FOUND, "Concept not found".to_string()),
            other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        };
        (status, Json(ErrorBody { message })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    let concepts = Router::new()
        .route("/concepts", get(concepts::list_concepts))
        .route("/concepts/{id}", get(concepts::get_concept));

    Router::new()
        .route("/health", get(health))
        .route("/ws", get(ws::ws_handler))
        .nest("/api", concepts.clone())
        .merge(concepts)
        .with_state(state)
}

/// Catalog from `concepts_path`, or the builtin concepts
pub fn load_catalog(config: &ServerConfig) -> Result<InMemoryCatalog> {
    match &config.concepts_path {
        Some(path) => InMemoryCatalog::load(path),
        None => InMemoryCatalog::builtin(),
    }
}

/// Bind the configured address and serve until the process stops
pub async fn serve(config: &ServerConfig, catalog: Arc<dyn ConceptCatalog>) -> Result<()> {
    let listener = TcpListener::bind(config.listen_addr).await?;
    serve_on(listener, AppState::new(catalog, SessionSettings::from(config))).await
}

/// Serve on an already bound listener
pub async fn serve_on(listener: TcpListener, state: AppState) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(addr = %addr, "Thread tutor listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let response = TutorError::ConceptNotFound(crate::core::types::ConceptId(9)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_other_errors_map_to_500() {
        let response = TutorError::Config("bad".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_connection_ids_increase() {
        let state = AppState::new(
            Arc::new(InMemoryCatalog::new()),
            SessionSettings::default(),
        );
        assert_eq!(state.next_connection_id(), 1);
        assert_eq!(state.clone().next_connection_id(), 2);
    }
}
