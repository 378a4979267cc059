//! Read-only concept endpoints

use axum::extract::{Path, State};
use axum::Json;

use crate::catalog::Concept;
use crate::core::error::{Result, TutorError};
use crate::core::types::ConceptId;
use crate::server::AppState;

pub async fn list_concepts(State(state): State<AppState>) -> Json<Vec<Concept>> {
    Json(state.catalog.list())
}

/// Non-numeric ids are treated like ids that do not exist
pub async fn get_concept(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Concept>> {
    let id = raw_id
        .parse::<i64>()
        .map(ConceptId)
        .map_err(|_| TutorError::ConceptNotFound(ConceptId(0)))?;

    state
        .catalog
        .get(id)
        .map(Json)
        .ok_or(TutorError::ConceptNotFound(id))
}
