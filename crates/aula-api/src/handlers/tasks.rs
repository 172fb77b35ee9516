//! Task completion and statistics

use aula_core::{DomainError, Record, TaskStatistics, TAREFAS};
use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::ApiError;
use crate::extractors::{Credentials, CurrentSession};
use crate::handlers::records::{ensure_collection, parse_id, RecordPath};
use crate::state::AppState;

/// PATCH /tarefas/{id}/concluir; other collections have no such action.
///
/// Checked in order: collection, action, id, caller.
pub async fn complete(
    State(state): State<AppState>,
    path: RecordPath,
    credentials: Credentials,
) -> Result<Json<Record>, ApiError> {
    let Path((collection, raw_id)) = path?;
    ensure_collection(&state, &collection)?;
    if collection != TAREFAS {
        return Err(DomainError::NotFound(format!(
            "{} has no concluir action",
            collection
        ))
        .into());
    }
    let id = parse_id(&raw_id)?;
    let actor = credentials.resolve(&state)?;
    Ok(Json(state.tasks.complete(id, &actor)?))
}

/// GET /estatisticas
pub async fn statistics(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<TaskStatistics>, ApiError> {
    Ok(Json(state.tasks.statistics(session.owner_id)?))
}
