//! Generic collection endpoints

use std::collections::HashMap;

use aula_core::{DomainError, ListQuery, Record, PEDIDOS};
use aula_shared::RecordId;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::error::ApiError;
use crate::extractors::Credentials;
use crate::handlers::orders;
use crate::state::AppState;

pub(crate) type RecordPath = Result<Path<(String, String)>, PathRejection>;

pub(crate) fn ensure_collection(state: &AppState, name: &str) -> Result<(), ApiError> {
    if state.store.has_collection(name) {
        Ok(())
    } else {
        Err(DomainError::CollectionNotFound(name.to_string()).into())
    }
}

pub(crate) fn parse_id(raw_id: &str) -> Result<RecordId, ApiError> {
    raw_id
        .parse::<RecordId>()
        .map_err(|_| ApiError::BadRequest(format!("invalid record id '{}'", raw_id)))
}

/// Collection name checked first, then the id segment.
fn record_path(state: &AppState, path: RecordPath) -> Result<(String, RecordId), ApiError> {
    let Path((collection, raw_id)) = path?;
    ensure_collection(state, &collection)?;
    Ok((collection, parse_id(&raw_id)?))
}

/// GET /{collection}
pub async fn list(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    params: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<Json<Vec<Record>>, ApiError> {
    ensure_collection(&state, &collection)?;
    let Query(params) = params?;
    let query = ListQuery::from_params(&params)?;
    Ok(Json(state.store.list(&collection, &query)?))
}

/// POST /{collection}; orders go through the order service.
pub async fn create(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    credentials: Credentials,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Record>), ApiError> {
    ensure_collection(&state, &collection)?;
    let actor = credentials.resolve(&state)?;
    let Json(input) = body?;

    let record = if collection == PEDIDOS {
        orders::place(&state, input, &actor)?
    } else {
        state.store.create(&collection, input, &actor)?
    };
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /{collection}/{id}
pub async fn get(
    State(state): State<AppState>,
    path: RecordPath,
) -> Result<Json<Record>, ApiError> {
    let (collection, id) = record_path(&state, path)?;
    Ok(Json(state.store.get(&collection, id)?))
}

/// PUT and PATCH /{collection}/{id}; both are merge patches.
pub async fn update(
    State(state): State<AppState>,
    path: RecordPath,
    credentials: Credentials,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Record>, ApiError> {
    let (collection, id) = record_path(&state, path)?;
    let actor = credentials.resolve(&state)?;
    let Json(patch) = body?;

    Ok(Json(state.store.update(&collection, id, patch, &actor)?))
}

/// DELETE /{collection}/{id}
pub async fn delete(
    State(state): State<AppState>,
    path: RecordPath,
    credentials: Credentials,
) -> Result<StatusCode, ApiError> {
    let (collection, id) = record_path(&state, path)?;
    let actor = credentials.resolve(&state)?;

    state.store.delete(&collection, id, &actor)?;
    Ok(StatusCode::NO_CONTENT)
}
