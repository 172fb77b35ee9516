//! Catalogue views over `produtos`

use aula_core::{ProductStatistics, Record};
use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /estatisticas/produtos
pub async fn statistics(
    State(state): State<AppState>,
) -> Result<Json<ProductStatistics>, ApiError> {
    Ok(Json(state.products.statistics()?))
}

/// GET /categorias
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.products.categories()?))
}

/// GET /categorias/{categoria}
pub async fn by_category(
    State(state): State<AppState>,
    Path(categoria): Path<String>,
) -> Result<Json<Vec<Record>>, ApiError> {
    Ok(Json(state.products.by_category(&categoria)?))
}
