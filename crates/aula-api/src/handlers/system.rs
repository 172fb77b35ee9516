//! Banner, health, metrics and maintenance endpoints

use std::collections::BTreeMap;

use aula_core::{PEDIDOS, PRODUTOS, USUARIOS};
use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": state.config.app.name,
        "version": env!("CARGO_PKG_VERSION"),
        "collections": state.store.collection_names(),
        "endpoints": [
            "/auth/login",
            "/auth/logout",
            "/auth/perfil",
            "/categorias",
            "/categorias/{categoria}",
            "/estatisticas",
            "/estatisticas/produtos",
            "/health",
            "/metrics",
            "/relatorios/vendas",
            "/{collection}",
            "/{collection}/{id}",
            "/tarefas/{id}/concluir",
        ],
    }))
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    timestamp: String,
    version: &'static str,
    collections: BTreeMap<&'static str, usize>,
    active_sessions: usize,
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let mut collections = BTreeMap::new();
    for name in state.store.collection_names() {
        collections.insert(name, state.store.count(name)?);
    }

    Ok(Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
        collections,
        active_sessions: state.auth.active_sessions(),
    }))
}

/// GET /metrics
pub async fn metrics(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    Ok(Json(json!({
        "usuarios_cadastrados": state.store.count(USUARIOS)?,
        "produtos_cadastrados": state.store.count(PRODUTOS)?,
        "pedidos_realizados": state.store.count(PEDIDOS)?,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// POST /sistema/limpar-sessoes
pub async fn sweep_sessions(State(state): State<AppState>) -> Json<Value> {
    let removed = state.auth.sweep_expired();
    info!("Manual session sweep removed {} sessions", removed);
    Json(json!({ "removed": removed }))
}
