// ============================================================================
// Aula API - Order Handlers
// File: crates/aula-api/src/handlers/orders.rs
// ============================================================================
//! Order placement and the sales report

use std::sync::Arc;
use std::time::Duration;

use aula_core::{Actor, OrderService, Record, SalesReport};
use aula_shared::RecordId;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::extractors::CurrentSession;
use crate::state::AppState;

/// Places the order and schedules its processing. Reached through
/// `POST /pedidos`.
pub(crate) fn place(state: &AppState, input: Value, actor: &Actor) -> Result<Record, ApiError> {
    let record = state.orders.place(input, actor)?;
    schedule_processing(
        state.orders.clone(),
        record.id,
        Duration::from_secs(state.config.orders.processing_delay_seconds),
    );
    Ok(record)
}

fn schedule_processing(orders: Arc<OrderService>, id: RecordId, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        match orders.process(id) {
            Ok(_) => debug!("Background processing of order {} done", id),
            Err(e) => warn!("Order {} was not processed: {}", id, e),
        }
    });
}

#[derive(Debug, Deserialize)]
pub struct ReportParams {
    pub data_inicio: Option<NaiveDate>,
    pub data_fim: Option<NaiveDate>,
}

/// GET /relatorios/vendas
pub async fn sales_report(
    State(state): State<AppState>,
    _session: CurrentSession,
    params: Result<Query<ReportParams>, QueryRejection>,
) -> Result<Json<SalesReport>, ApiError> {
    let Query(params) = params?;
    Ok(Json(state.orders.sales_report(params.data_inicio, params.data_fim)?))
}
