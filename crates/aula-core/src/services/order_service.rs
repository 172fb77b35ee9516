// ============================================================================
// Aula Core - Order Service
// File: crates/aula-core/src/services/order_service.rs
// ============================================================================
//! Order placement, processing and the sales report

use std::sync::Arc;

use aula_shared::RecordId;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use super::round_cents;
use crate::domain::catalog::{STATUS_PENDENTE, STATUS_PROCESSADO};
use crate::domain::schema::FieldAccess;
use crate::domain::{Actor, Record, PEDIDOS, PRODUTOS};
use crate::error::DomainError;
use crate::store::collection::Collection;
use crate::store::EntityStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportPeriod {
    pub inicio: Option<NaiveDate>,
    pub fim: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesSummary {
    pub total_vendas: f64,
    pub total_pedidos: usize,
    /// Average order value, 0 without orders.
    pub ticket_medio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesReport {
    pub periodo: ReportPeriod,
    pub resumo: SalesSummary,
    pub pedidos: Vec<Record>,
}

pub struct OrderService {
    store: Arc<EntityStore>,
}

impl OrderService {
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self { store }
    }

    /// Validates the lines, checks that every product exists and stores the
    /// order as pending with its computed total.
    pub fn place(&self, input: Value, actor: &Actor) -> Result<Record, DomainError> {
        let schema = self.store.schema(PEDIDOS)?;
        if !actor.is_authenticated() {
            return Err(DomainError::Authentication(format!(
                "creating {} requires a session",
                PEDIDOS
            )));
        }

        let mut fields = schema.validate_new(input, FieldAccess::Client)?;
        let itens = fields.get("itens").and_then(Value::as_array).cloned().unwrap_or_default();
        let total = self.store.read(PRODUTOS, |produtos| order_total(produtos, &itens))??;

        fields.insert("total".to_string(), json!(total));
        fields.insert("status".to_string(), json!(STATUS_PENDENTE));
        let record =
            self.store.create_with(PEDIDOS, Value::Object(fields), actor, FieldAccess::Service)?;

        info!("Order {} placed by {:?}, total {:.2}", record.id, actor, total);
        Ok(record)
    }

    /// Moves a pending order to processed; any other status is a
    /// validation error.
    pub fn process(&self, id: RecordId) -> Result<Record, DomainError> {
        let record = self.store.modify_as_service(PEDIDOS, id, |order, schema| {
            let pending = schema
                .effective(order, "status")
                .is_some_and(|status| status.as_str() == Some(STATUS_PENDENTE));
            if !pending {
                return Err(DomainError::validation(format!("order {} is not pending", id)));
            }
            Ok(json!({"status": STATUS_PROCESSADO}))
        })?;

        info!("Order {} processed", id);
        Ok(record)
    }

    /// Orders created within `[inicio, fim]`, both bounds inclusive UTC days.
    pub fn sales_report(
        &self,
        inicio: Option<NaiveDate>,
        fim: Option<NaiveDate>,
    ) -> Result<SalesReport, DomainError> {
        if let (Some(inicio), Some(fim)) = (inicio, fim) {
            if inicio > fim {
                return Err(DomainError::validation("data_inicio must not be after data_fim"));
            }
        }

        self.store.read(PEDIDOS, |orders| {
            let schema = orders.schema();
            let pedidos: Vec<Record> = orders
                .records()
                .filter(|order| {
                    let day = order.created_at.date_naive();
                    inicio.map_or(true, |inicio| day >= inicio) && fim.map_or(true, |fim| day <= fim)
                })
                .cloned()
                .collect();

            let total_vendas: f64 = pedidos
                .iter()
                .filter_map(|order| schema.effective(order, "total").and_then(|v| v.as_f64()))
                .sum();
            let total_pedidos = pedidos.len();
            let ticket_medio = if total_pedidos > 0 {
                round_cents(total_vendas / total_pedidos as f64)
            } else {
                0.0
            };

            SalesReport {
                periodo: ReportPeriod { inicio, fim },
                resumo: SalesSummary {
                    total_vendas: round_cents(total_vendas),
                    total_pedidos,
                    ticket_medio,
                },
                pedidos,
            }
        })
    }
}

fn order_total(produtos: &Collection, itens: &[Value]) -> Result<f64, DomainError> {
    let mut total = 0.0;
    for item in itens {
        let produto_id = item.get("produto_id").and_then(Value::as_u64).unwrap_or_default();
        if produtos.get(produto_id).is_none() {
            return Err(DomainError::validation(format!(
                "product {} does not exist",
                produto_id
            )));
        }
        let quantidade = item.get("quantidade").and_then(Value::as_f64).unwrap_or_default();
        let preco = item.get("preco_unitario").and_then(Value::as_f64).unwrap_or_default();
        total += quantidade * preco;
    }
    Ok(round_cents(total))
}
