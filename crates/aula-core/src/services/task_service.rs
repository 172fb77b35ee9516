// ============================================================================
// Aula Core - Task Service
// File: crates/aula-core/src/services/task_service.rs
// ============================================================================
//! Task completion and per-user task statistics

use std::collections::BTreeMap;
use std::sync::Arc;

use aula_shared::RecordId;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::domain::schema::FieldAccess;
use crate::domain::{Actor, Record, TAREFAS};
use crate::domain::catalog::PRIORIDADE_PADRAO;
use crate::error::DomainError;
use crate::store::EntityStore;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskStatistics {
    pub total_tarefas: usize,
    pub tarefas_concluidas: usize,
    pub tarefas_pendentes: usize,
    /// Percentage, 0 when there are no tasks.
    pub taxa_conclusao: f64,
    pub por_prioridade: BTreeMap<String, usize>,
}

pub struct TaskService {
    store: Arc<EntityStore>,
}

impl TaskService {
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self { store }
    }

    /// Marks a task as done. Same session/ownership checks as an update;
    /// a task that is already done is a validation error.
    pub fn complete(&self, id: RecordId, actor: &Actor) -> Result<Record, DomainError> {
        let now = self.store.now();
        let record = self.store.modify(TAREFAS, id, actor, FieldAccess::Service, |task, schema| {
            let done = schema
                .effective(task, "concluida")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            if done {
                return Err(DomainError::validation(format!("task {} is already completed", id)));
            }
            Ok(json!({"concluida": true, "concluida_em": now.to_rfc3339()}))
        })?;

        info!("Task {} completed by {:?}", id, actor);
        Ok(record)
    }

    pub fn statistics(&self, owner: RecordId) -> Result<TaskStatistics, DomainError> {
        self.store.read(TAREFAS, |tasks| {
            let schema = tasks.schema();
            let mut stats = TaskStatistics::default();

            for task in tasks.records().filter(|t| t.owner_id == Some(owner)) {
                stats.total_tarefas += 1;
                if schema
                    .effective(task, "concluida")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false)
                {
                    stats.tarefas_concluidas += 1;
                }
                let prioridade = schema
                    .effective(task, "prioridade")
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_else(|| PRIORIDADE_PADRAO.to_string());
                *stats.por_prioridade.entry(prioridade).or_insert(0) += 1;
            }

            stats.tarefas_pendentes = stats.total_tarefas - stats.tarefas_concluidas;
            if stats.total_tarefas > 0 {
                stats.taxa_conclusao =
                    stats.tarefas_concluidas as f64 / stats.total_tarefas as f64 * 100.0;
            }
            stats
        })
    }
}
