//! Product catalogue statistics and categories

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use super::round_cents;
use crate::domain::{Record, PRODUTOS};
use crate::error::DomainError;
use crate::store::EntityStore;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductStatistics {
    pub total_produtos: usize,
    /// Products whose effective `estoque` is above zero.
    pub em_estoque: usize,
    pub sem_estoque: usize,
    pub preco_medio: f64,
    /// First product with the highest price.
    pub produto_mais_caro: Option<Record>,
    pub categorias_disponiveis: usize,
}

pub struct ProductService {
    store: Arc<EntityStore>,
}

impl ProductService {
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self { store }
    }

    pub fn statistics(&self) -> Result<ProductStatistics, DomainError> {
        self.store.read(PRODUTOS, |produtos| {
            let schema = produtos.schema();
            let mut stats = ProductStatistics::default();
            let mut soma_precos = 0.0;
            let mut maior_preco = f64::NEG_INFINITY;
            let mut categorias = BTreeSet::new();

            for produto in produtos.records() {
                stats.total_produtos += 1;
                let estoque = schema
                    .effective(produto, "estoque")
                    .and_then(|v| v.as_i64())
                    .unwrap_or(0);
                if estoque > 0 {
                    stats.em_estoque += 1;
                }

                let preco = produto.field("preco").and_then(|v| v.as_f64()).unwrap_or(0.0);
                soma_precos += preco;
                if preco > maior_preco {
                    maior_preco = preco;
                    stats.produto_mais_caro = Some(produto.clone());
                }

                if let Some(categoria) = produto.field("categoria").and_then(|v| v.as_str()) {
                    categorias.insert(categoria);
                }
            }

            stats.sem_estoque = stats.total_produtos - stats.em_estoque;
            if stats.total_produtos > 0 {
                stats.preco_medio = round_cents(soma_precos / stats.total_produtos as f64);
            }
            stats.categorias_disponiveis = categorias.len();
            stats
        })
    }

    /// Distinct categories in use, sorted.
    pub fn categories(&self) -> Result<Vec<String>, DomainError> {
        self.store.read(PRODUTOS, |produtos| {
            produtos
                .records()
                .filter_map(|p| p.field("categoria").and_then(|v| v.as_str()))
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(str::to_string)
                .collect()
        })
    }

    /// Products of one category, matched case-insensitively. An empty
    /// result is a not-found error.
    pub fn by_category(&self, categoria: &str) -> Result<Vec<Record>, DomainError> {
        let wanted = categoria.to_lowercase();
        let found: Vec<Record> = self.store.read(PRODUTOS, |produtos| {
            produtos
                .records()
                .filter(|p| {
                    p.field("categoria")
                        .and_then(|v| v.as_str())
                        .is_some_and(|c| c.to_lowercase() == wanted)
                })
                .cloned()
                .collect()
        })?;

        if found.is_empty() {
            return Err(DomainError::NotFound(format!(
                "no products in category '{}'",
                categoria
            )));
        }
        Ok(found)
    }
}
