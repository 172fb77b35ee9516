//! Startup seeding

use aula_shared::RecordId;
use serde_json::json;
use tracing::info;

use crate::domain::schema::FieldAccess;
use crate::domain::{Actor, USUARIOS};
use crate::error::DomainError;
use crate::store::EntityStore;

/// Inserts the user that the configured credential pair logs in as. The
/// record cannot be deleted, so every issued session keeps resolving to it.
pub fn seed_admin(
    store: &EntityStore,
    nome: &str,
    email: &str,
    idade: i64,
) -> Result<RecordId, DomainError> {
    let record = store.create_with(
        USUARIOS,
        json!({"nome": nome, "email": email, "idade": idade, "ativo": true}),
        &Actor::Anonymous,
        FieldAccess::Service,
    )?;
    store.protect(USUARIOS, record.id)?;
    info!("Seeded admin user {} ({})", record.id, email);
    Ok(record.id)
}
