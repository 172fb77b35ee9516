// ============================================================================
// Aula Core - Entity Store
// File: crates/aula-core/src/store/entity_store.rs
// ============================================================================
//! Named record collections behind one lock each

use std::collections::HashMap;
use std::sync::Arc;

use aula_shared::RecordId;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::collection::Collection;
use super::query::ListQuery;
use crate::clock::Clock;
use crate::domain::schema::FieldAccess;
use crate::domain::{Actor, CollectionSchema, Ownership, Record};
use crate::error::DomainError;

/// Create/read/update/delete over a fixed set of collections.
///
/// Collections are registered before the store is shared; afterwards every
/// mutation takes that collection's write lock for its whole
/// check-then-write sequence.
pub struct EntityStore {
    collections: HashMap<&'static str, RwLock<Collection>>,
    clock: Arc<dyn Clock>,
}

impl EntityStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { collections: HashMap::new(), clock }
    }

    pub fn with_schemas(schemas: Vec<CollectionSchema>, clock: Arc<dyn Clock>) -> Self {
        let mut store = Self::new(clock);
        for schema in schemas {
            store.register(schema);
        }
        store
    }

    /// Adds a collection; re-registering a name replaces it and its records.
    pub fn register(&mut self, schema: CollectionSchema) {
        info!("Registering collection: {}", schema.name);
        self.collections.insert(schema.name, RwLock::new(Collection::new(schema)));
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn collection_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.collections.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn has_collection(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    pub fn schema(&self, name: &str) -> Result<CollectionSchema, DomainError> {
        Ok(self.collection(name)?.read().schema().clone())
    }

    pub fn create(&self, name: &str, input: Value, actor: &Actor) -> Result<Record, DomainError> {
        self.create_with(name, input, actor, FieldAccess::Client)
    }

    pub(crate) fn create_with(
        &self,
        name: &str,
        input: Value,
        actor: &Actor,
        access: FieldAccess,
    ) -> Result<Record, DomainError> {
        let mut collection = self.collection(name)?.write();

        let (fields, owner_id) = {
            let schema = collection.schema();
            if schema.access.create_requires_session && !actor.is_authenticated() {
                return Err(DomainError::Authentication(format!(
                    "creating {} requires a session",
                    name
                )));
            }
            let owner_id = match schema.access.ownership {
                Ownership::Creator => actor.user_id(),
                Ownership::Unowned | Ownership::SelfRecord => None,
            };
            (schema.validate_new(input, access)?, owner_id)
        };

        let record = collection.insert(fields, owner_id, self.clock.now())?;
        debug!("Created {} {}", name, record.id);
        Ok(record)
    }

    pub fn get(&self, name: &str, id: RecordId) -> Result<Record, DomainError> {
        self.collection(name)?
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(name, id))
    }

    pub fn list(&self, name: &str, query: &ListQuery) -> Result<Vec<Record>, DomainError> {
        let collection = self.collection(name)?.read();
        query.apply(collection.schema(), collection.records())
    }

    pub fn count(&self, name: &str) -> Result<usize, DomainError> {
        Ok(self.collection(name)?.read().len())
    }

    /// Merge-patch update: supplied fields replace stored ones, `null`
    /// removes an optional field, everything else is left as is.
    pub fn update(
        &self,
        name: &str,
        id: RecordId,
        patch: Value,
        actor: &Actor,
    ) -> Result<Record, DomainError> {
        self.modify(name, id, actor, FieldAccess::Client, |_, _| Ok(patch))
    }

    /// Builds a patch from the current record under the write lock, then
    /// validates and applies it. Checks run in this order: session, record
    /// existence, ownership, then the patch itself.
    pub(crate) fn modify<F>(
        &self,
        name: &str,
        id: RecordId,
        actor: &Actor,
        access: FieldAccess,
        make_patch: F,
    ) -> Result<Record, DomainError>
    where
        F: FnOnce(&Record, &CollectionSchema) -> Result<Value, DomainError>,
    {
        self.collection(name)?;
        require_session(actor, "modifying", name)?;
        self.patch_locked(name, id, Some(actor), access, make_patch)
    }

    /// Same as `modify`, for background work that acts on no caller's
    /// behalf: no session or ownership check.
    pub(crate) fn modify_as_service<F>(
        &self,
        name: &str,
        id: RecordId,
        make_patch: F,
    ) -> Result<Record, DomainError>
    where
        F: FnOnce(&Record, &CollectionSchema) -> Result<Value, DomainError>,
    {
        self.patch_locked(name, id, None, FieldAccess::Service, make_patch)
    }

    fn patch_locked<F>(
        &self,
        name: &str,
        id: RecordId,
        actor: Option<&Actor>,
        access: FieldAccess,
        make_patch: F,
    ) -> Result<Record, DomainError>
    where
        F: FnOnce(&Record, &CollectionSchema) -> Result<Value, DomainError>,
    {
        let mut collection = self.collection(name)?.write();
        let changes = {
            let schema = collection.schema();
            let current = collection
                .get(id)
                .ok_or_else(|| DomainError::not_found(name, id))?;
            if let Some(actor) = actor {
                if !schema.owns(actor, current) {
                    warn!("Actor {:?} denied update of {} {}", actor, name, id);
                    return Err(DomainError::Authorization(format!(
                        "not allowed to modify {} {}",
                        name, id
                    )));
                }
            }
            let patch = make_patch(current, schema)?;
            schema.validate_patch(patch, access)?
        };

        let record = collection.apply_changes(id, changes)?;
        debug!("Updated {} {}", name, id);
        Ok(record)
    }

    /// Hard delete. The id is not handed out again.
    pub fn delete(&self, name: &str, id: RecordId, actor: &Actor) -> Result<Record, DomainError> {
        let lock = self.collection(name)?;
        require_session(actor, "deleting", name)?;

        let mut collection = lock.write();
        let current = collection
            .get(id)
            .ok_or_else(|| DomainError::not_found(name, id))?;
        if !collection.schema().owns(actor, current) {
            warn!("Actor {:?} denied delete of {} {}", actor, name, id);
            return Err(DomainError::Authorization(format!(
                "not allowed to delete {} {}",
                name, id
            )));
        }
        if collection.is_protected(id) {
            warn!("Actor {:?} tried to delete protected {} {}", actor, name, id);
            return Err(DomainError::Authorization(format!(
                "{} {} is protected and cannot be deleted",
                name, id
            )));
        }

        let removed = collection
            .remove(id)
            .ok_or_else(|| DomainError::not_found(name, id))?;
        debug!("Deleted {} {}", name, id);
        Ok(removed)
    }

    /// Marks a record as undeletable.
    pub(crate) fn protect(&self, name: &str, id: RecordId) -> Result<(), DomainError> {
        let mut collection = self.collection(name)?.write();
        if collection.get(id).is_none() {
            return Err(DomainError::not_found(name, id));
        }
        collection.protect(id);
        Ok(())
    }

    /// Runs `f` under the collection's read lock.
    pub fn read<R>(&self, name: &str, f: impl FnOnce(&Collection) -> R) -> Result<R, DomainError> {
        let collection = self.collection(name)?.read();
        Ok(f(&collection))
    }

    fn collection(&self, name: &str) -> Result<&RwLock<Collection>, DomainError> {
        self.collections
            .get(name)
            .ok_or_else(|| DomainError::CollectionNotFound(name.to_string()))
    }
}

fn require_session(actor: &Actor, action: &str, name: &str) -> Result<(), DomainError> {
    if actor.is_authenticated() {
        Ok(())
    } else {
        Err(DomainError::Authentication(format!("{} {} requires a session", action, name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::domain::{default_schemas, PEDIDOS, PRODUTOS, TAREFAS, USUARIOS};
    use serde_json::json;

    fn store() -> EntityStore {
        EntityStore::with_schemas(default_schemas(), Arc::new(SystemClock))
    }

    const ADMIN: Actor = Actor::User(1);

    #[test]
    fn test_produtos_scenario() {
        let store = store();
        let input = json!({"nome": "Ana", "preco": 10});

        let first = store.create(PRODUTOS, input.clone(), &ADMIN).unwrap();
        assert_eq!(first.id, 1);

        let listed = store.list(PRODUTOS, &ListQuery::new()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, 1);
        assert_eq!(Value::Object(listed[0].fields.clone()), input);

        let second = store.create(PRODUTOS, input.clone(), &ADMIN).unwrap();
        assert_eq!(second.id, 2);
        assert_eq!(second.fields, first.fields);
    }

    #[test]
    fn test_get_after_create_returns_supplied_fields() {
        let store = store();
        let input = json!({"titulo": "Implementar API", "prioridade": "alta"});
        let created = store.create(TAREFAS, input.clone(), &ADMIN).unwrap();

        let fetched = store.get(TAREFAS, created.id).unwrap();
        assert_eq!(fetched, created);
        assert_eq!(Value::Object(fetched.fields), input);
        assert_eq!(fetched.owner_id, Some(1));
    }

    #[test]
    fn test_unknown_collection_and_record() {
        let store = store();
        assert!(matches!(
            store.get("livros", 1),
            Err(DomainError::CollectionNotFound(_))
        ));
        assert_eq!(store.get(PRODUTOS, 99), Err(DomainError::not_found(PRODUTOS, 99)));
        assert!(matches!(
            store.list("livros", &ListQuery::new()),
            Err(DomainError::CollectionNotFound(_))
        ));
    }

    #[test]
    fn test_create_requires_session_where_declared() {
        let store = store();
        let err = store
            .create(PRODUTOS, json!({"nome": "Ana", "preco": 10}), &Actor::Anonymous)
            .unwrap_err();
        assert!(matches!(err, DomainError::Authentication(_)));
        assert_eq!(store.count(PRODUTOS).unwrap(), 0);

        // registration is public
        let user = store
            .create(USUARIOS, json!({"nome": "Ana Lima", "email": "ana@x.com"}), &Actor::Anonymous)
            .unwrap();
        assert_eq!(user.owner_id, None);
    }

    #[test]
    fn test_update_changes_only_supplied_fields() {
        let store = store();
        let created = store
            .create(PRODUTOS, json!({"nome": "Bola", "preco": 50, "estoque": 3}), &ADMIN)
            .unwrap();

        store
            .update(PRODUTOS, created.id, json!({"preco": 45.9}), &ADMIN)
            .unwrap();

        let fetched = store.get(PRODUTOS, created.id).unwrap();
        assert_eq!(
            Value::Object(fetched.fields),
            json!({"nome": "Bola", "preco": 45.9, "estoque": 3})
        );
        assert_eq!(fetched.created_at, created.created_at);
    }

    #[test]
    fn test_update_validation_leaves_record_untouched() {
        let store = store();
        let created = store.create(PRODUTOS, json!({"nome": "Bola", "preco": 50}), &ADMIN).unwrap();

        let err = store
            .update(PRODUTOS, created.id, json!({"preco": -1}), &ADMIN)
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(store.get(PRODUTOS, created.id).unwrap(), created);
    }

    #[test]
    fn test_mutation_check_order() {
        let store = store();
        let task = store.create(TAREFAS, json!({"titulo": "minha"}), &ADMIN).unwrap();

        let anon = store.update(TAREFAS, task.id, json!({"titulo": "x"}), &Actor::Anonymous);
        assert!(matches!(anon, Err(DomainError::Authentication(_))));

        let missing = store.update(TAREFAS, 42, json!({"titulo": "x"}), &Actor::User(2));
        assert!(matches!(missing, Err(DomainError::RecordNotFound { .. })));

        let foreign = store.update(TAREFAS, task.id, json!({"titulo": ""}), &Actor::User(2));
        assert!(matches!(foreign, Err(DomainError::Authorization(_))));

        let invalid = store.update(TAREFAS, task.id, json!({"titulo": ""}), &ADMIN);
        assert!(matches!(invalid, Err(DomainError::Validation(_))));

        let read_only = store.update(TAREFAS, task.id, json!({"concluida": true}), &ADMIN);
        assert!(matches!(read_only, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_users_only_modify_themselves() {
        let store = store();
        let ana = store
            .create(USUARIOS, json!({"nome": "Ana Lima", "email": "ana@x.com"}), &Actor::Anonymous)
            .unwrap();
        let bia = store
            .create(USUARIOS, json!({"nome": "Bia Reis", "email": "bia@x.com"}), &Actor::Anonymous)
            .unwrap();

        let me = Actor::User(ana.id);
        assert!(store.update(USUARIOS, ana.id, json!({"idade": 30}), &me).is_ok());
        assert!(matches!(
            store.delete(USUARIOS, bia.id, &me),
            Err(DomainError::Authorization(_))
        ));
        assert!(matches!(
            store.update(USUARIOS, bia.id, json!({"email": "ana@x.com"}), &Actor::User(bia.id)),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_delete_is_hard() {
        let store = store();
        let created = store.create(PRODUTOS, json!({"nome": "Bola", "preco": 50}), &ADMIN).unwrap();

        let removed = store.delete(PRODUTOS, created.id, &ADMIN).unwrap();
        assert_eq!(removed, created);
        assert_eq!(
            store.get(PRODUTOS, created.id),
            Err(DomainError::not_found(PRODUTOS, created.id))
        );
        assert!(store.list(PRODUTOS, &ListQuery::new()).unwrap().is_empty());
        assert!(matches!(
            store.delete(PRODUTOS, created.id, &ADMIN),
            Err(DomainError::RecordNotFound { .. })
        ));

        let next = store.create(PRODUTOS, json!({"nome": "Rede", "preco": 5}), &ADMIN).unwrap();
        assert_eq!(next.id, 2);
    }

    #[test]
    fn test_protected_record_survives_delete() {
        let store = store();
        let input = json!({"nome": "Admin Sistema", "email": "admin@x.com"});
        let admin = store.create(USUARIOS, input, &Actor::Anonymous).unwrap();
        store.protect(USUARIOS, admin.id).unwrap();

        let me = Actor::User(admin.id);
        assert!(matches!(
            store.delete(USUARIOS, admin.id, &me),
            Err(DomainError::Authorization(_))
        ));
        assert_eq!(store.get(USUARIOS, admin.id).unwrap(), admin);
        assert!(store.update(USUARIOS, admin.id, json!({"idade": 40}), &me).is_ok());
        assert!(matches!(
            store.protect(USUARIOS, 99),
            Err(DomainError::RecordNotFound { .. })
        ));
    }

    #[test]
    fn test_service_modify_skips_caller_checks() {
        let store = store();
        let task = store.create(TAREFAS, json!({"titulo": "minha"}), &ADMIN).unwrap();

        let updated = store
            .modify_as_service(TAREFAS, task.id, |_, _| Ok(json!({"concluida": true})))
            .unwrap();
        assert_eq!(updated.field("concluida"), Some(&json!(true)));
        assert_eq!(updated.owner_id, Some(1));
        assert!(matches!(
            store.modify_as_service(TAREFAS, 42, |_, _| Ok(json!({"titulo": "x"}))),
            Err(DomainError::RecordNotFound { .. })
        ));
    }

    #[test]
    fn test_concurrent_creates_get_unique_ids() {
        let store = Arc::new(store());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    (0..25)
                        .map(|i| {
                            store
                                .create(
                                    PRODUTOS,
                                    json!({"nome": format!("p{}-{}", t, i), "preco": 1}),
                                    &ADMIN,
                                )
                                .unwrap()
                                .id
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<RecordId> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 200);
        assert_eq!(store.count(PRODUTOS).unwrap(), 200);
    }

    #[test]
    fn test_collection_names_sorted() {
        assert_eq!(store().collection_names(), vec![PEDIDOS, PRODUTOS, TAREFAS, USUARIOS]);
    }
}
