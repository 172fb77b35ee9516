//! One named collection of records

use std::collections::{BTreeMap, BTreeSet};

use aula_shared::RecordId;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::{CollectionSchema, Fields, Record};
use crate::error::DomainError;

/// Records keyed by id. Ids grow monotonically from 1 and are never reused,
/// so key order is insertion order.
#[derive(Debug)]
pub struct Collection {
    schema: CollectionSchema,
    records: BTreeMap<RecordId, Record>,
    next_id: RecordId,
    /// Ids that may not be deleted.
    protected: BTreeSet<RecordId>,
}

impl Collection {
    pub fn new(schema: CollectionSchema) -> Self {
        Self { schema, records: BTreeMap::new(), next_id: 1, protected: BTreeSet::new() }
    }

    pub fn schema(&self) -> &CollectionSchema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.get(&id)
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Stores already-validated fields under a fresh id.
    pub fn insert(
        &mut self,
        fields: Fields,
        owner_id: Option<RecordId>,
        now: DateTime<Utc>,
    ) -> Result<Record, DomainError> {
        self.check_unique(&fields, None)?;

        let id = self.next_id;
        self.next_id += 1;

        let record = Record { id, created_at: now, owner_id, fields };
        self.records.insert(id, record.clone());
        Ok(record)
    }

    /// Applies validated merge-patch changes; `None` removes the field.
    pub fn apply_changes(
        &mut self,
        id: RecordId,
        changes: Vec<(String, Option<Value>)>,
    ) -> Result<Record, DomainError> {
        let mut fields = self
            .records
            .get(&id)
            .map(|record| record.fields.clone())
            .ok_or_else(|| DomainError::not_found(self.schema.name, id))?;

        for (name, value) in changes {
            match value {
                Some(value) => {
                    fields.insert(name, value);
                }
                None => {
                    fields.remove(&name);
                }
            }
        }

        self.check_unique(&fields, Some(id))?;

        match self.records.get_mut(&id) {
            Some(record) => {
                record.fields = fields;
                Ok(record.clone())
            }
            None => Err(DomainError::not_found(self.schema.name, id)),
        }
    }

    pub fn remove(&mut self, id: RecordId) -> Option<Record> {
        self.records.remove(&id)
    }

    pub fn protect(&mut self, id: RecordId) {
        self.protected.insert(id);
    }

    pub fn is_protected(&self, id: RecordId) -> bool {
        self.protected.contains(&id)
    }

    fn check_unique(&self, fields: &Fields, except: Option<RecordId>) -> Result<(), DomainError> {
        for spec in self.schema.fields.iter().filter(|spec| spec.unique) {
            let Some(value) = fields.get(spec.name) else {
                continue;
            };
            let taken = self
                .records
                .values()
                .filter(|other| Some(other.id) != except)
                .filter_map(|other| other.fields.get(spec.name))
                .any(|taken| spec.kind.same_value(taken, value));
            if taken {
                return Err(DomainError::validation(format!(
                    "{} {} already registered",
                    spec.name, value
                )));
            }
        }
        Ok(())
    }
}
