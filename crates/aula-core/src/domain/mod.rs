//! # Aula Core - Domain Module
//!
//! Records, collection schemas, callers and the built-in collections.

pub mod actor;
pub mod catalog;
pub mod record;
pub mod schema;

pub use actor::Actor;
pub use catalog::{default_schemas, PEDIDOS, PRODUTOS, TAREFAS, USUARIOS};
pub use record::{Fields, Record};
pub use schema::{AccessPolicy, CollectionSchema, FieldKind, FieldSpec, Ownership};
