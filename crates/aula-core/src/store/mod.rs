//! In-memory record storage

pub mod collection;
pub mod entity_store;
pub mod query;

pub use collection::Collection;
pub use entity_store::EntityStore;
pub use query::{Filter, ListQuery, SortOrder};
