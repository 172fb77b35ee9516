//! Common types

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Identifier assigned to a record inside its collection.
pub type RecordId = u64;

/// Offset pagination as used by the list endpoints (`skip` / `limit`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub skip: usize,
    pub limit: usize,
}

impl Pagination {
    pub fn new(skip: usize, limit: usize) -> Self {
        Self { skip, limit: limit.min(MAX_PAGE_SIZE) }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self { skip: 0, limit: DEFAULT_PAGE_SIZE }
    }
}
