//! # Aula Core
//!
//! In-memory entity store and session guard: record collections with
//! schemas, list queries, the bearer session table and the services built
//! on top of them.

pub mod clock;
pub mod domain;
pub mod error;
pub mod services;
pub mod session_store;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use domain::*;
pub use error::DomainError;
pub use services::{
    seed_admin, AuthService, LoginResult, OrderService, ProductService, ProductStatistics,
    SalesReport, TaskService, TaskStatistics,
};
pub use session_store::SessionStore;
pub use store::{EntityStore, ListQuery};
