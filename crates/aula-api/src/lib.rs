//! # Aula API
//!
//! HTTP boundary: handlers, bearer extractors, error mapping and the router.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
