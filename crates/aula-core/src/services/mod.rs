//! Domain services built on the store and the session table

pub mod auth_service;
pub mod bootstrap;
pub mod order_service;
pub mod product_service;
pub mod task_service;

pub use auth_service::{AuthService, LoginResult};
pub use bootstrap::seed_admin;
pub use order_service::{OrderService, ReportPeriod, SalesReport, SalesSummary};
pub use product_service::{ProductService, ProductStatistics};
pub use task_service::{TaskService, TaskStatistics};

/// Rounds to two decimal places.
pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
