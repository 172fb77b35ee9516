//! Application-wide constants

pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const MAX_PAGE_SIZE: usize = 1000;
pub const TOKEN_TYPE_BEARER: &str = "bearer";
pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 86_400;
/// One year.
pub const MAX_SESSION_TTL_SECONDS: i64 = 31_536_000;
pub const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 3_600;
pub const DEFAULT_ORDER_PROCESSING_DELAY_SECONDS: u64 = 5;
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@sistema.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "123456";
pub const DEFAULT_ADMIN_NAME: &str = "Admin Sistema";
pub const DEFAULT_ADMIN_AGE: i64 = 25;
