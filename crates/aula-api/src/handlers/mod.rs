//! HTTP handlers

pub mod auth;
pub mod orders;
pub mod products;
pub mod records;
pub mod system;
pub mod tasks;
