//! Database layer
//!
//! Trait-based abstraction over SQLite (default, single-binary deployment)
//! and MySQL. The driver is selected from configuration; repositories work
//! against `DynDatabasePool` without knowing the backend.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, DatabasePool, DynDatabasePool};
