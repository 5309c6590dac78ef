//! `db` crate: pure persistence layer.
//!
//! Provides a connection pool, typed row structs, and repository functions
//! for every table in the carewatch schema.  No business logic lives here:
//! statuses are stored and returned as plain strings, and the `monitor`
//! crate decides which transitions are legal.

pub mod error;
pub mod pool;
pub mod repository;
pub mod models;

pub use pool::DbPool;
pub use error::DbError;
