//! Repository functions: one function per database operation.
//!
//! Functions take a `&DbPool` (or any executor, to join a caller's
//! transaction) and return a `Result<T, DbError>`.
//! Pure SQL with no domain types.  Multi-statement writes
//! open their own transaction.

pub mod borrows;
pub mod dashboard;
pub mod dependents;
pub mod equipment;
pub mod rescues;
pub mod safe_zones;
pub mod telemetry;
pub mod thresholds;
pub mod users;
