//! Durable job store (SQLite via sqlx).
//!
//! Persists every job so that PROCESSING jobs stranded by a crash can be
//! reset to PENDING on resume. Connection and schema live in `db`; queries
//! are split into `read` and `write`.

pub mod db;
mod read;
mod write;


pub use db::{JobStore, StoreError};
