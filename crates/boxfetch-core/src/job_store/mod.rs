//! Durable job store (SQLite via sqlx).
//!
//! Holds one row per job plus a string key/value settings table. The worker,
//! the intake scanner and the CLI all share this store; every status change
//! made by the worker is a read-then-compare-and-write against it.

pub mod keys;
pub mod types;
pub mod db;
mod jobs;
mod settings;

pub use db::*;
pub use types::*;
