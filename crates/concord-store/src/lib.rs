//! # concord-store
//!
//! SQLite persistence for the reconciliation engine. The crate exposes a
//! synchronous `Database` handle wrapping a `rusqlite::Connection`, typed
//! CRUD helpers for the local account, recipients, distribution lists and
//! unknown records, and a `SyncTransaction` that implements the engine's
//! `LocalStore` so a whole pass commits or rolls back as one unit.

pub mod account;
pub mod database;
pub mod distribution_lists;
pub mod migrations;
pub mod recipients;
pub mod unknown;

mod error;
mod local_store;

pub use database::{default_path, Database, SyncTransaction};
pub use error::StoreError;
