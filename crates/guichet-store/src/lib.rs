//! # guichet-store
//!
//! SQLite persistence for the Guichet document-intake service.  The crate
//! exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for every domain
//! model: dossiers with their batches and file content, back-office
//! accounts, the status audit trail, and the blank client form.
//!
//! The handle is not `Sync`; the server wraps it in an async mutex so all
//! writes, reference issuance included, are serialized through one
//! connection.

pub mod database;
pub mod dossiers;
pub mod formulaires;
pub mod historique;
pub mod migrations;
pub mod utilisateurs;

mod error;
mod rows;

pub use database::Database;
pub use error::StoreError;
