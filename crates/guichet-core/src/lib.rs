//! # guichet-core
//!
//! Pure domain logic for the Guichet document-intake service: the dossier
//! aggregate model, the daily reference-number format, the status lifecycle,
//! the role/permission matrix and submission validation.
//!
//! Nothing in this crate performs I/O.  The store and server crates drive
//! these types against SQLite and HTTP respectively.

pub mod constants;
pub mod lifecycle;
pub mod models;
pub mod reference;
pub mod roles;
pub mod types;
pub mod validation;

mod error;

pub use error::{CoreError, ValidationError};
pub use models::*;
pub use types::{Reference, Role, Sexe, Statut, TypeDocument};
