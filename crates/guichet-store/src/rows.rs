//! Row-to-domain conversion helpers shared by the CRUD modules.
//!
//! Each helper turns a TEXT column back into its typed form, reporting
//! failures as [`rusqlite::Error::FromSqlConversionFailure`] so they surface
//! through the normal query path.

use chrono::{DateTime, NaiveDate, Utc};
use guichet_core::{Role, Sexe, Statut, TypeDocument, ValidationError};
use rusqlite::types::Type;
use uuid::Uuid;

fn conversion_failure(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub(crate) fn parse_uuid(idx: usize, s: String) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(&s).map_err(|e| conversion_failure(idx, e))
}

pub(crate) fn parse_date(idx: usize, s: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_failure(idx, e))
}

pub(crate) fn parse_jour(idx: usize, s: String) -> rusqlite::Result<NaiveDate> {
    s.parse().map_err(|e| conversion_failure(idx, e))
}

pub(crate) fn parse_statut(idx: usize, s: String) -> rusqlite::Result<Statut> {
    Statut::parse(&s).ok_or_else(|| conversion_failure(idx, ValidationError::StatutInvalide(s)))
}

pub(crate) fn parse_role(idx: usize, s: String) -> rusqlite::Result<Role> {
    Role::parse(&s).ok_or_else(|| conversion_failure(idx, ValidationError::RoleInvalide(s)))
}

pub(crate) fn parse_type_document(idx: usize, s: String) -> rusqlite::Result<TypeDocument> {
    TypeDocument::parse(&s).ok_or_else(|| {
        conversion_failure(
            idx,
            ValidationError::ValeurInvalide {
                champ: "typeDocument",
                valeur: s,
            },
        )
    })
}

pub(crate) fn parse_sexe(idx: usize, s: String) -> rusqlite::Result<Sexe> {
    Sexe::parse(&s).ok_or_else(|| {
        conversion_failure(
            idx,
            ValidationError::ValeurInvalide {
                champ: "sexe",
                valeur: s,
            },
        )
    })
}
