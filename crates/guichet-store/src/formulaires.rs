//! Storage of the blank client form PDF.
//!
//! A single row holds the current form; uploading a new one replaces it.

use guichet_core::FormulaireClient;
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::rows::parse_date;

impl Database {
    /// Store (or replace) the client form.
    pub fn upsert_formulaire(&self, meta: &FormulaireClient, contenu: &[u8]) -> Result<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO formulaires (id, nom_original, taille, mime_type,
                                                 contenu, date_upload, uploader)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                meta.nom_original,
                meta.taille as i64,
                meta.mime_type,
                contenu,
                meta.date_upload.to_rfc3339(),
                meta.uploader,
            ],
        )?;
        Ok(())
    }

    /// Current form metadata, without the PDF bytes.
    pub fn get_formulaire_meta(&self) -> Result<FormulaireClient> {
        self.conn()
            .query_row(
                "SELECT nom_original, taille, mime_type, date_upload, uploader
                 FROM formulaires WHERE id = 1",
                [],
                row_to_formulaire,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Current form metadata and content, for download.
    pub fn get_formulaire(&self) -> Result<(FormulaireClient, Vec<u8>)> {
        self.conn()
            .query_row(
                "SELECT nom_original, taille, mime_type, date_upload, uploader, contenu
                 FROM formulaires WHERE id = 1",
                [],
                |row| {
                    let meta = row_to_formulaire(row)?;
                    let contenu: Vec<u8> = row.get(5)?;
                    Ok((meta, contenu))
                },
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }
}

/// Map a `rusqlite::Row` to a [`FormulaireClient`].
fn row_to_formulaire(row: &rusqlite::Row<'_>) -> rusqlite::Result<FormulaireClient> {
    let taille: i64 = row.get(1)?;
    let upload_str: String = row.get(3)?;

    Ok(FormulaireClient {
        nom_original: row.get(0)?,
        taille: taille as u64,
        mime_type: row.get(2)?,
        date_upload: parse_date(3, upload_str)?,
        uploader: row.get(4)?,
    })
}
