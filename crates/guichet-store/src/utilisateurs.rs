//! CRUD operations for [`Utilisateur`] accounts.
//!
//! Password hashes are opaque strings to this layer; they are written and
//! read alongside the account row but never appear in [`Utilisateur`].

use guichet_core::Utilisateur;
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{map_insert_err, Result, StoreError};
use crate::rows::{parse_date, parse_role, parse_uuid};

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new account. A taken username or email yields
    /// [`StoreError::AlreadyExists`].
    pub fn create_utilisateur(&self, utilisateur: &Utilisateur, hash: &str) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO utilisateurs (id, username, email, mot_de_passe, role, actif,
                                           date_creation)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    utilisateur.id.to_string(),
                    utilisateur.username,
                    utilisateur.email,
                    hash,
                    utilisateur.role.as_str(),
                    utilisateur.actif,
                    utilisateur.date_creation.to_rfc3339(),
                ],
            )
            .map_err(map_insert_err)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single account by UUID.
    pub fn get_utilisateur(&self, id: Uuid) -> Result<Utilisateur> {
        self.conn()
            .query_row(
                "SELECT id, username, email, role, actif, date_creation
                 FROM utilisateurs
                 WHERE id = ?1",
                params![id.to_string()],
                row_to_utilisateur,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Fetch an account and its password hash by email, for login.
    pub fn get_utilisateur_par_email(&self, email: &str) -> Result<(Utilisateur, String)> {
        self.conn()
            .query_row(
                "SELECT id, username, email, role, actif, date_creation, mot_de_passe
                 FROM utilisateurs
                 WHERE email = ?1",
                params![email],
                |row| {
                    let utilisateur = row_to_utilisateur(row)?;
                    let hash: String = row.get(6)?;
                    Ok((utilisateur, hash))
                },
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List every account except `sauf`, newest first.
    pub fn list_utilisateurs(&self, sauf: Uuid) -> Result<Vec<Utilisateur>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, username, email, role, actif, date_creation
             FROM utilisateurs
             WHERE id != ?1
             ORDER BY date_creation DESC",
        )?;

        let rows = stmt.query_map(params![sauf.to_string()], row_to_utilisateur)?;

        let mut utilisateurs = Vec::new();
        for row in rows {
            utilisateurs.push(row?);
        }
        Ok(utilisateurs)
    }

    /// Number of stored accounts, used to decide first-run bootstrap.
    pub fn compter_utilisateurs(&self) -> Result<i64> {
        let n = self
            .conn()
            .query_row("SELECT COUNT(*) FROM utilisateurs", [], |row| row.get(0))?;
        Ok(n)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Persist changed profile fields (username, email, role, actif).
    pub fn update_utilisateur(&self, utilisateur: &Utilisateur) -> Result<()> {
        let affected = self
            .conn()
            .execute(
                "UPDATE utilisateurs
                 SET username = ?2, email = ?3, role = ?4, actif = ?5
                 WHERE id = ?1",
                params![
                    utilisateur.id.to_string(),
                    utilisateur.username,
                    utilisateur.email,
                    utilisateur.role.as_str(),
                    utilisateur.actif,
                ],
            )
            .map_err(map_insert_err)?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Replace an account's password hash.
    pub fn update_mot_de_passe(&self, id: Uuid, hash: &str) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE utilisateurs SET mot_de_passe = ?2 WHERE id = ?1",
            params![id.to_string(), hash],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete an account by UUID.  Returns `true` if a row was deleted.
    pub fn delete_utilisateur(&self, id: Uuid) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM utilisateurs WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(affected > 0)
    }
}

/// Map a `rusqlite::Row` to an [`Utilisateur`].
fn row_to_utilisateur(row: &rusqlite::Row<'_>) -> rusqlite::Result<Utilisateur> {
    let id_str: String = row.get(0)?;
    let role_str: String = row.get(3)?;
    let creation_str: String = row.get(5)?;

    Ok(Utilisateur {
        id: parse_uuid(0, id_str)?,
        username: row.get(1)?,
        email: row.get(2)?,
        role: parse_role(3, role_str)?,
        actif: row.get(4)?,
        date_creation: parse_date(5, creation_str)?,
    })
}
