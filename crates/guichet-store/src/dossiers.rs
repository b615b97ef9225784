//! CRUD operations for [`Dossier`] aggregates.
//!
//! A dossier, its sous-dossiers and their file rows are written inside a
//! single transaction, so a failed submission leaves no partial state.
//! Reads rebuild the full aggregate except file content, which only
//! [`Database::get_contenu_fichier`] touches.

use chrono::{DateTime, Utc};
use guichet_core::{Dossier, Fichier, Identite, Reference, SousDossier, Statut, TypeDocument};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::database::Database;
use crate::error::{map_insert_err, Result, StoreError};
use crate::rows::{
    parse_date, parse_jour, parse_sexe, parse_statut, parse_type_document, parse_uuid,
};

impl Database {
    // ------------------------------------------------------------------
    // Create / append
    // ------------------------------------------------------------------

    /// Insert a brand-new dossier with its initial batches.
    ///
    /// `contenus` holds the bytes of every file across the batches, in
    /// batch order then file order. A duplicate reference or identity
    /// tuple yields [`StoreError::AlreadyExists`].
    pub fn create_dossier(&mut self, dossier: &Dossier, contenus: &[Vec<u8>]) -> Result<()> {
        let tx = self.conn_mut().transaction()?;

        tx.execute(
            "INSERT INTO dossiers (reference, nom, prenom, email, telephone, profession,
                                   sexe, type_document, statut, motif_rejet,
                                   date_creation, date_modification)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                dossier.reference.as_str(),
                dossier.identite.nom,
                dossier.identite.prenom,
                dossier.identite.email,
                dossier.identite.telephone,
                dossier.identite.profession,
                dossier.identite.sexe.as_str(),
                dossier.type_document.as_str(),
                dossier.statut.as_str(),
                dossier.motif_rejet,
                dossier.date_creation.to_rfc3339(),
                dossier.date_modification.to_rfc3339(),
            ],
        )
        .map_err(map_insert_err)?;

        let mut reste = contenus;
        for (position, lot) in dossier.sous_dossiers.iter().enumerate() {
            let coupe = lot.fichiers.len().min(reste.len());
            let (contenus_lot, queue) = reste.split_at(coupe);
            insert_sous_dossier(&tx, &dossier.reference, lot, contenus_lot, position as i64)?;
            reste = queue;
        }

        tx.commit()?;
        Ok(())
    }

    /// Append one batch to an existing dossier and bump `date_modification`.
    ///
    /// `contenus[i]` holds the bytes of `lot.fichiers[i]`.
    pub fn append_sous_dossier(
        &mut self,
        reference: &Reference,
        lot: &SousDossier,
        contenus: &[Vec<u8>],
        date_modification: DateTime<Utc>,
    ) -> Result<()> {
        let tx = self.conn_mut().transaction()?;

        let affected = tx.execute(
            "UPDATE dossiers SET date_modification = ?2 WHERE reference = ?1",
            params![reference.as_str(), date_modification.to_rfc3339()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }

        let position: i64 = tx.query_row(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM sous_dossiers WHERE reference = ?1",
            params![reference.as_str()],
            |row| row.get(0),
        )?;
        insert_sous_dossier(&tx, reference, lot, contenus, position)?;

        tx.commit()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a full dossier by reference, batches and file metadata included.
    pub fn get_dossier(&self, reference: &Reference) -> Result<Dossier> {
        let mut dossier = self
            .conn()
            .query_row(
                "SELECT reference, nom, prenom, email, telephone, profession, sexe,
                        type_document, statut, motif_rejet, date_creation, date_modification
                 FROM dossiers
                 WHERE reference = ?1",
                params![reference.as_str()],
                row_to_dossier,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })?;
        dossier.sous_dossiers = self.load_sous_dossiers(&dossier.reference)?;
        Ok(dossier)
    }

    /// Look up the dossier owned by an identity tuple, if any.
    ///
    /// The caller passes a normalized identity; matching is exact.
    pub fn find_dossier_par_identite(
        &self,
        identite: &Identite,
        type_document: TypeDocument,
    ) -> Result<Option<Dossier>> {
        let found = self
            .conn()
            .query_row(
                "SELECT reference, nom, prenom, email, telephone, profession, sexe,
                        type_document, statut, motif_rejet, date_creation, date_modification
                 FROM dossiers
                 WHERE nom = ?1 AND prenom = ?2 AND email = ?3 AND type_document = ?4",
                params![
                    identite.nom,
                    identite.prenom,
                    identite.email,
                    type_document.as_str()
                ],
                row_to_dossier,
            );
        match found {
            Ok(mut dossier) => {
                dossier.sous_dossiers = self.load_sous_dossiers(&dossier.reference)?;
                Ok(Some(dossier))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(other) => Err(StoreError::Sqlite(other)),
        }
    }

    /// List dossiers, newest first, optionally filtered by category and status.
    pub fn list_dossiers(
        &self,
        type_document: Option<TypeDocument>,
        statut: Option<Statut>,
    ) -> Result<Vec<Dossier>> {
        let mut stmt = self.conn().prepare(
            "SELECT reference, nom, prenom, email, telephone, profession, sexe,
                    type_document, statut, motif_rejet, date_creation, date_modification
             FROM dossiers
             WHERE (?1 IS NULL OR type_document = ?1)
               AND (?2 IS NULL OR statut = ?2)
             ORDER BY date_creation DESC",
        )?;

        let rows = stmt.query_map(
            params![
                type_document.map(|t| t.as_str()),
                statut.map(|s| s.as_str())
            ],
            row_to_dossier,
        )?;

        let mut dossiers = Vec::new();
        for row in rows {
            let mut dossier = row?;
            dossier.sous_dossiers = self.load_sous_dossiers(&dossier.reference)?;
            dossiers.push(dossier);
        }
        Ok(dossiers)
    }

    /// Combined stored size in bytes of every file of a dossier.
    pub fn taille_dossier(&self, reference: &Reference) -> Result<u64> {
        let total: i64 = self.conn().query_row(
            "SELECT COALESCE(SUM(f.taille), 0)
             FROM fichiers f
             JOIN sous_dossiers sd ON sd.id = f.sous_dossier
             WHERE sd.reference = ?1",
            params![reference.as_str()],
            |row| row.get(0),
        )?;
        Ok(total as u64)
    }

    /// Highest stored reference starting with `prefixe` (e.g. `15102025-DOC`),
    /// by lexicographic order.
    pub fn max_reference_avec_prefixe(&self, prefixe: &str) -> Result<Option<Reference>> {
        let found = self.conn().query_row(
            "SELECT reference FROM dossiers
             WHERE reference LIKE ?1 || '%'
             ORDER BY reference DESC
             LIMIT 1",
            params![prefixe],
            |row| row.get::<_, String>(0),
        );
        match found {
            Ok(r) => Ok(Some(Reference(r))),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(other) => Err(StoreError::Sqlite(other)),
        }
    }

    /// Whether a reference is already taken.
    pub fn reference_existe(&self, reference: &Reference) -> Result<bool> {
        let n: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM dossiers WHERE reference = ?1",
            params![reference.as_str()],
            |row| row.get(0),
        )?;
        Ok(n > 0)
    }

    /// Fetch one file's metadata and content, scoped to its batch and dossier.
    pub fn get_contenu_fichier(
        &self,
        reference: &Reference,
        sous_dossier: Uuid,
        fichier: Uuid,
    ) -> Result<(Fichier, Vec<u8>)> {
        self.conn()
            .query_row(
                "SELECT f.id, f.nom, f.nom_original, f.taille, f.extension, f.mime_type,
                        f.date_upload, f.contenu
                 FROM fichiers f
                 JOIN sous_dossiers sd ON sd.id = f.sous_dossier
                 WHERE f.id = ?1 AND sd.id = ?2 AND sd.reference = ?3",
                params![
                    fichier.to_string(),
                    sous_dossier.to_string(),
                    reference.as_str()
                ],
                |row| {
                    let fichier = row_to_fichier(row)?;
                    let contenu: Vec<u8> = row.get(7)?;
                    Ok((fichier, contenu))
                },
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Dossier counts grouped by category and status, for the stats endpoint.
    pub fn compter_par_statut(&self) -> Result<Vec<(TypeDocument, Statut, i64)>> {
        let mut stmt = self.conn().prepare(
            "SELECT type_document, statut, COUNT(*)
             FROM dossiers
             GROUP BY type_document, statut",
        )?;

        let rows = stmt.query_map([], |row| {
            let type_str: String = row.get(0)?;
            let statut_str: String = row.get(1)?;
            let n: i64 = row.get(2)?;
            Ok((
                parse_type_document(0, type_str)?,
                parse_statut(1, statut_str)?,
                n,
            ))
        })?;

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }

    /// Stored file count and cumulative byte size.
    pub fn compter_fichiers(&self) -> Result<(i64, i64)> {
        let totals = self.conn().query_row(
            "SELECT COUNT(*), COALESCE(SUM(taille), 0) FROM fichiers",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(totals)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a dossier and, by cascade, its batches and files.
    /// Returns `true` if a row was deleted.
    pub fn delete_dossier(&self, reference: &Reference) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM dossiers WHERE reference = ?1",
            params![reference.as_str()],
        )?;
        Ok(affected > 0)
    }

    /// Delete one batch of a dossier (files cascade).
    pub fn delete_sous_dossier(&self, reference: &Reference, id: Uuid) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM sous_dossiers WHERE id = ?1 AND reference = ?2",
            params![id.to_string(), reference.as_str()],
        )?;
        Ok(affected > 0)
    }

    /// Delete one file, scoped to its batch and dossier.
    pub fn delete_fichier(
        &self,
        reference: &Reference,
        sous_dossier: Uuid,
        fichier: Uuid,
    ) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM fichiers
             WHERE id = ?1
               AND sous_dossier IN (
                   SELECT id FROM sous_dossiers WHERE id = ?2 AND reference = ?3
               )",
            params![
                fichier.to_string(),
                sous_dossier.to_string(),
                reference.as_str()
            ],
        )?;
        Ok(affected > 0)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn load_sous_dossiers(&self, reference: &Reference) -> Result<Vec<SousDossier>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, nom, date, motif, pays, raison, autre_raison, type_transfert,
                    date_debut, date_fin
             FROM sous_dossiers
             WHERE reference = ?1
             ORDER BY position ASC",
        )?;

        let rows = stmt.query_map(params![reference.as_str()], row_to_sous_dossier)?;

        let mut lots = Vec::new();
        for row in rows {
            let mut lot = row?;
            lot.fichiers = self.load_fichiers(lot.id)?;
            lots.push(lot);
        }
        Ok(lots)
    }

    fn load_fichiers(&self, sous_dossier: Uuid) -> Result<Vec<Fichier>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, nom, nom_original, taille, extension, mime_type, date_upload
             FROM fichiers
             WHERE sous_dossier = ?1
             ORDER BY position ASC",
        )?;

        let rows = stmt.query_map(params![sous_dossier.to_string()], row_to_fichier)?;

        let mut fichiers = Vec::new();
        for row in rows {
            fichiers.push(row?);
        }
        Ok(fichiers)
    }
}

/// Insert one batch and its files under `reference` at `position`.
fn insert_sous_dossier(
    conn: &Connection,
    reference: &Reference,
    lot: &SousDossier,
    contenus: &[Vec<u8>],
    position: i64,
) -> Result<()> {
    debug_assert_eq!(lot.fichiers.len(), contenus.len());

    let pays_json = if lot.pays.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&lot.pays)?)
    };

    conn.execute(
        "INSERT INTO sous_dossiers (id, reference, nom, date, motif, pays, raison,
                                    autre_raison, type_transfert, date_debut, date_fin, position)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            lot.id.to_string(),
            reference.as_str(),
            lot.nom,
            lot.date.to_rfc3339(),
            lot.motif,
            pays_json,
            lot.raison,
            lot.autre_raison,
            lot.type_transfert,
            lot.date_debut.map(|d| d.to_string()),
            lot.date_fin.map(|d| d.to_string()),
            position,
        ],
    )?;

    for (i, (fichier, contenu)) in lot.fichiers.iter().zip(contenus).enumerate() {
        conn.execute(
            "INSERT INTO fichiers (id, sous_dossier, nom, nom_original, taille, extension,
                                   mime_type, contenu, date_upload, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                fichier.id.to_string(),
                lot.id.to_string(),
                fichier.nom,
                fichier.nom_original,
                fichier.taille as i64,
                fichier.extension,
                fichier.mime_type,
                contenu,
                fichier.date_upload.to_rfc3339(),
                i as i64,
            ],
        )?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Row mappers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`Dossier`] with an empty batch list.
fn row_to_dossier(row: &rusqlite::Row<'_>) -> rusqlite::Result<Dossier> {
    let sexe_str: String = row.get(6)?;
    let type_str: String = row.get(7)?;
    let statut_str: String = row.get(8)?;
    let creation_str: String = row.get(10)?;
    let modification_str: String = row.get(11)?;

    Ok(Dossier {
        reference: Reference(row.get(0)?),
        identite: Identite {
            nom: row.get(1)?,
            prenom: row.get(2)?,
            email: row.get(3)?,
            telephone: row.get(4)?,
            profession: row.get(5)?,
            sexe: parse_sexe(6, sexe_str)?,
        },
        type_document: parse_type_document(7, type_str)?,
        statut: parse_statut(8, statut_str)?,
        motif_rejet: row.get(9)?,
        date_creation: parse_date(10, creation_str)?,
        date_modification: parse_date(11, modification_str)?,
        sous_dossiers: Vec::new(),
    })
}

/// Map a `rusqlite::Row` to a [`SousDossier`] with an empty file list.
fn row_to_sous_dossier(row: &rusqlite::Row<'_>) -> rusqlite::Result<SousDossier> {
    let id_str: String = row.get(0)?;
    let date_str: String = row.get(2)?;
    let pays_json: Option<String> = row.get(4)?;
    let debut_str: Option<String> = row.get(8)?;
    let fin_str: Option<String> = row.get(9)?;

    let pays = match pays_json {
        Some(json) => serde_json::from_str(&json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?,
        None => Vec::new(),
    };

    Ok(SousDossier {
        id: parse_uuid(0, id_str)?,
        nom: row.get(1)?,
        date: parse_date(2, date_str)?,
        motif: row.get(3)?,
        pays,
        raison: row.get(5)?,
        autre_raison: row.get(6)?,
        type_transfert: row.get(7)?,
        date_debut: debut_str.map(|s| parse_jour(8, s)).transpose()?,
        date_fin: fin_str.map(|s| parse_jour(9, s)).transpose()?,
        fichiers: Vec::new(),
    })
}

/// Map a `rusqlite::Row` to file metadata (no content column).
fn row_to_fichier(row: &rusqlite::Row<'_>) -> rusqlite::Result<Fichier> {
    let id_str: String = row.get(0)?;
    let taille: i64 = row.get(3)?;
    let upload_str: String = row.get(6)?;

    Ok(Fichier {
        id: parse_uuid(0, id_str)?,
        nom: row.get(1)?,
        nom_original: row.get(2)?,
        taille: taille as u64,
        extension: row.get(4)?,
        mime_type: row.get(5)?,
        date_upload: parse_date(6, upload_str)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use guichet_core::{DemandeSoumission, DetailsSoumission, FichierRecu, Sexe};

    fn db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    fn identite(nom: &str) -> Identite {
        Identite {
            nom: nom.into(),
            prenom: "Jean".into(),
            email: format!("{}@x.com", nom.to_lowercase()),
            telephone: "0600000000".into(),
            profession: "ingénieur".into(),
            sexe: Sexe::H,
        }
    }

    fn demande(nom: &str, octets: usize) -> DemandeSoumission {
        DemandeSoumission {
            identite: identite(nom).normalisee(),
            details: DetailsSoumission::Voyage {
                pays: vec!["France".into(), "Sénégal".into()],
                raison: "affaires".into(),
                autre_raison: None,
                date_debut: chrono::NaiveDate::from_ymd_opt(2025, 11, 1),
                date_fin: chrono::NaiveDate::from_ymd_opt(2025, 11, 15),
            },
            fichiers: vec![FichierRecu {
                nom_original: "passeport.pdf".into(),
                mime_type: "application/pdf".into(),
                contenu: vec![0xAB; octets],
            }],
        }
    }

    fn dossier_de(demande: &DemandeSoumission, reference: &str) -> (Dossier, Vec<Vec<u8>>) {
        let quand = Utc::now();
        let lot = demande.en_sous_dossier(quand);
        let contenus = demande.fichiers.iter().map(|f| f.contenu.clone()).collect();
        let dossier = Dossier::nouveau(
            Reference(reference.into()),
            demande.identite.clone(),
            demande.details.type_document(),
            lot,
            quand,
        );
        (dossier, contenus)
    }

    #[test]
    fn create_et_get_round_trip() {
        let (_dir, mut db) = db();
        let demande = demande("Dupont", 64);
        let (dossier, contenus) = dossier_de(&demande, "15102025-DOC001");

        db.create_dossier(&dossier, &contenus).unwrap();

        let lu = db.get_dossier(&dossier.reference).unwrap();
        assert_eq!(lu.identite.nom, "Dupont");
        assert_eq!(lu.statut, Statut::EnAttente);
        assert_eq!(lu.sous_dossiers.len(), 1);
        let lot = &lu.sous_dossiers[0];
        assert_eq!(lot.pays, vec!["France", "Sénégal"]);
        assert_eq!(lot.raison.as_deref(), Some("affaires"));
        assert_eq!(lot.fichiers.len(), 1);
        assert_eq!(lot.fichiers[0].taille, 64);
        assert_eq!(lot.fichiers[0].nom_original, "passeport.pdf");
    }

    #[test]
    fn reference_dupliquee_refusee() {
        let (_dir, mut db) = db();
        let (d1, c1) = dossier_de(&demande("Dupont", 8), "15102025-DOC001");
        db.create_dossier(&d1, &c1).unwrap();

        let (d2, c2) = dossier_de(&demande("Martin", 8), "15102025-DOC001");
        let err = db.create_dossier(&d2, &c2).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists));

        // L'échec ne laisse aucune trace du second dossier.
        assert!(db
            .find_dossier_par_identite(&identite("Martin").normalisee(), TypeDocument::Voyage)
            .unwrap()
            .is_none());
    }

    #[test]
    fn identite_dupliquee_refusee() {
        let (_dir, mut db) = db();
        let (d1, c1) = dossier_de(&demande("Dupont", 8), "15102025-DOC001");
        db.create_dossier(&d1, &c1).unwrap();

        let (d2, c2) = dossier_de(&demande("Dupont", 8), "15102025-DOC002");
        let err = db.create_dossier(&d2, &c2).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists));
    }

    #[test]
    fn lookup_par_identite_et_categorie() {
        let (_dir, mut db) = db();
        let demande = demande("Dupont", 16);
        let (dossier, contenus) = dossier_de(&demande, "15102025-DOC001");
        db.create_dossier(&dossier, &contenus).unwrap();

        let trouve = db
            .find_dossier_par_identite(&demande.identite, TypeDocument::Voyage)
            .unwrap();
        assert_eq!(trouve.unwrap().reference, dossier.reference);

        // Même identité, autre catégorie: dossier distinct.
        let absent = db
            .find_dossier_par_identite(&demande.identite, TypeDocument::Transfert)
            .unwrap();
        assert!(absent.is_none());
    }

    #[test]
    fn append_conserve_l_ordre_et_la_taille() {
        let (_dir, mut db) = db();
        let premiere = demande("Dupont", 100);
        let (dossier, contenus) = dossier_de(&premiere, "15102025-DOC001");
        db.create_dossier(&dossier, &contenus).unwrap();

        let seconde = demande("Dupont", 200);
        let lot = seconde.en_sous_dossier(Utc::now());
        let contenus: Vec<Vec<u8>> = seconde.fichiers.iter().map(|f| f.contenu.clone()).collect();
        db.append_sous_dossier(&dossier.reference, &lot, &contenus, Utc::now())
            .unwrap();

        let lu = db.get_dossier(&dossier.reference).unwrap();
        assert_eq!(lu.sous_dossiers.len(), 2);
        assert_eq!(lu.sous_dossiers[1].id, lot.id);
        assert_eq!(db.taille_dossier(&dossier.reference).unwrap(), 300);
        assert!(lu.date_modification >= lu.date_creation);
    }

    #[test]
    fn append_sur_reference_inconnue() {
        let (_dir, mut db) = db();
        let demande = demande("Dupont", 8);
        let lot = demande.en_sous_dossier(Utc::now());
        let err = db
            .append_sous_dossier(&Reference("15102025-DOC999".into()), &lot, &[vec![0u8; 8]], Utc::now())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn plus_haute_reference_par_prefixe() {
        let (_dir, mut db) = db();
        for (nom, reference) in [
            ("Dupont", "15102025-DOC001"),
            ("Martin", "15102025-DOC003"),
            ("Durand", "14102025-DOC009"),
        ] {
            let (d, c) = dossier_de(&demande(nom, 8), reference);
            db.create_dossier(&d, &c).unwrap();
        }

        let max = db.max_reference_avec_prefixe("15102025-DOC").unwrap();
        assert_eq!(max.unwrap().as_str(), "15102025-DOC003");
        assert!(db.max_reference_avec_prefixe("15102025-TRF").unwrap().is_none());
        assert!(db.reference_existe(&Reference("14102025-DOC009".into())).unwrap());
        assert!(!db.reference_existe(&Reference("14102025-DOC010".into())).unwrap());
    }

    #[test]
    fn contenu_fichier_et_suppressions_en_cascade() {
        let (_dir, mut db) = db();
        let demande = demande("Dupont", 32);
        let (dossier, contenus) = dossier_de(&demande, "15102025-DOC001");
        db.create_dossier(&dossier, &contenus).unwrap();

        let lu = db.get_dossier(&dossier.reference).unwrap();
        let lot = &lu.sous_dossiers[0];
        let fichier = &lot.fichiers[0];

        let (meta, contenu) = db
            .get_contenu_fichier(&dossier.reference, lot.id, fichier.id)
            .unwrap();
        assert_eq!(meta.nom_original, "passeport.pdf");
        assert_eq!(contenu, vec![0xAB; 32]);

        // Mauvais dossier: pas de fuite entre références.
        let err = db
            .get_contenu_fichier(&Reference("15102025-DOC999".into()), lot.id, fichier.id)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));

        assert!(db.delete_dossier(&dossier.reference).unwrap());
        let reste: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM fichiers", [], |r| r.get(0))
            .unwrap();
        assert_eq!(reste, 0);
    }

    #[test]
    fn suppression_fichier_et_sous_dossier_cibles() {
        let (_dir, mut db) = db();
        let demande = demande("Dupont", 32);
        let (dossier, contenus) = dossier_de(&demande, "15102025-DOC001");
        db.create_dossier(&dossier, &contenus).unwrap();

        let lu = db.get_dossier(&dossier.reference).unwrap();
        let lot_id = lu.sous_dossiers[0].id;
        let fichier_id = lu.sous_dossiers[0].fichiers[0].id;

        assert!(db.delete_fichier(&dossier.reference, lot_id, fichier_id).unwrap());
        assert!(!db.delete_fichier(&dossier.reference, lot_id, fichier_id).unwrap());

        assert!(db.delete_sous_dossier(&dossier.reference, lot_id).unwrap());
        let lu = db.get_dossier(&dossier.reference).unwrap();
        assert!(lu.sous_dossiers.is_empty());
    }

    #[test]
    fn liste_filtree_et_comptages() {
        let (_dir, mut db) = db();
        let (d1, c1) = dossier_de(&demande("Dupont", 8), "15102025-DOC001");
        db.create_dossier(&d1, &c1).unwrap();

        let mut transfert = demande("Martin", 8);
        transfert.details = DetailsSoumission::Transfert {
            type_transfert: "international".into(),
            date_debut: None,
            date_fin: None,
        };
        let (d2, c2) = dossier_de(&transfert, "15102025-TRF001");
        db.create_dossier(&d2, &c2).unwrap();

        assert_eq!(db.list_dossiers(None, None).unwrap().len(), 2);
        assert_eq!(
            db.list_dossiers(Some(TypeDocument::Voyage), None).unwrap().len(),
            1
        );
        assert_eq!(
            db.list_dossiers(None, Some(Statut::Apure)).unwrap().len(),
            0
        );

        let counts = db.compter_par_statut().unwrap();
        assert!(counts.contains(&(TypeDocument::Voyage, Statut::EnAttente, 1)));
        assert!(counts.contains(&(TypeDocument::Transfert, Statut::EnAttente, 1)));

        let (n, octets) = db.compter_fichiers().unwrap();
        assert_eq!(n, 2);
        assert_eq!(octets, 16);
    }
}
