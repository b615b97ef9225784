//! Append-only status transition history.

use guichet_core::{Dossier, Reference, TransitionStatut};
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::rows::{parse_date, parse_role, parse_statut};

impl Database {
    /// Persist an applied status change: the dossier row and its audit line
    /// land in the same transaction, so the journal never diverges from the
    /// stored status.
    pub fn enregistrer_transition(
        &mut self,
        dossier: &Dossier,
        transition: &TransitionStatut,
    ) -> Result<()> {
        let tx = self.conn_mut().transaction()?;

        let touche = tx.execute(
            "UPDATE dossiers
             SET statut = ?2, motif_rejet = ?3, date_modification = ?4
             WHERE reference = ?1",
            params![
                dossier.reference.as_str(),
                dossier.statut.as_str(),
                dossier.motif_rejet,
                dossier.date_modification.to_rfc3339(),
            ],
        )?;
        if touche == 0 {
            return Err(StoreError::NotFound);
        }

        tx.execute(
            "INSERT INTO historique_statuts (reference, statut_avant, statut_apres, role,
                                             motif, date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                transition.reference.as_str(),
                transition.statut_avant.as_str(),
                transition.statut_apres.as_str(),
                transition.role.as_str(),
                transition.motif,
                transition.date.to_rfc3339(),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Transitions of one dossier in application order.
    pub fn list_transitions(&self, reference: &Reference) -> Result<Vec<TransitionStatut>> {
        let mut stmt = self.conn().prepare(
            "SELECT reference, statut_avant, statut_apres, role, motif, date
             FROM historique_statuts
             WHERE reference = ?1
             ORDER BY id ASC",
        )?;

        let rows = stmt.query_map(params![reference.as_str()], row_to_transition)?;

        let mut transitions = Vec::new();
        for row in rows {
            transitions.push(row?);
        }
        Ok(transitions)
    }
}

/// Map a `rusqlite::Row` to a [`TransitionStatut`].
fn row_to_transition(row: &rusqlite::Row<'_>) -> rusqlite::Result<TransitionStatut> {
    let avant_str: String = row.get(1)?;
    let apres_str: String = row.get(2)?;
    let role_str: String = row.get(3)?;
    let date_str: String = row.get(5)?;

    Ok(TransitionStatut {
        reference: Reference(row.get(0)?),
        statut_avant: parse_statut(1, avant_str)?,
        statut_apres: parse_statut(2, apres_str)?,
        role: parse_role(3, role_str)?,
        motif: row.get(4)?,
        date: parse_date(5, date_str)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use guichet_core::{
        DemandeSoumission, Identite, DetailsSoumission, Dossier, FichierRecu, Role, Sexe, Statut,
    };

    #[test]
    fn journal_dans_l_ordre_et_cascade() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = Database::open_at(&dir.path().join("test.db")).unwrap();

        let demande = DemandeSoumission {
            identite: Identite {
                nom: "Dupont".into(),
                prenom: "Jean".into(),
                email: "jean@x.com".into(),
                telephone: "0600000000".into(),
                profession: "ingénieur".into(),
                sexe: Sexe::H,
            },
            details: DetailsSoumission::Transfert {
                type_transfert: "international".into(),
                date_debut: None,
                date_fin: None,
            },
            fichiers: vec![FichierRecu {
                nom_original: "releve.pdf".into(),
                mime_type: "application/pdf".into(),
                contenu: vec![1, 2, 3],
            }],
        };
        let quand = Utc::now();
        let mut dossier = Dossier::nouveau(
            Reference("15102025-TRF001".into()),
            demande.identite.clone(),
            demande.details.type_document(),
            demande.en_sous_dossier(quand),
            quand,
        );
        db.create_dossier(&dossier, &[vec![1, 2, 3]]).unwrap();

        for (statut, role, motif) in [
            (Statut::PartiellementApure, Role::AgentSaisie, None),
            (Statut::Rejete, Role::Conformite, Some("incomplet")),
        ] {
            let ligne = dossier
                .appliquer_statut(statut, role, motif, Utc::now())
                .unwrap();
            db.enregistrer_transition(&dossier, &ligne).unwrap();
        }

        let lu = db.get_dossier(&dossier.reference).unwrap();
        assert_eq!(lu.statut, Statut::Rejete);
        assert_eq!(lu.motif_rejet.as_deref(), Some("incomplet"));

        let journal = db.list_transitions(&dossier.reference).unwrap();
        assert_eq!(journal.len(), 2);
        assert_eq!(journal[0].statut_avant, Statut::EnAttente);
        assert_eq!(journal[0].statut_apres, Statut::PartiellementApure);
        assert_eq!(journal[1].statut_apres, Statut::Rejete);
        assert_eq!(journal[1].motif.as_deref(), Some("incomplet"));

        db.delete_dossier(&dossier.reference).unwrap();
        assert!(db.list_transitions(&dossier.reference).unwrap().is_empty());
    }

    #[test]
    fn dossier_inconnu_ne_laisse_aucune_ligne() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = Database::open_at(&dir.path().join("test.db")).unwrap();

        let demande = DemandeSoumission {
            identite: Identite {
                nom: "Fantome".into(),
                prenom: "Luc".into(),
                email: "luc@x.com".into(),
                telephone: "0600000000".into(),
                profession: "ingénieur".into(),
                sexe: Sexe::H,
            },
            details: DetailsSoumission::Transfert {
                type_transfert: "international".into(),
                date_debut: None,
                date_fin: None,
            },
            fichiers: vec![],
        };
        let quand = Utc::now();
        let mut dossier = Dossier::nouveau(
            Reference("15102025-TRF001".into()),
            demande.identite.clone(),
            demande.details.type_document(),
            demande.en_sous_dossier(quand),
            quand,
        );
        // Jamais inséré: la transaction doit tout annuler.
        let ligne = dossier
            .appliquer_statut(Statut::Apure, Role::Superviseur, None, Utc::now())
            .unwrap();
        let err = db.enregistrer_transition(&dossier, &ligne).unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
        assert!(db.list_transitions(&dossier.reference).unwrap().is_empty());
    }
}
