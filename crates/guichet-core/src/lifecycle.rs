//! Status transition rules for dossiers.
//!
//! Terminal statuses (`archivé`, `rejeté`) accept no further change.
//! Between live statuses the graph is free, backwards included, so a
//! reviewer can undo a premature `apuré`. Every applied change yields a
//! [`TransitionStatut`] row for the audit trail.

use chrono::{DateTime, Utc};

use crate::error::{CoreError, ValidationError};
use crate::models::{Dossier, TransitionStatut};
use crate::types::{Role, Statut};

/// Validate a requested transition without applying it.
///
/// Checks, in order: the role may change statuses at all, the current
/// status is not terminal, and a rejection comes from `conformité` with a
/// non-blank motif.
pub fn verifier_transition(
    actuel: Statut,
    vise: Statut,
    role: Role,
    motif: Option<&str>,
) -> Result<(), CoreError> {
    if !role.capacites().changer_statut {
        return Err(CoreError::Permission {
            role,
            action: "changer le statut",
        });
    }
    if actuel.est_terminal() {
        return Err(ValidationError::StatutTerminal(actuel).into());
    }
    if vise == Statut::Rejete {
        if role != Role::Conformite {
            return Err(CoreError::Permission {
                role,
                action: "rejeter un dossier",
            });
        }
        if motif.map_or(true, |m| m.trim().is_empty()) {
            return Err(ValidationError::MotifRejetManquant.into());
        }
    }
    Ok(())
}

impl Dossier {
    /// Apply a status change and return the audit row to persist.
    ///
    /// `motif` is only retained for rejections.
    pub fn appliquer_statut(
        &mut self,
        vise: Statut,
        role: Role,
        motif: Option<&str>,
        horodatage: DateTime<Utc>,
    ) -> Result<TransitionStatut, CoreError> {
        verifier_transition(self.statut, vise, role, motif)?;
        let avant = self.statut;
        self.statut = vise;
        if vise == Statut::Rejete {
            self.motif_rejet = motif.map(|m| m.trim().to_string());
        }
        self.date_modification = horodatage;
        Ok(TransitionStatut {
            reference: self.reference.clone(),
            statut_avant: avant,
            statut_apres: vise,
            role,
            motif: self.motif_rejet.clone().filter(|_| vise == Statut::Rejete),
            date: horodatage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Identite;
    use crate::types::{Reference, Sexe, TypeDocument};
    use crate::models::SousDossier;
    use uuid::Uuid;

    fn dossier() -> Dossier {
        let quand = Utc::now();
        Dossier::nouveau(
            Reference("15102025-DOC001".into()),
            Identite {
                nom: "Dupont".into(),
                prenom: "Jean".into(),
                email: "jean@x.com".into(),
                telephone: "0600000000".into(),
                profession: "ingénieur".into(),
                sexe: Sexe::H,
            },
            TypeDocument::Voyage,
            SousDossier {
                id: Uuid::new_v4(),
                nom: "2025-10-15".into(),
                date: quand,
                motif: None,
                pays: vec![],
                raison: None,
                autre_raison: None,
                type_transfert: None,
                date_debut: None,
                date_fin: None,
                fichiers: vec![],
            },
            quand,
        )
    }

    #[test]
    fn parcours_nominal_jusqu_a_apure() {
        let mut d = dossier();
        d.appliquer_statut(Statut::PartiellementApure, Role::Superviseur, None, Utc::now())
            .unwrap();
        d.appliquer_statut(Statut::Apure, Role::AdminBank, None, Utc::now())
            .unwrap();
        assert_eq!(d.statut, Statut::Apure);
    }

    #[test]
    fn retour_en_arriere_autorise() {
        let mut d = dossier();
        d.appliquer_statut(Statut::Apure, Role::Superviseur, None, Utc::now())
            .unwrap();
        d.appliquer_statut(Statut::EnAttente, Role::Superviseur, None, Utc::now())
            .unwrap();
        assert_eq!(d.statut, Statut::EnAttente);
    }

    #[test]
    fn archive_refuse_tout_changement() {
        let mut d = dossier();
        d.appliquer_statut(Statut::Archive, Role::Superviseur, None, Utc::now())
            .unwrap();
        let err = d
            .appliquer_statut(Statut::EnAttente, Role::Superviseur, None, Utc::now())
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::Validation(ValidationError::StatutTerminal(Statut::Archive))
        );
    }

    #[test]
    fn rejet_exige_conformite() {
        let mut d = dossier();
        let err = d
            .appliquer_statut(
                Statut::Rejete,
                Role::Superviseur,
                Some("pièces illisibles"),
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::Permission { .. }));
    }

    #[test]
    fn rejet_sans_motif_refuse() {
        let mut d = dossier();
        let err = d
            .appliquer_statut(Statut::Rejete, Role::Conformite, Some("   "), Utc::now())
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::Validation(ValidationError::MotifRejetManquant)
        );
        let err = d
            .appliquer_statut(Statut::Rejete, Role::Conformite, None, Utc::now())
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::Validation(ValidationError::MotifRejetManquant)
        );
    }

    #[test]
    fn rejet_valide_conserve_le_motif() {
        let mut d = dossier();
        let ligne = d
            .appliquer_statut(
                Statut::Rejete,
                Role::Conformite,
                Some("  pièces illisibles "),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(d.statut, Statut::Rejete);
        assert_eq!(d.motif_rejet.as_deref(), Some("pièces illisibles"));
        assert_eq!(ligne.statut_avant, Statut::EnAttente);
        assert_eq!(ligne.statut_apres, Statut::Rejete);
        assert_eq!(ligne.motif.as_deref(), Some("pièces illisibles"));

        // Terminal: même la conformité ne peut plus y toucher.
        let err = d
            .appliquer_statut(Statut::EnAttente, Role::Conformite, None, Utc::now())
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::Validation(ValidationError::StatutTerminal(Statut::Rejete))
        );
    }

    #[test]
    fn roles_sans_mutation_refuses() {
        let mut d = dossier();
        for role in [Role::Auditeur, Role::SuperAdmin] {
            let err = d
                .appliquer_statut(Statut::Apure, role, None, Utc::now())
                .unwrap_err();
            assert!(matches!(err, CoreError::Permission { .. }), "{role}");
        }
        assert_eq!(d.statut, Statut::EnAttente);
    }

    #[test]
    fn agent_saisie_peut_faire_avancer() {
        let mut d = dossier();
        d.appliquer_statut(Statut::PartiellementApure, Role::AgentSaisie, None, Utc::now())
            .unwrap();
        assert_eq!(d.statut, Statut::PartiellementApure);
    }

    #[test]
    fn motif_ignore_hors_rejet() {
        let mut d = dossier();
        let ligne = d
            .appliquer_statut(Statut::Apure, Role::Superviseur, Some("sans objet"), Utc::now())
            .unwrap();
        assert_eq!(d.motif_rejet, None);
        assert_eq!(ligne.motif, None);
    }
}
