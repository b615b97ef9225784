//! Dossier orchestration: the single submission entry point (validate, then
//! create-or-append in one transaction), reference issuance with its retry
//! policy, role-gated reads and status changes.
//!
//! Every public method takes the acting role explicitly; the permission
//! matrix in `guichet_core::roles` is consulted here and nowhere deeper.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use guichet_core::constants::{REFERENCE_MAX_TENTATIVES, REFERENCE_PAUSE_COLLISION_MS};
use guichet_core::reference;
use guichet_core::validation::{valider_demande, valider_taille_totale};
use guichet_core::{
    DemandeSoumission, Dossier, Fichier, Reference, Role, Statut, TransitionStatut, TypeDocument,
};
use guichet_store::{Database, StoreError};

use crate::error::ApiError;
use crate::notify::{NotificationEvent, Notifications, ResumeDossier};

/// Outcome of an accepted submission.
#[derive(Debug)]
pub struct Soumis {
    pub dossier: Dossier,
    /// `true` when a dossier was created, `false` for an append.
    pub nouveau: bool,
}

/// Shared handle driving all dossier operations against the store.
#[derive(Clone)]
pub struct DossierService {
    store: Arc<Mutex<Database>>,
    notifications: Notifications,
}

impl DossierService {
    pub fn new(store: Arc<Mutex<Database>>, notifications: Notifications) -> Self {
        Self {
            store,
            notifications,
        }
    }

    // ------------------------------------------------------------------
    // Submission
    // ------------------------------------------------------------------

    /// Accept one intake-form submission.
    ///
    /// Validation runs in full before the store is touched; a failure leaves
    /// no partial state. An existing dossier for the same identity tuple and
    /// category gets the batch appended, otherwise a reference is issued and
    /// a dossier created. The notification carries only the new batch.
    pub async fn soumettre(&self, demande: DemandeSoumission) -> Result<Soumis, ApiError> {
        valider_demande(&demande)?;

        let demande = DemandeSoumission {
            identite: demande.identite.normalisee(),
            ..demande
        };
        let quand = Utc::now();
        let lot = demande.en_sous_dossier(quand);
        let contenus: Vec<Vec<u8>> = demande.fichiers.iter().map(|f| f.contenu.clone()).collect();
        let type_document = demande.details.type_document();

        let mut db = self.store.lock().await;
        let (dossier, nouveau) = match db.find_dossier_par_identite(&demande.identite, type_document)? {
            Some(mut dossier) => {
                valider_taille_totale(
                    db.taille_dossier(&dossier.reference)?,
                    demande.taille_fichiers(),
                )?;
                db.append_sous_dossier(&dossier.reference, &lot, &contenus, quand)?;
                dossier.sous_dossiers.push(lot.clone());
                dossier.date_modification = quand;
                (dossier, false)
            }
            None => {
                let reference = emettre_reference(&db, type_document)?;
                let dossier = Dossier::nouveau(
                    reference,
                    demande.identite.clone(),
                    type_document,
                    lot.clone(),
                    quand,
                );
                db.create_dossier(&dossier, &contenus).map_err(|e| match e {
                    // Unique index hit by a concurrent writer on another
                    // instance, after the retry loop already gave up.
                    StoreError::AlreadyExists => ApiError::Conflict(
                        "Une référence identique vient d'être émise, veuillez réessayer".into(),
                    ),
                    other => other.into(),
                })?;
                (dossier, true)
            }
        };
        drop(db);

        info!(
            reference = dossier.reference.as_str(),
            type_document = type_document.as_str(),
            nouveau,
            fichiers = lot.fichiers.len(),
            "soumission acceptée"
        );
        self.notifications.publier(NotificationEvent::Soumission {
            dossier: ResumeDossier::de(&dossier),
            lot,
            nouveau,
        });
        Ok(Soumis { dossier, nouveau })
    }

    // ------------------------------------------------------------------
    // Status lifecycle
    // ------------------------------------------------------------------

    /// Apply a status change, record it in the audit trail, and notify the
    /// client on rejection. The lifecycle rules live in `guichet_core`.
    pub async fn changer_statut(
        &self,
        reference: &Reference,
        vise: Statut,
        role: Role,
        motif: Option<&str>,
    ) -> Result<Dossier, ApiError> {
        let quand = Utc::now();
        let dossier = {
            let mut db = self.store.lock().await;
            let mut dossier = db.get_dossier(reference)?;
            let ligne = dossier.appliquer_statut(vise, role, motif, quand)?;
            db.enregistrer_transition(&dossier, &ligne)?;
            dossier
        };

        info!(
            reference = reference.as_str(),
            statut = vise.as_str(),
            role = role.as_str(),
            "statut mis à jour"
        );
        if vise == Statut::Rejete {
            self.notifications.publier(NotificationEvent::Rejet {
                dossier: ResumeDossier::de(&dossier),
                motif: dossier.motif_rejet.clone().unwrap_or_default(),
            });
        }
        Ok(dossier)
    }

    /// Audit trail of one dossier, oldest first.
    pub async fn historique(
        &self,
        role: Role,
        reference: &Reference,
    ) -> Result<Vec<TransitionStatut>, ApiError> {
        let db = self.store.lock().await;
        let dossier = db.get_dossier(reference)?;
        verifier_visibilite(role, &dossier)?;
        Ok(db.list_transitions(reference)?)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// List dossiers visible to the role, newest first, optionally filtered.
    pub async fn lister(
        &self,
        role: Role,
        type_document: Option<TypeDocument>,
        statut: Option<Statut>,
    ) -> Result<Vec<Dossier>, ApiError> {
        if !role.capacites().voir_dossiers {
            return Err(acces_refuse(role));
        }
        if let Some(s) = statut {
            if !role.peut_voir_statut(s) {
                return Err(acces_refuse(role));
            }
        }
        let db = self.store.lock().await;
        let dossiers = db.list_dossiers(type_document, statut)?;
        Ok(dossiers
            .into_iter()
            .filter(|d| role.peut_voir_statut(d.statut))
            .collect())
    }

    /// Fetch one dossier. A status hidden from the role reads as absent, so
    /// listings and direct lookups agree.
    pub async fn consulter(&self, role: Role, reference: &Reference) -> Result<Dossier, ApiError> {
        if !role.capacites().voir_dossiers {
            return Err(acces_refuse(role));
        }
        let db = self.store.lock().await;
        let dossier = db.get_dossier(reference)?;
        verifier_visibilite(role, &dossier)?;
        Ok(dossier)
    }

    /// Fetch one file's metadata and bytes for download.
    pub async fn telecharger_fichier(
        &self,
        role: Role,
        reference: &Reference,
        sous_dossier: Uuid,
        fichier: Uuid,
    ) -> Result<(Fichier, Vec<u8>), ApiError> {
        if !role.capacites().voir_dossiers {
            return Err(acces_refuse(role));
        }
        let db = self.store.lock().await;
        let dossier = db.get_dossier(reference)?;
        verifier_visibilite(role, &dossier)?;
        Ok(db.get_contenu_fichier(reference, sous_dossier, fichier)?)
    }

    /// Dossier counts per category and status plus file totals.
    pub async fn statistiques(
        &self,
        role: Role,
    ) -> Result<(Vec<(TypeDocument, Statut, i64)>, (i64, i64)), ApiError> {
        if !role.capacites().voir_dossiers {
            return Err(acces_refuse(role));
        }
        let db = self.store.lock().await;
        Ok((db.compter_par_statut()?, db.compter_fichiers()?))
    }

    /// Full dossier list rendered as CSV for the export roles.
    pub async fn exporter(&self, role: Role) -> Result<String, ApiError> {
        if !role.capacites().exporter {
            return Err(ApiError::Forbidden(format!(
                "le rôle {role} n'est pas autorisé à exporter"
            )));
        }
        let db = self.store.lock().await;
        let dossiers = db.list_dossiers(None, None)?;
        Ok(crate::export::csv_dossiers(&dossiers))
    }

    // ------------------------------------------------------------------
    // Deletions
    // ------------------------------------------------------------------

    /// Delete a whole dossier, batches and files cascading.
    pub async fn supprimer_dossier(
        &self,
        role: Role,
        reference: &Reference,
    ) -> Result<(), ApiError> {
        verifier_suppression(role)?;
        let db = self.store.lock().await;
        if !db.delete_dossier(reference)? {
            return Err(ApiError::NotFound("Dossier non trouvé".into()));
        }
        info!(reference = reference.as_str(), role = role.as_str(), "dossier supprimé");
        Ok(())
    }

    /// Delete one batch of a dossier.
    pub async fn supprimer_sous_dossier(
        &self,
        role: Role,
        reference: &Reference,
        sous_dossier: Uuid,
    ) -> Result<(), ApiError> {
        verifier_suppression(role)?;
        let db = self.store.lock().await;
        if !db.delete_sous_dossier(reference, sous_dossier)? {
            return Err(ApiError::NotFound("Sous-dossier non trouvé".into()));
        }
        info!(reference = reference.as_str(), %sous_dossier, "sous-dossier supprimé");
        Ok(())
    }

    /// Delete one file of a batch.
    pub async fn supprimer_fichier(
        &self,
        role: Role,
        reference: &Reference,
        sous_dossier: Uuid,
        fichier: Uuid,
    ) -> Result<(), ApiError> {
        verifier_suppression(role)?;
        let db = self.store.lock().await;
        if !db.delete_fichier(reference, sous_dossier, fichier)? {
            return Err(ApiError::NotFound("Fichier non trouvé".into()));
        }
        info!(reference = reference.as_str(), %fichier, "fichier supprimé");
        Ok(())
    }
}

fn acces_refuse(role: Role) -> ApiError {
    ApiError::Forbidden(format!("le rôle {role} n'a pas accès à ces dossiers"))
}

fn verifier_visibilite(role: Role, dossier: &Dossier) -> Result<(), ApiError> {
    if !role.peut_voir_statut(dossier.statut) {
        return Err(ApiError::NotFound("Dossier non trouvé".into()));
    }
    Ok(())
}

fn verifier_suppression(role: Role) -> Result<(), ApiError> {
    if !role.capacites().supprimer {
        return Err(ApiError::Forbidden(format!(
            "le rôle {role} n'est pas autorisé à supprimer"
        )));
    }
    Ok(())
}

/// Issue the next reference for today, retrying on collision.
///
/// The caller holds the store lock, so in-process issuance is already
/// serialized and never pauses; the retry loop and the timestamp fallback
/// cover concurrent writers on other instances sharing the database file.
/// Kept synchronous so the borrow never crosses an await point.
fn emettre_reference(db: &Database, type_document: TypeDocument) -> Result<Reference, ApiError> {
    let jour = Utc::now().date_naive();
    let prefixe = reference::prefixe_compteur(jour, type_document);

    for tentative in 1..=REFERENCE_MAX_TENTATIVES {
        let plus_haute = db.max_reference_avec_prefixe(&prefixe)?;
        let candidat = reference::suivante(jour, type_document, plus_haute.as_ref());
        if !db.reference_existe(&candidat)? {
            return Ok(candidat);
        }
        warn!(
            candidat = candidat.as_str(),
            tentative, "collision de référence, nouvel essai"
        );
        std::thread::sleep(Duration::from_millis(REFERENCE_PAUSE_COLLISION_MS));
    }

    let plus_haute = db.max_reference_avec_prefixe(&prefixe)?;
    let candidat = reference::suivante(jour, type_document, plus_haute.as_ref());
    let repli = reference::repli_collision(&candidat, Utc::now().timestamp_millis());
    warn!(
        reference = repli.as_str(),
        "réessais épuisés, référence de repli horodatée"
    );
    Ok(repli)
}
