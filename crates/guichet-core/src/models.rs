//! Domain model structs shared by the store and the HTTP layer.
//!
//! Every struct derives `Serialize`/`Deserialize`; field names keep the
//! original French wire vocabulary the admin clients consume.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Reference, Role, Sexe, Statut, TypeDocument};

// ---------------------------------------------------------------------------
// Identity tuple
// ---------------------------------------------------------------------------

/// Client identity fields carried at the dossier root.
///
/// (`nom`, `prenom`, `email`) plus the dossier's `typeDocument` form the
/// aggregate identity: one open dossier per tuple.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identite {
    pub nom: String,
    pub prenom: String,
    pub email: String,
    pub telephone: String,
    pub profession: String,
    pub sexe: Sexe,
}

impl Identite {
    /// Canonical form used for lookups and persistence: names and phone
    /// trimmed, email trimmed and lowercased.
    pub fn normalisee(mut self) -> Self {
        self.nom = self.nom.trim().to_string();
        self.prenom = self.prenom.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self.telephone = self.telephone.trim().to_string();
        self.profession = self.profession.trim().to_string();
        self
    }
}

// ---------------------------------------------------------------------------
// Fichier
// ---------------------------------------------------------------------------

/// Metadata of one stored file. Content bytes are persisted separately and
/// never travel with list responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Fichier {
    pub id: Uuid,
    /// Server-generated storage name (`{stem}_{millis}{ext}`).
    pub nom: String,
    #[serde(rename = "nomOriginal")]
    pub nom_original: String,
    /// Size in bytes.
    pub taille: u64,
    pub extension: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    #[serde(rename = "dateUpload")]
    pub date_upload: DateTime<Utc>,
}

/// One uploaded file as received from the intake form, content included.
#[derive(Debug, Clone)]
pub struct FichierRecu {
    pub nom_original: String,
    pub mime_type: String,
    pub contenu: Vec<u8>,
}

impl FichierRecu {
    pub fn taille(&self) -> u64 {
        self.contenu.len() as u64
    }

    /// Lowercased extension including the dot, empty when absent.
    pub fn extension(&self) -> String {
        match self.nom_original.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => format!(".{}", ext.to_lowercase()),
            _ => String::new(),
        }
    }

    /// Build the stored metadata, stamping a collision-free storage name.
    pub fn en_fichier(&self, horodatage: DateTime<Utc>) -> Fichier {
        let extension = self.extension();
        // La casse de l'extension d'origine peut différer de la forme
        // normalisée, on coupe donc sur le dernier point plutôt que par
        // suffixe.
        let stem = match self.nom_original.rsplit_once('.') {
            Some((stem, _)) if !extension.is_empty() => stem,
            _ => self.nom_original.as_str(),
        };
        Fichier {
            id: Uuid::new_v4(),
            nom: format!("{}_{}{}", stem, horodatage.timestamp_millis(), extension),
            nom_original: self.nom_original.clone(),
            taille: self.taille(),
            extension,
            mime_type: self.mime_type.clone(),
            date_upload: horodatage,
        }
    }
}

// ---------------------------------------------------------------------------
// SousDossier
// ---------------------------------------------------------------------------

/// One submission batch within a dossier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SousDossier {
    pub id: Uuid,
    /// Batch label, the ISO day of submission (e.g. `2025-10-15`).
    pub nom: String,
    pub date: DateTime<Utc>,
    /// Human-readable reason shown in the back office: the voyage `raison`
    /// (or `autreRaison` when "autres") or the transfert type.
    pub motif: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pays: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raison: Option<String>,
    #[serde(rename = "autreRaison", skip_serializing_if = "Option::is_none")]
    pub autre_raison: Option<String>,
    #[serde(rename = "typeTransfert", skip_serializing_if = "Option::is_none")]
    pub type_transfert: Option<String>,
    #[serde(rename = "dateDebut", skip_serializing_if = "Option::is_none")]
    pub date_debut: Option<NaiveDate>,
    #[serde(rename = "dateFin", skip_serializing_if = "Option::is_none")]
    pub date_fin: Option<NaiveDate>,
    pub fichiers: Vec<Fichier>,
}

impl SousDossier {
    pub fn taille_totale(&self) -> u64 {
        self.fichiers.iter().map(|f| f.taille).sum()
    }
}

// ---------------------------------------------------------------------------
// Dossier (aggregate root)
// ---------------------------------------------------------------------------

/// Top-level case record for one client + submission category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dossier {
    pub reference: Reference,
    #[serde(flatten)]
    pub identite: Identite,
    #[serde(rename = "typeDocument")]
    pub type_document: TypeDocument,
    pub statut: Statut,
    #[serde(rename = "motifRejet", skip_serializing_if = "Option::is_none")]
    pub motif_rejet: Option<String>,
    #[serde(rename = "dateCreation")]
    pub date_creation: DateTime<Utc>,
    #[serde(rename = "dateModification")]
    pub date_modification: DateTime<Utc>,
    #[serde(rename = "sousDossiers")]
    pub sous_dossiers: Vec<SousDossier>,
}

impl Dossier {
    /// Assemble a brand-new dossier around its first batch.
    pub fn nouveau(
        reference: Reference,
        identite: Identite,
        type_document: TypeDocument,
        premier_lot: SousDossier,
        horodatage: DateTime<Utc>,
    ) -> Self {
        Self {
            reference,
            identite,
            type_document,
            statut: Statut::EnAttente,
            motif_rejet: None,
            date_creation: horodatage,
            date_modification: horodatage,
            sous_dossiers: vec![premier_lot],
        }
    }

    /// Combined size in bytes of every file across every batch.
    pub fn taille_totale(&self) -> u64 {
        self.sous_dossiers.iter().map(|sd| sd.taille_totale()).sum()
    }

    pub fn nombre_fichiers(&self) -> usize {
        self.sous_dossiers.iter().map(|sd| sd.fichiers.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Submission payload
// ---------------------------------------------------------------------------

/// Category-specific fields of one submission.
#[derive(Debug, Clone)]
pub enum DetailsSoumission {
    Voyage {
        pays: Vec<String>,
        raison: String,
        autre_raison: Option<String>,
        date_debut: Option<NaiveDate>,
        date_fin: Option<NaiveDate>,
    },
    Transfert {
        type_transfert: String,
        date_debut: Option<NaiveDate>,
        date_fin: Option<NaiveDate>,
    },
}

impl DetailsSoumission {
    pub fn type_document(&self) -> TypeDocument {
        match self {
            DetailsSoumission::Voyage { .. } => TypeDocument::Voyage,
            DetailsSoumission::Transfert { .. } => TypeDocument::Transfert,
        }
    }
}

/// A full intake-form submission, validated then turned into a create or an
/// append by the dossier service.
#[derive(Debug, Clone)]
pub struct DemandeSoumission {
    pub identite: Identite,
    pub details: DetailsSoumission,
    pub fichiers: Vec<FichierRecu>,
}

impl DemandeSoumission {
    /// Combined size in bytes of the uploaded files.
    pub fn taille_fichiers(&self) -> u64 {
        self.fichiers.iter().map(|f| f.taille()).sum()
    }

    /// Build the batch this submission adds, files stamped and named.
    pub fn en_sous_dossier(&self, horodatage: DateTime<Utc>) -> SousDossier {
        let fichiers = self
            .fichiers
            .iter()
            .map(|f| f.en_fichier(horodatage))
            .collect();
        match &self.details {
            DetailsSoumission::Voyage {
                pays,
                raison,
                autre_raison,
                date_debut,
                date_fin,
            } => {
                let motif = if raison == "autres" {
                    autre_raison.clone().unwrap_or_else(|| raison.clone())
                } else {
                    raison.clone()
                };
                SousDossier {
                    id: Uuid::new_v4(),
                    nom: horodatage.date_naive().to_string(),
                    date: horodatage,
                    motif: Some(motif),
                    pays: pays.clone(),
                    raison: Some(raison.clone()),
                    autre_raison: if raison == "autres" {
                        autre_raison.clone()
                    } else {
                        None
                    },
                    type_transfert: None,
                    date_debut: *date_debut,
                    date_fin: *date_fin,
                    fichiers,
                }
            }
            DetailsSoumission::Transfert {
                type_transfert,
                date_debut,
                date_fin,
            } => SousDossier {
                id: Uuid::new_v4(),
                nom: horodatage.date_naive().to_string(),
                date: horodatage,
                motif: Some(type_transfert.clone()),
                pays: Vec::new(),
                raison: None,
                autre_raison: None,
                type_transfert: Some(type_transfert.clone()),
                date_debut: *date_debut,
                date_fin: *date_fin,
                fichiers,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Utilisateur
// ---------------------------------------------------------------------------

/// A back-office account. The password hash never leaves the store layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Utilisateur {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub actif: bool,
    #[serde(rename = "dateCreation")]
    pub date_creation: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Status history
// ---------------------------------------------------------------------------

/// One row of the append-only status audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransitionStatut {
    pub reference: Reference,
    #[serde(rename = "statutAvant")]
    pub statut_avant: Statut,
    #[serde(rename = "statutApres")]
    pub statut_apres: Statut,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motif: Option<String>,
    pub date: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Formulaire client
// ---------------------------------------------------------------------------

/// Metadata of the single blank client form PDF served to the public site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormulaireClient {
    #[serde(rename = "nomOriginal")]
    pub nom_original: String,
    pub taille: u64,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    #[serde(rename = "dateUpload")]
    pub date_upload: DateTime<Utc>,
    pub uploader: String,
}
