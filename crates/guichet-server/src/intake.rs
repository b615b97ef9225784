//! Multipart intake: turning a public form post into a [`DemandeSoumission`].
//!
//! Reading the wire format and assembling the domain payload are split so
//! the assembly rules stay testable without HTTP machinery. Field presence
//! and caps are checked later by `guichet_core::validation`; this module
//! only rejects values it cannot parse at all.

use std::collections::HashMap;

use axum::extract::Multipart;
use chrono::NaiveDate;

use guichet_core::{
    DemandeSoumission, DetailsSoumission, FichierRecu, Identite, Sexe, TypeDocument,
    ValidationError,
};

use crate::error::ApiError;

/// Raw form content: text fields, the repeated `pays` entries and the
/// uploaded files.
#[derive(Debug, Default)]
pub struct ChampsSoumission {
    valeurs: HashMap<String, String>,
    pays: Vec<String>,
    fichiers: Vec<FichierRecu>,
}

impl ChampsSoumission {
    /// Record one text field. `pays` may arrive repeated or as one JSON
    /// array, depending on the client.
    pub fn poser(&mut self, nom: &str, valeur: String) {
        if nom == "pays" || nom == "pays[]" {
            if valeur.trim_start().starts_with('[') {
                if let Ok(liste) = serde_json::from_str::<Vec<String>>(&valeur) {
                    self.pays.extend(liste);
                    return;
                }
            }
            self.pays.push(valeur);
        } else {
            self.valeurs.insert(nom.to_string(), valeur);
        }
    }

    pub fn ajouter_fichier(&mut self, fichier: FichierRecu) {
        self.fichiers.push(fichier);
    }

    fn valeur(&self, champ: &str) -> String {
        self.valeurs
            .get(champ)
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    fn option(&self, champ: &str) -> Option<String> {
        Some(self.valeur(champ)).filter(|v| !v.is_empty())
    }
}

/// Drain the multipart stream into raw form content.
pub async fn lire_multipart(multipart: &mut Multipart) -> Result<ChampsSoumission, ApiError> {
    let mut champs = ChampsSoumission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Formulaire multipart illisible: {e}")))?
    {
        let nom = field.name().unwrap_or("").to_string();
        let nom_fichier = field.file_name().map(str::to_string);
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        match nom_fichier {
            Some(nom_original) => {
                let contenu = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Fichier illisible: {e}")))?
                    .to_vec();
                // Un <input type=file> vide envoie une partie sans nom.
                if nom_original.is_empty() && contenu.is_empty() {
                    continue;
                }
                champs.ajouter_fichier(FichierRecu {
                    nom_original,
                    mime_type,
                    contenu,
                });
            }
            None => {
                let valeur = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Champ {nom} illisible: {e}")))?;
                champs.poser(&nom, valeur);
            }
        }
    }
    Ok(champs)
}

/// Build the domain payload for the given category.
pub fn assembler_demande(
    champs: ChampsSoumission,
    type_document: TypeDocument,
) -> Result<DemandeSoumission, ApiError> {
    let sexe_brut = champs.valeur("sexe");
    if sexe_brut.is_empty() {
        return Err(ValidationError::ChampManquant("sexe").into());
    }
    let sexe = Sexe::parse(&sexe_brut).ok_or(ValidationError::ValeurInvalide {
        champ: "sexe",
        valeur: sexe_brut,
    })?;

    let identite = Identite {
        nom: champs.valeur("nom"),
        prenom: champs.valeur("prenom"),
        email: champs.valeur("email"),
        telephone: champs.valeur("telephone"),
        profession: champs.valeur("profession"),
        sexe,
    };

    let date_debut = lire_date(&champs, "dateDebut")?;
    let date_fin = lire_date(&champs, "dateFin")?;

    let details = match type_document {
        TypeDocument::Voyage => DetailsSoumission::Voyage {
            pays: champs
                .pays
                .iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            raison: champs.valeur("raison"),
            autre_raison: champs.option("autreRaison"),
            date_debut,
            date_fin,
        },
        TypeDocument::Transfert => DetailsSoumission::Transfert {
            type_transfert: champs.valeur("typeTransfert"),
            date_debut,
            date_fin,
        },
    };

    Ok(DemandeSoumission {
        identite,
        details,
        fichiers: champs.fichiers,
    })
}

/// ISO `AAAA-MM-JJ` date field, absent when empty.
fn lire_date(champs: &ChampsSoumission, champ: &'static str) -> Result<Option<NaiveDate>, ApiError> {
    match champs.option(champ) {
        None => Ok(None),
        Some(valeur) => valeur.parse().map(Some).map_err(|_| {
            ValidationError::ValeurInvalide {
                champ,
                valeur,
            }
            .into()
        }),
    }
}
