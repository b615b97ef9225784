//! Submission validation, run in full before anything is persisted.
//!
//! Order: identity fields, category fields, then the file set. The first
//! violation aborts the whole submission; there are no partial writes.

use crate::constants::{TAILLE_MAX_DOSSIER, TAILLE_MAX_FICHIER};
use crate::error::ValidationError;
use crate::models::{DemandeSoumission, DetailsSoumission};

fn champ_requis(valeur: &str, champ: &'static str) -> Result<(), ValidationError> {
    if valeur.trim().is_empty() {
        return Err(ValidationError::ChampManquant(champ));
    }
    Ok(())
}

/// Validate a full submission (identity, category fields, file caps).
///
/// The total-size cap is checked against the new files alone here; appends
/// must also pass [`valider_taille_totale`] with the bytes already stored.
pub fn valider_demande(demande: &DemandeSoumission) -> Result<(), ValidationError> {
    let identite = &demande.identite;
    champ_requis(&identite.nom, "nom")?;
    champ_requis(&identite.prenom, "prenom")?;
    champ_requis(&identite.email, "email")?;
    champ_requis(&identite.telephone, "telephone")?;
    champ_requis(&identite.profession, "profession")?;

    match &demande.details {
        DetailsSoumission::Voyage {
            pays,
            raison,
            date_debut,
            date_fin,
            ..
        } => {
            if pays.iter().all(|p| p.trim().is_empty()) {
                return Err(ValidationError::ChampManquant("pays"));
            }
            champ_requis(raison, "raison")?;
            let debut = date_debut.ok_or(ValidationError::ChampManquant("dateDebut"))?;
            let fin = date_fin.ok_or(ValidationError::ChampManquant("dateFin"))?;
            if debut > fin {
                return Err(ValidationError::PlageDatesInvalide);
            }
        }
        DetailsSoumission::Transfert {
            type_transfert,
            date_debut,
            date_fin,
        } => {
            champ_requis(type_transfert, "typeTransfert")?;
            if let (Some(debut), Some(fin)) = (date_debut, date_fin) {
                if debut > fin {
                    return Err(ValidationError::PlageDatesInvalide);
                }
            }
        }
    }

    if demande.fichiers.is_empty() {
        return Err(ValidationError::AucunFichier);
    }
    for fichier in &demande.fichiers {
        if fichier.taille() > TAILLE_MAX_FICHIER {
            return Err(ValidationError::FichierTropVolumineux {
                nom: fichier.nom_original.clone(),
                taille: fichier.taille(),
                max: TAILLE_MAX_FICHIER,
            });
        }
    }
    valider_taille_totale(0, demande.taille_fichiers())
}

/// Dossier-wide cap: bytes already stored plus the incoming batch.
pub fn valider_taille_totale(existant: u64, ajout: u64) -> Result<(), ValidationError> {
    let total = existant + ajout;
    if total > TAILLE_MAX_DOSSIER {
        return Err(ValidationError::TailleTotaleDepassee {
            total,
            max: TAILLE_MAX_DOSSIER,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FichierRecu, Identite};
    use crate::types::Sexe;
    use chrono::NaiveDate;

    fn fichier(octets: usize) -> FichierRecu {
        FichierRecu {
            nom_original: "piece.pdf".into(),
            mime_type: "application/pdf".into(),
            contenu: vec![0u8; octets],
        }
    }

    fn demande_voyage() -> DemandeSoumission {
        DemandeSoumission {
            identite: Identite {
                nom: "Dupont".into(),
                prenom: "Jean".into(),
                email: "jean@x.com".into(),
                telephone: "0600000000".into(),
                profession: "ingénieur".into(),
                sexe: Sexe::H,
            },
            details: DetailsSoumission::Voyage {
                pays: vec!["France".into()],
                raison: "affaires".into(),
                autre_raison: None,
                date_debut: NaiveDate::from_ymd_opt(2025, 11, 1),
                date_fin: NaiveDate::from_ymd_opt(2025, 11, 15),
            },
            fichiers: vec![fichier(1024)],
        }
    }

    #[test]
    fn demande_complete_acceptee() {
        assert_eq!(valider_demande(&demande_voyage()), Ok(()));
    }

    #[test]
    fn identite_incomplete_refusee() {
        let mut d = demande_voyage();
        d.identite.telephone = "   ".into();
        assert_eq!(
            valider_demande(&d),
            Err(ValidationError::ChampManquant("telephone"))
        );
    }

    #[test]
    fn voyage_sans_pays_refuse() {
        let mut d = demande_voyage();
        d.details = DetailsSoumission::Voyage {
            pays: vec![],
            raison: "affaires".into(),
            autre_raison: None,
            date_debut: NaiveDate::from_ymd_opt(2025, 11, 1),
            date_fin: NaiveDate::from_ymd_opt(2025, 11, 15),
        };
        assert_eq!(valider_demande(&d), Err(ValidationError::ChampManquant("pays")));
    }

    #[test]
    fn voyage_dates_inversees_refuse() {
        let mut d = demande_voyage();
        d.details = DetailsSoumission::Voyage {
            pays: vec!["France".into()],
            raison: "affaires".into(),
            autre_raison: None,
            date_debut: NaiveDate::from_ymd_opt(2025, 11, 15),
            date_fin: NaiveDate::from_ymd_opt(2025, 11, 1),
        };
        assert_eq!(valider_demande(&d), Err(ValidationError::PlageDatesInvalide));
    }

    #[test]
    fn transfert_sans_dates_accepte() {
        let mut d = demande_voyage();
        d.details = DetailsSoumission::Transfert {
            type_transfert: "international".into(),
            date_debut: None,
            date_fin: None,
        };
        assert_eq!(valider_demande(&d), Ok(()));
    }

    #[test]
    fn transfert_sans_type_refuse() {
        let mut d = demande_voyage();
        d.details = DetailsSoumission::Transfert {
            type_transfert: "".into(),
            date_debut: None,
            date_fin: None,
        };
        assert_eq!(
            valider_demande(&d),
            Err(ValidationError::ChampManquant("typeTransfert"))
        );
    }

    #[test]
    fn aucun_fichier_refuse() {
        let mut d = demande_voyage();
        d.fichiers.clear();
        assert_eq!(valider_demande(&d), Err(ValidationError::AucunFichier));
    }

    #[test]
    fn fichier_de_13_mo_refuse() {
        let mut d = demande_voyage();
        d.fichiers = vec![fichier(13 * 1024 * 1024)];
        assert!(matches!(
            valider_demande(&d),
            Err(ValidationError::FichierTropVolumineux { .. })
        ));
    }

    #[test]
    fn fichier_pile_a_la_limite_accepte() {
        let mut d = demande_voyage();
        d.fichiers = vec![fichier(12 * 1024 * 1024)];
        assert_eq!(valider_demande(&d), Ok(()));
    }

    #[test]
    fn cumul_au_dela_de_50_mo_refuse() {
        // Chaque pièce respecte la limite unitaire, le cumul non.
        let mut d = demande_voyage();
        d.fichiers = (0..5).map(|_| fichier(11 * 1024 * 1024)).collect();
        assert!(matches!(
            valider_demande(&d),
            Err(ValidationError::TailleTotaleDepassee { .. })
        ));
    }

    #[test]
    fn ajout_qui_deborde_le_dossier_refuse() {
        let existant = 45 * 1024 * 1024;
        assert_eq!(valider_taille_totale(existant, 1024), Ok(()));
        assert!(matches!(
            valider_taille_totale(existant, 6 * 1024 * 1024),
            Err(ValidationError::TailleTotaleDepassee { .. })
        ));
    }
}
