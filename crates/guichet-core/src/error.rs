use thiserror::Error;

use crate::types::{Role, Statut};

/// Errors produced by the pure domain layer.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CoreError {
    /// The request is malformed or violates a submission rule; nothing was
    /// persisted.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The acting role is not authorized for the requested action.
    #[error("le rôle {role} n'est pas autorisé à {action}")]
    Permission { role: Role, action: &'static str },
}

/// Submission / transition validation failures, detected before any mutation.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("le champ {0} est requis")]
    ChampManquant(&'static str),

    #[error("au moins un fichier est requis")]
    AucunFichier,

    #[error("{nom}: le fichier ({taille} octets) dépasse la limite de {max} octets")]
    FichierTropVolumineux { nom: String, taille: u64, max: u64 },

    #[error("taille totale des fichiers ({total} octets) dépasse la limite de {max} octets")]
    TailleTotaleDepassee { total: u64, max: u64 },

    #[error("la date de fin doit être postérieure à la date de début")]
    PlageDatesInvalide,

    #[error("un motif de rejet est requis")]
    MotifRejetManquant,

    #[error("statut invalide: {0}")]
    StatutInvalide(String),

    #[error("aucune transition possible depuis le statut terminal {0}")]
    StatutTerminal(Statut),

    #[error("rôle invalide: {0}")]
    RoleInvalide(String),

    #[error("valeur invalide pour le champ {champ}: {valeur}")]
    ValeurInvalide { champ: &'static str, valeur: String },
}
