use serde::{Deserialize, Serialize};

/// Unique human-readable case identifier, `DDMMYYYY-TYPEnnn`.
///
/// Issued once at submission time by [`crate::reference`] and never mutated;
/// the rare collision-fallback form carries an extra `-dddd` timestamp
/// suffix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Reference(pub String);

impl Reference {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Reference {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The two submission categories.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TypeDocument {
    #[serde(rename = "voyage")]
    Voyage,
    #[serde(rename = "transfert")]
    Transfert,
}

impl TypeDocument {
    /// Short code embedded in references (`DOC` for voyage, `TRF` for
    /// transfert).
    pub fn code(&self) -> &'static str {
        match self {
            TypeDocument::Voyage => "DOC",
            TypeDocument::Transfert => "TRF",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeDocument::Voyage => "voyage",
            TypeDocument::Transfert => "transfert",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "voyage" => Some(TypeDocument::Voyage),
            "transfert" => Some(TypeDocument::Transfert),
            _ => None,
        }
    }
}

impl std::fmt::Display for TypeDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Dossier status. `Archive` and `Rejete` are terminal.
///
/// The wire/storage strings keep the original French spellings, accents
/// included, because they are the values the admin clients already filter
/// and display on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Statut {
    #[serde(rename = "en_attente")]
    EnAttente,
    #[serde(rename = "partiellement_apuré")]
    PartiellementApure,
    #[serde(rename = "apuré")]
    Apure,
    #[serde(rename = "archivé")]
    Archive,
    #[serde(rename = "rejeté")]
    Rejete,
}

impl Statut {
    pub fn as_str(&self) -> &'static str {
        match self {
            Statut::EnAttente => "en_attente",
            Statut::PartiellementApure => "partiellement_apuré",
            Statut::Apure => "apuré",
            Statut::Archive => "archivé",
            Statut::Rejete => "rejeté",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "en_attente" => Some(Statut::EnAttente),
            "partiellement_apuré" => Some(Statut::PartiellementApure),
            "apuré" => Some(Statut::Apure),
            "archivé" => Some(Statut::Archive),
            "rejeté" => Some(Statut::Rejete),
            _ => None,
        }
    }

    /// Terminal states admit no further transition.
    pub fn est_terminal(&self) -> bool {
        matches!(self, Statut::Archive | Statut::Rejete)
    }
}

impl std::fmt::Display for Statut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Back-office roles. A tagged enum, not a hierarchy — every permission is
/// answered by the matrix in [`crate::roles`], nowhere else.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    #[serde(rename = "superviseur")]
    Superviseur,
    #[serde(rename = "admin_bank")]
    AdminBank,
    #[serde(rename = "super_admin")]
    SuperAdmin,
    #[serde(rename = "agent_saisie")]
    AgentSaisie,
    #[serde(rename = "auditeur")]
    Auditeur,
    #[serde(rename = "conformité")]
    Conformite,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superviseur => "superviseur",
            Role::AdminBank => "admin_bank",
            Role::SuperAdmin => "super_admin",
            Role::AgentSaisie => "agent_saisie",
            Role::Auditeur => "auditeur",
            Role::Conformite => "conformité",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "superviseur" => Some(Role::Superviseur),
            "admin_bank" => Some(Role::AdminBank),
            "super_admin" => Some(Role::SuperAdmin),
            "agent_saisie" => Some(Role::AgentSaisie),
            "auditeur" => Some(Role::Auditeur),
            "conformité" => Some(Role::Conformite),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Declared gender on the intake form (`H`/`F`, per the original form).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Sexe {
    H,
    F,
}

impl Sexe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sexe::H => "H",
            Sexe::F => "F",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "H" => Some(Sexe::H),
            "F" => Some(Sexe::F),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statut_round_trip() {
        for s in [
            Statut::EnAttente,
            Statut::PartiellementApure,
            Statut::Apure,
            Statut::Archive,
            Statut::Rejete,
        ] {
            assert_eq!(Statut::parse(s.as_str()), Some(s));
        }
        assert_eq!(Statut::parse("traite"), None);
    }

    #[test]
    fn terminal_states() {
        assert!(Statut::Archive.est_terminal());
        assert!(Statut::Rejete.est_terminal());
        assert!(!Statut::EnAttente.est_terminal());
        assert!(!Statut::Apure.est_terminal());
    }

    #[test]
    fn role_round_trip() {
        for r in [
            Role::Superviseur,
            Role::AdminBank,
            Role::SuperAdmin,
            Role::AgentSaisie,
            Role::Auditeur,
            Role::Conformite,
        ] {
            assert_eq!(Role::parse(r.as_str()), Some(r));
        }
        assert_eq!(Role::parse("administrateur"), None);
    }

    #[test]
    fn type_document_codes() {
        assert_eq!(TypeDocument::Voyage.code(), "DOC");
        assert_eq!(TypeDocument::Transfert.code(), "TRF");
    }
}
