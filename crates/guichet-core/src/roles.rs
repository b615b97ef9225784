//! Capability matrix: what each back-office role may do.
//!
//! Pure lookups, no state. The HTTP layer and the lifecycle both consult
//! this module; the server is the authority even when a client already
//! filtered its choices.

use crate::types::{Role, Statut};

/// Capability flags of one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacites {
    pub voir_dossiers: bool,
    pub changer_statut: bool,
    pub rejeter: bool,
    pub supprimer: bool,
    pub gerer_utilisateurs: bool,
    pub exporter: bool,
    pub gerer_formulaire: bool,
    pub voir_archives: bool,
    pub voir_rejetes: bool,
}

impl Role {
    /// Full capability row for this role.
    ///
    /// `super_admin` administers accounts only and never touches dossiers.
    /// `auditeur` observes and exports, never mutates. Rejection stays
    /// exclusive to `conformité`.
    pub const fn capacites(&self) -> Capacites {
        match self {
            Role::Superviseur => Capacites {
                voir_dossiers: true,
                changer_statut: true,
                rejeter: false,
                supprimer: true,
                gerer_utilisateurs: false,
                exporter: false,
                gerer_formulaire: true,
                voir_archives: true,
                voir_rejetes: false,
            },
            Role::AdminBank => Capacites {
                voir_dossiers: true,
                changer_statut: true,
                rejeter: false,
                supprimer: true,
                gerer_utilisateurs: true,
                exporter: false,
                gerer_formulaire: false,
                voir_archives: true,
                voir_rejetes: false,
            },
            Role::SuperAdmin => Capacites {
                voir_dossiers: false,
                changer_statut: false,
                rejeter: false,
                supprimer: false,
                gerer_utilisateurs: true,
                exporter: false,
                gerer_formulaire: false,
                voir_archives: false,
                voir_rejetes: false,
            },
            Role::AgentSaisie => Capacites {
                voir_dossiers: true,
                changer_statut: true,
                rejeter: false,
                supprimer: false,
                gerer_utilisateurs: false,
                exporter: false,
                gerer_formulaire: false,
                voir_archives: false,
                voir_rejetes: false,
            },
            Role::Auditeur => Capacites {
                voir_dossiers: true,
                changer_statut: false,
                rejeter: false,
                supprimer: false,
                gerer_utilisateurs: false,
                exporter: true,
                gerer_formulaire: false,
                voir_archives: true,
                voir_rejetes: true,
            },
            Role::Conformite => Capacites {
                voir_dossiers: true,
                changer_statut: true,
                rejeter: true,
                supprimer: false,
                gerer_utilisateurs: false,
                exporter: true,
                gerer_formulaire: false,
                voir_archives: true,
                voir_rejetes: true,
            },
        }
    }

    /// Whether a dossier in the given status appears for this role at all,
    /// in listings as well as direct lookups.
    pub const fn peut_voir_statut(&self, statut: Statut) -> bool {
        let c = self.capacites();
        match statut {
            Statut::Archive => c.voir_archives,
            Statut::Rejete => c.voir_rejetes,
            _ => c.voir_dossiers,
        }
    }
}

/// Account administration gate.
///
/// Touching an `admin_bank` or `super_admin` account takes `super_admin`;
/// any other target takes `admin_bank` or `super_admin`. Self-modification
/// is refused separately, by account id, in the user service.
pub const fn peut_administrer(acteur: Role, cible: Role) -> bool {
    match cible {
        Role::AdminBank | Role::SuperAdmin => matches!(acteur, Role::SuperAdmin),
        _ => matches!(acteur, Role::AdminBank | Role::SuperAdmin),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOUS: [Role; 6] = [
        Role::Superviseur,
        Role::AdminBank,
        Role::SuperAdmin,
        Role::AgentSaisie,
        Role::Auditeur,
        Role::Conformite,
    ];

    #[test]
    fn seule_la_conformite_rejette() {
        for role in TOUS {
            assert_eq!(role.capacites().rejeter, role == Role::Conformite, "{role}");
        }
    }

    #[test]
    fn export_reserve_audit_et_conformite() {
        for role in TOUS {
            let attendu = matches!(role, Role::Auditeur | Role::Conformite);
            assert_eq!(role.capacites().exporter, attendu, "{role}");
        }
    }

    #[test]
    fn suppression_reservee_aux_gestionnaires() {
        for role in TOUS {
            let attendu = matches!(role, Role::Superviseur | Role::AdminBank);
            assert_eq!(role.capacites().supprimer, attendu, "{role}");
        }
    }

    #[test]
    fn super_admin_ne_voit_pas_les_dossiers() {
        let c = Role::SuperAdmin.capacites();
        assert!(!c.voir_dossiers);
        assert!(!c.changer_statut);
        assert!(c.gerer_utilisateurs);
        for statut in [
            Statut::EnAttente,
            Statut::PartiellementApure,
            Statut::Apure,
            Statut::Archive,
            Statut::Rejete,
        ] {
            assert!(!Role::SuperAdmin.peut_voir_statut(statut));
        }
    }

    #[test]
    fn agent_saisie_ne_voit_ni_archives_ni_rejets() {
        assert!(Role::AgentSaisie.peut_voir_statut(Statut::EnAttente));
        assert!(Role::AgentSaisie.peut_voir_statut(Statut::Apure));
        assert!(!Role::AgentSaisie.peut_voir_statut(Statut::Archive));
        assert!(!Role::AgentSaisie.peut_voir_statut(Statut::Rejete));
        assert!(Role::AgentSaisie.capacites().changer_statut);
    }

    #[test]
    fn rejets_visibles_seulement_en_audit_et_conformite() {
        for role in TOUS {
            let attendu = matches!(role, Role::Auditeur | Role::Conformite);
            assert_eq!(role.peut_voir_statut(Statut::Rejete), attendu, "{role}");
        }
    }

    #[test]
    fn formulaire_gere_par_le_superviseur() {
        for role in TOUS {
            let attendu = role == Role::Superviseur;
            assert_eq!(role.capacites().gerer_formulaire, attendu, "{role}");
        }
    }

    #[test]
    fn administration_des_comptes() {
        // Cibles sensibles: super_admin uniquement.
        for cible in [Role::AdminBank, Role::SuperAdmin] {
            assert!(peut_administrer(Role::SuperAdmin, cible));
            assert!(!peut_administrer(Role::AdminBank, cible));
            assert!(!peut_administrer(Role::Superviseur, cible));
        }
        // Autres cibles: admin_bank ou super_admin.
        for cible in [Role::Superviseur, Role::AgentSaisie, Role::Auditeur, Role::Conformite] {
            assert!(peut_administrer(Role::AdminBank, cible));
            assert!(peut_administrer(Role::SuperAdmin, cible));
            assert!(!peut_administrer(Role::Conformite, cible));
            assert!(!peut_administrer(Role::AgentSaisie, cible));
        }
    }
}
