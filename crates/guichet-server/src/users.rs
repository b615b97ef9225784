//! Back-office account management.
//!
//! Every mutation re-checks the role matrix server-side: who may touch an
//! `admin_bank` or `super_admin` account is decided by
//! `guichet_core::roles::peut_administrer`, and nobody edits or deletes
//! their own account.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use guichet_core::constants::LONGUEUR_MIN_MOT_DE_PASSE;
use guichet_core::roles::peut_administrer;
use guichet_core::{Role, Utilisateur, ValidationError};

use crate::api::AppState;
use crate::auth::hash_mot_de_passe;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreerUtilisateurRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Deserialize, Default)]
pub struct ModifierUtilisateurRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub actif: Option<bool>,
}

fn verifier_gestion(acteur: &Utilisateur) -> Result<(), ApiError> {
    if !acteur.role.capacites().gerer_utilisateurs {
        return Err(ApiError::Forbidden(format!(
            "le rôle {} ne gère pas les utilisateurs",
            acteur.role
        )));
    }
    Ok(())
}

fn verifier_cible(acteur: Role, cible: Role) -> Result<(), ApiError> {
    if !peut_administrer(acteur, cible) {
        return Err(ApiError::Forbidden(format!(
            "le rôle {acteur} ne peut pas administrer un compte {cible}"
        )));
    }
    Ok(())
}

fn verifier_mot_de_passe_neuf(password: &str) -> Result<(), ApiError> {
    if password.len() < LONGUEUR_MIN_MOT_DE_PASSE {
        return Err(ApiError::BadRequest(format!(
            "le mot de passe doit contenir au moins {LONGUEUR_MIN_MOT_DE_PASSE} caractères"
        )));
    }
    Ok(())
}

fn parse_role(role: &str) -> Result<Role, ApiError> {
    Role::parse(role).ok_or_else(|| ValidationError::RoleInvalide(role.to_string()).into())
}

/// GET /api/users
pub async fn lister(
    State(state): State<AppState>,
    Extension(acteur): Extension<Utilisateur>,
) -> Result<Json<serde_json::Value>, ApiError> {
    verifier_gestion(&acteur)?;
    let utilisateurs = {
        let db = state.store.lock().await;
        db.list_utilisateurs(acteur.id)?
    };
    Ok(Json(serde_json::json!({
        "success": true,
        "users": utilisateurs,
    })))
}

/// POST /api/users
pub async fn creer(
    State(state): State<AppState>,
    Extension(acteur): Extension<Utilisateur>,
    Json(req): Json<CreerUtilisateurRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    verifier_gestion(&acteur)?;
    let role = parse_role(&req.role)?;
    verifier_cible(acteur.role, role)?;

    let username = req.username.trim().to_string();
    if username.is_empty() {
        return Err(ValidationError::ChampManquant("username").into());
    }
    let email = req.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(ValidationError::ChampManquant("email").into());
    }
    if !email.contains('@') {
        return Err(ValidationError::ValeurInvalide {
            champ: "email",
            valeur: email,
        }
        .into());
    }
    verifier_mot_de_passe_neuf(&req.password)?;

    let utilisateur = Utilisateur {
        id: Uuid::new_v4(),
        username,
        email,
        role,
        actif: true,
        date_creation: Utc::now(),
    };
    {
        let db = state.store.lock().await;
        db.create_utilisateur(&utilisateur, &hash_mot_de_passe(&req.password))?;
    }

    info!(
        username = %utilisateur.username,
        role = %utilisateur.role,
        par = %acteur.username,
        "utilisateur créé"
    );
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "message": "Utilisateur créé",
            "user": utilisateur,
        })),
    ))
}

/// PUT /api/users/{id}
pub async fn modifier(
    State(state): State<AppState>,
    Extension(acteur): Extension<Utilisateur>,
    Path(id): Path<Uuid>,
    Json(req): Json<ModifierUtilisateurRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    verifier_gestion(&acteur)?;
    if id == acteur.id {
        return Err(ApiError::Forbidden(
            "Impossible de modifier son propre compte".into(),
        ));
    }

    let utilisateur = {
        let db = state.store.lock().await;
        let mut cible = db.get_utilisateur(id)?;
        verifier_cible(acteur.role, cible.role)?;

        if let Some(role) = req.role.as_deref() {
            let nouveau = parse_role(role)?;
            // Changer de rôle exige l'autorité sur l'ancien ET le nouveau.
            verifier_cible(acteur.role, nouveau)?;
            cible.role = nouveau;
        }
        if let Some(username) = req.username.as_deref() {
            let username = username.trim();
            if username.is_empty() {
                return Err(ValidationError::ChampManquant("username").into());
            }
            cible.username = username.to_string();
        }
        if let Some(email) = req.email.as_deref() {
            let email = email.trim().to_lowercase();
            if !email.contains('@') {
                return Err(ValidationError::ValeurInvalide {
                    champ: "email",
                    valeur: email,
                }
                .into());
            }
            cible.email = email;
        }
        if let Some(actif) = req.actif {
            cible.actif = actif;
        }
        // Tout valider avant d'écrire: un mot de passe refusé ne doit pas
        // laisser un profil à moitié modifié.
        if let Some(password) = req.password.as_deref() {
            verifier_mot_de_passe_neuf(password)?;
        }
        db.update_utilisateur(&cible)?;

        if let Some(password) = req.password.as_deref() {
            db.update_mot_de_passe(cible.id, &hash_mot_de_passe(password))?;
        }
        cible
    };

    info!(username = %utilisateur.username, par = %acteur.username, "utilisateur modifié");
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Utilisateur mis à jour",
        "user": utilisateur,
    })))
}

/// DELETE /api/users/{id}
pub async fn supprimer(
    State(state): State<AppState>,
    Extension(acteur): Extension<Utilisateur>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    verifier_gestion(&acteur)?;
    if id == acteur.id {
        return Err(ApiError::Forbidden(
            "Impossible de supprimer son propre compte".into(),
        ));
    }

    {
        let db = state.store.lock().await;
        let cible = db.get_utilisateur(id)?;
        verifier_cible(acteur.role, cible.role)?;
        if !db.delete_utilisateur(id)? {
            return Err(ApiError::NotFound("Utilisateur non trouvé".into()));
        }
        info!(username = %cible.username, par = %acteur.username, "utilisateur supprimé");
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Utilisateur supprimé",
    })))
}
