//! Authentication: password hashing, in-memory sessions, and the bearer
//! middleware protecting the back-office routes.
//!
//! Passwords are stored as `hex(salt)$hex(pbkdf2)`. Session tokens are 32
//! random bytes, hex-encoded, held in memory with a TTL; restarting the
//! server logs everyone out.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use axum::{Extension, Json};
use chrono::{DateTime, Duration, Utc};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use guichet_core::constants::LONGUEUR_MIN_MOT_DE_PASSE;
use guichet_core::{Role, Utilisateur};
use guichet_store::Database;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::error::ApiError;

const PBKDF2_ITERATIONS: u32 = 600_000;
const SALT_LENGTH: usize = 32;
const HASH_LENGTH: usize = 32;
const TOKEN_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Password hashing
// ---------------------------------------------------------------------------

/// Hash a password with PBKDF2-SHA256 and a fresh random salt.
pub fn hash_mot_de_passe(mot_de_passe: &str) -> String {
    let mut sel = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut sel);

    let mut empreinte = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(mot_de_passe.as_bytes(), &sel, PBKDF2_ITERATIONS, &mut empreinte);

    format!("{}${}", hex::encode(sel), hex::encode(empreinte))
}

/// Check a password against a stored `salt$hash` string, in constant time
/// over the hash comparison.
pub fn verifier_mot_de_passe(mot_de_passe: &str, stocke: &str) -> bool {
    let Some((sel_hex, empreinte_hex)) = stocke.split_once('$') else {
        return false;
    };
    let (Ok(sel), Ok(attendue)) = (hex::decode(sel_hex), hex::decode(empreinte_hex)) else {
        return false;
    };
    if attendue.is_empty() {
        return false;
    }

    let mut calculee = vec![0u8; attendue.len()];
    pbkdf2_hmac::<Sha256>(mot_de_passe.as_bytes(), &sel, PBKDF2_ITERATIONS, &mut calculee);

    calculee.ct_eq(&attendue).unwrap_u8() == 1
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Session {
    utilisateur: Uuid,
    expire: DateTime<Utc>,
}

/// In-memory session table: token -> account id, with expiry.
#[derive(Clone)]
pub struct Sessions {
    duree: Duration,
    table: Arc<RwLock<HashMap<String, Session>>>,
}

impl Sessions {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            duree: Duration::seconds(ttl_secs as i64),
            table: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Open a session and return its bearer token.
    pub async fn ouvrir(&self, utilisateur: Uuid) -> String {
        let mut octets = [0u8; TOKEN_LENGTH];
        rand::thread_rng().fill_bytes(&mut octets);
        let token = hex::encode(octets);

        let mut table = self.table.write().await;
        table.insert(
            token.clone(),
            Session {
                utilisateur,
                expire: Utc::now() + self.duree,
            },
        );
        token
    }

    /// Resolve a token to its account id, `None` when unknown or expired.
    pub async fn resoudre(&self, token: &str) -> Option<Uuid> {
        let table = self.table.read().await;
        let session = table.get(token)?;
        if Utc::now() >= session.expire {
            return None;
        }
        Some(session.utilisateur)
    }

    /// Close one session. Returns `true` if the token existed.
    pub async fn fermer(&self, token: &str) -> bool {
        self.table.write().await.remove(token).is_some()
    }

    /// Drop every expired entry; run periodically from a background task.
    pub async fn purge_expired(&self) {
        let maintenant = Utc::now();
        let mut table = self.table.write().await;
        let avant = table.len();
        table.retain(|_, s| s.expire > maintenant);
        let purgees = avant - table.len();
        if purgees > 0 {
            tracing::debug!(purgees, "sessions expirées purgées");
        }
    }
}

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

/// Extract the bearer token from an `Authorization` header.
fn bearer(headers: &HeaderMap) -> Option<&str> {
    let auth = headers.get("authorization")?.to_str().ok()?;
    Some(auth.strip_prefix("Bearer ").unwrap_or(auth))
}

/// Require a valid session and an active account; the [`Utilisateur`] is
/// stored in the request extensions for the handlers.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer(req.headers())
        .ok_or_else(|| ApiError::Unauthorized("Accès refusé. Token manquant.".into()))?;

    let utilisateur_id = state
        .sessions
        .resoudre(token)
        .await
        .ok_or_else(|| ApiError::Unauthorized("Token invalide ou expiré.".into()))?;

    let utilisateur = {
        let db = state.store.lock().await;
        db.get_utilisateur(utilisateur_id)
            .map_err(|_| ApiError::Unauthorized("Token invalide.".into()))?
    };
    if !utilisateur.actif {
        return Err(ApiError::Unauthorized("Utilisateur inactif.".into()));
    }

    req.extensions_mut().insert(utilisateur);
    Ok(next.run(req).await)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: Utilisateur,
}

fn identifiants_invalides() -> ApiError {
    ApiError::Unauthorized("Identifiants invalides".into())
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = req.email.trim().to_lowercase();

    let (utilisateur, hash) = {
        let db = state.store.lock().await;
        db.get_utilisateur_par_email(&email)
            .map_err(|_| identifiants_invalides())?
    };

    if !verifier_mot_de_passe(&req.password, &hash) {
        return Err(identifiants_invalides());
    }
    if !utilisateur.actif {
        return Err(ApiError::Unauthorized("Compte désactivé.".into()));
    }

    let token = state.sessions.ouvrir(utilisateur.id).await;
    info!(username = %utilisateur.username, role = %utilisateur.role, "connexion réussie");

    Ok(Json(LoginResponse {
        success: true,
        message: "Connexion réussie".into(),
        token,
        user: utilisateur,
    }))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    if let Some(token) = bearer(&headers) {
        state.sessions.fermer(token).await;
    }
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Déconnexion réussie"
    })))
}

/// GET /api/auth/profile
pub async fn profile(
    Extension(utilisateur): Extension<Utilisateur>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "success": true,
        "user": utilisateur,
    }))
}

// ---------------------------------------------------------------------------
// First-run bootstrap
// ---------------------------------------------------------------------------

/// Create the initial `super_admin` account when the user table is empty.
///
/// Without it a fresh deployment has no way to log in; the credentials come
/// from the `GUICHET_ADMIN_*` environment variables.
pub fn bootstrap_admin(db: &Database, config: &ServerConfig) -> anyhow::Result<()> {
    if db.compter_utilisateurs()? > 0 {
        return Ok(());
    }

    let (Some(username), Some(email), Some(password)) = (
        config.admin_username.as_deref(),
        config.admin_email.as_deref(),
        config.admin_password.as_deref(),
    ) else {
        warn!("table utilisateurs vide et GUICHET_ADMIN_* absents, aucune connexion possible");
        return Ok(());
    };

    if password.len() < LONGUEUR_MIN_MOT_DE_PASSE {
        anyhow::bail!(
            "GUICHET_ADMIN_PASSWORD doit contenir au moins {} caractères",
            LONGUEUR_MIN_MOT_DE_PASSE
        );
    }

    let utilisateur = Utilisateur {
        id: Uuid::new_v4(),
        username: username.trim().to_string(),
        email: email.trim().to_lowercase(),
        role: Role::SuperAdmin,
        actif: true,
        date_creation: Utc::now(),
    };
    db.create_utilisateur(&utilisateur, &hash_mot_de_passe(password))?;

    info!(username = %utilisateur.username, "compte super_admin initial créé");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mot_de_passe_round_trip() {
        let hash = hash_mot_de_passe("secret123");
        assert!(verifier_mot_de_passe("secret123", &hash));
        assert!(!verifier_mot_de_passe("secret124", &hash));

        // Deux hachages du même mot de passe diffèrent par le sel.
        assert_ne!(hash, hash_mot_de_passe("secret123"));
    }

    #[test]
    fn hash_stocke_illisible_refuse() {
        assert!(!verifier_mot_de_passe("secret", "pas-un-hash"));
        assert!(!verifier_mot_de_passe("secret", "abcd$zzzz"));
        assert!(!verifier_mot_de_passe("secret", "$"));
    }

    #[tokio::test]
    async fn session_ouvrir_resoudre_fermer() {
        let sessions = Sessions::new(3600);
        let id = Uuid::new_v4();

        let token = sessions.ouvrir(id).await;
        assert_eq!(token.len(), TOKEN_LENGTH * 2);
        assert_eq!(sessions.resoudre(&token).await, Some(id));
        assert_eq!(sessions.resoudre("inconnu").await, None);

        assert!(sessions.fermer(&token).await);
        assert!(!sessions.fermer(&token).await);
        assert_eq!(sessions.resoudre(&token).await, None);
    }

    #[tokio::test]
    async fn session_expiree_purgee() {
        let sessions = Sessions::new(0);
        let token = sessions.ouvrir(Uuid::new_v4()).await;

        assert_eq!(sessions.resoudre(&token).await, None);

        sessions.purge_expired().await;
        assert!(sessions.table.read().await.is_empty());
    }

    #[test]
    fn bootstrap_cree_le_premier_compte() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();

        let config = ServerConfig {
            admin_username: Some("racine".into()),
            admin_email: Some("Racine@Guichet.Test".into()),
            admin_password: Some("motdepasse".into()),
            ..ServerConfig::default()
        };
        bootstrap_admin(&db, &config).unwrap();
        assert_eq!(db.compter_utilisateurs().unwrap(), 1);

        let (compte, hash) = db.get_utilisateur_par_email("racine@guichet.test").unwrap();
        assert_eq!(compte.role, Role::SuperAdmin);
        assert!(verifier_mot_de_passe("motdepasse", &hash));

        // Idempotent: une table non vide n'est jamais retouchée.
        bootstrap_admin(&db, &config).unwrap();
        assert_eq!(db.compter_utilisateurs().unwrap(), 1);
    }

    #[test]
    fn bootstrap_refuse_un_mot_de_passe_court() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();

        let config = ServerConfig {
            admin_username: Some("racine".into()),
            admin_email: Some("racine@guichet.test".into()),
            admin_password: Some("abc".into()),
            ..ServerConfig::default()
        };
        assert!(bootstrap_admin(&db, &config).is_err());
        assert_eq!(db.compter_utilisateurs().unwrap(), 0);
    }
}
