//! HTTP surface: application state, router and request handlers.
//!
//! The public routes carry the intake form and the blank-form download;
//! everything else sits behind the bearer-session middleware. Handlers stay
//! thin: parse, delegate to [`DossierService`] or the store, shape the
//! `{success, ...}` response.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, patch, post, put};
use axum::{middleware, Extension, Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use guichet_core::constants::{TAILLE_MAX_DOSSIER, TAILLE_MAX_FORMULAIRE};
use guichet_core::{
    FormulaireClient, Reference, Statut, TypeDocument, Utilisateur, ValidationError,
};
use guichet_store::Database;

use crate::auth::{self, Sessions};
use crate::error::ApiError;
use crate::intake;
use crate::service::DossierService;
use crate::users;

/// Body cap: the dossier-wide file budget plus form-field headroom. The
/// per-file and per-dossier caps proper are enforced by the validation layer.
const LIMITE_CORPS: usize = TAILLE_MAX_DOSSIER as usize + 2 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<Database>>,
    pub sessions: Sessions,
    pub dossiers: DossierService,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let publiques = Router::new()
        .route("/health", get(health))
        .route("/api/auth/login", post(auth::login))
        .route("/api/documents/submit", post(submit_voyage))
        .route("/api/documents/submit-transfert", post(submit_transfert))
        .route("/api/formulaire", get(telecharger_formulaire));

    let protegees = Router::new()
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/profile", get(auth::profile))
        .route("/api/documents", get(lister_dossiers))
        .route("/api/documents/export", get(exporter_dossiers))
        .route("/api/documents/stats", get(statistiques))
        .route(
            "/api/documents/:reference",
            get(consulter_dossier).delete(supprimer_dossier),
        )
        .route("/api/documents/:reference/statut", patch(changer_statut))
        .route("/api/documents/:reference/historique", get(historique_statuts))
        .route(
            "/api/documents/:reference/sous-dossiers/:lot",
            delete(supprimer_sous_dossier),
        )
        .route(
            "/api/documents/:reference/sous-dossiers/:lot/fichiers/:fichier",
            get(telecharger_fichier).delete(supprimer_fichier),
        )
        .route("/api/formulaire", post(deposer_formulaire))
        .route("/api/formulaire/meta", get(formulaire_meta))
        .route("/api/users", get(users::lister).post(users::creer))
        .route("/api/users/:id", put(users::modifier).delete(users::supprimer))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    publiques
        .merge(protegees)
        .layer(DefaultBodyLimit::max(LIMITE_CORPS))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "démarrage du serveur HTTP");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Public handlers
// ---------------------------------------------------------------------------

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// POST /api/documents/submit
async fn submit_voyage(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let champs = intake::lire_multipart(&mut multipart).await?;
    let demande = intake::assembler_demande(champs, TypeDocument::Voyage)?;
    soumettre(&state, demande).await
}

/// POST /api/documents/submit-transfert
async fn submit_transfert(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let champs = intake::lire_multipart(&mut multipart).await?;
    let demande = intake::assembler_demande(champs, TypeDocument::Transfert)?;
    soumettre(&state, demande).await
}

async fn soumettre(
    state: &AppState,
    demande: guichet_core::DemandeSoumission,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let soumis = state.dossiers.soumettre(demande).await?;
    let (code, message) = if soumis.nouveau {
        (StatusCode::CREATED, "Dossier créé")
    } else {
        (StatusCode::OK, "Nouvelles pièces ajoutées au dossier existant")
    };
    Ok((
        code,
        Json(serde_json::json!({
            "success": true,
            "message": message,
            "reference": soumis.dossier.reference,
            "isNew": soumis.nouveau,
            "dossier": soumis.dossier,
        })),
    ))
}

/// GET /api/formulaire — blank client form download.
async fn telecharger_formulaire(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let (meta, contenu) = {
        let db = state.store.lock().await;
        db.get_formulaire()?
    };
    Ok((
        [
            (
                header::CONTENT_TYPE,
                entete_http(&meta.mime_type, "application/pdf"),
            ),
            (
                header::CONTENT_DISPOSITION,
                entete_piece_jointe(&meta.nom_original),
            ),
        ],
        contenu,
    ))
}

// ---------------------------------------------------------------------------
// Dossier handlers (authenticated)
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ListeQuery {
    #[serde(rename = "type")]
    type_document: Option<String>,
    statut: Option<String>,
}

/// GET /api/documents
async fn lister_dossiers(
    State(state): State<AppState>,
    Extension(utilisateur): Extension<Utilisateur>,
    Query(filtres): Query<ListeQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let type_document = filtres
        .type_document
        .as_deref()
        .map(parse_type_document)
        .transpose()?;
    let statut = filtres.statut.as_deref().map(parse_statut).transpose()?;

    let dossiers = state
        .dossiers
        .lister(utilisateur.role, type_document, statut)
        .await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "total": dossiers.len(),
        "dossiers": dossiers,
    })))
}

/// GET /api/documents/{reference}
async fn consulter_dossier(
    State(state): State<AppState>,
    Extension(utilisateur): Extension<Utilisateur>,
    Path(reference): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let dossier = state
        .dossiers
        .consulter(utilisateur.role, &Reference(reference))
        .await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "dossier": dossier,
    })))
}

#[derive(Deserialize)]
struct StatutRequest {
    statut: String,
    #[serde(rename = "motifRejet")]
    motif_rejet: Option<String>,
}

/// PATCH /api/documents/{reference}/statut
async fn changer_statut(
    State(state): State<AppState>,
    Extension(utilisateur): Extension<Utilisateur>,
    Path(reference): Path<String>,
    Json(req): Json<StatutRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let vise = parse_statut(&req.statut)?;
    let dossier = state
        .dossiers
        .changer_statut(
            &Reference(reference),
            vise,
            utilisateur.role,
            req.motif_rejet.as_deref(),
        )
        .await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": format!("Statut mis à jour: {}", dossier.statut),
        "dossier": dossier,
    })))
}

/// GET /api/documents/{reference}/historique
async fn historique_statuts(
    State(state): State<AppState>,
    Extension(utilisateur): Extension<Utilisateur>,
    Path(reference): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let historique = state
        .dossiers
        .historique(utilisateur.role, &Reference(reference))
        .await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "historique": historique,
    })))
}

/// DELETE /api/documents/{reference}
async fn supprimer_dossier(
    State(state): State<AppState>,
    Extension(utilisateur): Extension<Utilisateur>,
    Path(reference): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .dossiers
        .supprimer_dossier(utilisateur.role, &Reference(reference))
        .await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Dossier supprimé",
    })))
}

/// DELETE /api/documents/{reference}/sous-dossiers/{lot}
async fn supprimer_sous_dossier(
    State(state): State<AppState>,
    Extension(utilisateur): Extension<Utilisateur>,
    Path((reference, lot)): Path<(String, Uuid)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .dossiers
        .supprimer_sous_dossier(utilisateur.role, &Reference(reference), lot)
        .await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Sous-dossier supprimé",
    })))
}

/// DELETE /api/documents/{reference}/sous-dossiers/{lot}/fichiers/{fichier}
async fn supprimer_fichier(
    State(state): State<AppState>,
    Extension(utilisateur): Extension<Utilisateur>,
    Path((reference, lot, fichier)): Path<(String, Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .dossiers
        .supprimer_fichier(utilisateur.role, &Reference(reference), lot, fichier)
        .await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Fichier supprimé",
    })))
}

/// GET /api/documents/{reference}/sous-dossiers/{lot}/fichiers/{fichier}
async fn telecharger_fichier(
    State(state): State<AppState>,
    Extension(utilisateur): Extension<Utilisateur>,
    Path((reference, lot, fichier)): Path<(String, Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let (meta, contenu) = state
        .dossiers
        .telecharger_fichier(utilisateur.role, &Reference(reference), lot, fichier)
        .await?;
    Ok((
        [
            (
                header::CONTENT_TYPE,
                entete_http(&meta.mime_type, "application/octet-stream"),
            ),
            (
                header::CONTENT_DISPOSITION,
                entete_piece_jointe(&meta.nom_original),
            ),
        ],
        contenu,
    ))
}

/// GET /api/documents/stats
async fn statistiques(
    State(state): State<AppState>,
    Extension(utilisateur): Extension<Utilisateur>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (par_statut, (nb_fichiers, octets)) =
        state.dossiers.statistiques(utilisateur.role).await?;

    let mut dossiers = serde_json::Map::new();
    for (type_document, statut, n) in par_statut {
        let entree = dossiers
            .entry(type_document.as_str().to_string())
            .or_insert(serde_json::json!({}));
        entree[statut.as_str()] = serde_json::json!(n);
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "dossiers": dossiers,
        "fichiers": {
            "nombre": nb_fichiers,
            "tailleTotale": octets,
        },
    })))
}

/// GET /api/documents/export
async fn exporter_dossiers(
    State(state): State<AppState>,
    Extension(utilisateur): Extension<Utilisateur>,
) -> Result<impl IntoResponse, ApiError> {
    let csv = state.dossiers.exporter(utilisateur.role).await?;
    info!(role = %utilisateur.role, par = %utilisateur.username, "export CSV");
    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/csv; charset=utf-8"),
            ),
            (
                header::CONTENT_DISPOSITION,
                HeaderValue::from_static("attachment; filename=\"dossiers.csv\""),
            ),
        ],
        csv,
    ))
}

/// POST /api/formulaire — replace the blank client form.
async fn deposer_formulaire(
    State(state): State<AppState>,
    Extension(utilisateur): Extension<Utilisateur>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !utilisateur.role.capacites().gerer_formulaire {
        return Err(ApiError::Forbidden(format!(
            "le rôle {} ne gère pas le formulaire client",
            utilisateur.role
        )));
    }

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Formulaire multipart illisible: {e}")))?
    {
        let nom_fichier = field.file_name().map(str::to_string);
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let Some(nom_original) = nom_fichier else {
            continue;
        };

        let contenu = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Fichier illisible: {e}")))?;
        if mime_type != "application/pdf" {
            return Err(ValidationError::ValeurInvalide {
                champ: "formulaire",
                valeur: mime_type,
            }
            .into());
        }
        if contenu.len() as u64 > TAILLE_MAX_FORMULAIRE {
            return Err(ValidationError::FichierTropVolumineux {
                nom: nom_original,
                taille: contenu.len() as u64,
                max: TAILLE_MAX_FORMULAIRE,
            }
            .into());
        }

        let meta = FormulaireClient {
            nom_original,
            taille: contenu.len() as u64,
            mime_type,
            date_upload: Utc::now(),
            uploader: utilisateur.username.clone(),
        };
        {
            let db = state.store.lock().await;
            db.upsert_formulaire(&meta, &contenu)?;
        }
        info!(nom = %meta.nom_original, par = %utilisateur.username, "formulaire client remplacé");
        return Ok(Json(serde_json::json!({
            "success": true,
            "message": "Formulaire mis à jour",
            "formulaire": meta,
        })));
    }

    Err(ApiError::BadRequest("Aucun fichier reçu".into()))
}

/// GET /api/formulaire/meta — current form metadata for the admin UI.
async fn formulaire_meta(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let meta = {
        let db = state.store.lock().await;
        db.get_formulaire_meta()?
    };
    Ok(Json(serde_json::json!({
        "success": true,
        "formulaire": meta,
    })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_statut(s: &str) -> Result<Statut, ApiError> {
    Statut::parse(s).ok_or_else(|| ValidationError::StatutInvalide(s.to_string()).into())
}

fn parse_type_document(s: &str) -> Result<TypeDocument, ApiError> {
    TypeDocument::parse(s).ok_or_else(|| {
        ValidationError::ValeurInvalide {
            champ: "type",
            valeur: s.to_string(),
        }
        .into()
    })
}

fn entete_http(valeur: &str, defaut: &'static str) -> HeaderValue {
    HeaderValue::from_str(valeur).unwrap_or_else(|_| HeaderValue::from_static(defaut))
}

/// `Content-Disposition` for a stored filename; non-ASCII falls back to `_`.
fn entete_piece_jointe(nom: &str) -> HeaderValue {
    let propre: String = nom
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    entete_http(
        &format!("attachment; filename=\"{propre}\""),
        "attachment",
    )
}
