//! Guichet server binary: SQLite-backed dossier intake and back office
//! behind an axum HTTP API.

mod api;
mod auth;
mod config;
mod error;
mod export;
mod intake;
mod notify;
mod service;
mod users;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use guichet_store::Database;

use crate::api::AppState;
use crate::auth::Sessions;
use crate::config::ServerConfig;
use crate::notify::{spawn_dispatcher, LogSink};
use crate::service::DossierService;

const PURGE_SESSIONS_SECS: u64 = 300;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,guichet_server=debug")),
        )
        .init();

    let config = ServerConfig::from_env();

    let db = match &config.db_path {
        Some(chemin) => Database::open_at(chemin)?,
        None => Database::new()?,
    };
    if let Some(chemin) = db.path() {
        info!(chemin = %chemin.display(), "base de données ouverte");
    }

    auth::bootstrap_admin(&db, &config)?;

    let store = Arc::new(Mutex::new(db));
    let sessions = Sessions::new(config.session_ttl_secs);
    let state = AppState {
        dossiers: DossierService::new(store.clone(), spawn_dispatcher(LogSink)),
        store,
        sessions: sessions.clone(),
    };

    tokio::spawn(async move {
        let mut intervalle = tokio::time::interval(Duration::from_secs(PURGE_SESSIONS_SECS));
        loop {
            intervalle.tick().await;
            sessions.purge_expired().await;
        }
    });

    tokio::select! {
        resultat = api::serve(state, config.http_addr) => resultat,
        _ = tokio::signal::ctrl_c() => {
            info!("arrêt du serveur");
            Ok(())
        }
    }
}
