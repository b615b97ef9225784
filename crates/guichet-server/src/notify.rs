//! Outbound notification dispatch.
//!
//! Status changes and submissions emit events on an unbounded channel; a
//! background task forwards them to the configured sink. Delivery is
//! best-effort: a failed or dropped notification never affects the HTTP
//! response that produced it.

use guichet_core::{Dossier, Reference, SousDossier, Statut, TypeDocument};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Dossier fields carried by every event. The full batch history stays out;
/// consumers only ever see the batch that triggered the event.
#[derive(Debug, Clone)]
pub struct ResumeDossier {
    pub reference: Reference,
    pub nom: String,
    pub prenom: String,
    pub email: String,
    pub telephone: String,
    pub type_document: TypeDocument,
    pub statut: Statut,
}

impl ResumeDossier {
    pub fn de(dossier: &Dossier) -> Self {
        Self {
            reference: dossier.reference.clone(),
            nom: dossier.identite.nom.clone(),
            prenom: dossier.identite.prenom.clone(),
            email: dossier.identite.email.clone(),
            telephone: dossier.identite.telephone.clone(),
            type_document: dossier.type_document,
            statut: dossier.statut,
        }
    }
}

/// One notification to deliver.
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    /// A submission was accepted; `nouveau` tells create from append.
    Soumission {
        dossier: ResumeDossier,
        lot: SousDossier,
        nouveau: bool,
    },
    /// A dossier was rejected with the given reason.
    Rejet {
        dossier: ResumeDossier,
        motif: String,
    },
}

/// Delivery backend. The default sink writes structured log lines; a real
/// deployment would plug mail or messaging gateways in here.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, event: &NotificationEvent);
}

/// Sink that logs every event.
pub struct LogSink;

impl NotificationSink for LogSink {
    fn deliver(&self, event: &NotificationEvent) {
        match event {
            NotificationEvent::Soumission { dossier, lot, nouveau } => {
                info!(
                    reference = dossier.reference.as_str(),
                    client = %format!("{} {}", dossier.prenom, dossier.nom),
                    type_document = dossier.type_document.as_str(),
                    lot = %lot.nom,
                    fichiers = lot.fichiers.len(),
                    nouveau,
                    "notification: soumission reçue"
                );
            }
            NotificationEvent::Rejet { dossier, motif } => {
                info!(
                    reference = dossier.reference.as_str(),
                    email = %dossier.email,
                    motif = %motif,
                    "notification: dossier rejeté"
                );
            }
        }
    }
}

/// Cloneable sending half handed to the services.
#[derive(Clone)]
pub struct Notifications {
    tx: mpsc::UnboundedSender<NotificationEvent>,
}

impl Notifications {
    /// Queue an event. Errors (dispatcher gone) are logged and swallowed.
    pub fn publier(&self, event: NotificationEvent) {
        if self.tx.send(event).is_err() {
            warn!("notification dropped, dispatcher is gone");
        }
    }
}

/// Spawn the dispatcher task and return the sending half.
pub fn spawn_dispatcher(sink: impl NotificationSink + 'static) -> Notifications {
    let (tx, mut rx) = mpsc::unbounded_channel::<NotificationEvent>();
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            sink.deliver(&event);
        }
    });
    Notifications { tx }
}
