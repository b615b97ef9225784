//! Daily reference numbers of the form `DDMMYYYY-DOC007` / `DDMMYYYY-TRF012`.
//!
//! The counter restarts at 001 each day and is derived from the highest
//! reference already stored for the day and category. Issuance itself
//! (retry on collision, fallback suffix) lives with the service that owns
//! the store handle; everything here is pure.

use chrono::NaiveDate;

use crate::constants::REFERENCE_LARGEUR_COMPTEUR;
use crate::types::{Reference, TypeDocument};

/// `DDMMYYYY` prefix for the given day.
pub fn prefixe_jour(jour: NaiveDate) -> String {
    jour.format("%d%m%Y").to_string()
}

/// Everything before the counter digits, e.g. `15102025-DOC`.
pub fn prefixe_compteur(jour: NaiveDate, type_document: TypeDocument) -> String {
    format!("{}-{}", prefixe_jour(jour), type_document.code())
}

/// Counter digits of an existing reference, given the `DDMMYYYY-CODE` part.
///
/// A reference that does not carry the prefix, or whose suffix is not
/// numeric, counts as 0 so the next issue starts the day at 001.
pub fn compteur_de(reference: &Reference, prefixe: &str) -> u32 {
    let Some(suffixe) = reference.as_str().strip_prefix(prefixe) else {
        return 0;
    };
    // Fallback references carry `-XXXX` after the counter; ignore that part.
    let chiffres = suffixe.split('-').next().unwrap_or("");
    chiffres.parse().unwrap_or(0)
}

/// Next reference for the day, given the highest one already stored.
pub fn suivante(
    jour: NaiveDate,
    type_document: TypeDocument,
    plus_haute: Option<&Reference>,
) -> Reference {
    let prefixe = prefixe_compteur(jour, type_document);
    let compteur = plus_haute.map(|r| compteur_de(r, &prefixe)).unwrap_or(0) + 1;
    Reference(format!(
        "{}{:0largeur$}",
        prefixe,
        compteur,
        largeur = REFERENCE_LARGEUR_COMPTEUR
    ))
}

/// Collision fallback: candidate plus the last four digits of a millisecond
/// timestamp, e.g. `15102025-DOC014-8841`. Only used once the normal path
/// has exhausted its retries.
pub fn repli_collision(candidat: &Reference, horodatage_ms: i64) -> Reference {
    Reference(format!(
        "{}-{:04}",
        candidat.as_str(),
        horodatage_ms.rem_euclid(10_000)
    ))
}

/// Shape check for a stored reference, fallback suffix allowed.
pub fn est_reference_valide(s: &str) -> bool {
    let Some((jour, reste)) = s.split_once('-') else {
        return false;
    };
    if jour.len() != 8 || !jour.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let corps = reste.strip_prefix("DOC").or_else(|| reste.strip_prefix("TRF"));
    let Some(corps) = corps else {
        return false;
    };
    let (compteur, repli) = match corps.split_once('-') {
        Some((c, r)) => (c, Some(r)),
        None => (corps, None),
    };
    if compteur.len() < REFERENCE_LARGEUR_COMPTEUR
        || !compteur.bytes().all(|b| b.is_ascii_digit())
    {
        return false;
    }
    match repli {
        None => true,
        Some(r) => r.len() == 4 && r.bytes().all(|b| b.is_ascii_digit()),
    }
}
