/// Maximum size of a single uploaded file in bytes (12 MiB).
///
/// Kept well under the storage engine's per-row comfort zone so a dossier
/// row plus its largest file never approaches engine limits.
pub const TAILLE_MAX_FICHIER: u64 = 12 * 1024 * 1024;

/// Maximum combined size of all files across a dossier in bytes (50 MiB).
pub const TAILLE_MAX_DOSSIER: u64 = 50 * 1024 * 1024;

/// Maximum size of the blank client form PDF in bytes (10 MiB).
pub const TAILLE_MAX_FORMULAIRE: u64 = 10 * 1024 * 1024;

/// Reference issuance: attempts before falling back to a timestamp suffix.
pub const REFERENCE_MAX_TENTATIVES: u32 = 5;

/// Reference issuance: pause between collision retries, in milliseconds.
pub const REFERENCE_PAUSE_COLLISION_MS: u64 = 100;

/// Zero-padded width of the daily reference counter.
pub const REFERENCE_LARGEUR_COMPTEUR: usize = 3;

/// Minimum accepted password length for back-office accounts.
pub const LONGUEUR_MIN_MOT_DE_PASSE: usize = 6;
