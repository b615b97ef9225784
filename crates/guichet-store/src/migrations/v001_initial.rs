//! v001 -- Initial schema creation.
//!
//! Creates the five core tables: `dossiers`, `sous_dossiers`, `fichiers`,
//! `utilisateurs`, and `formulaires`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Dossiers (aggregate roots)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS dossiers (
    reference         TEXT PRIMARY KEY NOT NULL,  -- e.g. 15102025-DOC007
    nom               TEXT NOT NULL,
    prenom            TEXT NOT NULL,
    email             TEXT NOT NULL,              -- lowercased
    telephone         TEXT NOT NULL,
    profession        TEXT NOT NULL,
    sexe              TEXT NOT NULL,              -- 'H' / 'F'
    type_document     TEXT NOT NULL,              -- 'voyage' / 'transfert'
    statut            TEXT NOT NULL,
    motif_rejet       TEXT,
    date_creation     TEXT NOT NULL,              -- ISO-8601 / RFC-3339
    date_modification TEXT NOT NULL
);

-- Create-or-append lookup key: one dossier per identity and category.
CREATE UNIQUE INDEX IF NOT EXISTS idx_dossiers_identite
    ON dossiers(nom, prenom, email, type_document);

CREATE INDEX IF NOT EXISTS idx_dossiers_statut ON dossiers(statut);

-- ----------------------------------------------------------------
-- Sous-dossiers (submission batches)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS sous_dossiers (
    id             TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    reference      TEXT NOT NULL,                 -- FK -> dossiers(reference)
    nom            TEXT NOT NULL,                 -- batch label (ISO day)
    date           TEXT NOT NULL,
    motif          TEXT,
    pays           TEXT,                          -- JSON array of strings
    raison         TEXT,
    autre_raison   TEXT,
    type_transfert TEXT,
    date_debut     TEXT,                          -- ISO day
    date_fin       TEXT,
    position       INTEGER NOT NULL,              -- append order

    FOREIGN KEY (reference) REFERENCES dossiers(reference) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_sous_dossiers_reference
    ON sous_dossiers(reference, position);

-- ----------------------------------------------------------------
-- Fichiers (uploaded artifacts, content inline)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS fichiers (
    id           TEXT PRIMARY KEY NOT NULL,       -- UUID v4
    sous_dossier TEXT NOT NULL,                   -- FK -> sous_dossiers(id)
    nom          TEXT NOT NULL,                   -- storage name
    nom_original TEXT NOT NULL,
    taille       INTEGER NOT NULL,                -- bytes
    extension    TEXT NOT NULL,
    mime_type    TEXT NOT NULL,
    contenu      BLOB NOT NULL,
    date_upload  TEXT NOT NULL,
    position     INTEGER NOT NULL,

    FOREIGN KEY (sous_dossier) REFERENCES sous_dossiers(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_fichiers_sous_dossier
    ON fichiers(sous_dossier, position);

-- ----------------------------------------------------------------
-- Utilisateurs (back-office accounts)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS utilisateurs (
    id            TEXT PRIMARY KEY NOT NULL,      -- UUID v4
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL UNIQUE,           -- lowercased
    mot_de_passe  TEXT NOT NULL,                  -- salted PBKDF2, hex salt$hash
    role          TEXT NOT NULL,
    actif         INTEGER NOT NULL DEFAULT 1,     -- boolean 0/1
    date_creation TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Formulaires (single blank client form PDF)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS formulaires (
    id           INTEGER PRIMARY KEY CHECK (id = 1),
    nom_original TEXT NOT NULL,
    taille       INTEGER NOT NULL,
    mime_type    TEXT NOT NULL,
    contenu      BLOB NOT NULL,
    date_upload  TEXT NOT NULL,
    uploader     TEXT NOT NULL
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
