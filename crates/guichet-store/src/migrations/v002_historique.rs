//! v002 -- Status transition audit trail.
//!
//! Adds the append-only `historique_statuts` table, one row per applied
//! status change.

use rusqlite::Connection;

/// SQL executed when upgrading from version 1 to version 2.
const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS historique_statuts (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    reference    TEXT NOT NULL,                   -- FK -> dossiers(reference)
    statut_avant TEXT NOT NULL,
    statut_apres TEXT NOT NULL,
    role         TEXT NOT NULL,                   -- acting role
    motif        TEXT,                            -- rejection reason
    date         TEXT NOT NULL,

    FOREIGN KEY (reference) REFERENCES dossiers(reference) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_historique_reference
    ON historique_statuts(reference, id);
"#;

/// Apply the historique migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
