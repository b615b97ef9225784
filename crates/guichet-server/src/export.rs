//! CSV rendering of the dossier list for the export roles.
//!
//! Semicolon separated, UTF-8, one row per dossier: the format the back
//! office already opens in French-locale Excel.

use guichet_core::Dossier;

const ENTETES: [&str; 15] = [
    "Référence",
    "Nom",
    "Prénom",
    "Email",
    "Téléphone",
    "Profession",
    "Sexe",
    "Type",
    "Statut",
    "Motif de rejet",
    "Date de création",
    "Date de modification",
    "Sous-dossiers",
    "Fichiers",
    "Taille (octets)",
];

/// Render the dossiers as CSV, header line included.
pub fn csv_dossiers(dossiers: &[Dossier]) -> String {
    let mut sortie = ENTETES.join(";");
    sortie.push('\n');

    for dossier in dossiers {
        let colonnes = [
            dossier.reference.as_str().to_string(),
            echapper(&dossier.identite.nom),
            echapper(&dossier.identite.prenom),
            echapper(&dossier.identite.email),
            echapper(&dossier.identite.telephone),
            echapper(&dossier.identite.profession),
            dossier.identite.sexe.as_str().to_string(),
            dossier.type_document.as_str().to_string(),
            dossier.statut.as_str().to_string(),
            echapper(dossier.motif_rejet.as_deref().unwrap_or("")),
            dossier.date_creation.format("%d/%m/%Y %H:%M").to_string(),
            dossier.date_modification.format("%d/%m/%Y %H:%M").to_string(),
            dossier.sous_dossiers.len().to_string(),
            dossier.nombre_fichiers().to_string(),
            dossier.taille_totale().to_string(),
        ];
        sortie.push_str(&colonnes.join(";"));
        sortie.push('\n');
    }
    sortie
}

/// Quote a field when it contains the separator, a quote or a line break.
fn echapper(champ: &str) -> String {
    if champ.contains([';', '"', '\n', '\r']) {
        format!("\"{}\"", champ.replace('"', "\"\""))
    } else {
        champ.to_string()
    }
}
