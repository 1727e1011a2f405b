//! Candidate column spellings per role, in priority order.
//!
//! Spellings are compared against the *uppercased* raw column name with exact
//! equality; the first hit wins. Order matters: `PUBLICATION_YEAR` outranks
//! `DATE` for [`Role::Year`], so a dataset carrying both maps the more
//! specific column.

use super::Role;

const NAME: &[&str] = &["SAMPLE_NAME", "NAME", "SAMPLE", "SAMPLE_ID", "TITLE", "PROTEIN_NAME"];

const MOLECULE_TYPE: &[&str] = &[
    "MOLECULE_TYPE",
    "CONTENT_TYPE",
    "MOLECULE",
    "CARGO_TYPE",
    "DATA_TYPE",
];

const SPECIES: &[&str] = &["SPECIES", "ORGANISM", "TAXON", "HOST"];

const VESICLE_TYPE: &[&str] = &["VESICLE_TYPE", "EV_TYPE", "VESICLE", "SAMPLE_TYPE", "SUBTYPE"];

const ISOLATION_METHOD: &[&str] = &[
    "ISOLATION_METHOD",
    "ISOLATION",
    "SEPARATION_METHOD",
    "PURIFICATION_METHOD",
    "METHOD",
];

const YEAR: &[&str] = &["YEAR", "PUBLICATION_YEAR", "PUB_YEAR", "DATE"];

const DATABASE: &[&str] = &["SOURCE_DATABASE", "DATABASE", "SOURCE", "DB"];

/// The ordered candidate spellings for a role.
pub fn candidates_for(role: Role) -> &'static [&'static str] {
    match role {
        Role::Name => NAME,
        Role::MoleculeType => MOLECULE_TYPE,
        Role::Species => SPECIES,
        Role::VesicleType => VESICLE_TYPE,
        Role::IsolationMethod => ISOLATION_METHOD,
        Role::Year => YEAR,
        Role::Database => DATABASE,
    }
}
