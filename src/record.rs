//! Field normalization and the `MatchRecord` output row.
//!
//! Every raw cell passes through [`clean_text`] or [`clean_year`] before it
//! becomes part of a [`MatchRecord`]. Both transforms are pure and idempotent:
//! cleaning an already-cleaned value returns it unchanged.

use serde::Serialize;

use crate::schema::{ColumnMapping, Role};

/// Placeholder for missing or null display fields.
pub const SENTINEL: &str = "—";

/// Literal tokens that normalize to the sentinel, compared case-insensitively.
const NULL_TOKENS: [&str; 4] = ["none", "nan", "null", "n/a"];

/// Ordered substring markers for molecule-type inference. First match wins.
const MOLECULE_MARKERS: [(&str, &str); 5] = [
    ("mirna", "miRNA"),
    ("mrna", "mRNA"),
    ("protein", "Protein"),
    ("uniprot", "Protein"),
    ("lipid", "Lipid"),
];

fn is_null_token(s: &str) -> bool {
    NULL_TOKENS.iter().any(|t| s.eq_ignore_ascii_case(t))
}

/// Clean a raw text cell for display.
///
/// Null, empty, and the literal tokens `none`/`nan`/`null`/`n/a`
/// (case-insensitive) normalize to the sentinel `—`. Underscores become
/// spaces, internal whitespace runs collapse to a single space, and the result
/// is trimmed. Capitalization is preserved as stored.
pub fn clean_text(raw: Option<&str>) -> String {
    let raw = match raw {
        Some(r) => r.trim(),
        None => return SENTINEL.to_string(),
    };
    let replaced = raw.replace('_', " ");
    let collapsed = replaced.split_whitespace().collect::<Vec<&str>>().join(" ");
    // Token check runs after the cleanup so "_none_" normalizes the same as "none".
    if collapsed.is_empty() || is_null_token(&collapsed) {
        return SENTINEL.to_string();
    }
    collapsed
}

/// Clean a raw year cell for display.
///
/// Values stored as floating point (`2015.0`) are truncated at the first `.`;
/// null/empty/`none`/`nan`/`null`/`n/a` normalize to the sentinel.
pub fn clean_year(raw: Option<&str>) -> String {
    let raw = match raw {
        Some(r) => r.trim(),
        None => return SENTINEL.to_string(),
    };
    let truncated = match raw.split_once('.') {
        Some((whole, _)) => whole.trim_end(),
        None => raw,
    };
    if truncated.is_empty() || is_null_token(truncated) {
        return SENTINEL.to_string();
    }
    truncated.to_string()
}

/// Infer a molecule/content type for a row.
///
/// An explicit, non-empty mapped value always wins (cleaned). Only when the
/// mapped cell is absent or cleans to the sentinel does the marker scan run
/// over the row's concatenated lowercased text, trying each marker in order.
/// Defaults to `Other`.
pub fn infer_molecule_type(explicit: Option<&str>, haystack: &str) -> String {
    let cleaned = clean_text(explicit);
    if cleaned != SENTINEL {
        return cleaned;
    }
    let haystack = haystack.to_lowercase();
    for (marker, label) in MOLECULE_MARKERS {
        if haystack.contains(marker) {
            return label.to_string();
        }
    }
    "Other".to_string()
}

/// The normalized output row produced for each matching raw row.
///
/// Every field is individually cleaned; nothing references the raw row after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    /// Sample or record name
    pub name: String,
    /// Molecule/content type (miRNA, mRNA, Protein, Lipid, Other)
    pub molecule_type: String,
    /// Species / organism
    pub species: String,
    /// Vesicle type (exosome, microvesicle, ...)
    pub vesicle_type: String,
    /// Isolation method
    pub isolation_method: String,
    /// Publication year
    pub year: String,
}

impl MatchRecord {
    /// Build a record from a scan row using the resolved column mapping.
    ///
    /// Unmapped roles render as the sentinel. The molecule type falls back to
    /// marker inference over the row's concatenated text when the mapped cell
    /// is empty.
    pub fn from_row(row: &crate::reader::ScanRow, mapping: &ColumnMapping) -> Self {
        let cell = |role: Role| mapping.column(role).and_then(|c| row.get(c));

        Self {
            name: clean_text(cell(Role::Name)),
            molecule_type: infer_molecule_type(cell(Role::MoleculeType), &row.concat_text()),
            species: clean_text(cell(Role::Species)),
            vesicle_type: clean_text(cell(Role::VesicleType)),
            isolation_method: clean_text(cell(Role::IsolationMethod)),
            year: clean_year(cell(Role::Year)),
        }
    }
}
