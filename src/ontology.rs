//! # EV Controlled Vocabulary
//!
//! This module provides synonym and ontology-term resolution for
//! extracellular-vesicle vocabulary. Queries arrive as free text ("exosome",
//! "sEVs", "microvesicle"); resolving them against a fixed synonym table with
//! Gene Ontology accessions lets biologically equivalent spellings match the
//! same records.
//!
//! ## Reference
//! - GO:0070062 extracellular exosome
//! - GO:1903561 extracellular vesicle
//! - Documentation: <http://geneontology.org>

use serde::{Deserialize, Serialize};

/// A canonical vocabulary entry: label, optional ontology accession, and the
/// full set of synonym spellings (always including the label itself).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyEntry {
    /// Canonical label (e.g., "exosome")
    pub label: String,
    /// Ontology accession (e.g., "GO:0070062")
    pub ontology_id: Option<String>,
    /// All synonym spellings, lowercase, label included
    pub synonyms: Vec<String>,
}

impl OntologyEntry {
    /// Create a new entry. The canonical label is prepended to the synonym
    /// list if not already present; all spellings are lowercased.
    pub fn new(label: &str, ontology_id: Option<&str>, synonyms: &[&str]) -> Self {
        let label = label.trim().to_lowercase();
        let mut all: Vec<String> = Vec::with_capacity(synonyms.len() + 1);
        all.push(label.clone());
        for syn in synonyms {
            let syn = syn.trim().to_lowercase();
            if !all.contains(&syn) {
                all.push(syn);
            }
        }
        Self {
            label,
            ontology_id: ontology_id.map(str::to_string),
            synonyms: all,
        }
    }

    /// True if `term` (already lowercased and trimmed) names this entry.
    fn matches(&self, term: &str) -> bool {
        self.label == term || self.synonyms.iter().any(|s| s == term)
    }
}

/// Immutable synonym table, built once and read concurrently for the process
/// lifetime. Construct with [`OntologyTable::builtin`] for the EV vocabulary
/// or [`OntologyTable::new`] for a synthetic table in tests.
#[derive(Debug, Clone, Default)]
pub struct OntologyTable {
    entries: Vec<OntologyEntry>,
}

impl OntologyTable {
    /// Create a table from explicit entries.
    pub fn new(entries: Vec<OntologyEntry>) -> Self {
        Self { entries }
    }

    /// The built-in EV vocabulary.
    pub fn builtin() -> Self {
        Self::new(vec![
            OntologyEntry::new(
                "exosome",
                Some("GO:0070062"),
                &[
                    "exosomes",
                    "small extracellular vesicle",
                    "small extracellular vesicles",
                    "sev",
                    "sevs",
                ],
            ),
            OntologyEntry::new(
                "extracellular vesicle",
                Some("GO:1903561"),
                &["extracellular vesicles", "ev", "evs"],
            ),
            OntologyEntry::new(
                "microvesicle",
                Some("GO:1903561"),
                &["microvesicles", "ectosome", "ectosomes", "mv", "mvs"],
            ),
            OntologyEntry::new(
                "apoptotic body",
                Some("GO:0097189"),
                &["apoptotic bodies"],
            ),
        ])
    }

    /// Resolve a free-text term to its vocabulary entry.
    ///
    /// Lowercases and trims the input, then does an exact lookup against every
    /// canonical label and synonym. Returns `None` on a miss; callers treat
    /// that as "apply no ontology narrowing", never as an error.
    pub fn normalize(&self, term: &str) -> Option<&OntologyEntry> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return None;
        }
        self.entries.iter().find(|e| e.matches(&term))
    }

    /// The synonym set to substring-match against data for `term`.
    ///
    /// Returns the matched entry's full synonym set, or a single-element set
    /// of the lowercased term itself when nothing matched - an unresolved term
    /// degrades to a literal substring search rather than failing.
    pub fn synonyms_for(&self, term: &str) -> Vec<String> {
        match self.normalize(term) {
            Some(entry) => entry.synonyms.clone(),
            None => vec![term.trim().to_lowercase()],
        }
    }

    /// Iterate over all vocabulary entries, in table order.
    pub fn entries(&self) -> impl Iterator<Item = &OntologyEntry> {
        self.entries.iter()
    }

    /// Number of entries in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
