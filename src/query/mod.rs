//! # Query Engine
//!
//! The facade the service layer talks to: paged search, streaming summaries,
//! and capped export over one open dataset.
//!
//! All engine state (dataset footer metadata, column mapping, ontology table)
//! is built once at open time and only ever read afterwards, so one engine
//! can serve concurrent requests behind an `Arc` with no locking. Each
//! request performs its own independent scan; results are always re-derived
//! from the current filter state, never cached.
//!
//! ## Example
//!
//! ```rust,no_run
//! use evquery::query::QueryEngine;
//! use evquery::filter::FilterSpec;
//!
//! let engine = QueryEngine::open("unified_ev_metadata.parquet")?;
//! let spec = FilterSpec::new().with_ontology_term("exosome");
//!
//! let summary = engine.summarize(&spec)?;
//! println!("{} matching records", summary.total_matches);
//! # Ok::<(), evquery::query::QueryError>(())
//! ```

mod aggregate;
mod export;


pub use aggregate::{TopCounts, ValueCount};
pub use export::{Export, EXPORT_HEADER};

use std::path::Path;

use bytes::Bytes;
use serde::Serialize;

use crate::filter::{FilterEvaluator, FilterSpec};
use crate::ontology::{OntologyEntry, OntologyTable};
use crate::reader::{EvMetadataReader, Projection, ReaderConfig, ReaderError};
use crate::record::{clean_text, clean_year, infer_molecule_type, MatchRecord, SENTINEL};
use crate::schema::{ColumnMapping, DatasetSchema, Role};

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Rows decoded per batch within a row group
    pub batch_size: usize,
    /// Hard cap on exported rows
    pub export_cap: usize,
    /// Number of top values reported per grouping column
    pub top_n: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: 8192,
            export_cap: 1000,
            top_n: 10,
        }
    }
}

/// Errors surfaced to the service layer.
///
/// Per the fail-open policy, only total dataset unavailability aborts a
/// request: absent roles, unparseable filter values, and individual bad row
/// groups all degrade inside the scan instead of erroring.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The dataset could not be opened, or every row group failed to decode
    #[error(transparent)]
    Dataset(#[from] ReaderError),

    /// CSV serialization error during export
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Export buffer finalization failed
    #[error("export failed: {0}")]
    Export(String),
}

/// One page of search results.
#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    /// Records whose 1-based match rank falls inside the requested page
    pub records: Vec<MatchRecord>,
    /// Total rows matching the filter across the whole dataset
    pub total_matches: usize,
    /// `ceil(total_matches / page_size)`; zero when nothing matched
    pub total_pages: usize,
    /// The 1-based page that was returned
    pub page: usize,
    /// Requested page size
    pub page_size: usize,
}

/// Echo of the resolved ontology query, mirrored into summaries so callers
/// can show which synonyms actually broadened the search.
#[derive(Debug, Clone, Serialize)]
pub struct QueryEcho {
    /// Canonical entity label (or the raw term when unresolved)
    pub entity: String,
    /// Ontology accessions backing the entity
    pub ontology: Vec<String>,
    /// Synonym spellings the scan matched against
    pub synonyms_used: Vec<String>,
}

/// Top values for one grouping role.
#[derive(Debug, Clone, Serialize)]
pub struct RoleBreakdown {
    /// The grouping role
    pub role: Role,
    /// Top values by descending count, ties in first-encountered order
    pub top: Vec<ValueCount>,
}

/// Streaming summary of every row matching a filter.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    /// Total matching rows
    pub total_matches: usize,
    /// Resolved ontology query, when a term was supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<QueryEcho>,
    /// Per-role top-value tables
    pub top_values: Vec<RoleBreakdown>,
}

/// Roles summarized by [`QueryEngine::summarize`], in output order.
const SUMMARY_ROLES: [Role; 6] = [
    Role::MoleculeType,
    Role::Species,
    Role::VesicleType,
    Role::IsolationMethod,
    Role::Year,
    Role::Database,
];

/// Ontology-aware, memory-bounded query engine over one read-only dataset.
pub struct QueryEngine {
    reader: EvMetadataReader,
    mapping: ColumnMapping,
    ontology: OntologyTable,
    config: EngineConfig,
}

impl QueryEngine {
    /// Open the dataset at `path` with default configuration.
    ///
    /// Fails with [`ReaderError::DatasetUnavailable`] (wrapped in
    /// [`QueryError::Dataset`]) if the path is missing or not valid Parquet.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, QueryError> {
        Self::open_with_config(path, EngineConfig::default())
    }

    /// Open with custom configuration.
    pub fn open_with_config<P: AsRef<Path>>(
        path: P,
        config: EngineConfig,
    ) -> Result<Self, QueryError> {
        let reader = EvMetadataReader::open_with_config(
            path,
            ReaderConfig {
                batch_size: config.batch_size,
            },
        )?;
        Ok(Self::from_reader(reader, config))
    }

    /// Open an in-memory dataset (tests, embedders).
    pub fn from_bytes(data: Bytes) -> Result<Self, QueryError> {
        Self::from_bytes_with_config(data, EngineConfig::default())
    }

    /// Open an in-memory dataset with custom configuration.
    pub fn from_bytes_with_config(data: Bytes, config: EngineConfig) -> Result<Self, QueryError> {
        let reader = EvMetadataReader::from_bytes_with_config(
            data,
            ReaderConfig {
                batch_size: config.batch_size,
            },
        )?;
        Ok(Self::from_reader(reader, config))
    }

    fn from_reader(reader: EvMetadataReader, config: EngineConfig) -> Self {
        let mapping = ColumnMapping::from_schema(reader.schema());
        Self {
            reader,
            mapping,
            ontology: OntologyTable::builtin(),
            config,
        }
    }

    /// Replace the built-in vocabulary, e.g. with a synthetic table in tests.
    pub fn with_ontology_table(mut self, table: OntologyTable) -> Self {
        self.ontology = table;
        self
    }

    /// The inferred column mapping.
    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    /// The dataset column schema.
    pub fn dataset_schema(&self) -> &DatasetSchema {
        self.reader.schema()
    }

    /// The active ontology table.
    pub fn ontology(&self) -> &OntologyTable {
        &self.ontology
    }

    /// The underlying dataset reader.
    pub fn reader(&self) -> &EvMetadataReader {
        &self.reader
    }

    /// Resolve a free-text term against the vocabulary, for UI option
    /// population. `None` means "no ontology narrowing would apply".
    pub fn resolve_term(&self, term: &str) -> Option<&OntologyEntry> {
        self.ontology.normalize(term)
    }

    /// Paged search in dataset order.
    ///
    /// Scans the whole file once, counting every match, and materializes
    /// records only for ranks inside the requested 1-based page. A page past
    /// the end returns an empty record list, not an error; page 0 is treated
    /// as page 1.
    pub fn search(
        &self,
        spec: &FilterSpec,
        page: usize,
        page_size: usize,
    ) -> Result<SearchPage, QueryError> {
        let evaluator = FilterEvaluator::new(spec, &self.mapping, &self.ontology);
        let projection = self.scan_projection(&evaluator);

        let page = page.max(1);
        let page_size = page_size.max(1);
        let start = (page - 1) * page_size;
        let end = start + page_size;

        let mut records = Vec::new();
        let mut total_matches = 0usize;
        for row in self.reader.rows(&projection)? {
            let row = row?;
            if !evaluator.matches(&row) {
                continue;
            }
            if total_matches >= start && total_matches < end {
                records.push(MatchRecord::from_row(&row, &self.mapping));
            }
            total_matches += 1;
        }

        let total_pages = if total_matches == 0 {
            0
        } else {
            (total_matches + page_size - 1) / page_size
        };

        Ok(SearchPage {
            records,
            total_matches,
            total_pages,
            page,
            page_size,
        })
    }

    /// Single-pass summary sharing the exact same evaluator as [`search`],
    /// so summary counts and search results always agree for one filter.
    ///
    /// [`search`]: QueryEngine::search
    pub fn summarize(&self, spec: &FilterSpec) -> Result<Summary, QueryError> {
        let evaluator = FilterEvaluator::new(spec, &self.mapping, &self.ontology);
        let projection = self.scan_projection(&evaluator);

        let mut aggs: Vec<(Role, TopCounts)> = SUMMARY_ROLES
            .iter()
            .map(|r| (*r, TopCounts::new()))
            .collect();
        let mut total_matches = 0usize;

        for row in self.reader.rows(&projection)? {
            let row = row?;
            if !evaluator.matches(&row) {
                continue;
            }
            total_matches += 1;
            for (role, agg) in &mut aggs {
                let cell = self.mapping.column(*role).and_then(|c| row.get(c));
                let value = match role {
                    Role::Year => clean_year(cell),
                    Role::MoleculeType => infer_molecule_type(cell, &row.concat_text()),
                    _ => clean_text(cell),
                };
                // Sentinel rows count toward total_matches but carry no
                // information in a frequency table.
                if value != SENTINEL {
                    agg.observe(&value);
                }
            }
        }

        let top_values = aggs
            .into_iter()
            .map(|(role, agg)| RoleBreakdown {
                role,
                top: agg.top(self.config.top_n),
            })
            .collect();

        Ok(Summary {
            total_matches,
            query: self.query_echo(spec),
            top_values,
        })
    }

    fn query_echo(&self, spec: &FilterSpec) -> Option<QueryEcho> {
        let term = spec.ontology_term.as_deref()?.trim();
        if term.is_empty() {
            return None;
        }
        match self.ontology.normalize(term) {
            Some(entry) => Some(QueryEcho {
                entity: entry.label.clone(),
                ontology: entry.ontology_id.iter().cloned().collect(),
                synonyms_used: entry.synonyms.clone(),
            }),
            None => Some(QueryEcho {
                entity: term.to_lowercase(),
                ontology: Vec::new(),
                synonyms_used: self.ontology.synonyms_for(term),
            }),
        }
    }

    /// Columns a scan for this evaluator must decode: every mapped role
    /// column (the record fields), whatever the predicates read, and the
    /// searchable set. The searchable columns are part of the display
    /// requirement, not just the degraded filter path: molecule-type
    /// inference reads the row's concatenated text whenever the mapped cell
    /// is empty, which only row-level data can decide. Non-textual columns
    /// outside the mapping are never decoded.
    fn scan_projection(&self, evaluator: &FilterEvaluator) -> Projection {
        let mut columns: Vec<String> = Vec::new();
        let mut push = |name: &str| {
            let name = name.to_string();
            if !columns.contains(&name) {
                columns.push(name);
            }
        };
        for role in Role::ALL {
            if let Some(col) = self.mapping.column(role) {
                push(col);
            }
        }
        for col in evaluator.required_columns() {
            push(&col);
        }
        for col in self.mapping.searchable_columns() {
            push(col);
        }
        Projection::of(columns)
    }
}
