//! # evquery - EV Metadata Query Engine
//!
//! `evquery` is an ontology-aware, memory-bounded streaming query engine for
//! extracellular-vesicle (EV) sample metadata stored in a single read-only
//! Apache Parquet file.
//!
//! ## Key Features
//!
//! - **Bounded Memory**: The dataset is scanned one Parquet row group at a
//!   time, decoding only the columns a query actually reads. Peak memory is
//!   one decoded row group plus the accumulated result, never the whole file.
//!
//! - **Ontology-Aware Search**: Free-text biological vocabulary is normalized
//!   through a synonym table with Gene Ontology accessions, so a query for
//!   "exosome" also matches "sEV" or "small extracellular vesicle".
//!
//! - **Heuristic Schema Mapping**: Column roles (species, vesicle type,
//!   isolation method, ...) are inferred once from raw column names via
//!   documented priority lists. Unmapped roles degrade gracefully instead of
//!   erroring.
//!
//! - **Deterministic Pagination**: Results are always produced in on-disk
//!   order, so fixed filters yield byte-identical pages across requests.
//!
//! - **Capped Export**: CSV export streams matches up to a hard row cap and
//!   signals truncation explicitly.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use evquery::query::QueryEngine;
//! use evquery::filter::FilterSpec;
//! use evquery::schema::Role;
//!
//! let engine = QueryEngine::open("unified_ev_metadata.parquet")?;
//!
//! // Ontology-narrowed, species-filtered search
//! let spec = FilterSpec::new()
//!     .with_role_filter(Role::Species, "Homo sapiens")
//!     .with_ontology_term("exosome");
//!
//! let page = engine.search(&spec, 1, 25)?;
//! println!("{} matches across {} pages", page.total_matches, page.total_pages);
//! for record in &page.records {
//!     println!("{} ({}, {})", record.name, record.species, record.year);
//! }
//! # Ok::<(), evquery::query::QueryError>(())
//! ```
//!
//! ## Architecture
//!
//! The library is organized into the following modules:
//!
//! - [`ontology`]: synonym/ontology term resolution (GO accessions)
//! - [`schema`]: column-role inference from raw column names
//! - [`record`]: field normalization and the `MatchRecord` output row
//! - [`reader`]: chunked Parquet scanning with column projection
//! - [`filter`]: query filter state and predicate evaluation
//! - [`query`]: the engine facade - paged search, summaries, capped export
//!
//! ## Data Flow
//!
//! A query enters as a [`filter::FilterSpec`]. The column mapping was resolved
//! once when the dataset was opened; the ontology table turns any free-text
//! term into a synonym set. The scanner walks the file row group by row group,
//! decoding only the columns the active filter needs, and each matching row is
//! either counted into a bounded top-N aggregate (summaries) or sliced into
//! the requested page (search/export). The scan short-circuits once the page
//! or export cap is satisfied.

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod filter;
pub mod ontology;
pub mod query;
pub mod reader;
pub mod record;
pub mod schema;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::filter::{Combinator, FilterEvaluator, FilterSpec, RoleFilter};
    pub use crate::ontology::{OntologyEntry, OntologyTable};
    pub use crate::query::{
        EngineConfig, Export, QueryEngine, QueryError, SearchPage, Summary, ValueCount,
    };
    pub use crate::reader::{
        EvMetadataReader, Projection, ReaderConfig, ReaderError, RowIter, ScanRow,
    };
    pub use crate::record::{clean_text, clean_year, MatchRecord, SENTINEL};
    pub use crate::schema::{ColumnMapping, DatasetSchema, Role};
}
