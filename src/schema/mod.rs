//! # Schema Mapping
//!
//! The unified EV metadata file is assembled out of band from heterogeneous
//! source databases, so column names vary between builds (`SPECIES` vs
//! `organism`, `VESICLE_TYPE` vs `ev_type`, ...). This module infers a
//! semantic [`Role`] for each column once at open time, from ordered
//! candidate lists matched case-insensitively against the raw column names.
//!
//! Mapping is a pure function of the schema: same columns in, same
//! [`ColumnMapping`] out. A role with no matching candidate is *absent*, and
//! every consumer degrades gracefully (sentinel display value, pass-through
//! predicate, whole-record text search) rather than erroring.

mod candidates;


use std::collections::HashMap;

use arrow::datatypes::{DataType, SchemaRef};
use serde::Serialize;

pub use candidates::candidates_for;

/// Semantic meaning assigned to a dataset column, independent of its raw name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    /// Sample / record name
    Name,
    /// Molecule or content type (miRNA, protein, ...)
    MoleculeType,
    /// Species / organism
    Species,
    /// Vesicle type (exosome, microvesicle, ...)
    VesicleType,
    /// Isolation / separation method
    IsolationMethod,
    /// Publication year
    Year,
    /// Source database the record was harmonized from
    Database,
}

impl Role {
    /// All roles, in display order.
    pub const ALL: [Role; 7] = [
        Role::Name,
        Role::MoleculeType,
        Role::Species,
        Role::VesicleType,
        Role::IsolationMethod,
        Role::Year,
        Role::Database,
    ];

    /// Human-readable role label (also used as export/CLI header wording).
    pub fn label(&self) -> &'static str {
        match self {
            Role::Name => "Name",
            Role::MoleculeType => "Type",
            Role::Species => "Species",
            Role::VesicleType => "Vesicle Type",
            Role::IsolationMethod => "Isolation Method",
            Role::Year => "Year",
            Role::Database => "Database",
        }
    }
}

/// Ordered sequence of (column name, declared type), captured from the Parquet
/// Arrow schema when the dataset is opened. Immutable afterwards.
#[derive(Debug, Clone)]
pub struct DatasetSchema {
    columns: Vec<(String, DataType)>,
}

impl DatasetSchema {
    /// Capture the column list from an Arrow schema.
    pub fn from_arrow(schema: &SchemaRef) -> Self {
        Self {
            columns: schema
                .fields()
                .iter()
                .map(|f| (f.name().clone(), f.data_type().clone()))
                .collect(),
        }
    }

    /// Build directly from (name, type) pairs. Intended for tests.
    pub fn from_columns(columns: Vec<(String, DataType)>) -> Self {
        Self { columns }
    }

    /// Ordered column names.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    /// Ordered (name, type) pairs.
    pub fn columns(&self) -> &[(String, DataType)] {
        &self.columns
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True if the schema has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

fn is_textual(dt: &DataType) -> bool {
    matches!(dt, DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View)
}

/// Mapping from semantic role to actual column name, plus the cached set of
/// searchable (textual) columns. Built once per dataset load, read-only after.
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    roles: HashMap<Role, String>,
    searchable: Vec<String>,
}

impl ColumnMapping {
    /// Infer the mapping from a dataset schema.
    ///
    /// For each role the candidate spellings are tried in priority order
    /// against the uppercased column names; the first match wins. A role with
    /// no match is left absent and logged once - absent roles are a warning,
    /// never an error.
    pub fn from_schema(schema: &DatasetSchema) -> Self {
        let upper: Vec<(String, &str)> = schema
            .column_names()
            .map(|n| (n.to_uppercase(), n))
            .collect();

        let mut roles = HashMap::new();
        for role in Role::ALL {
            let found = candidates_for(role)
                .iter()
                .find_map(|cand| {
                    upper
                        .iter()
                        .find(|(u, _)| u == cand)
                        .map(|(_, original)| (*original).to_string())
                });
            match found {
                Some(column) => {
                    roles.insert(role, column);
                }
                None => {
                    log::warn!("no column matched role {:?}; degrading to absent", role);
                }
            }
        }

        let searchable = schema
            .columns()
            .iter()
            .filter(|(_, dt)| is_textual(dt))
            .map(|(n, _)| n.clone())
            .collect();

        Self { roles, searchable }
    }

    /// The column mapped to `role`, or `None` if the role is absent.
    pub fn column(&self, role: Role) -> Option<&str> {
        self.roles.get(&role).map(String::as_str)
    }

    /// True if the role matched a column.
    pub fn has(&self, role: Role) -> bool {
        self.roles.contains_key(&role)
    }

    /// Every textual column, in schema order. This is the set free-text
    /// queries and whole-record fallbacks search over.
    pub fn searchable_columns(&self) -> &[String] {
        &self.searchable
    }

    /// Mapped (role, column) pairs in role display order, for diagnostics.
    pub fn entries(&self) -> Vec<(Role, Option<&str>)> {
        Role::ALL.iter().map(|r| (*r, self.column(*r))).collect()
    }
}
