//! Query filter state and predicate evaluation.
//!
//! A [`FilterSpec`] captures one request's filters: column-role predicates
//! with an AND/OR combinator, an optional ontology term, and an optional
//! free-text query. A [`FilterEvaluator`] compiles the spec against the
//! dataset's column mapping and ontology table once, then evaluates rows as a
//! pure predicate.
//!
//! The evaluator is deliberately fail-open: an absent column makes its
//! predicate pass, an unparseable year value makes its predicate fail, and an
//! unresolved ontology term degrades to a literal substring search. Nothing
//! in here returns an error.

use serde::Serialize;

use crate::ontology::OntologyTable;
use crate::reader::ScanRow;
use crate::record::clean_year;
use crate::record::SENTINEL;
use crate::schema::{ColumnMapping, Role};

/// How two column predicates combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    /// Both predicates must match
    #[default]
    And,
    /// Either predicate may match
    Or,
}

/// One (column role, filter value) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleFilter {
    /// The semantic role the predicate applies to
    pub role: Role,
    /// The value to match (substring for text roles, exact for year)
    pub value: String,
}

/// One query's complete filter state. An empty spec matches every row.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterSpec {
    /// Column-role predicates
    pub role_filters: Vec<RoleFilter>,
    /// Combinator applied when exactly two role predicates are present;
    /// three or more always AND
    pub combinator: Combinator,
    /// Free-text ontology term, normalized through the synonym table
    pub ontology_term: Option<String>,
    /// Free-text substring query over the searchable columns
    pub free_text: Option<String>,
}

impl FilterSpec {
    /// An empty spec (matches everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a role predicate.
    pub fn with_role_filter(mut self, role: Role, value: impl Into<String>) -> Self {
        self.role_filters.push(RoleFilter {
            role,
            value: value.into(),
        });
        self
    }

    /// Set the combinator for a two-predicate filter.
    pub fn with_combinator(mut self, combinator: Combinator) -> Self {
        self.combinator = combinator;
        self
    }

    /// Set the ontology term. The term always narrows: it is ANDed with
    /// whatever the column predicates decided.
    pub fn with_ontology_term(mut self, term: impl Into<String>) -> Self {
        self.ontology_term = Some(term.into());
        self
    }

    /// Set the free-text query.
    pub fn with_free_text(mut self, query: impl Into<String>) -> Self {
        self.free_text = Some(query.into());
        self
    }

    /// True if the spec applies no filtering at all.
    pub fn is_empty(&self) -> bool {
        self.role_filters.is_empty() && self.ontology_term.is_none() && self.free_text.is_none()
    }
}

enum Predicate {
    /// Case-insensitive substring containment on a mapped column; `None`
    /// column means the role is absent and the predicate passes.
    Text {
        column: Option<String>,
        needle: String,
    },
    /// Exact integer equality on the year column. An unparseable filter
    /// value never matches; an absent column passes.
    Year {
        column: Option<String>,
        value: Option<i64>,
    },
}

impl Predicate {
    fn eval(&self, row: &ScanRow) -> bool {
        match self {
            Predicate::Text { column, needle } => match column {
                None => true,
                Some(col) => row
                    .get(col)
                    .map(|cell| cell.to_lowercase().contains(needle))
                    .unwrap_or(false),
            },
            Predicate::Year { column, value } => match column {
                None => true,
                Some(col) => {
                    let Some(wanted) = value else { return false };
                    row.get(col)
                        .and_then(|cell| {
                            let cleaned = clean_year(Some(cell));
                            if cleaned == SENTINEL {
                                None
                            } else {
                                cleaned.parse::<i64>().ok()
                            }
                        })
                        .map(|year| year == *wanted)
                        .unwrap_or(false)
                }
            },
        }
    }
}

/// A [`FilterSpec`] compiled against one dataset's column mapping and the
/// ontology table. Evaluation is pure and side-effect free.
pub struct FilterEvaluator {
    predicates: Vec<Predicate>,
    combinator: Combinator,
    /// Lowercased synonym set when an ontology term is present
    synonyms: Option<Vec<String>>,
    /// Column the ontology predicate reads; `None` means whole-record
    ontology_column: Option<String>,
    /// Lowercased free-text query
    free_text: Option<String>,
    searchable: Vec<String>,
    whole_row_fallback: bool,
}

impl FilterEvaluator {
    /// Compile a spec. Resolves each role to its column (or absent), the
    /// ontology term to its synonym set, and decides up front whether any
    /// predicate needs the whole-record degraded mode.
    pub fn new(spec: &FilterSpec, mapping: &ColumnMapping, ontology: &OntologyTable) -> Self {
        let predicates = spec
            .role_filters
            .iter()
            .map(|f| {
                let column = mapping.column(f.role).map(str::to_string);
                if f.role == Role::Year {
                    Predicate::Year {
                        column,
                        value: f.value.trim().parse::<i64>().ok(),
                    }
                } else {
                    Predicate::Text {
                        column,
                        needle: f.value.trim().to_lowercase(),
                    }
                }
            })
            .collect();

        let synonyms = spec
            .ontology_term
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map(|t| ontology.synonyms_for(t));
        let ontology_column = mapping.column(Role::VesicleType).map(str::to_string);
        let free_text = spec
            .free_text
            .as_deref()
            .filter(|q| !q.trim().is_empty())
            .map(|q| q.trim().to_lowercase());
        let searchable = mapping.searchable_columns().to_vec();

        let whole_row_fallback = (synonyms.is_some() && ontology_column.is_none())
            || (free_text.is_some() && searchable.is_empty());

        Self {
            predicates,
            combinator: spec.combinator,
            synonyms,
            ontology_column,
            free_text,
            searchable,
            whole_row_fallback,
        }
    }

    /// True when this filter matches by scanning the whole row as one string
    /// (unmapped ontology target or no searchable columns). Degraded recall
    /// mode; the normal path reads only the mapped columns.
    pub fn whole_row_fallback(&self) -> bool {
        self.whole_row_fallback
    }

    /// The dataset columns this filter reads, for projection building.
    pub fn required_columns(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let mut push = |name: &str| {
            if !out.iter().any(|c| c == name) {
                out.push(name.to_string());
            }
        };
        for pred in &self.predicates {
            let (Predicate::Text { column, .. } | Predicate::Year { column, .. }) = pred;
            if let Some(col) = column {
                push(col);
            }
        }
        if self.synonyms.is_some() {
            match &self.ontology_column {
                Some(col) => push(col),
                None => self.searchable.iter().for_each(|c| push(c)),
            }
        }
        if self.free_text.is_some() {
            self.searchable.iter().for_each(|c| push(c));
        }
        out
    }

    /// Evaluate the compiled filter against one row.
    pub fn matches(&self, row: &ScanRow) -> bool {
        self.combined_column_predicates(row)
            && self.ontology_matches(row)
            && self.free_text_matches(row)
    }

    fn combined_column_predicates(&self, row: &ScanRow) -> bool {
        match self.predicates.len() {
            0 => true,
            1 => self.predicates[0].eval(row),
            2 => {
                let (a, b) = (self.predicates[0].eval(row), self.predicates[1].eval(row));
                match self.combinator {
                    Combinator::And => a && b,
                    Combinator::Or => a || b,
                }
            }
            _ => self.predicates.iter().all(|p| p.eval(row)),
        }
    }

    fn ontology_matches(&self, row: &ScanRow) -> bool {
        let Some(synonyms) = &self.synonyms else {
            return true;
        };
        let haystack = match &self.ontology_column {
            Some(col) => match row.get(col) {
                Some(cell) => cell.to_lowercase(),
                None => return false,
            },
            None => row.concat_text(),
        };
        synonyms.iter().any(|syn| haystack.contains(syn))
    }

    fn free_text_matches(&self, row: &ScanRow) -> bool {
        let Some(query) = &self.free_text else {
            return true;
        };
        if self.searchable.is_empty() {
            return row.concat_text().contains(query);
        }
        self.searchable.iter().any(|col| {
            row.get(col)
                .map(|cell| cell.to_lowercase().contains(query))
                .unwrap_or(false)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::DataType;
    use crate::schema::DatasetSchema;

    fn mapping(names: &[&str]) -> ColumnMapping {
        let schema = DatasetSchema::from_columns(
            names
                .iter()
                .map(|n| (n.to_string(), DataType::Utf8))
                .collect(),
        );
        ColumnMapping::from_schema(&schema)
    }

    fn row(columns: Vec<&str>, values: Vec<Option<&str>>) -> ScanRow {
        ScanRow::for_test(columns, values)
    }

    fn eval(spec: &FilterSpec, mapping: &ColumnMapping) -> FilterEvaluator {
        FilterEvaluator::new(spec, mapping, &OntologyTable::builtin())
    }

    #[test]
    fn test_empty_spec_matches_everything() {
        let m = mapping(&["species"]);
        let e = eval(&FilterSpec::new(), &m);
        assert!(e.matches(&row(vec!["species"], vec![Some("Homo sapiens")])));
        assert!(e.matches(&row(vec!["species"], vec![None])));
    }

    #[test]
    fn test_text_predicate_substring_case_insensitive() {
        let m = mapping(&["species"]);
        let spec = FilterSpec::new().with_role_filter(Role::Species, "homo");
        let e = eval(&spec, &m);
        assert!(e.matches(&row(vec!["species"], vec![Some("Homo sapiens")])));
        assert!(!e.matches(&row(vec!["species"], vec![Some("Mus musculus")])));
        assert!(!e.matches(&row(vec!["species"], vec![None])));
    }

    #[test]
    fn test_absent_role_predicate_passes() {
        let m = mapping(&["species"]);
        let spec = FilterSpec::new().with_role_filter(Role::IsolationMethod, "uc");
        let e = eval(&spec, &m);
        assert!(e.matches(&row(vec!["species"], vec![Some("Homo sapiens")])));
    }

    #[test]
    fn test_year_predicate_exact_after_coercion() {
        let m = mapping(&["year"]);
        let spec = FilterSpec::new().with_role_filter(Role::Year, "2015");
        let e = eval(&spec, &m);
        assert!(e.matches(&row(vec!["year"], vec![Some("2015")])));
        assert!(e.matches(&row(vec!["year"], vec![Some("2015.0")])));
        assert!(!e.matches(&row(vec!["year"], vec![Some("2016")])));
        // Unparseable cell fails the predicate, it does not error
        assert!(!e.matches(&row(vec!["year"], vec![Some("unknown")])));
    }

    #[test]
    fn test_invalid_year_filter_value_never_matches() {
        let m = mapping(&["year"]);
        let spec = FilterSpec::new().with_role_filter(Role::Year, "twenty-fifteen");
        let e = eval(&spec, &m);
        assert!(!e.matches(&row(vec!["year"], vec![Some("2015")])));
    }

    #[test]
    fn test_two_predicates_and_or() {
        let m = mapping(&["species", "vesicle_type"]);
        let and_spec = FilterSpec::new()
            .with_role_filter(Role::Species, "homo")
            .with_role_filter(Role::VesicleType, "exosome");
        let or_spec = and_spec.clone().with_combinator(Combinator::Or);

        let cols = vec!["species", "vesicle_type"];
        let hit_one = row(cols.clone(), vec![Some("Homo sapiens"), Some("microvesicle")]);
        let hit_both = row(cols.clone(), vec![Some("Homo sapiens"), Some("exosome")]);
        let hit_none = row(cols, vec![Some("Mus musculus"), Some("microvesicle")]);

        assert!(eval(&and_spec, &m).matches(&hit_both));
        assert!(!eval(&and_spec, &m).matches(&hit_one));
        assert!(eval(&or_spec, &m).matches(&hit_one));
        assert!(!eval(&or_spec, &m).matches(&hit_none));
    }

    #[test]
    fn test_ontology_narrows_column_filters() {
        let m = mapping(&["species", "vesicle_type"]);
        let spec = FilterSpec::new()
            .with_role_filter(Role::Species, "homo")
            .with_ontology_term("exosome");
        let e = eval(&spec, &m);

        let cols = vec!["species", "vesicle_type"];
        assert!(e.matches(&row(cols.clone(), vec![Some("Homo sapiens"), Some("exosome")])));
        // Synonym spelling in the data still matches
        assert!(e.matches(&row(
            cols.clone(),
            vec![Some("Homo sapiens"), Some("small extracellular vesicle")]
        )));
        // Column filters matched, ontology rejected: narrowed out
        assert!(!e.matches(&row(cols, vec![Some("Homo sapiens"), Some("microvesicle")])));
    }

    #[test]
    fn test_ontology_whole_row_when_target_absent() {
        let m = mapping(&["sample_description"]);
        let spec = FilterSpec::new().with_ontology_term("exosome");
        let e = eval(&spec, &m);
        assert!(e.whole_row_fallback());
        assert!(e.matches(&row(
            vec!["sample_description"],
            vec![Some("sEVs from plasma")]
        )));
        assert!(!e.matches(&row(
            vec!["sample_description"],
            vec![Some("whole cell lysate")]
        )));
    }

    #[test]
    fn test_unresolved_term_degrades_to_literal_substring() {
        let m = mapping(&["vesicle_type"]);
        let spec = FilterSpec::new().with_ontology_term("oncosome");
        let e = eval(&spec, &m);
        assert!(e.matches(&row(vec!["vesicle_type"], vec![Some("large oncosome")])));
        assert!(!e.matches(&row(vec!["vesicle_type"], vec![Some("exosome")])));
    }

    #[test]
    fn test_free_text_over_searchable_columns() {
        let m = mapping(&["sample_description", "protein_accession"]);
        let spec = FilterSpec::new().with_free_text("cd63");
        let e = eval(&spec, &m);
        let cols = vec!["sample_description", "protein_accession"];
        assert!(e.matches(&row(cols.clone(), vec![Some("CD63-positive sEVs"), None])));
        assert!(e.matches(&row(cols.clone(), vec![None, Some("CD63_HUMAN")])));
        assert!(!e.matches(&row(cols, vec![Some("CD9 fraction"), None])));
    }

    #[test]
    fn test_required_columns_narrow_without_degraded_mode() {
        let m = mapping(&["species", "vesicle_type", "sample_description"]);
        let spec = FilterSpec::new()
            .with_role_filter(Role::Species, "homo")
            .with_ontology_term("exosome");
        let e = eval(&spec, &m);
        assert!(!e.whole_row_fallback());
        let required = e.required_columns();
        assert!(required.contains(&"species".to_string()));
        assert!(required.contains(&"vesicle_type".to_string()));
        assert!(!required.contains(&"sample_description".to_string()));
    }
}
