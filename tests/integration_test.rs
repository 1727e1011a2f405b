//! End-to-end tests over a real on-disk Parquet file with several row groups:
//! open, search, summarize, and export must stay mutually consistent for the
//! same filter.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use tempfile::tempdir;

use evquery::filter::FilterSpec;
use evquery::query::{EngineConfig, QueryEngine};
use evquery::schema::Role;

const SPECIES: [&str; 3] = ["Homo sapiens", "Mus musculus", "Bos taurus"];
const VESICLES: [&str; 4] = [
    "exosome",
    "microvesicle",
    "small extracellular vesicle",
    "apoptotic body",
];
const METHODS: [&str; 3] = [
    "ultracentrifugation",
    "size_exclusion_chromatography",
    "precipitation",
];
const DATABASES: [&str; 2] = ["ExoCarta", "Vesiclepedia"];

/// Write a deterministic mixed-type dataset and return its path.
fn write_dataset(dir: &std::path::Path, rows: usize, row_group_size: usize) -> std::path::PathBuf {
    let schema = Arc::new(Schema::new(vec![
        Field::new("SAMPLE_NAME", DataType::Utf8, true),
        Field::new("SPECIES", DataType::Utf8, true),
        Field::new("VESICLE_TYPE", DataType::Utf8, true),
        Field::new("ISOLATION_METHOD", DataType::Utf8, true),
        Field::new("YEAR", DataType::Float64, true),
        Field::new("SOURCE_DATABASE", DataType::Utf8, true),
        Field::new("SAMPLE_DESCRIPTION", DataType::Utf8, true),
    ]));

    let names: Vec<Option<String>> = (0..rows).map(|i| Some(format!("EV-{:04}", i))).collect();
    let species: Vec<Option<&str>> = (0..rows).map(|i| Some(SPECIES[i % 3])).collect();
    let vesicles: Vec<Option<&str>> = (0..rows)
        .map(|i| if i % 7 == 0 { None } else { Some(VESICLES[i % 4]) })
        .collect();
    let methods: Vec<Option<&str>> = (0..rows).map(|i| Some(METHODS[i % 3])).collect();
    let years: Vec<Option<f64>> = (0..rows).map(|i| Some(2010.0 + (i % 10) as f64)).collect();
    let databases: Vec<Option<&str>> = (0..rows).map(|i| Some(DATABASES[i % 2])).collect();
    let descriptions: Vec<Option<String>> = (0..rows)
        .map(|i| {
            Some(if i % 5 == 0 {
                format!("CD63-positive prep, miRNA cargo, run {}", i)
            } else {
                format!("bulk cargo profiling, run {}", i)
            })
        })
        .collect();

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(names)) as ArrayRef,
            Arc::new(StringArray::from(species)) as ArrayRef,
            Arc::new(StringArray::from(vesicles)) as ArrayRef,
            Arc::new(StringArray::from(methods)) as ArrayRef,
            Arc::new(Float64Array::from(years)) as ArrayRef,
            Arc::new(StringArray::from(databases)) as ArrayRef,
            Arc::new(StringArray::from(descriptions)) as ArrayRef,
        ],
    )
    .expect("valid batch");

    let props = WriterProperties::builder()
        .set_max_row_group_size(row_group_size)
        .build();
    let path = dir.join("unified_ev_metadata.parquet");
    let file = std::fs::File::create(&path).expect("create file");
    let mut writer = ArrowWriter::try_new(file, schema, Some(props)).expect("writer");
    writer.write(&batch).expect("write batch");
    writer.close().expect("close writer");
    path
}

#[test]
fn test_end_to_end_consistency() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = write_dataset(dir.path(), 200, 32);

    let engine = QueryEngine::open(&path)?;

    // Mapping resolved from the uppercased production-style column names
    assert_eq!(engine.mapping().column(Role::Species), Some("SPECIES"));
    assert_eq!(
        engine.mapping().column(Role::VesicleType),
        Some("VESICLE_TYPE")
    );
    assert_eq!(
        engine.mapping().column(Role::Database),
        Some("SOURCE_DATABASE")
    );

    let spec = FilterSpec::new()
        .with_role_filter(Role::Species, "homo")
        .with_ontology_term("exosome");

    // Search, summary, and export must agree on the match set
    let page = engine.search(&spec, 1, 1000)?;
    let summary = engine.summarize(&spec)?;
    let export = engine.export(&spec)?;

    assert_eq!(summary.total_matches, page.total_matches);
    assert_eq!(export.rows, page.total_matches);
    assert!(!export.truncated);
    assert!(page.total_matches > 0);

    // Ontology narrowing: exosome synonyms include "small extracellular
    // vesicle" but never "microvesicle" or "apoptotic body"
    for record in &page.records {
        assert!(
            record.vesicle_type.contains("exosome")
                || record.vesicle_type.contains("small extracellular vesicle"),
            "unexpected vesicle type {:?}",
            record.vesicle_type
        );
    }

    // Float years render truncated
    assert!(page.records.iter().all(|r| !r.year.contains('.')));
    Ok(())
}

#[test]
fn test_pagination_round_trip_on_disk() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = write_dataset(dir.path(), 120, 16);
    let engine = QueryEngine::open(&path)?;

    let spec = FilterSpec::new().with_role_filter(Role::Database, "exocarta");
    let unpaged = engine.search(&spec, 1, 10_000)?;

    let page_size = 11;
    let mut stitched = Vec::new();
    let total_pages = engine.search(&spec, 1, page_size)?.total_pages;
    for page in 1..=total_pages {
        let result = engine.search(&spec, page, page_size)?;
        assert_eq!(result.total_matches, unpaged.total_matches);
        stitched.extend(result.records);
    }

    assert_eq!(stitched.len(), unpaged.records.len());
    assert_eq!(stitched, unpaged.records);
    Ok(())
}

#[test]
fn test_export_cap_on_disk() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = write_dataset(dir.path(), 300, 64);
    let engine = QueryEngine::open_with_config(
        &path,
        EngineConfig {
            export_cap: 100,
            ..Default::default()
        },
    )?;

    let export = engine.export(&FilterSpec::new())?;
    assert_eq!(export.rows, 100);
    assert!(export.truncated);

    let text = String::from_utf8(export.data)?;
    assert_eq!(text.lines().count(), 101);
    Ok(())
}

#[test]
fn test_free_text_and_summary_on_disk() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = write_dataset(dir.path(), 100, 16);
    let engine = QueryEngine::open(&path)?;

    // Every fifth row mentions CD63 in the description
    let spec = FilterSpec::new().with_free_text("cd63");
    let page = engine.search(&spec, 1, 1000)?;
    assert_eq!(page.total_matches, 20);

    let summary = engine.summarize(&spec)?;
    assert_eq!(summary.total_matches, 20);

    // Those rows carry a miRNA marker, picked up by molecule-type inference
    let molecule = summary
        .top_values
        .iter()
        .find(|b| b.role == Role::MoleculeType)
        .expect("molecule breakdown");
    assert_eq!(molecule.top[0].value, "miRNA");
    assert_eq!(molecule.top[0].count, 20);
    Ok(())
}
