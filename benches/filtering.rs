use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use tempfile::TempDir;

use evquery::filter::FilterSpec;
use evquery::query::QueryEngine;
use evquery::schema::Role;

/// Create a test dataset with the production column shape
fn create_test_dataset(path: &std::path::Path, num_rows: usize) {
    let schema = Arc::new(Schema::new(vec![
        Field::new("SAMPLE_NAME", DataType::Utf8, true),
        Field::new("SPECIES", DataType::Utf8, true),
        Field::new("VESICLE_TYPE", DataType::Utf8, true),
        Field::new("SAMPLE_DESCRIPTION", DataType::Utf8, true),
    ]));

    let species = ["Homo sapiens", "Mus musculus", "Rattus norvegicus"];
    let vesicles = ["exosome", "microvesicle", "sEV", "apoptotic body"];

    let names: Vec<Option<String>> = (0..num_rows).map(|i| Some(format!("EV-{:06}", i))).collect();
    let species_col: Vec<Option<&str>> = (0..num_rows).map(|i| Some(species[i % 3])).collect();
    let vesicle_col: Vec<Option<&str>> = (0..num_rows).map(|i| Some(vesicles[i % 4])).collect();
    let descriptions: Vec<Option<String>> = (0..num_rows)
        .map(|i| Some(format!("plasma-derived vesicles, replicate {}", i)))
        .collect();

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(names)) as ArrayRef,
            Arc::new(StringArray::from(species_col)) as ArrayRef,
            Arc::new(StringArray::from(vesicle_col)) as ArrayRef,
            Arc::new(StringArray::from(descriptions)) as ArrayRef,
        ],
    )
    .unwrap();

    let props = WriterProperties::builder()
        .set_max_row_group_size(10_000)
        .build();
    let file = std::fs::File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props)).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

/// Benchmark ontology-narrowed search across dataset sizes
fn bench_ontology_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("ontology_search");

    for num_rows in [10_000, 50_000, 100_000] {
        group.throughput(Throughput::Elements(num_rows as u64));

        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("bench.parquet");
        create_test_dataset(&file_path, num_rows);
        let engine = QueryEngine::open(&file_path).unwrap();

        let spec = FilterSpec::new()
            .with_role_filter(Role::Species, "homo")
            .with_ontology_term("exosome");

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}rows", num_rows)),
            &num_rows,
            |b, _| {
                b.iter(|| {
                    let page = engine.search(&spec, 1, 25).unwrap();
                    assert!(page.total_matches > 0);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark streaming summaries against plain search on the same filter
fn bench_summarize(c: &mut Criterion) {
    let mut group = c.benchmark_group("summarize");

    let num_rows = 50_000;
    group.throughput(Throughput::Elements(num_rows as u64));

    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("bench.parquet");
    create_test_dataset(&file_path, num_rows);
    let engine = QueryEngine::open(&file_path).unwrap();

    let spec = FilterSpec::new().with_ontology_term("extracellular vesicle");

    group.bench_function("top_values", |b| {
        b.iter(|| {
            let summary = engine.summarize(&spec).unwrap();
            assert!(summary.total_matches > 0);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_ontology_search, bench_summarize);
criterion_main!(benches);
