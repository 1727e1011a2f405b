//! # evquery CLI
//!
//! Command-line front end for the EV metadata query engine.
//!
//! ## Usage
//!
//! ```bash
//! # Ontology-narrowed search, first page of 25
//! evquery search data/unified_ev_metadata.parquet --term exosome --species "Homo sapiens"
//!
//! # Filter summary for a dashboard
//! evquery summary data/unified_ev_metadata.parquet --term exosome
//!
//! # Capped CSV export
//! evquery export data/unified_ev_metadata.parquet --query cd63 --output hits.csv
//!
//! # Inspect schema and inferred column mapping
//! evquery info data/unified_ev_metadata.parquet
//! ```

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;

use evquery::filter::{Combinator, FilterSpec};
use evquery::query::QueryEngine;
use evquery::schema::Role;

/// evquery - EV Metadata Query Engine
#[derive(Parser)]
#[command(name = "evquery")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Filter flags shared by search, summary, and export.
#[derive(Args)]
struct FilterArgs {
    /// Substring filter on the sample name column
    #[arg(long)]
    name: Option<String>,

    /// Substring filter on the species column
    #[arg(long)]
    species: Option<String>,

    /// Substring filter on the vesicle type column
    #[arg(long)]
    vesicle_type: Option<String>,

    /// Substring filter on the isolation method column
    #[arg(long)]
    isolation: Option<String>,

    /// Substring filter on the molecule type column
    #[arg(long)]
    molecule_type: Option<String>,

    /// Substring filter on the source database column
    #[arg(long)]
    database: Option<String>,

    /// Exact publication year
    #[arg(long)]
    year: Option<String>,

    /// Ontology term (resolved through the synonym table; always narrows)
    #[arg(short, long)]
    term: Option<String>,

    /// Free-text query over every textual column
    #[arg(short, long)]
    query: Option<String>,

    /// Combine two column filters with OR instead of AND
    #[arg(long)]
    any: bool,
}

impl FilterArgs {
    fn into_spec(self) -> FilterSpec {
        let mut spec = FilterSpec::new();
        let pairs = [
            (Role::Name, self.name),
            (Role::Species, self.species),
            (Role::VesicleType, self.vesicle_type),
            (Role::IsolationMethod, self.isolation),
            (Role::MoleculeType, self.molecule_type),
            (Role::Database, self.database),
            (Role::Year, self.year),
        ];
        for (role, value) in pairs {
            if let Some(value) = value {
                spec = spec.with_role_filter(role, value);
            }
        }
        if self.any {
            spec = spec.with_combinator(Combinator::Or);
        }
        if let Some(term) = self.term {
            spec = spec.with_ontology_term(term);
        }
        if let Some(query) = self.query {
            spec = spec.with_free_text(query);
        }
        spec
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Search the dataset, one page of results as JSON
    Search {
        /// Metadata Parquet file
        #[arg(value_name = "DATA")]
        data: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,

        /// 1-based page number
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Records per page
        #[arg(long, default_value = "25")]
        page_size: usize,
    },

    /// Summarize every match: total count plus top values per column
    Summary {
        /// Metadata Parquet file
        #[arg(value_name = "DATA")]
        data: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Export every match as CSV, up to the row cap
    Export {
        /// Metadata Parquet file
        #[arg(value_name = "DATA")]
        data: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,

        /// Output file (stdout when omitted)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// List the built-in ontology vocabulary
    Terms,

    /// Display dataset schema, row groups, and the inferred column mapping
    Info {
        /// Metadata Parquet file
        #[arg(value_name = "DATA")]
        data: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Search {
            data,
            filters,
            page,
            page_size,
        } => run_search(data, filters, page, page_size),
        Commands::Summary { data, filters } => run_summary(data, filters),
        Commands::Export {
            data,
            filters,
            output,
        } => run_export(data, filters, output),
        Commands::Terms => run_terms(),
        Commands::Info { data } => run_info(data),
    }
}

fn run_search(data: PathBuf, filters: FilterArgs, page: usize, page_size: usize) -> Result<()> {
    let engine = QueryEngine::open(&data).context("Failed to open dataset")?;
    let spec = filters.into_spec();

    let result = engine
        .search(&spec, page, page_size)
        .context("Search failed")?;
    info!(
        "{} matches, returning page {}/{}",
        result.total_matches, result.page, result.total_pages
    );

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn run_summary(data: PathBuf, filters: FilterArgs) -> Result<()> {
    let engine = QueryEngine::open(&data).context("Failed to open dataset")?;
    let spec = filters.into_spec();

    let summary = engine.summarize(&spec).context("Summary failed")?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn run_export(data: PathBuf, filters: FilterArgs, output: Option<PathBuf>) -> Result<()> {
    let engine = QueryEngine::open(&data).context("Failed to open dataset")?;
    let spec = filters.into_spec();

    let export = engine.export(&spec).context("Export failed")?;
    info!("exported {} rows", export.rows);
    if export.truncated {
        eprintln!("warning: export truncated at the row cap; narrow the filter for a full set");
    }

    match output {
        Some(path) => {
            std::fs::write(&path, &export.data)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("wrote {}", path.display());
        }
        None => {
            std::io::stdout().write_all(&export.data)?;
        }
    }
    Ok(())
}

fn run_terms() -> Result<()> {
    let engine_table = evquery::ontology::OntologyTable::builtin();
    println!("Built-in EV vocabulary");
    println!("======================");
    for entry in engine_table.entries() {
        let accession = entry.ontology_id.as_deref().unwrap_or("-");
        println!("{} ({})", entry.label, accession);
        println!("  synonyms: {}", entry.synonyms.join(", "));
    }
    Ok(())
}

fn run_info(data: PathBuf) -> Result<()> {
    let engine = QueryEngine::open(&data).context("Failed to open dataset")?;
    let reader = engine.reader();

    println!("EV Metadata Dataset");
    println!("===================");
    println!("File: {}", data.display());
    println!();

    println!("File Statistics:");
    println!("  Row groups: {}", reader.num_row_groups());
    println!("  Total rows: {}", reader.total_rows());
    println!("  Columns: {}", engine.dataset_schema().len());
    println!();

    println!("Schema:");
    for (i, (name, dtype)) in engine.dataset_schema().columns().iter().enumerate() {
        println!("  {:3}. {} ({})", i + 1, name, dtype);
    }
    println!();

    println!("Inferred Column Mapping:");
    for (role, column) in engine.mapping().entries() {
        println!("  {:<17} -> {}", role.label(), column.unwrap_or("(absent)"));
    }
    println!();

    println!(
        "Searchable columns: {}",
        engine.mapping().searchable_columns().join(", ")
    );
    Ok(())
}
