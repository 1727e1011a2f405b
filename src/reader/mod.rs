//! # Dataset Reader Module
//!
//! Chunked, projection-aware scanning of the EV metadata Parquet file.
//!
//! ## Features
//!
//! - **Bounded Memory**: rows are produced one Parquet row group at a time;
//!   the full dataset is never materialized.
//! - **Column Projection**: only the columns a query reads are decoded.
//! - **Fault Isolation**: a row group that fails to decode is skipped with a
//!   warning and the scan continues; only a dataset where *every* row group
//!   fails surfaces an error.
//! - **Deterministic Order**: rows are always yielded in on-disk order
//!   (row-group index, then within-group row order), which pagination
//!   depends on.
//!
//! ## Example
//!
//! ```rust,no_run
//! use evquery::reader::{EvMetadataReader, Projection};
//!
//! let reader = EvMetadataReader::open("unified_ev_metadata.parquet")?;
//! let projection = Projection::of(["species", "vesicle_type"]);
//! for row in reader.rows(&projection)? {
//!     let row = row?;
//!     println!("{:?}", row.get("species"));
//! }
//! # Ok::<(), evquery::reader::ReaderError>(())
//! ```

mod config;
mod error;
mod open;
mod rows;


pub use config::ReaderConfig;
pub use error::ReaderError;
pub use rows::{Projection, RowIter, ScanRow};

use parquet::arrow::arrow_reader::ArrowReaderMetadata;

use crate::schema::DatasetSchema;

use config::ReaderSource;

/// Reader over one read-only EV metadata Parquet file.
///
/// The Parquet footer metadata is parsed once at open time and shared by every
/// scan; each call to [`EvMetadataReader::rows`] starts an independent,
/// restartable pass over the file.
pub struct EvMetadataReader {
    source: ReaderSource,
    metadata: ArrowReaderMetadata,
    schema: DatasetSchema,
    config: ReaderConfig,
}

impl EvMetadataReader {
    /// The dataset column schema.
    pub fn schema(&self) -> &DatasetSchema {
        &self.schema
    }

    /// Number of row groups in the file.
    pub fn num_row_groups(&self) -> usize {
        self.metadata.metadata().num_row_groups()
    }

    /// Total number of rows in the file, from footer metadata.
    pub fn total_rows(&self) -> i64 {
        self.metadata.metadata().file_metadata().num_rows()
    }
}
