/// Errors that can occur while opening or scanning the dataset
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    /// The dataset file is missing or is not a readable Parquet file.
    /// Fatal at load time; never produced mid-scan.
    #[error("dataset unavailable: {reason}")]
    DatasetUnavailable {
        /// Why the dataset could not be opened
        reason: String,
    },

    /// Every row group in the file failed to decode, so the scan produced
    /// nothing. Individual row-group failures are skipped silently (with a
    /// warning); this surfaces only the total-loss case.
    #[error("no readable row groups: every chunk in the dataset failed to decode")]
    NoReadableRowGroups,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}
