use bytes::Bytes;

/// Configuration for reading the metadata file
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Maximum number of rows decoded per record batch within a row group
    pub batch_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self { batch_size: 8192 }
    }
}

/// Source the reader re-opens for each scan (stores path or bytes)
pub(super) enum ReaderSource {
    /// File path for file-based reading
    FilePath(std::path::PathBuf),
    /// In-memory Parquet bytes (implements `ChunkReader`), used by tests and embedders
    Memory(Bytes),
}
