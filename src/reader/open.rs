use std::fs::File;
use std::path::Path;

use bytes::Bytes;
use parquet::arrow::arrow_reader::{ArrowReaderMetadata, ArrowReaderOptions};

use crate::schema::DatasetSchema;

use super::config::ReaderSource;
use super::{EvMetadataReader, ReaderConfig, ReaderError};

impl EvMetadataReader {
    /// Open the metadata Parquet file at `path`.
    ///
    /// Fails with [`ReaderError::DatasetUnavailable`] if the path does not
    /// exist or the file is not a valid Parquet file. This is the only hard
    /// failure the engine ever surfaces for the dataset itself.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ReaderError> {
        Self::open_with_config(path, ReaderConfig::default())
    }

    /// Open with custom configuration.
    pub fn open_with_config<P: AsRef<Path>>(
        path: P,
        config: ReaderConfig,
    ) -> Result<Self, ReaderError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ReaderError::DatasetUnavailable {
            reason: format!("cannot open {}: {}", path.display(), e),
        })?;
        let metadata = Self::load_footer(&file, path.display().to_string())?;
        Ok(Self::from_parts(
            ReaderSource::FilePath(path.to_path_buf()),
            metadata,
            config,
        ))
    }

    /// Open a dataset held entirely in memory.
    ///
    /// `Bytes` implements the Parquet `ChunkReader` trait, so tests and
    /// embedders can scan synthetic datasets without touching disk.
    pub fn from_bytes(data: Bytes) -> Result<Self, ReaderError> {
        Self::from_bytes_with_config(data, ReaderConfig::default())
    }

    /// Open an in-memory dataset with custom configuration.
    pub fn from_bytes_with_config(
        data: Bytes,
        config: ReaderConfig,
    ) -> Result<Self, ReaderError> {
        let metadata = Self::load_footer(&data, "<memory>".to_string())?;
        Ok(Self::from_parts(ReaderSource::Memory(data), metadata, config))
    }

    fn load_footer<T: parquet::file::reader::ChunkReader>(
        reader: &T,
        what: String,
    ) -> Result<ArrowReaderMetadata, ReaderError> {
        ArrowReaderMetadata::load(reader, ArrowReaderOptions::default()).map_err(|e| {
            ReaderError::DatasetUnavailable {
                reason: format!("{} is not a readable Parquet file: {}", what, e),
            }
        })
    }

    fn from_parts(source: ReaderSource, metadata: ArrowReaderMetadata, config: ReaderConfig) -> Self {
        let schema = DatasetSchema::from_arrow(metadata.schema());
        Self {
            source,
            metadata,
            schema,
            config,
        }
    }
}
