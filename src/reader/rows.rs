use std::fs::File;
use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};
use parquet::arrow::ProjectionMask;

use super::config::ReaderSource;
use super::{EvMetadataReader, ReaderError};

/// Named subset of dataset columns to decode during a scan.
///
/// Names that do not exist in the dataset are ignored. An empty projection
/// (or one where nothing resolved) falls back to decoding every column, so a
/// degenerate query still scans rather than failing.
#[derive(Debug, Clone, Default)]
pub struct Projection {
    columns: Vec<String>,
    all: bool,
}

impl Projection {
    /// Project the named columns.
    pub fn of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut columns: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !columns.contains(&name) {
                columns.push(name);
            }
        }
        Self {
            columns,
            all: false,
        }
    }

    /// Project every column.
    pub fn all() -> Self {
        Self {
            columns: Vec::new(),
            all: true,
        }
    }

    /// The requested column names (empty when projecting all).
    pub fn names(&self) -> &[String] {
        &self.columns
    }

    fn resolve(&self, schema: &crate::schema::DatasetSchema) -> Vec<usize> {
        if self.all {
            return (0..schema.len()).collect();
        }
        let resolved: Vec<usize> = schema
            .column_names()
            .enumerate()
            .filter(|(_, name)| self.columns.iter().any(|c| c == name))
            .map(|(i, _)| i)
            .collect();
        if resolved.is_empty() {
            log::debug!("projection resolved no columns; decoding all");
            (0..schema.len()).collect()
        } else {
            resolved
        }
    }
}

/// One decoded row: the projected column names and their stringified values.
///
/// Values are `None` for null cells. Nothing here references the underlying
/// Arrow buffers; a `ScanRow` is safe to hold past the batch it came from.
#[derive(Debug, Clone)]
pub struct ScanRow {
    columns: Arc<[String]>,
    values: Vec<Option<String>>,
}

impl ScanRow {
    /// The stringified value of `column`, or `None` if the column is not in
    /// the projection or the cell is null.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values[i].as_deref())
    }

    /// Iterate over (column, value) pairs in projection order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Option::as_deref))
    }

    /// The row's non-null values concatenated into one lowercased haystack,
    /// for whole-record substring matching.
    pub fn concat_text(&self) -> String {
        self.values
            .iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<&str>>()
            .join(" ")
            .to_lowercase()
    }

    #[cfg(test)]
    pub(crate) fn for_test(columns: Vec<&str>, values: Vec<Option<&str>>) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            values: values.into_iter().map(|v| v.map(str::to_string)).collect(),
        }
    }
}

/// Lazy, single-pass row iterator over the dataset.
///
/// Advances one row group at a time in on-disk order, decoding only the
/// projected columns. Dropping the iterator cancels all remaining row-group
/// reads, so a caller that stops early never pays for the rest of the file.
pub struct RowIter<'a> {
    reader: &'a EvMetadataReader,
    mask: ProjectionMask,
    columns: Arc<[String]>,
    num_groups: usize,
    next_group: usize,
    current_group: usize,
    current: Option<ParquetRecordBatchReader>,
    batch: Option<(RecordBatch, usize)>,
    failed_groups: usize,
    emitted_any: bool,
    error_emitted: bool,
}

impl EvMetadataReader {
    /// Start a fresh scan decoding the projected columns.
    ///
    /// Each call is an independent pass; scans never share state. Rows are
    /// yielded in dataset order (row-group index, then within-group row
    /// order), the ordering pagination depends on.
    pub fn rows(&self, projection: &Projection) -> Result<RowIter<'_>, ReaderError> {
        let indices = projection.resolve(&self.schema);
        let schema_descr = self.metadata.metadata().file_metadata().schema_descr();
        let mask = ProjectionMask::roots(schema_descr, indices.iter().copied());
        let columns: Arc<[String]> = self
            .schema
            .columns()
            .iter()
            .enumerate()
            .filter(|(i, _)| indices.contains(i))
            .map(|(_, (name, _))| name.clone())
            .collect();

        Ok(RowIter {
            reader: self,
            mask,
            columns,
            num_groups: self.num_row_groups(),
            next_group: 0,
            current_group: 0,
            current: None,
            batch: None,
            failed_groups: 0,
            emitted_any: false,
            error_emitted: false,
        })
    }
}

impl RowIter<'_> {
    fn open_group(&self, group: usize) -> Result<ParquetRecordBatchReader, ReaderError> {
        let metadata = self.reader.metadata.clone();
        let batch_size = self.reader.config.batch_size;
        let reader = match &self.reader.source {
            ReaderSource::FilePath(path) => {
                let file = File::open(path)?;
                ParquetRecordBatchReaderBuilder::new_with_metadata(file, metadata)
                    .with_projection(self.mask.clone())
                    .with_batch_size(batch_size)
                    .with_row_groups(vec![group])
                    .build()?
            }
            ReaderSource::Memory(bytes) => {
                ParquetRecordBatchReaderBuilder::new_with_metadata(bytes.clone(), metadata)
                    .with_projection(self.mask.clone())
                    .with_batch_size(batch_size)
                    .with_row_groups(vec![group])
                    .build()?
            }
        };
        Ok(reader)
    }

    fn decode_row(&self, batch: &RecordBatch, row: usize) -> ScanRow {
        let values = (0..batch.num_columns())
            .map(|ci| {
                let column = batch.column(ci);
                if column.is_null(row) {
                    None
                } else {
                    array_value_to_string(column, row).ok()
                }
            })
            .collect();
        ScanRow {
            columns: Arc::clone(&self.columns),
            values,
        }
    }
}

impl Iterator for RowIter<'_> {
    type Item = Result<ScanRow, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // Drain the current batch first
            if let Some((batch, cursor)) = self.batch.take() {
                if cursor < batch.num_rows() {
                    let decoded = self.decode_row(&batch, cursor);
                    self.batch = Some((batch, cursor + 1));
                    self.emitted_any = true;
                    return Some(Ok(decoded));
                }
            }

            // Pull the next batch from the current row group
            if let Some(reader) = &mut self.current {
                match reader.next() {
                    Some(Ok(batch)) => {
                        self.batch = Some((batch, 0));
                        continue;
                    }
                    Some(Err(e)) => {
                        log::warn!(
                            "row group {} failed to decode, skipping rest of chunk: {}",
                            self.current_group,
                            e
                        );
                        self.failed_groups += 1;
                        self.current = None;
                        continue;
                    }
                    None => {
                        self.current = None;
                        continue;
                    }
                }
            }

            // Advance to the next row group, or finish
            if self.next_group >= self.num_groups {
                if self.num_groups > 0
                    && self.failed_groups == self.num_groups
                    && !self.emitted_any
                    && !self.error_emitted
                {
                    self.error_emitted = true;
                    return Some(Err(ReaderError::NoReadableRowGroups));
                }
                return None;
            }
            let group = self.next_group;
            self.next_group += 1;
            self.current_group = group;
            match self.open_group(group) {
                Ok(reader) => self.current = Some(reader),
                Err(e) => {
                    log::warn!("skipping unreadable row group {}: {}", group, e);
                    self.failed_groups += 1;
                }
            }
        }
    }
}
