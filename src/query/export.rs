use crate::filter::{FilterEvaluator, FilterSpec};
use crate::record::MatchRecord;

use super::{QueryEngine, QueryError};

/// Fixed header row of every export.
pub const EXPORT_HEADER: [&str; 6] = [
    "Name",
    "Type",
    "Species",
    "Vesicle Type",
    "Isolation Method",
    "Year",
];

/// A finished export: CSV bytes plus the truncation signal.
#[derive(Debug, Clone)]
pub struct Export {
    /// CSV bytes, header row included
    pub data: Vec<u8>,
    /// Number of data rows written (excluding the header)
    pub rows: usize,
    /// True when the row cap cut the export short. Truncation is silent -
    /// the export is still a success - but the caller must be able to tell.
    pub truncated: bool,
}

impl QueryEngine {
    /// Export every match as CSV, ignoring pagination, up to the configured
    /// row cap.
    ///
    /// Once the cap is reached the scan stops at the next match - no further
    /// row groups are read - and [`Export::truncated`] is set. A filter
    /// matching exactly the cap exports every row untruncated.
    pub fn export(&self, spec: &FilterSpec) -> Result<Export, QueryError> {
        let evaluator = FilterEvaluator::new(spec, &self.mapping, &self.ontology);
        let projection = self.scan_projection(&evaluator);
        let cap = self.config.export_cap;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(EXPORT_HEADER)?;

        let mut rows = 0usize;
        let mut truncated = false;
        for row in self.reader.rows(&projection)? {
            let row = row?;
            if !evaluator.matches(&row) {
                continue;
            }
            if rows >= cap {
                truncated = true;
                break;
            }
            let record = MatchRecord::from_row(&row, &self.mapping);
            writer.write_record([
                record.name.as_str(),
                record.molecule_type.as_str(),
                record.species.as_str(),
                record.vesicle_type.as_str(),
                record.isolation_method.as_str(),
                record.year.as_str(),
            ])?;
            rows += 1;
        }

        if truncated {
            log::warn!("export truncated at the {} row cap", cap);
        }

        let data = writer
            .into_inner()
            .map_err(|e| QueryError::Export(e.to_string()))?;

        Ok(Export {
            data,
            rows,
            truncated,
        })
    }
}
