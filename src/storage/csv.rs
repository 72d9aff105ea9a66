//! CSV export for normalized log records.

use std::io::Write;
use std::path::Path;

use crate::core::schema::{ExportBatch, FieldSpec, NormalizedRecord};
use crate::{ExportError, ExportResult};

/// CSV exporter for normalized records.
///
/// Writes a header naming every configured column, then one row per record in
/// the order given. Absent values are replaced by the column default here and
/// nowhere earlier.
#[derive(Debug, Clone, Default)]
pub struct CsvExporter;

impl CsvExporter {
    /// Create a new CsvExporter.
    pub fn new() -> Self {
        CsvExporter
    }

    /// Export a batch to a CSV file, creating or truncating it.
    ///
    /// An empty batch still produces a header-only file.
    ///
    /// # Errors
    /// Returns [`ExportError::Output`] if the file cannot be created or
    /// written.
    pub fn export(&self, batch: &ExportBatch, spec: &FieldSpec, output: &Path) -> ExportResult<()> {
        let output_err = |source: std::io::Error| ExportError::Output {
            path: output.to_path_buf(),
            source,
        };

        // Ensure parent directory exists
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(output_err)?;
            }
        }

        let file = std::fs::File::create(output).map_err(output_err)?;
        self.write_records(batch.records(), spec, file)
            .map_err(|e| output_err(e.into()))
    }

    /// Export records to any writer implementing Write.
    ///
    /// # Errors
    /// Returns an error if CSV writing fails.
    pub fn export_to_writer<W: Write>(
        &self,
        records: &[NormalizedRecord],
        spec: &FieldSpec,
        writer: W,
    ) -> ExportResult<()> {
        self.write_records(records, spec, writer)
            .map_err(|e| ExportError::Message(format!("failed to write CSV: {e}")))
    }

    fn write_records<W: Write>(
        &self,
        records: &[NormalizedRecord],
        spec: &FieldSpec,
        writer: W,
    ) -> csv::Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::CRLF)
            .from_writer(writer);

        csv_writer.write_record(spec.headers())?;
        for record in records {
            csv_writer.write_record(self.record_to_row(record, spec))?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Convert a record to a row of CSV values.
    fn record_to_row(&self, record: &NormalizedRecord, spec: &FieldSpec) -> Vec<String> {
        let mut row = Vec::with_capacity(spec.width());
        row.push(
            record
                .formatted_timestamp()
                .unwrap_or_else(|| spec.timestamp().default.clone()),
        );
        for (column, cell) in spec.columns().iter().zip(record.cells()) {
            row.push(cell.clone().unwrap_or_else(|| column.default.clone()));
        }
        row
    }
}
