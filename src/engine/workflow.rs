//! End-to-end export workflow.
//!
//! Open the source, normalize every document into an [`ExportBatch`], sort
//! it, derive the file name from the observed time range, and write the CSV.
//! A document that cannot be normalized is logged and dropped; only a broken
//! source or a failed write ends the run early.

use std::path::PathBuf;

use chrono::DateTime;
use chrono_tz::Tz;
use tracing::{debug, error, info, warn};

use crate::ExportResult;
use crate::core::schema::{ExportBatch, RawDocument};
use crate::source::{DocumentSource, SearchQuery};
use crate::storage::CsvExporter;

use super::filename::{derive_filename, resolve_output_path};
use super::normalize::{RecordError, RecordNormalizer};

/// Everything the pipeline needs besides the source and query.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub normalizer: RecordNormalizer,
    /// File name prefix
    pub prefix: String,
    /// Directory for the derived file name
    pub output_dir: PathBuf,
    /// Fixed destination overriding the derived name
    pub output: Option<PathBuf>,
}

impl ExportJob {
    pub fn new(normalizer: RecordNormalizer, prefix: impl Into<String>) -> Self {
        ExportJob {
            normalizer,
            prefix: prefix.into(),
            output_dir: PathBuf::from("."),
            output: None,
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    /// Where a finished batch will be written.
    pub fn destination(&self, batch: &ExportBatch) -> PathBuf {
        let derived = derive_filename(&self.prefix, batch.earliest(), batch.latest());
        resolve_output_path(&self.output_dir, self.output.as_deref(), &derived)
    }
}

/// Outcome of a completed export.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub rows: usize,
    pub skipped: usize,
    pub missing_fields: usize,
    pub earliest: Option<DateTime<Tz>>,
    pub latest: Option<DateTime<Tz>>,
}

/// Normalize a document stream into a batch.
///
/// Missing fields are warned about and defaulted; documents that fail to
/// normalize are logged and skipped. An `Err` from the stream itself aborts.
pub fn collect_batch<I>(documents: I, normalizer: &RecordNormalizer) -> ExportResult<ExportBatch>
where
    I: IntoIterator<Item = ExportResult<RawDocument>>,
{
    let mut batch = ExportBatch::new();
    for item in documents {
        let doc = item?;
        match normalizer.normalize(&doc) {
            Ok(normalized) => {
                for column in &normalized.missing {
                    warn!(document = doc.label(), column = %column, "missing expected field, using default");
                }
                batch.note_missing_fields(normalized.missing.len());
                batch.push(normalized.record);
            }
            Err(e @ RecordError::MalformedTimestamp { .. }) => {
                warn!(document = doc.label(), error = %e, "skipping document");
                batch.note_skipped();
            }
            Err(e) => {
                error!(document = doc.label(), error = %e, "error processing document, skipping");
                batch.note_skipped();
            }
        }
    }
    Ok(batch)
}

/// Sort `batch` and write it to its derived (or fixed) destination.
pub fn write_batch(batch: &mut ExportBatch, job: &ExportJob) -> ExportResult<PathBuf> {
    batch.sort();
    let path = job.destination(batch);
    CsvExporter::new().export(batch, job.normalizer.spec(), &path)?;
    Ok(path)
}

/// Run one complete export against `source`.
pub fn run_export(
    source: &dyn DocumentSource,
    query: &SearchQuery,
    job: &ExportJob,
) -> ExportResult<ExportSummary> {
    info!(
        source = source.name(),
        endpoint = source.endpoint(),
        index = %query.index,
        "fetching documents"
    );
    let stream = source.open(query)?;
    let mut batch = collect_batch(stream, &job.normalizer)?;
    debug!(
        records = batch.len(),
        skipped = batch.skipped(),
        "normalization finished"
    );

    let path = write_batch(&mut batch, job)?;
    info!(
        path = %path.display(),
        rows = batch.len(),
        skipped = batch.skipped(),
        missing_fields = batch.missing_fields(),
        "CSV file with sorted logs has been created"
    );

    Ok(ExportSummary {
        path,
        rows: batch.len(),
        skipped: batch.skipped(),
        missing_fields: batch.missing_fields(),
        earliest: batch.earliest().copied(),
        latest: batch.latest().copied(),
    })
}
