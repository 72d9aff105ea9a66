use serde_json::Value;
use tracing::warn;

use crate::ExportResult;
use crate::core::ExportConfig;
use crate::engine::{ExportJob, ExportSummary, RecordNormalizer, run_export};
use crate::source::elasticsearch::search_body;
use crate::source::{DocumentSource, ElasticsearchConfig, ElasticsearchSource};

/// Build the pipeline settings described by `config`.
pub fn build_job(config: &ExportConfig) -> ExportResult<ExportJob> {
    config.validate()?;
    let normalizer = RecordNormalizer::new(config.field_spec()?, config.time_zone()?);
    Ok(ExportJob::new(normalizer, config.file_prefix())
        .with_output_dir(config.output_dir.clone())
        .with_output(config.output.clone()))
}

/// Run an export against an already-constructed source.
pub fn run_with_source(
    config: &ExportConfig,
    source: &dyn DocumentSource,
) -> ExportResult<ExportSummary> {
    let job = build_job(config)?;
    let summary = run_export(source, &config.search_query(), &job)?;
    if summary.earliest.is_none() || summary.latest.is_none() {
        warn!("no document carried a usable timestamp; file name has no date range");
    }
    Ok(summary)
}

/// Run an export against the configured search cluster.
pub fn run(config: &ExportConfig) -> ExportResult<ExportSummary> {
    config.validate()?;
    let source = ElasticsearchSource::new(ElasticsearchConfig::from(config));
    run_with_source(config, &source)
}

/// The initial search request body `run` would send.
pub fn query_body(config: &ExportConfig) -> ExportResult<Value> {
    config.validate()?;
    Ok(search_body(&config.search_query(), config.page_size))
}
