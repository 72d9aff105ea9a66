//! Engine module: the log export pipeline.
//!
//! # Stages
//!
//! - **normalize**: raw documents to [`NormalizedRecord`](crate::core::NormalizedRecord)s
//!   (timestamp conversion, field extraction with defaults).
//! - **filename**: output name from the batch's observed time range.
//! - **workflow**: drives a [`DocumentSource`](crate::source::DocumentSource)
//!   through normalization, sorting, and CSV output.

pub mod filename;
pub mod normalize;
pub mod workflow;

// Re-export key types for convenience
pub use filename::{derive_filename, resolve_output_path, sanitize_prefix};
pub use normalize::{Normalized, RecordError, RecordNormalizer, parse_timestamp};
pub use workflow::{ExportJob, ExportSummary, collect_batch, run_export, write_batch};
