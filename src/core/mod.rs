//! Core types for log-export.
//!
//! `schema` holds the column layout and the record/batch model shared by the
//! pipeline stages; `config` holds the user-facing configuration surface.

pub mod config;
pub mod schema;

// Re-export key types for convenience
pub use config::{ConfigOverrides, ExportConfig};
pub use schema::{
    ColumnSpec, ExportBatch, FieldSpec, NormalizedRecord, RawDocument, SchemaKind,
    TIMESTAMP_FORMAT,
};
