//! Column layouts and the record/batch model.

use chrono::{DateTime, NaiveDateTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::NOT_AVAILABLE;

/// Layout of the formatted timestamp column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Source field holding the event time in search documents.
pub const DEFAULT_TIMESTAMP_FIELD: &str = "@timestamp";

/// Output name of the leading timestamp column.
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// One output column: header name, source field path, and the text written
/// when the field is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub source: String,
    #[serde(default = "default_cell")]
    pub default: String,
}

fn default_cell() -> String {
    NOT_AVAILABLE.to_string()
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        ColumnSpec {
            name: name.into(),
            source: source.into(),
            default: default_cell(),
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = default.into();
        self
    }
}

/// Which built-in column layout to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaKind {
    /// nginx access-log fields
    #[default]
    AccessLog,
    /// free-text `message` field
    MessageLog,
    /// columns listed in the config file
    Custom,
}

impl std::fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaKind::AccessLog => write!(f, "access-log"),
            SchemaKind::MessageLog => write!(f, "message-log"),
            SchemaKind::Custom => write!(f, "custom"),
        }
    }
}

/// Ordered column layout for one export type.
///
/// The timestamp column always comes first; `columns` follow in the order
/// they were configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    timestamp: ColumnSpec,
    columns: Vec<ColumnSpec>,
}

impl FieldSpec {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        FieldSpec {
            timestamp: ColumnSpec::new(TIMESTAMP_COLUMN, DEFAULT_TIMESTAMP_FIELD),
            columns,
        }
    }

    /// nginx access-log layout.
    pub fn access_log() -> Self {
        Self::new(
            [
                ("referrer", "nginx.referrer"),
                ("path", "nginx.path"),
                ("remote", "nginx.remote"),
                ("request_length", "nginx.request_length"),
                ("upstream_status", "nginx.upstream_status"),
                ("request_time", "nginx.request_time"),
                ("upstream_response_length", "nginx.upstream_response_length"),
            ]
            .into_iter()
            .map(|(name, source)| ColumnSpec::new(name, source))
            .collect(),
        )
    }

    /// Single free-text message layout.
    pub fn message_log() -> Self {
        Self::new(vec![ColumnSpec::new("log_message", "message")])
    }

    /// Read the event time from `field` instead of `@timestamp`.
    pub fn with_timestamp_field(mut self, field: impl Into<String>) -> Self {
        self.timestamp.source = field.into();
        self
    }

    pub fn timestamp(&self) -> &ColumnSpec {
        &self.timestamp
    }

    /// Non-timestamp columns, in output order.
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Header row: the timestamp column followed by every configured column.
    pub fn headers(&self) -> Vec<&str> {
        std::iter::once(self.timestamp.name.as_str())
            .chain(self.columns.iter().map(|c| c.name.as_str()))
            .collect()
    }

    /// Number of cells in an output row.
    pub fn width(&self) -> usize {
        self.columns.len() + 1
    }
}

/// One document as delivered by a search source.
///
/// `body` is the document's stored source and is usually an object, but
/// nothing guarantees it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub id: Option<String>,
    pub body: Value,
}

impl RawDocument {
    pub fn new(body: Value) -> Self {
        RawDocument { id: None, body }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Identifier used in diagnostics.
    pub fn label(&self) -> &str {
        self.id.as_deref().unwrap_or("<no id>")
    }
}

/// A document reduced to its export columns. Absent values stay `None` until
/// serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    timestamp: Option<DateTime<Tz>>,
    cells: Vec<Option<String>>,
}

impl NormalizedRecord {
    /// `timestamp` is expected to carry whole seconds only.
    pub fn new(timestamp: Option<DateTime<Tz>>, cells: Vec<Option<String>>) -> Self {
        NormalizedRecord { timestamp, cells }
    }

    pub fn timestamp(&self) -> Option<&DateTime<Tz>> {
        self.timestamp.as_ref()
    }

    pub fn cells(&self) -> &[Option<String>] {
        &self.cells
    }

    /// Local wall-clock time as shown in the timestamp column. `None` orders
    /// before every real time.
    pub fn sort_key(&self) -> Option<NaiveDateTime> {
        self.timestamp.map(|t| t.naive_local())
    }

    pub fn formatted_timestamp(&self) -> Option<String> {
        self.timestamp
            .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
    }
}

/// All records produced by one run, with the observed time range.
#[derive(Debug, Clone, Default)]
pub struct ExportBatch {
    records: Vec<NormalizedRecord>,
    earliest: Option<DateTime<Tz>>,
    latest: Option<DateTime<Tz>>,
    skipped: usize,
    missing_fields: usize,
}

impl ExportBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record and widen the tracked time range.
    pub fn push(&mut self, record: NormalizedRecord) {
        if let Some(ts) = record.timestamp {
            if self.earliest.is_none_or(|e| ts < e) {
                self.earliest = Some(ts);
            }
            if self.latest.is_none_or(|l| ts > l) {
                self.latest = Some(ts);
            }
        }
        self.records.push(record);
    }

    pub fn note_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn note_missing_fields(&mut self, count: usize) {
        self.missing_fields += count;
    }

    /// Stable ascending sort on the timestamp column; untimed records first.
    pub fn sort(&mut self) {
        self.records.sort_by_key(NormalizedRecord::sort_key);
    }

    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn earliest(&self) -> Option<&DateTime<Tz>> {
        self.earliest.as_ref()
    }

    pub fn latest(&self) -> Option<&DateTime<Tz>> {
        self.latest.as_ref()
    }

    /// Documents dropped because they could not be normalized.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Field lookups that fell back to a column default.
    pub fn missing_fields(&self) -> usize {
        self.missing_fields
    }
}
