//! Turns raw documents into [`NormalizedRecord`]s.
//!
//! Timestamps are parsed as UTC, converted to the configured zone, and cut to
//! whole seconds. Other columns are looked up by field path and rendered as
//! text. Absent values stay `None`; the CSV writer substitutes the column
//! default.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound, Utc};
use chrono_tz::Tz;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::NOT_AVAILABLE;
use crate::core::schema::{FieldSpec, NormalizedRecord, RawDocument};

/// Why a single document could not be normalized. The document is dropped;
/// the run continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("document body is not an object")]
    NotAnObject,
    #[error("timestamp field {field:?} holds non-text value {value}")]
    TimestampNotText { field: String, value: String },
    #[error("malformed timestamp {value:?} in field {field:?}")]
    MalformedTimestamp { field: String, value: String },
}

/// A normalized record plus the columns that fell back to their default.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub record: NormalizedRecord,
    pub missing: Vec<String>,
}

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 timestamp.
///
/// Accepts full RFC 3339, minute precision (`2024-11-01T07:00Z`) and bare
/// dates (`2024-11-01`, midnight). Offset-less values are taken as UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    // chrono's `%:z` wants a numeric offset.
    let zulu = text
        .strip_suffix(['Z', 'z'])
        .map(|rest| format!("{rest}+00:00"));
    let with_offset = zulu.as_deref().unwrap_or(text);
    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(with_offset, fmt).ok())
    {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

/// Find `path` in `body`: first as a literal key (flattened documents), then
/// by walking dot-separated segments through nested objects.
pub fn lookup<'a>(body: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    if let Some(v) = body.get(path) {
        return Some(v);
    }
    let mut segments = path.split('.');
    let mut current = body.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Cell text for a JSON value. `null` renders empty; containers render as
/// compact JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct RecordNormalizer {
    spec: FieldSpec,
    tz: Tz,
}

impl RecordNormalizer {
    pub fn new(spec: FieldSpec, tz: Tz) -> Self {
        RecordNormalizer { spec, tz }
    }

    pub fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    pub fn time_zone(&self) -> Tz {
        self.tz
    }

    /// Local time for a raw timestamp value, or `None` when it is absent,
    /// `null`, or the literal placeholder.
    pub fn normalize_timestamp(
        &self,
        field: &str,
        raw: Option<&Value>,
    ) -> Result<Option<DateTime<Tz>>, RecordError> {
        match raw {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s == NOT_AVAILABLE => Ok(None),
            Some(Value::String(s)) => parse_timestamp(s)
                .map(|utc| Some(utc.with_timezone(&self.tz).trunc_subsecs(0)))
                .ok_or_else(|| RecordError::MalformedTimestamp {
                    field: field.to_string(),
                    value: s.clone(),
                }),
            Some(other) => Err(RecordError::TimestampNotText {
                field: field.to_string(),
                value: other.to_string(),
            }),
        }
    }

    pub fn normalize(&self, doc: &RawDocument) -> Result<Normalized, RecordError> {
        let body = doc.body.as_object().ok_or(RecordError::NotAnObject)?;
        let mut missing = Vec::new();

        let ts_column = self.spec.timestamp();
        let raw_ts = lookup(body, &ts_column.source);
        if raw_ts.is_none() {
            missing.push(ts_column.name.clone());
        }
        let timestamp = self.normalize_timestamp(&ts_column.source, raw_ts)?;

        let mut cells = Vec::with_capacity(self.spec.columns().len());
        for column in self.spec.columns() {
            match lookup(body, &column.source) {
                Some(v) => cells.push(Some(render_value(v))),
                None => {
                    missing.push(column.name.clone());
                    cells.push(None);
                }
            }
        }

        Ok(Normalized {
            record: NormalizedRecord::new(timestamp, cells),
            missing,
        })
    }
}
