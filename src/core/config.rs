//! Export configuration.
//!
//! Values come from an optional TOML file (every key optional) and are then
//! overridden by command-line flags. [`ExportConfig::default`] matches the
//! nginx access-log export of the last seven days.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use serde::Deserialize;

use crate::source::{LookbackWindow, SearchQuery};
use crate::{ExportError, ExportResult};

use super::schema::{ColumnSpec, DEFAULT_TIMESTAMP_FIELD, FieldSpec, SchemaKind};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:9200";
pub const DEFAULT_INDEX: &str = "cluster_foo-*";
pub const DEFAULT_TIMEZONE: &str = "Europe/Istanbul";
const ACCESS_LOG_PREFIX: &str = "kibana_logs";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Base URL of the search cluster
    pub endpoint: String,
    /// Index name or pattern to query
    pub index: String,
    pub schema: SchemaKind,
    /// IANA time zone for the timestamp column and the file name
    pub timezone: String,
    pub lookback_days: u32,
    /// Round the query window to whole days
    pub day_aligned: bool,
    pub timestamp_field: String,
    /// File name prefix; derived from the schema when unset
    pub prefix: Option<String>,
    pub output_dir: PathBuf,
    /// Fixed output path, bypassing the derived file name
    pub output: Option<PathBuf>,
    pub page_size: usize,
    pub scroll_keep_alive: String,
    /// Per-request timeout in seconds; 0 waits indefinitely
    pub timeout_secs: u64,
    pub api_key: Option<String>,
    /// Columns for `schema = "custom"`
    pub columns: Vec<ColumnSpec>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            index: DEFAULT_INDEX.to_string(),
            schema: SchemaKind::AccessLog,
            timezone: DEFAULT_TIMEZONE.to_string(),
            lookback_days: 7,
            day_aligned: false,
            timestamp_field: DEFAULT_TIMESTAMP_FIELD.to_string(),
            prefix: None,
            output_dir: PathBuf::from("."),
            output: None,
            page_size: 1000,
            scroll_keep_alive: "2m".to_string(),
            timeout_secs: 30,
            api_key: None,
            columns: Vec::new(),
        }
    }
}

/// Command-line values layered over the file configuration. `None` keeps the
/// file (or default) value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub endpoint: Option<String>,
    pub index: Option<String>,
    pub schema: Option<SchemaKind>,
    pub timezone: Option<String>,
    pub lookback_days: Option<u32>,
    pub day_aligned: Option<bool>,
    pub prefix: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

impl ExportConfig {
    pub fn from_toml_str(s: &str) -> ExportResult<Self> {
        toml::from_str(s).map_err(|e| ExportError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> ExportResult<Self> {
        let s = std::fs::read_to_string(path).map_err(|e| {
            ExportError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&s)
    }

    /// Load `path` when given, otherwise start from the defaults.
    pub fn load_or_default(path: Option<&Path>) -> ExportResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(v) = overrides.endpoint {
            self.endpoint = v;
        }
        if let Some(v) = overrides.index {
            self.index = v;
        }
        if let Some(v) = overrides.schema {
            self.schema = v;
        }
        if let Some(v) = overrides.timezone {
            self.timezone = v;
        }
        if let Some(v) = overrides.lookback_days {
            self.lookback_days = v;
        }
        if let Some(v) = overrides.day_aligned {
            self.day_aligned = v;
        }
        if let Some(v) = overrides.prefix {
            self.prefix = Some(v);
        }
        if let Some(v) = overrides.output_dir {
            self.output_dir = v;
        }
        if let Some(v) = overrides.output {
            self.output = Some(v);
        }
        self
    }

    pub fn validate(&self) -> ExportResult<()> {
        if self.endpoint.trim().is_empty() {
            return Err(ExportError::Config("endpoint must not be empty".into()));
        }
        if self.index.trim().is_empty() {
            return Err(ExportError::Config("index must not be empty".into()));
        }
        if self.lookback_days == 0 {
            return Err(ExportError::Config("lookback_days must be at least 1".into()));
        }
        if self.page_size == 0 {
            return Err(ExportError::Config("page_size must be at least 1".into()));
        }
        if self.schema == SchemaKind::Custom && self.columns.is_empty() {
            return Err(ExportError::Config(
                "schema \"custom\" needs at least one [[columns]] entry".into(),
            ));
        }
        self.time_zone()?;
        Ok(())
    }

    pub fn time_zone(&self) -> ExportResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| ExportError::Config(format!("unknown time zone {:?}: {e}", self.timezone)))
    }

    /// Column layout for the selected schema.
    pub fn field_spec(&self) -> ExportResult<FieldSpec> {
        let spec = match self.schema {
            SchemaKind::AccessLog => FieldSpec::access_log(),
            SchemaKind::MessageLog => FieldSpec::message_log(),
            SchemaKind::Custom => {
                if self.columns.is_empty() {
                    return Err(ExportError::Config("custom schema has no columns".into()));
                }
                FieldSpec::new(self.columns.clone())
            }
        };
        Ok(spec.with_timestamp_field(self.timestamp_field.clone()))
    }

    /// Explicit prefix, or `kibana_logs` for access logs and `logs_<index>`
    /// for everything else.
    pub fn file_prefix(&self) -> String {
        match (&self.prefix, self.schema) {
            (Some(p), _) => p.clone(),
            (None, SchemaKind::AccessLog) => ACCESS_LOG_PREFIX.to_string(),
            (None, _) => format!("logs_{}", self.index),
        }
    }

    pub fn lookback(&self) -> LookbackWindow {
        LookbackWindow {
            days: self.lookback_days,
            day_aligned: self.day_aligned,
        }
    }

    pub fn search_query(&self) -> SearchQuery {
        SearchQuery::new(self.index.clone(), self.lookback())
            .with_timestamp_field(self.timestamp_field.clone())
    }

    /// Per-request timeout; `timeout_secs = 0` disables it.
    pub fn timeout(&self) -> Option<Duration> {
        match self.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
