//! Source trait and the query description it receives.

use serde_json::{Value, json};

use crate::ExportResult;
use crate::core::schema::{DEFAULT_TIMESTAMP_FIELD, RawDocument};

/// Relative time range ending now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookbackWindow {
    pub days: u32,
    /// Round both ends down to midnight
    pub day_aligned: bool,
}

impl Default for LookbackWindow {
    fn default() -> Self {
        LookbackWindow {
            days: 7,
            day_aligned: false,
        }
    }
}

impl LookbackWindow {
    /// Lower (inclusive) and upper (exclusive) bound in date-math syntax.
    pub fn bounds(&self) -> (String, String) {
        if self.day_aligned {
            (format!("now-{}d/d", self.days), "now/d".to_string())
        } else {
            (format!("now-{}d", self.days), "now".to_string())
        }
    }
}

/// What to fetch: an index selector plus a time-range filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub index: String,
    pub timestamp_field: String,
    pub window: LookbackWindow,
}

impl SearchQuery {
    pub fn new(index: impl Into<String>, window: LookbackWindow) -> Self {
        SearchQuery {
            index: index.into(),
            timestamp_field: DEFAULT_TIMESTAMP_FIELD.to_string(),
            window,
        }
    }

    pub fn with_timestamp_field(mut self, field: impl Into<String>) -> Self {
        self.timestamp_field = field.into();
        self
    }

    /// The `range` query clause selecting the lookback window.
    pub fn range_filter(&self) -> Value {
        let (gte, lt) = self.window.bounds();
        json!({
            "range": {
                self.timestamp_field.as_str(): { "gte": gte, "lt": lt }
            }
        })
    }
}

/// Forward-only, finite sequence of documents. An `Err` item means the
/// stream broke and no further items follow.
pub type DocumentStream<'a> = Box<dyn Iterator<Item = ExportResult<RawDocument>> + 'a>;

/// A search service able to stream the documents matching a query.
///
/// `open` failing means the source is unavailable; the caller treats that as
/// fatal. Pagination is the implementation's business.
pub trait DocumentSource: Send + Sync {
    /// Short name for diagnostics (e.g., "elasticsearch", "replay").
    fn name(&self) -> &str;

    /// Where documents come from, for error messages.
    fn endpoint(&self) -> &str;

    fn open(&self, query: &SearchQuery) -> ExportResult<DocumentStream<'_>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_window_bounds() {
        let w = LookbackWindow::default();
        assert_eq!(w.bounds(), ("now-7d".to_string(), "now".to_string()));
    }

    #[test]
    fn test_day_aligned_bounds() {
        let w = LookbackWindow {
            days: 3,
            day_aligned: true,
        };
        assert_eq!(w.bounds(), ("now-3d/d".to_string(), "now/d".to_string()));
    }

    #[test]
    fn test_range_filter_uses_timestamp_field() {
        let q = SearchQuery::new("logs-*", LookbackWindow::default())
            .with_timestamp_field("event.created");
        assert_eq!(
            q.range_filter(),
            json!({"range": {"event.created": {"gte": "now-7d", "lt": "now"}}})
        );
    }
}
