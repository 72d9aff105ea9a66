//! Replaying source for testing.

use std::sync::Mutex;

use serde_json::Value;

use crate::core::schema::RawDocument;
use crate::{ExportError, ExportResult};

use super::traits::{DocumentSource, DocumentStream, SearchQuery};

/// Configuration for replayed responses.
#[derive(Debug, Clone, Default)]
pub struct ReplayConfig {
    /// Name to report
    pub name: String,
    /// Documents returned, in order
    pub documents: Vec<RawDocument>,
    /// Whether `open` should fail
    pub open_fails: bool,
    /// Break the stream after this many documents
    pub fail_after: Option<usize>,
}

impl ReplayConfig {
    pub fn new(name: impl Into<String>) -> Self {
        ReplayConfig {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append document bodies without ids.
    pub fn with_bodies(mut self, bodies: impl IntoIterator<Item = Value>) -> Self {
        self.documents
            .extend(bodies.into_iter().map(RawDocument::new));
        self
    }

    pub fn with_document(mut self, doc: RawDocument) -> Self {
        self.documents.push(doc);
        self
    }

    /// Make `open` fail.
    pub fn open_fails(mut self) -> Self {
        self.open_fails = true;
        self
    }

    /// Make the stream yield an error after `n` documents.
    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }
}

/// Source that replays a fixed document sequence and records the queries it
/// was opened with.
pub struct ReplaySource {
    config: ReplayConfig,
    queries: Mutex<Vec<SearchQuery>>,
}

impl ReplaySource {
    pub fn new(config: ReplayConfig) -> Self {
        ReplaySource {
            config,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn from_bodies(bodies: impl IntoIterator<Item = Value>) -> Self {
        Self::new(ReplayConfig::new("replay").with_bodies(bodies))
    }

    /// Queries passed to `open`, oldest first.
    pub fn queries(&self) -> Vec<SearchQuery> {
        self.queries
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }
}

impl DocumentSource for ReplaySource {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn endpoint(&self) -> &str {
        "replay://"
    }

    fn open(&self, query: &SearchQuery) -> ExportResult<DocumentStream<'_>> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.clone());
        }
        if self.config.open_fails {
            return Err(ExportError::SourceUnavailable {
                endpoint: self.endpoint().to_string(),
                reason: "replay open failed".into(),
            });
        }

        let docs = self
            .config
            .documents
            .iter()
            .cloned()
            .map(Ok::<RawDocument, ExportError>);
        match self.config.fail_after {
            Some(n) => {
                let broken = ExportError::SourceUnavailable {
                    endpoint: self.endpoint().to_string(),
                    reason: format!("replay stream broke after {n} documents"),
                };
                Ok(Box::new(docs.take(n).chain(std::iter::once(Err(broken)))))
            }
            None => Ok(Box::new(docs)),
        }
    }
}
