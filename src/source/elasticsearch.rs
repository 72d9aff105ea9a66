//! Elasticsearch source using the scroll API.
//!
//! `open` issues the initial `_search?scroll=..` request, so connection and
//! query errors surface before any document is processed. Later pages are
//! fetched lazily as the stream is consumed, and the scroll context is
//! cleared when the stream is dropped.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::core::config::{DEFAULT_ENDPOINT, ExportConfig};
use crate::core::schema::RawDocument;
use crate::{ExportError, ExportResult};

use super::traits::{DocumentSource, DocumentStream, SearchQuery};

/// Configuration for the Elasticsearch source.
#[derive(Debug, Clone)]
pub struct ElasticsearchConfig {
    /// Base URL, e.g. `http://localhost:9200`
    pub endpoint: String,
    /// Hits per scroll page
    pub page_size: usize,
    /// How long the cluster keeps the scroll context between pages
    pub keep_alive: String,
    /// Per-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
    /// Sent as `Authorization: ApiKey <key>`
    pub api_key: Option<String>,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        ElasticsearchConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            page_size: 1000,
            keep_alive: "2m".to_string(),
            timeout: Some(Duration::from_secs(30)),
            api_key: None,
        }
    }
}

impl ElasticsearchConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        ElasticsearchConfig {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: impl Into<String>) -> Self {
        self.keep_alive = keep_alive.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }
}

impl From<&ExportConfig> for ElasticsearchConfig {
    fn from(cfg: &ExportConfig) -> Self {
        let mut es = ElasticsearchConfig::new(cfg.endpoint.clone())
            .with_page_size(cfg.page_size)
            .with_keep_alive(cfg.scroll_keep_alive.clone())
            .with_api_key(cfg.api_key.clone());
        es.timeout = cfg.timeout();
        es
    }
}

/// Body of the initial search request.
pub fn search_body(query: &SearchQuery, page_size: usize) -> Value {
    json!({
        "size": page_size,
        "sort": ["_doc"],
        "query": query.range_filter(),
    })
}

#[derive(Debug, Deserialize)]
struct ScrollPage {
    #[serde(rename = "_scroll_id")]
    scroll_id: Option<String>,
    hits: HitList,
}

#[derive(Debug, Deserialize)]
struct HitList {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_id")]
    id: Option<String>,
    #[serde(rename = "_source")]
    source: Option<Value>,
}

impl From<Hit> for RawDocument {
    fn from(hit: Hit) -> Self {
        RawDocument {
            id: hit.id,
            body: hit.source.unwrap_or(Value::Null),
        }
    }
}

/// Search cluster reachable over HTTP.
pub struct ElasticsearchSource {
    config: ElasticsearchConfig,
    agent: ureq::Agent,
}

impl ElasticsearchSource {
    pub fn new(config: ElasticsearchConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(config.timeout)
            .build()
            .into();
        ElasticsearchSource { config, agent }
    }

    pub fn config(&self) -> &ElasticsearchConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn unavailable(&self, reason: String) -> ExportError {
        ExportError::SourceUnavailable {
            endpoint: self.config.endpoint.clone(),
            reason,
        }
    }

    fn authorize<B>(&self, request: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        match &self.config.api_key {
            Some(key) => request.header("Authorization", format!("ApiKey {key}")),
            None => request,
        }
    }

    fn first_page(&self, query: &SearchQuery) -> ExportResult<ScrollPage> {
        let url = self.url(&format!("{}/_search", query.index));
        let body = search_body(query, self.config.page_size);
        debug!(%url, index = %query.index, "opening scroll");
        let request = self
            .authorize(self.agent.post(&url))
            .query("scroll", &self.config.keep_alive);
        let mut response = request
            .send_json(&body)
            .map_err(|e| self.unavailable(format!("search request failed: {e}")))?;
        response
            .body_mut()
            .read_json::<ScrollPage>()
            .map_err(|e| self.unavailable(format!("unreadable search response: {e}")))
    }

    fn next_page(&self, scroll_id: &str) -> ExportResult<ScrollPage> {
        let url = self.url("_search/scroll");
        let body = json!({ "scroll": self.config.keep_alive, "scroll_id": scroll_id });
        let mut response = self
            .authorize(self.agent.post(&url))
            .send_json(&body)
            .map_err(|e| self.unavailable(format!("scroll request failed: {e}")))?;
        response
            .body_mut()
            .read_json::<ScrollPage>()
            .map_err(|e| self.unavailable(format!("unreadable scroll response: {e}")))
    }

    fn clear_scroll(&self, scroll_id: &str) {
        let url = self.url("_search/scroll");
        let body = json!({ "scroll_id": [scroll_id] });
        let result = self
            .authorize(self.agent.delete(&url))
            .force_send_body()
            .send_json(&body);
        if let Err(e) = result {
            warn!(error = %e, "failed to clear scroll context");
        }
    }
}

impl DocumentSource for ElasticsearchSource {
    fn name(&self) -> &str {
        "elasticsearch"
    }

    fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    fn open(&self, query: &SearchQuery) -> ExportResult<DocumentStream<'_>> {
        let page = self.first_page(query)?;
        let mut pages = ScrollPages {
            source: self,
            scroll_id: None,
            buffer: Vec::new().into_iter(),
            done: false,
            fetched: 0,
        };
        pages.accept(page);
        Ok(Box::new(pages))
    }
}

/// Lazily pages through one scroll context.
struct ScrollPages<'a> {
    source: &'a ElasticsearchSource,
    scroll_id: Option<String>,
    buffer: std::vec::IntoIter<RawDocument>,
    done: bool,
    fetched: usize,
}

impl ScrollPages<'_> {
    fn accept(&mut self, page: ScrollPage) {
        if page.scroll_id.is_some() {
            self.scroll_id = page.scroll_id;
        }
        let hits = page.hits.hits;
        self.fetched += hits.len();
        debug!(hits = hits.len(), total = self.fetched, "received scroll page");
        if hits.is_empty() {
            self.done = true;
        }
        self.buffer = hits
            .into_iter()
            .map(RawDocument::from)
            .collect::<Vec<_>>()
            .into_iter();
    }
}

impl Iterator for ScrollPages<'_> {
    type Item = ExportResult<RawDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(doc) = self.buffer.next() {
                return Some(Ok(doc));
            }
            if self.done {
                return None;
            }
            let Some(scroll_id) = self.scroll_id.clone() else {
                self.done = true;
                return None;
            };
            match self.source.next_page(&scroll_id) {
                Ok(page) => self.accept(page),
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl Drop for ScrollPages<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.scroll_id.take() {
            self.source.clear_scroll(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::LookbackWindow;

    #[test]
    fn test_search_body_shape() {
        let q = SearchQuery::new("cluster_foo-*", LookbackWindow::default());
        let body = search_body(&q, 500);
        assert_eq!(body["size"], 500);
        assert_eq!(body["sort"], json!(["_doc"]));
        assert_eq!(body["query"]["range"]["@timestamp"]["gte"], "now-7d");
        assert_eq!(body["query"]["range"]["@timestamp"]["lt"], "now");
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let source = ElasticsearchSource::new(ElasticsearchConfig::new("http://es:9200/"));
        assert_eq!(source.url("/_search/scroll"), "http://es:9200/_search/scroll");
        assert_eq!(source.url("idx/_search"), "http://es:9200/idx/_search");
    }

    #[test]
    fn test_config_from_export_config() {
        let cfg = ExportConfig {
            endpoint: "http://search:9200".into(),
            page_size: 250,
            timeout_secs: 5,
            api_key: Some("secret".into()),
            ..Default::default()
        };
        let es = ElasticsearchConfig::from(&cfg);
        assert_eq!(es.endpoint, "http://search:9200");
        assert_eq!(es.page_size, 250);
        assert_eq!(es.timeout, Some(Duration::from_secs(5)));
        assert_eq!(es.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_zero_timeout_disables_limit() {
        let cfg = ExportConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(ElasticsearchConfig::from(&cfg).timeout, None);
        assert_eq!(
            ElasticsearchConfig::new("http://es:9200").without_timeout().timeout,
            None
        );
    }

    #[test]
    fn test_hit_without_source_becomes_null_body() {
        let page: ScrollPage = serde_json::from_value(json!({
            "_scroll_id": "abc",
            "hits": {"hits": [{"_id": "1"}, {"_id": "2", "_source": {"message": "hi"}}]}
        }))
        .unwrap();
        let docs: Vec<RawDocument> = page.hits.hits.into_iter().map(RawDocument::from).collect();
        assert_eq!(docs[0].body, Value::Null);
        assert_eq!(docs[1].id.as_deref(), Some("2"));
        assert_eq!(docs[1].body["message"], "hi");
    }

    #[test]
    fn test_unreachable_cluster_is_source_unavailable() {
        // Port 9 (discard) on localhost is not expected to run an HTTP server.
        let source = ElasticsearchSource::new(
            ElasticsearchConfig::new("http://127.0.0.1:9").with_timeout(Duration::from_secs(2)),
        );
        let q = SearchQuery::new("idx", LookbackWindow::default());
        let err = source.open(&q).err().unwrap();
        assert!(matches!(err, ExportError::SourceUnavailable { .. }));
    }
}
