//! Search sources that supply raw log documents.
//!
//! The pipeline only sees the [`DocumentSource`] trait. `ElasticsearchSource`
//! talks to a real cluster through the scroll API; `ReplaySource` replays a
//! fixed document list for tests.

pub mod elasticsearch;
pub mod mock;
pub mod traits;

// Re-export key types
pub use elasticsearch::{ElasticsearchConfig, ElasticsearchSource};
pub use mock::{ReplayConfig, ReplaySource};
pub use traits::{DocumentSource, DocumentStream, LookbackWindow, SearchQuery};
