//! Order search: the denormalized read model kept in the search engine.
//!
//! - [`SearchDocument`]: one per order, overwritten on every re-index
//! - [`SearchQuery`]: status filter or fuzzy free text, rendered to the
//!   Elasticsearch query DSL
//! - [`SearchIndex`] with [`ElasticsearchIndex`] and [`InMemorySearchIndex`]
//! - [`Reindexer`] for pushing the current store state of an order

pub mod document;
pub mod elasticsearch;
pub mod error;
pub mod index;
pub mod memory;
pub mod query;
pub mod reindexer;

pub use document::SearchDocument;
pub use elasticsearch::{ElasticsearchConfig, ElasticsearchIndex};
pub use error::{Result, SearchError};
pub use index::{SearchIndex, index_mappings};
pub use memory::InMemorySearchIndex;
pub use query::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, SearchQuery};
pub use reindexer::Reindexer;
