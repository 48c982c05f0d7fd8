//! The search index contract.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::Result;
use crate::document::SearchDocument;
use crate::query::SearchQuery;

/// A document store supporting fuzzy text and exact-term queries over orders.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Creates the index and its mappings if they do not exist yet.
    async fn ensure_index(&self) -> Result<()>;

    /// Upserts the document for its order, replacing any previous version.
    async fn index_document(&self, document: &SearchDocument) -> Result<()>;

    /// Returns matching documents, best match first.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchDocument>>;
}

/// Index mappings for order documents.
pub fn index_mappings() -> Value {
    json!({
        "mappings": {
            "properties": {
                "orderId": { "type": "long" },
                "customerId": { "type": "long" },
                "customerName": { "type": "text" },
                "status": { "type": "keyword" },
                "items": {
                    "type": "nested",
                    "properties": {
                        "sku": { "type": "keyword" },
                        "name": { "type": "text" },
                        "qty": { "type": "integer" },
                        "price": { "type": "double" }
                    }
                },
                "createdAt": { "type": "date" }
            }
        }
    })
}
