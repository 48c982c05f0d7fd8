//! Search queries and their Elasticsearch rendering.

use domain::OrderStatus;
use serde_json::{Value, json};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Largest page a single query may ask for.
pub const MAX_PAGE_SIZE: usize = 100;

/// A search over order documents.
///
/// A status filter wins over free text: when `status` is set the text is
/// not scored at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: Option<String>,
    pub status: Option<OrderStatus>,
    pub from: usize,
    pub size: usize,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            text: None,
            status: None,
            from: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchQuery {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_page(mut self, from: usize, size: usize) -> Self {
        self.from = from;
        self.size = size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Interprets a single search box input.
    ///
    /// Input that is exactly a status name (ignoring case and surrounding
    /// whitespace) becomes a status filter; anything else non-blank is free
    /// text. Pages are 1-based.
    pub fn from_input(input: &str, page: usize, size: usize) -> Self {
        let size = size.clamp(1, MAX_PAGE_SIZE);
        let from = page.max(1).saturating_sub(1).saturating_mul(size);
        let trimmed = input.trim();

        let base = match trimmed.to_lowercase().parse::<OrderStatus>() {
            Ok(status) => Self::status(status),
            Err(_) if trimmed.is_empty() => Self::default(),
            Err(_) => Self::text(trimmed),
        };
        base.with_page(from, size)
    }

    /// Free text with surrounding whitespace removed, if any is left.
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Renders the full `_search` request body.
    pub fn to_query_dsl(&self) -> Value {
        let query = if let Some(status) = self.status {
            json!({
                "bool": {
                    "filter": [{ "term": { "status": status.as_str() } }]
                }
            })
        } else if let Some(text) = self.trimmed_text() {
            let mut should = vec![
                json!({
                    "match": {
                        "customerName": { "query": text, "fuzziness": "AUTO", "boost": 2.0 }
                    }
                }),
                json!({
                    "nested": {
                        "path": "items",
                        "query": {
                            "match": { "items.name": { "query": text, "fuzziness": "AUTO" } }
                        }
                    }
                }),
            ];
            if let Ok(order_id) = text.parse::<i64>() {
                should.push(json!({ "term": { "orderId": order_id } }));
            }
            json!({
                "bool": {
                    "should": should,
                    "minimum_should_match": 1
                }
            })
        } else {
            json!({ "match_all": {} })
        };

        json!({
            "from": self.from,
            "size": self.size,
            "query": query,
        })
    }
}
