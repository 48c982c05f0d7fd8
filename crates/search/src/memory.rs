//! In-memory search index with Elasticsearch-like fuzzy matching.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use async_trait::async_trait;
use common::OrderId;
use tokio::sync::RwLock;

use crate::document::SearchDocument;
use crate::index::SearchIndex;
use crate::query::SearchQuery;
use crate::{Result, SearchError};

const CUSTOMER_NAME_BOOST: f64 = 2.0;

/// In-memory search index.
///
/// Text is split into lowercase words and compared term by term with the
/// same `AUTO` edit-distance allowance Elasticsearch applies: none for terms
/// of up to two characters, one up to five, two beyond that.
#[derive(Clone, Default)]
pub struct InMemorySearchIndex {
    documents: Arc<RwLock<BTreeMap<OrderId, SearchDocument>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, AtomicOrdering::SeqCst);
    }

    /// Returns the stored document for an order.
    pub async fn get(&self, order_id: OrderId) -> Option<SearchDocument> {
        self.documents.read().await.get(&order_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(AtomicOrdering::SeqCst) {
            return Err(SearchError::Unavailable);
        }
        Ok(())
    }
}

#[async_trait]
impl SearchIndex for InMemorySearchIndex {
    async fn ensure_index(&self) -> Result<()> {
        self.check_available()
    }

    async fn index_document(&self, document: &SearchDocument) -> Result<()> {
        self.check_available()?;
        self.documents
            .write()
            .await
            .insert(document.order_id, document.clone());
        Ok(())
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchDocument>> {
        self.check_available()?;
        let documents = self.documents.read().await;

        let mut scored: Vec<(f64, &SearchDocument)> = if let Some(status) = query.status {
            documents
                .values()
                .filter(|doc| doc.status == status)
                .map(|doc| (1.0, doc))
                .collect()
        } else if let Some(text) = query.trimmed_text() {
            let terms = tokenize(text);
            let order_id = text.parse::<i64>().ok();
            documents
                .values()
                .map(|doc| (score(doc, &terms, order_id), doc))
                .filter(|(score, _)| *score > 0.0)
                .collect()
        } else {
            documents.values().map(|doc| (1.0, doc)).collect()
        };

        scored.sort_by(|(a_score, a), (b_score, b)| {
            b_score
                .partial_cmp(a_score)
                .unwrap_or(Ordering::Equal)
                .then(a.order_id.cmp(&b.order_id))
        });

        Ok(scored
            .into_iter()
            .skip(query.from)
            .take(query.size)
            .map(|(_, doc)| doc.clone())
            .collect())
    }
}

fn score(doc: &SearchDocument, terms: &[String], order_id: Option<i64>) -> f64 {
    let name_hits = doc
        .customer_name
        .as_deref()
        .map(|name| matching_terms(terms, &tokenize(name)))
        .unwrap_or(0);

    let item_hits = doc
        .items
        .iter()
        .map(|item| matching_terms(terms, &tokenize(&item.name)))
        .max()
        .unwrap_or(0);

    let id_hit = order_id.is_some_and(|id| id == doc.order_id.as_i64());

    CUSTOMER_NAME_BOOST * name_hits as f64 + item_hits as f64 + if id_hit { 1.0 } else { 0.0 }
}

/// Number of query terms that fuzzily match some field token.
fn matching_terms(terms: &[String], tokens: &[String]) -> usize {
    terms
        .iter()
        .filter(|term| {
            let allowed = auto_fuzziness(term);
            tokens.iter().any(|token| edit_distance(term, token) <= allowed)
        })
        .count()
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn auto_fuzziness(term: &str) -> usize {
    match term.chars().count() {
        0..=2 => 0,
        3..=5 => 1,
        _ => 2,
    }
}

/// Levenshtein distance counting an adjacent transposition as one edit.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let width = b.len() + 1;
    let mut d = vec![0usize; (a.len() + 1) * width];

    for i in 0..=a.len() {
        d[i * width] = i;
    }
    for j in 0..=b.len() {
        d[j] = j;
    }

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut best = (d[(i - 1) * width + j] + 1)
                .min(d[i * width + j - 1] + 1)
                .min(d[(i - 1) * width + j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                best = best.min(d[(i - 2) * width + j - 2] + 1);
            }
            d[i * width + j] = best;
        }
    }

    d[a.len() * width + b.len()]
}
