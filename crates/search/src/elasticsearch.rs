//! Elasticsearch over its REST API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::document::SearchDocument;
use crate::index::{SearchIndex, index_mappings};
use crate::query::SearchQuery;
use crate::{Result, SearchError};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for Elasticsearch.
#[derive(Debug, Clone)]
pub struct ElasticsearchConfig {
    /// Base URL, e.g. http://localhost:9200.
    pub url: String,
    pub index: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ElasticsearchConfig {
    pub fn new(url: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            index: index.into(),
            username: None,
            password: None,
        }
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.username = Some(username.into());
        self.password = password;
        self
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: Hits,
}

#[derive(Deserialize)]
struct Hits {
    hits: Vec<Hit>,
}

#[derive(Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: SearchDocument,
}

/// Search index stored in Elasticsearch.
///
/// The index and its mappings are created on first use, so documents are
/// never written into a dynamically mapped index. A failed attempt is
/// retried by the next call.
#[derive(Clone)]
pub struct ElasticsearchIndex {
    client: reqwest::Client,
    config: ElasticsearchConfig,
    ready: Arc<OnceCell<()>>,
}

impl ElasticsearchIndex {
    pub fn new(config: ElasticsearchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            config,
            ready: Arc::new(OnceCell::new()),
        })
    }

    fn index_url(&self) -> String {
        format!(
            "{}/{}",
            self.config.url.trim_end_matches('/'),
            self.config.index
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.username {
            Some(username) => request.basic_auth(username, self.config.password.as_deref()),
            None => request,
        }
    }

    async fn error_for_status(response: Response) -> SearchError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        SearchError::Status { status, body }
    }

    async fn create_if_missing(&self) -> Result<()> {
        let url = self.index_url();
        let exists = self.authorize(self.client.head(&url)).send().await?;
        match exists.status() {
            status if status.is_success() => return Ok(()),
            StatusCode::NOT_FOUND => {}
            _ => return Err(Self::error_for_status(exists).await),
        }

        let response = self
            .authorize(self.client.put(&url))
            .json(&index_mappings())
            .send()
            .await?;

        if response.status().is_success() {
            info!(index = %self.config.index, "Created search index");
            return Ok(());
        }

        // Another process may have created it between the two calls
        let error = Self::error_for_status(response).await;
        match &error {
            SearchError::Status { status: 400, body }
                if body.contains("resource_already_exists_exception") =>
            {
                Ok(())
            }
            _ => Err(error),
        }
    }
}

#[async_trait]
impl SearchIndex for ElasticsearchIndex {
    async fn ensure_index(&self) -> Result<()> {
        self.ready
            .get_or_try_init(|| self.create_if_missing())
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, document), fields(order_id = %document.order_id))]
    async fn index_document(&self, document: &SearchDocument) -> Result<()> {
        self.ensure_index().await?;
        let url = format!("{}/_doc/{}?refresh=wait_for", self.index_url(), document.order_id);
        let response = self
            .authorize(self.client.put(url))
            .json(document)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(response).await);
        }
        debug!(status = %document.status, "Indexed order");
        Ok(())
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchDocument>> {
        self.ensure_index().await?;
        let url = format!("{}/_search", self.index_url());
        let response = self
            .authorize(self.client.post(url))
            .json(&query.to_query_dsl())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(response).await);
        }

        let body: SearchResponse = serde_json::from_slice(&response.bytes().await?)?;
        Ok(body.hits.hits.into_iter().map(|hit| hit.source).collect())
    }
}
