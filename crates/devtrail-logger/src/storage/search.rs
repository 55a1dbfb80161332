//! Search index backend (Elasticsearch-compatible REST API).

use async_trait::async_trait;
use devtrail_core::SearchIndexConfig;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::StorageBackend;
use crate::error::LogError;
use crate::record::LogRecord;

/// Stores each record as one document in a search index.
///
/// Concurrent appends are independent requests; per-document write atomicity
/// is left to the store.
pub struct SearchIndexBackend {
    client: reqwest::Client,
    base_url: String,
    index: String,
    max_results: usize,
    refresh: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "_source")]
    source: LogRecord,
}

impl SearchIndexBackend {
    /// Create a backend from connection settings. No request is made here.
    pub fn new(config: &SearchIndexConfig) -> Result<Self, LogError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.host.trim().trim_end_matches('/').to_string(),
            index: config.index_name.clone(),
            max_results: config.max_results,
            refresh: config.refresh,
        })
    }

    fn doc_url(&self) -> String {
        let mut url = format!("{}/{}/_doc", self.base_url, self.index);
        if self.refresh {
            url.push_str("?refresh=wait_for");
        }
        url
    }

    fn search_url(&self) -> String {
        format!("{}/{}/_search", self.base_url, self.index)
    }

    async fn unexpected(response: reqwest::Response) -> LogError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        LogError::UnexpectedResponse { status, body }
    }
}

#[async_trait]
impl StorageBackend for SearchIndexBackend {
    fn name(&self) -> &'static str {
        "search_index"
    }

    async fn append(&self, record: &LogRecord) -> Result<(), LogError> {
        let response = self
            .client
            .post(self.doc_url())
            .json(record)
            .send()
            .await
            .map_err(LogError::from_transport)?;

        if !response.status().is_success() {
            return Err(Self::unexpected(response).await);
        }

        tracing::debug!(index = %self.index, "Log saved to search index");
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<LogRecord>, LogError> {
        let query = json!({
            "query": { "match_all": {} },
            "size": self.max_results,
            "sort": ["_doc"],
        });

        let response = self
            .client
            .post(self.search_url())
            .json(&query)
            .send()
            .await
            .map_err(LogError::from_transport)?;

        // The index is created by the first append.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::info!(index = %self.index, "Search index does not exist yet");
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(Self::unexpected(response).await);
        }

        let body = response.bytes().await.map_err(LogError::from_transport)?;
        let parsed: SearchResponse = serde_json::from_slice(&body)?;
        Ok(parsed.hits.hits.into_iter().map(|hit| hit.source).collect())
    }
}
