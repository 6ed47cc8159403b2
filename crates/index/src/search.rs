use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::record::RetrievedRecord;

const DEFAULT_API_VERSION: &str = "2023-11-01";

/// One retrieval round trip.
///
/// `query_text: None` gives a pure vector search; with text it is hybrid.
/// A `filter` is applied before vector ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query_text: Option<String>,
    pub vector: Vec<f32>,
    pub filter: Option<String>,
    pub fields: Vec<String>,
    pub top_k: usize,
    pub k_nearest_neighbors: usize,
    pub vector_field: String,
}

#[async_trait]
pub trait SearchService: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RetrievedRecord>>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureSearchConfig {
    pub endpoint: String,
    pub index_name: String,
    pub api_key: String,
    pub api_version: String,
}

impl AzureSearchConfig {
    /// Read `AZURE_AISEARCH_*` variables from the environment.
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| std::env::var(name).with_context(|| format!("{} is not set", name));

        Ok(Self {
            endpoint: var("AZURE_AISEARCH_ENDPOINT")?,
            index_name: var("AZURE_AISEARCH_INDEX_NAME")?,
            api_key: var("AZURE_AISEARCH_API_KEY")?,
            api_version: std::env::var("AZURE_AISEARCH_API_VERSION")
                .unwrap_or_else(|_| DEFAULT_API_VERSION.to_string()),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<&'a str>,
    vector_queries: Vec<VectorQuery<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vector_filter_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a str>,
    select: String,
    top: usize,
}

#[derive(Serialize)]
struct VectorQuery<'a> {
    kind: &'static str,
    vector: &'a [f32],
    k: usize,
    fields: &'a str,
}

#[derive(Deserialize)]
struct SearchResponse {
    value: Vec<RetrievedRecord>,
}

/// REST client for an Azure AI Search index.
#[derive(Clone)]
pub struct AzureSearchClient {
    config: AzureSearchConfig,
    client: reqwest::Client,
}

impl AzureSearchClient {
    pub fn new(config: AzureSearchConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn search_url(&self) -> String {
        format!(
            "{}/indexes/{}/docs/search?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.index_name,
            self.config.api_version
        )
    }

    fn build_body<'a>(request: &'a SearchRequest) -> SearchBody<'a> {
        SearchBody {
            search: request.query_text.as_deref(),
            vector_queries: vec![VectorQuery {
                kind: "vector",
                vector: &request.vector,
                k: request.k_nearest_neighbors,
                fields: &request.vector_field,
            }],
            vector_filter_mode: request.filter.as_ref().map(|_| "preFilter"),
            filter: request.filter.as_deref(),
            select: request.fields.join(","),
            top: request.top_k,
        }
    }
}

#[async_trait]
impl SearchService for AzureSearchClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RetrievedRecord>> {
        let body = Self::build_body(request);

        let response = self.client
            .post(self.search_url())
            .header("api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send search request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Search request failed ({}): {}", status, error_text);
        }

        let result: SearchResponse = response.json().await
            .context("Failed to parse search response")?;

        debug!(
            filter = request.filter.as_deref().unwrap_or("none"),
            hits = result.value.len(),
            "Search completed"
        );

        Ok(result.value)
    }
}
