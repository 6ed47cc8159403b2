use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use index::RetrievedRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub search: SearchConfig,
    pub filter_fields: FilterFields,
    pub concurrency: ConcurrencyConfig,
    pub retry: RetryConfig,
}

/// Projection and ranking applied identically to every search call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub top_k: usize,
    pub k_nearest_neighbors: usize,
    pub vector_field: String,
    pub fields: Vec<String>,
    /// Send the question as keyword text alongside the vector
    pub hybrid: bool,
}

/// Index fields targeted by filter clauses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterFields {
    pub entity: String,
    pub location: String,
    pub year: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    pub max_concurrent_searches: usize,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            filter_fields: FilterFields::default(),
            concurrency: ConcurrencyConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            k_nearest_neighbors: 5,
            vector_field: "Embedding".to_string(),
            fields: RetrievedRecord::FIELDS.iter().map(|f| f.to_string()).collect(),
            hybrid: true,
        }
    }
}

impl Default for FilterFields {
    fn default() -> Self {
        Self {
            entity: "referenced_entity".to_string(),
            location: "referenced_location".to_string(),
            year: "referenced_year".to_string(),
        }
    }
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_concurrent_searches: 4,
            request_timeout_secs: 30,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 500,
            max_backoff_ms: 5000,
        }
    }
}

impl RetrievalConfig {
    pub fn fast() -> Self {
        Self {
            concurrency: ConcurrencyConfig {
                max_concurrent_searches: 8,
                request_timeout_secs: 10,
            },
            retry: RetryConfig {
                max_retries: 0,
                initial_backoff_ms: 0,
                max_backoff_ms: 0,
            },
            ..Self::default()
        }
    }

    pub fn thorough() -> Self {
        Self {
            search: SearchConfig {
                top_k: 8,
                k_nearest_neighbors: 10,
                ..SearchConfig::default()
            },
            concurrency: ConcurrencyConfig {
                max_concurrent_searches: 2,
                request_timeout_secs: 120,
            },
            retry: RetryConfig {
                max_retries: 5,
                initial_backoff_ms: 2000,
                max_backoff_ms: 20000,
            },
            ..Self::default()
        }
    }

    /// Parse a JSON document; omitted sections fall back to defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse retrieval config")
    }
}
