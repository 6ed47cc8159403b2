pub mod schema;
pub mod llm;
pub mod prompt;

pub use schema::{EntityError, ExtractedEntities, parse_entities};
pub use llm::OllamaClient;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

/// Turns a question into raw, JSON-like entity text.
///
/// Implementations return the model output untouched; validation happens in
/// [`parse_entities`] so that a malformed answer surfaces as a typed error.
#[async_trait]
pub trait EntityExtractor: Send + Sync {
    async fn extract(&self, question: &str) -> Result<String>;
}

pub struct LlmEntityExtractor {
    llm_client: OllamaClient,
    max_retries: usize,
}

impl LlmEntityExtractor {
    pub fn new(llm_client: OllamaClient) -> Self {
        Self {
            llm_client,
            max_retries: 3,
        }
    }

    pub fn default() -> Self {
        Self::new(OllamaClient::default())
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }
}

#[async_trait]
impl EntityExtractor for LlmEntityExtractor {
    async fn extract(&self, question: &str) -> Result<String> {
        let prompt = prompt::build_entity_prompt(question);

        let raw = self.llm_client
            .generate_json_with_retry(&prompt, self.max_retries)
            .await
            .context("Failed to extract entities")?;

        debug!(raw = %raw, "Extractor responded");
        Ok(raw)
    }
}
