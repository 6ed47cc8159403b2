use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Produces the final answer from a question and the formatted context block.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, question: &str, context: &str) -> Result<String>;
}

#[derive(Clone)]
pub struct QueryLLM {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

impl QueryLLM {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            base_url,
            model,
            client: reqwest::Client::new(),
        }
    }

    pub fn default() -> Self {
        Self::new(
            "http://localhost:11434".to_string(),
            "llama3".to_string(),
        )
    }

    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
        };

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Ollama")?;

        if !response.status().is_success() {
            anyhow::bail!("Ollama request failed: {}", response.status());
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        Ok(ollama_response.response)
    }
}

#[async_trait]
impl AnswerGenerator for QueryLLM {
    async fn generate(&self, question: &str, context: &str) -> Result<String> {
        self.complete(&build_answer_prompt(question, context)).await
    }
}

pub fn build_answer_prompt(question: &str, context: &str) -> String {
    format!(
        r#"You are a helpful financial assistant answering questions about public company filings.

DOCUMENTS:
{}

USER QUESTION: {}

INSTRUCTIONS:
- Answer using only information from the documents above
- Each fenced block holds the documents retrieved for one company
- Cite the source name of the documents you rely on
- If the documents don't contain enough information, say so
- Keep your answer concise and factual

ANSWER:"#,
        context, question
    )
}
