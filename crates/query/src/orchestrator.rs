use futures::{StreamExt, stream};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::batch::DocumentBatch;
use crate::config::RetrievalConfig;
use crate::error::RetrievalError;
use crate::filter::{FilterBuilder, FilterExpression, FilterSet};
use crate::format::ResultFormatter;
use crate::llm::AnswerGenerator;
use crate::retry::RetryPolicy;
use extract::EntityExtractor;
use index::{Embedder, SearchRequest, SearchService};

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub answer: String,
    pub context: String,
    /// Filters the batches were retrieved with; `None` for the unfiltered call
    pub filters: Option<FilterSet>,
    pub batches: Vec<DocumentBatch>,
}

/// Question in, document batches out.
///
/// Collaborators are injected and owned by the caller. One search call is
/// issued per filter; a failing call only empties its own batch.
pub struct RetrievalOrchestrator {
    extractor: Arc<dyn EntityExtractor>,
    embedder: Arc<dyn Embedder>,
    search: Arc<dyn SearchService>,
    generator: Option<Arc<dyn AnswerGenerator>>,
    filter_builder: FilterBuilder,
    retry: RetryPolicy,
    config: RetrievalConfig,
}

impl RetrievalOrchestrator {
    pub fn new(
        extractor: Arc<dyn EntityExtractor>,
        embedder: Arc<dyn Embedder>,
        search: Arc<dyn SearchService>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            extractor,
            embedder,
            search,
            generator: None,
            filter_builder: FilterBuilder::new(config.filter_fields.clone()),
            retry: RetryPolicy::from_config(&config.retry),
            config,
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn AnswerGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Batches come back in filter order, whatever order the calls finish in.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<DocumentBatch>, RetrievalError> {
        let span = info_span!("retrieve", request_id = %Uuid::new_v4());
        self.retrieve_batches(question).instrument(span).await
    }

    pub async fn retrieve_context(&self, question: &str) -> Result<String, RetrievalError> {
        let batches = self.retrieve(question).await?;
        Ok(ResultFormatter::format(&batches))
    }

    pub async fn answer(&self, question: &str) -> Result<Answer, RetrievalError> {
        let generator = self.generator.as_ref().ok_or(RetrievalError::NoGenerator)?;

        let batches = self.retrieve(question).await?;
        let context = ResultFormatter::format(&batches);
        let filters: Option<FilterSet> = batches.iter().map(|b| b.filter.clone()).collect();

        let answer = generator
            .generate(question, &context)
            .await
            .map_err(RetrievalError::Generation)?;

        Ok(Answer {
            answer,
            context,
            filters,
            batches,
        })
    }

    async fn retrieve_batches(&self, question: &str) -> Result<Vec<DocumentBatch>, RetrievalError> {
        // Step 1: Extract entities
        let raw = self.extractor
            .extract(question)
            .await
            .map_err(RetrievalError::Extraction)?;
        let entities = extract::parse_entities(&raw)?;
        debug!(?entities, "Entities extracted");

        // Step 2: Build filters
        let filters = self.filter_builder.build(&entities);
        info!(
            filters = filters.as_ref().map_or(0, Vec::len),
            "Filters built"
        );

        // Step 3: Embed the question once for every call
        let vector = self.embedder
            .embed(question)
            .await
            .map_err(RetrievalError::Embedding)?;

        // Step 4: One search per filter, or a single unfiltered search
        let targets: Vec<Option<FilterExpression>> = match filters {
            None => vec![None],
            Some(filters) => filters.into_iter().map(Some).collect(),
        };

        let max_in_flight = self.config.concurrency.max_concurrent_searches.max(1);
        let batches: Vec<DocumentBatch> = stream::iter(targets)
            .map(|filter| self.search_batch(question, &vector, filter))
            .buffered(max_in_flight)
            .collect()
            .await;

        let failed = batches.iter().filter(|b| b.is_failed()).count();
        if failed > 0 {
            warn!(failed = failed, total = batches.len(), "Returning partial results");
        }

        Ok(batches)
    }

    async fn search_batch(
        &self,
        question: &str,
        vector: &[f32],
        filter: Option<FilterExpression>,
    ) -> DocumentBatch {
        let request = self.build_request(question, vector, filter.as_ref());
        let timeout = Duration::from_secs(self.config.concurrency.request_timeout_secs);

        let search = &self.search;
        let request = &request;
        let result = self.retry
            .retry("search", move || async move {
                match tokio::time::timeout(timeout, search.search(request)).await {
                    Ok(result) => result,
                    Err(_) => Err(anyhow::anyhow!(
                        "search timed out after {}s",
                        timeout.as_secs()
                    )),
                }
            })
            .await;

        let label = filter.as_ref().map_or("none", |f| f.as_str()).to_string();
        match result {
            Ok(records) => {
                info!(filter = %label, records = records.len(), "Search returned");
                DocumentBatch::new(filter, records)
            }
            Err(e) => {
                warn!(filter = %label, error = %e, "Search failed, continuing with remaining filters");
                DocumentBatch::failed(filter, format!("{:#}", e))
            }
        }
    }

    fn build_request(
        &self,
        question: &str,
        vector: &[f32],
        filter: Option<&FilterExpression>,
    ) -> SearchRequest {
        let search = &self.config.search;

        SearchRequest {
            query_text: search.hybrid.then(|| question.to_string()),
            vector: vector.to_vec(),
            filter: filter.map(|f| f.as_str().to_string()),
            fields: search.fields.clone(),
            top_k: search.top_k,
            k_nearest_neighbors: search.k_nearest_neighbors,
            vector_field: search.vector_field.clone(),
        }
    }
}
