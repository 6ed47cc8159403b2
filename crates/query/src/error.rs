use extract::EntityError;
use thiserror::Error;

/// Failures that abort a whole question.
///
/// Individual search calls never end up here: they are recorded on their
/// [`DocumentBatch`](crate::DocumentBatch) and the remaining calls go on.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("entity extraction failed: {0:#}")]
    Extraction(#[source] anyhow::Error),

    #[error(transparent)]
    Entities(#[from] EntityError),

    #[error("failed to embed question: {0:#}")]
    Embedding(#[source] anyhow::Error),

    #[error("answer generation failed: {0:#}")]
    Generation(#[source] anyhow::Error),

    #[error("no answer generator configured")]
    NoGenerator,
}
