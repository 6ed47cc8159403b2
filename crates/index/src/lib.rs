pub mod record;
pub mod search;
pub mod embeddings;
pub mod cache;

pub use record::RetrievedRecord;
pub use search::{AzureSearchClient, AzureSearchConfig, SearchRequest, SearchService};
pub use embeddings::{Embedder, EmbeddingClient};
pub use cache::CachedEmbedder;
