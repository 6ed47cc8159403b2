use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::debug;

use crate::embeddings::Embedder;

/// Wraps an [`Embedder`] and remembers vectors by text hash.
pub struct CachedEmbedder<E> {
    inner: E,
    embeddings: Arc<DashMap<String, Vec<f32>>>,
    max_entries: usize,
}

impl<E: Embedder> CachedEmbedder<E> {
    pub fn new(inner: E, max_entries: usize) -> Self {
        Self {
            inner,
            embeddings: Arc::new(DashMap::new()),
            max_entries,
        }
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    fn insert(&self, key: String, embedding: Vec<f32>) {
        if self.max_entries == 0 {
            return;
        }
        if self.embeddings.len() >= self.max_entries {
            // Simple eviction: clear 25% when full
            let to_remove: Vec<_> = self.embeddings.iter()
                .take((self.max_entries / 4).max(1))
                .map(|r| r.key().clone())
                .collect();
            for key in to_remove {
                self.embeddings.remove(&key);
            }
        }
        self.embeddings.insert(key, embedding);
    }

    fn hash_text(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl<E: Embedder> Embedder for CachedEmbedder<E> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let key = Self::hash_text(text);

        if let Some(hit) = self.embeddings.get(&key) {
            debug!("Embedding cache hit");
            return Ok(hit.value().clone());
        }

        let embedding = self.inner.embed(text).await?;
        self.insert(key, embedding.clone());
        Ok(embedding)
    }
}
