use std::num::NonZeroUsize;
use std::sync::Arc;

use futures_util::future::try_join_all;
use lru::LruCache;
use tokio::sync::Mutex;

use crate::core::errors::ApiError;
use crate::llm::LlmProvider;

/// Upper bound on inputs per embedding request when indexing a corpus.
pub const EMBED_BATCH_SIZE: usize = 32;

/// Wraps the provider's embedding endpoint with a bounded LRU memo for
/// query strings. Corpus chunks are embedded in parallel batches and are
/// never memoized; only queries repeat often enough to be worth caching.
pub struct EmbeddingService {
    provider: Arc<dyn LlmProvider>,
    query_cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl EmbeddingService {
    pub fn new(provider: Arc<dyn LlmProvider>, cache_size: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_size.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            provider,
            query_cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>, ApiError> {
        let key = query.trim().to_string();

        {
            let mut cache = self.query_cache.lock().await;
            if let Some(embedding) = cache.get(&key) {
                return Ok(embedding.clone());
            }
        }

        let vectors = self
            .provider
            .embed(std::slice::from_ref(&key))
            .await
            .map_err(|err| ApiError::Retrieval(err.to_string()))?;
        let embedding = vectors
            .into_iter()
            .find(|vector| !vector.is_empty())
            .ok_or_else(|| {
                ApiError::Retrieval("embedding response contained no vectors".to_string())
            })?;

        self.query_cache
            .lock()
            .await
            .put(key, embedding.clone());
        Ok(embedding)
    }

    pub async fn embed_chunks(&self, chunks: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let batches = chunks
            .chunks(EMBED_BATCH_SIZE)
            .map(|batch| self.provider.embed(batch));
        let results = try_join_all(batches)
            .await
            .map_err(|err| ApiError::Retrieval(err.to_string()))?;

        let embeddings: Vec<Vec<f32>> = results.into_iter().flatten().collect();
        if embeddings.len() != chunks.len() {
            return Err(ApiError::Retrieval(format!(
                "embedding count {} does not match chunk count {}",
                embeddings.len(),
                chunks.len()
            )));
        }
        Ok(embeddings)
    }
}
