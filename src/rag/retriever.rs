use std::sync::Arc;

use super::embedding::EmbeddingService;
use super::index::CorpusIndex;
use crate::core::errors::ApiError;

/// Turns a query string into the ranked passage texts backing an answer.
pub struct Retriever {
    embeddings: Arc<EmbeddingService>,
    index: Arc<CorpusIndex>,
    top_k: usize,
}

impl Retriever {
    pub fn new(embeddings: Arc<EmbeddingService>, index: Arc<CorpusIndex>, top_k: usize) -> Self {
        Self {
            embeddings,
            index,
            top_k: top_k.clamp(1, 50),
        }
    }

    /// Embeds the query and returns up to `top_k` passage texts.
    ///
    /// A corrupted index is reinitialized once and the query retried against
    /// the now-empty index; a failure after that is surfaced to the caller.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<String>, ApiError> {
        let embedding = self.embeddings.embed_query(query).await?;

        let passages = match self.index.query(&embedding, self.top_k).await {
            Ok(passages) => passages,
            Err(ApiError::IndexCorrupted(reason)) => {
                tracing::warn!("Corpus index corrupted ({}), reinitializing", reason);
                self.index.reinitialize().await;
                self.index.query(&embedding, self.top_k).await?
            }
            Err(err) => return Err(err),
        };

        Ok(passages.into_iter().map(|passage| passage.text).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ApiError;
    use crate::llm::{GenerationRequest, LlmProvider};
    use crate::rag::index::{CorpusInfo, IndexedChunk};
    use async_trait::async_trait;

    struct VectorProvider {
        vector: Vec<f32>,
    }

    #[async_trait]
    impl LlmProvider for VectorProvider {
        fn name(&self) -> &str {
            "vector"
        }

        async fn chat(&self, _request: GenerationRequest) -> Result<String, ApiError> {
            Ok(String::new())
        }

        async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
            Ok(inputs.iter().map(|_| self.vector.clone()).collect())
        }
    }

    fn retriever_with(vector: Vec<f32>, index: Arc<CorpusIndex>, top_k: usize) -> Retriever {
        let provider = Arc::new(VectorProvider { vector });
        let embeddings = Arc::new(EmbeddingService::new(provider, 10));
        Retriever::new(embeddings, index, top_k)
    }

    fn chunk(id: &str, text: &str, embedding: Vec<f32>, position: usize) -> IndexedChunk {
        IndexedChunk {
            id: id.to_string(),
            text: text.to_string(),
            embedding,
            position,
        }
    }

    #[tokio::test]
    async fn empty_index_yields_no_passages() {
        let index = Arc::new(CorpusIndex::new());
        let retriever = retriever_with(vec![1.0, 0.0], index, 3);

        let passages = retriever.retrieve("anything").await.unwrap();
        assert!(passages.is_empty());
    }

    #[tokio::test]
    async fn passages_come_back_ranked_and_limited() {
        let index = Arc::new(CorpusIndex::new());
        index
            .replace(
                vec![
                    chunk("a", "closest", vec![1.0, 0.0, 0.0], 0),
                    chunk("b", "farthest", vec![0.0, 1.0, 0.0], 1),
                    chunk("c", "near", vec![0.9, 0.1, 0.0], 2),
                ],
                CorpusInfo::new("doc", 3),
            )
            .await
            .unwrap();
        let retriever = retriever_with(vec![1.0, 0.0, 0.0], index, 2);

        let passages = retriever.retrieve("query").await.unwrap();
        assert_eq!(passages, vec!["closest".to_string(), "near".to_string()]);
    }

    #[tokio::test]
    async fn dimension_mismatch_recovers_by_reinitializing() {
        let index = Arc::new(CorpusIndex::new());
        index
            .replace(
                vec![chunk("a", "alpha", vec![1.0, 0.0, 0.0], 0)],
                CorpusInfo::new("doc", 1),
            )
            .await
            .unwrap();
        let retriever = retriever_with(vec![1.0, 0.0, 0.0, 0.0], index.clone(), 3);

        let passages = retriever.retrieve("query").await.unwrap();

        assert!(passages.is_empty());
        assert_eq!(index.chunk_count().await, 0);
        assert_eq!(index.query_count(), 2);
    }
}
