use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::core::errors::ApiError;

#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    pub position: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorpusInfo {
    pub name: String,
    pub uploaded_at: DateTime<Utc>,
    pub chunk_count: usize,
}

impl CorpusInfo {
    pub fn new(name: impl Into<String>, chunk_count: usize) -> Self {
        Self {
            name: name.into(),
            uploaded_at: Utc::now(),
            chunk_count,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScoredPassage {
    pub chunk_id: String,
    pub text: String,
    pub score: f32,
    pub position: usize,
}

#[derive(Default)]
struct IndexContents {
    chunks: Vec<IndexedChunk>,
    info: Option<CorpusInfo>,
    dimension: Option<usize>,
}

/// In-memory vector index over the active corpus.
///
/// `replace` swaps the whole corpus under a write lock, so readers observe
/// either the previous corpus or the new one, never a partial mix.
pub struct CorpusIndex {
    contents: RwLock<IndexContents>,
    queries: AtomicU64,
}

impl CorpusIndex {
    pub fn new() -> Self {
        Self {
            contents: RwLock::new(IndexContents::default()),
            queries: AtomicU64::new(0),
        }
    }

    pub async fn replace(
        &self,
        chunks: Vec<IndexedChunk>,
        info: CorpusInfo,
    ) -> Result<(), ApiError> {
        let dimension = validate_embeddings(&chunks)?;
        let mut contents = self.contents.write().await;
        *contents = IndexContents {
            chunks,
            info: Some(info),
            dimension,
        };
        Ok(())
    }

    pub async fn query(
        &self,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredPassage>, ApiError> {
        self.queries.fetch_add(1, Ordering::Relaxed);

        let contents = self.contents.read().await;
        if contents.chunks.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(dimension) = contents.dimension {
            if query_embedding.len() != dimension {
                return Err(ApiError::IndexCorrupted(format!(
                    "query dimension {} does not match stored dimension {}",
                    query_embedding.len(),
                    dimension
                )));
            }
        }

        let mut scored: Vec<ScoredPassage> = contents
            .chunks
            .iter()
            .map(|chunk| ScoredPassage {
                chunk_id: chunk.id.clone(),
                text: chunk.text.clone(),
                score: cosine_similarity(query_embedding, &chunk.embedding),
                position: chunk.position,
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }

    /// Drops all stored content, leaving the index empty but usable.
    pub async fn reinitialize(&self) {
        let mut contents = self.contents.write().await;
        *contents = IndexContents::default();
    }

    pub async fn corpus_info(&self) -> Option<CorpusInfo> {
        self.contents.read().await.info.clone()
    }

    pub async fn chunk_count(&self) -> usize {
        self.contents.read().await.chunks.len()
    }

    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }
}

impl Default for CorpusIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_embeddings(chunks: &[IndexedChunk]) -> Result<Option<usize>, ApiError> {
    let mut dimension = None;
    for chunk in chunks {
        if chunk.embedding.is_empty() {
            return Err(ApiError::Retrieval(format!(
                "chunk {} has an empty embedding",
                chunk.id
            )));
        }
        if chunk.embedding.iter().any(|v| !v.is_finite()) {
            return Err(ApiError::Retrieval(format!(
                "chunk {} has a non-finite embedding value",
                chunk.id
            )));
        }
        match dimension {
            None => dimension = Some(chunk.embedding.len()),
            Some(expected) if chunk.embedding.len() != expected => {
                return Err(ApiError::Retrieval(format!(
                    "chunk {} embedding dimension {} does not match {}",
                    chunk.id,
                    chunk.embedding.len(),
                    expected
                )));
            }
            Some(_) => {}
        }
    }
    Ok(dimension)
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (dot, norm_a, norm_b) = a.iter().zip(b.iter()).fold(
        (0.0f32, 0.0f32, 0.0f32),
        |(dot, norm_a, norm_b), (x, y)| (dot + x * y, norm_a + x * x, norm_b + y * y),
    );
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f32::EPSILON {
        0.0
    } else {
        dot / denom
    }
}
