pub mod extract;

pub use extract::{DocumentExtractor, PlainTextExtractor};

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::cache::ContextCache;
use crate::core::config::ChunkerSettings;
use crate::core::errors::ApiError;
use crate::rag::{chunk_text, CorpusIndex, CorpusInfo, EmbeddingService, IndexedChunk};
use crate::session::SessionStore;

#[derive(Debug, Serialize)]
pub struct IngestSummary {
    pub message: String,
    pub chunk_count: usize,
}

/// Installs a new corpus: chunk, embed, replace the index, then drop all
/// cached context and session state so nothing from the old document leaks
/// into later answers.
pub struct IngestService {
    chunker: ChunkerSettings,
    embeddings: Arc<EmbeddingService>,
    index: Arc<CorpusIndex>,
    cache: Arc<ContextCache>,
    sessions: Arc<SessionStore>,
}

impl IngestService {
    pub fn new(
        chunker: ChunkerSettings,
        embeddings: Arc<EmbeddingService>,
        index: Arc<CorpusIndex>,
        cache: Arc<ContextCache>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            chunker,
            embeddings,
            index,
            cache,
            sessions,
        }
    }

    pub async fn ingest(&self, name: &str, text: &str) -> Result<IngestSummary, ApiError> {
        let texts = chunk_text(text, self.chunker.chunk_size, self.chunker.overlap);
        let chunk_count = texts.len();
        tracing::info!("Document '{}' split into {} chunk(s)", name, chunk_count);

        let embeddings = self.embeddings.embed_chunks(&texts).await?;

        let chunks = texts
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(position, (text, embedding))| IndexedChunk {
                id: Uuid::new_v4().to_string(),
                text,
                embedding,
                position,
            })
            .collect::<Vec<_>>();

        self.index
            .replace(chunks, CorpusInfo::new(name, chunk_count))
            .await?;
        self.cache.clear().await;
        self.sessions.clear().await;
        tracing::info!("Corpus '{}' installed, caches and sessions cleared", name);

        Ok(IngestSummary {
            message: format!("Document '{}' processed successfully", name),
            chunk_count,
        })
    }
}
