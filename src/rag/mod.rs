//! Retrieval pipeline: chunking, embedding, the in-memory vector index,
//! and the retriever that ties them together for chat requests.

pub mod chunker;
pub mod embedding;
pub mod index;
pub mod retriever;

pub use chunker::chunk_text;
pub use embedding::{EmbeddingService, EMBED_BATCH_SIZE};
pub use index::{CorpusIndex, CorpusInfo, IndexedChunk, ScoredPassage};
pub use retriever::Retriever;
