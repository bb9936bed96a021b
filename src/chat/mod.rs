pub mod generator;
pub mod prompt;
pub mod types;

pub use generator::Generator;
pub use types::{ChatRequest, ChatResponse, ChatSettings};

use std::sync::Arc;
use std::time::Instant;

use crate::cache::ContextCache;
use crate::core::errors::ApiError;
use crate::rag::Retriever;
use crate::session::{ChatTurn, SessionStore};

/// Orchestrates one chat request: validate, sweep idle sessions, resolve
/// context through the cache or the index, generate under a deadline, then
/// persist the new turn.
pub struct ChatService {
    sessions: Arc<SessionStore>,
    cache: Arc<ContextCache>,
    retriever: Arc<Retriever>,
    generator: Arc<Generator>,
}

impl ChatService {
    pub fn new(
        sessions: Arc<SessionStore>,
        cache: Arc<ContextCache>,
        retriever: Arc<Retriever>,
        generator: Arc<Generator>,
    ) -> Self {
        Self {
            sessions,
            cache,
            retriever,
            generator,
        }
    }

    pub async fn handle(&self, request: ChatRequest) -> Result<ChatResponse, ApiError> {
        let started = Instant::now();

        let query = request.query.trim();
        if query.is_empty() {
            return Err(ApiError::BadRequest("Query cannot be empty".to_string()));
        }

        self.sessions.sweep().await;
        let stored_turns = self.sessions.get_or_create(&request.session_id).await;
        tracing::debug!(
            session_id = %request.session_id,
            stored_turns = stored_turns.len(),
            "Handling chat query"
        );

        let passages = match self.cache.get(&request.session_id, query).await {
            Some(passages) => {
                tracing::debug!(session_id = %request.session_id, "Context served from cache");
                passages
            }
            None => match self.retriever.retrieve(query).await {
                Ok(passages) => {
                    self.cache
                        .set(&request.session_id, query, passages.clone())
                        .await;
                    passages
                }
                Err(err @ ApiError::IndexCorrupted(_)) => return Err(err),
                Err(err) => {
                    // Failed retrievals are never cached, so the next request
                    // gets another chance at real context.
                    tracing::warn!("Retrieval failed, continuing without context: {}", err);
                    Vec::new()
                }
            },
        };

        let response = self
            .generator
            .respond(query, &passages, &request.chat_history, &request.settings)
            .await?;

        let mut turns = request.chat_history;
        turns.push(ChatTurn {
            user: query.to_string(),
            assistant: response.clone(),
        });
        self.sessions.set_history(&request.session_id, turns).await;

        Ok(ChatResponse {
            response,
            passages_used: passages,
            processing_time_ms: started.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GenerationSettings;
    use crate::llm::{GenerationRequest, LlmProvider};
    use crate::rag::{CorpusIndex, CorpusInfo, EmbeddingService, IndexedChunk};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn embedding_for(text: &str) -> Vec<f32> {
        let mut v = [0.0f32; 4];
        for (i, b) in text.bytes().enumerate() {
            v[i % 4] += f32::from(b) / 255.0;
        }
        v.to_vec()
    }

    #[derive(Default)]
    struct FakeLlm {
        chat_calls: AtomicUsize,
        embed_calls: AtomicUsize,
        chat_delay: Duration,
        chat_error: Option<String>,
        embed_error: bool,
    }

    #[async_trait]
    impl LlmProvider for FakeLlm {
        fn name(&self) -> &str {
            "fake"
        }

        async fn chat(&self, request: GenerationRequest) -> Result<String, ApiError> {
            self.chat_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.chat_delay).await;
            if let Some(message) = &self.chat_error {
                return Err(ApiError::Internal(message.clone()));
            }
            let query = request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            Ok(format!("answer to: {}", query))
        }

        async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
            self.embed_calls.fetch_add(1, Ordering::SeqCst);
            if self.embed_error {
                return Err(ApiError::Internal("embedding backend down".to_string()));
            }
            Ok(inputs.iter().map(|t| embedding_for(t)).collect())
        }
    }

    struct Harness {
        service: ChatService,
        index: Arc<CorpusIndex>,
        cache: Arc<ContextCache>,
        sessions: Arc<SessionStore>,
        provider: Arc<FakeLlm>,
    }

    fn harness(provider: FakeLlm) -> Harness {
        let provider = Arc::new(provider);
        let index = Arc::new(CorpusIndex::new());
        let cache = Arc::new(ContextCache::new(Duration::from_secs(60), 10));
        let sessions = Arc::new(SessionStore::new(Duration::from_secs(60), 5));
        let embeddings = Arc::new(EmbeddingService::new(provider.clone(), 10));
        let retriever = Arc::new(Retriever::new(embeddings, index.clone(), 3));
        let generator = Arc::new(Generator::new(
            provider.clone(),
            "persona".to_string(),
            GenerationSettings {
                deadline: Duration::from_millis(200),
                temperature: 0.7,
                max_tokens: 100,
                top_p: 0.95,
            },
        ));
        let service = ChatService::new(sessions.clone(), cache.clone(), retriever, generator);
        Harness {
            service,
            index,
            cache,
            sessions,
            provider,
        }
    }

    async fn seed_corpus(index: &CorpusIndex, texts: &[&str]) {
        let chunks = texts
            .iter()
            .enumerate()
            .map(|(position, text)| IndexedChunk {
                id: format!("c{}", position),
                text: text.to_string(),
                embedding: embedding_for(text),
                position,
            })
            .collect::<Vec<_>>();
        let info = CorpusInfo::new("doc", chunks.len());
        index.replace(chunks, info).await.unwrap();
    }

    fn request(session_id: &str, query: &str) -> ChatRequest {
        ChatRequest {
            query: query.to_string(),
            session_id: session_id.to_string(),
            chat_history: Vec::new(),
            settings: ChatSettings::default(),
        }
    }

    #[tokio::test]
    async fn empty_query_is_rejected_before_any_work() {
        let h = harness(FakeLlm::default());

        let err = h
            .service
            .handle(request("s1", "   "))
            .await
            .expect_err("blank query must fail");

        assert!(matches!(err, ApiError::BadRequest(_)));
        assert_eq!(h.provider.embed_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.provider.chat_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn chat_answers_with_passages_and_records_one_turn() {
        let h = harness(FakeLlm::default());
        seed_corpus(
            &h.index,
            &["warranty is two years", "refunds in thirty days", "support by email"],
        )
        .await;

        let response = h
            .service
            .handle(request("s1", "What is the warranty?"))
            .await
            .unwrap();

        assert_eq!(response.response, "answer to: What is the warranty?");
        assert!(!response.passages_used.is_empty());
        assert!(response.passages_used.len() <= 3);

        let history = h.sessions.history("s1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].user, "What is the warranty?");
    }

    #[tokio::test]
    async fn repeated_query_is_served_from_cache_but_regenerated() {
        let h = harness(FakeLlm::default());
        seed_corpus(&h.index, &["warranty is two years"]).await;

        let first = h.service.handle(request("s1", "warranty?")).await.unwrap();
        let second = h.service.handle(request("s1", "warranty?")).await.unwrap();

        assert_eq!(first.passages_used, second.passages_used);
        assert_eq!(h.index.query_count(), 1);
        assert_eq!(h.provider.chat_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn retrieval_failure_degrades_to_no_context_and_is_not_cached() {
        let h = harness(FakeLlm {
            embed_error: true,
            ..FakeLlm::default()
        });

        let response = h.service.handle(request("s1", "anything")).await.unwrap();

        assert!(response.passages_used.is_empty());
        assert_eq!(h.cache.entry_count().await, 0);
        assert_eq!(h.provider.chat_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn timed_out_generation_does_not_persist_a_turn() {
        let h = harness(FakeLlm {
            chat_delay: Duration::from_millis(500),
            ..FakeLlm::default()
        });

        let err = h
            .service
            .handle(request("s1", "slow question"))
            .await
            .expect_err("deadline must fire");

        assert!(matches!(err, ApiError::GenerationTimeout(_)));
        assert!(h.sessions.history("s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_generation_does_not_persist_a_turn() {
        let h = harness(FakeLlm {
            chat_error: Some("model offline".to_string()),
            ..FakeLlm::default()
        });

        let err = h
            .service
            .handle(request("s1", "question"))
            .await
            .expect_err("generation failure must surface");

        assert!(matches!(err, ApiError::Generation(_)));
        assert!(h.sessions.history("s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sessions_keep_independent_caches_and_history() {
        let h = harness(FakeLlm::default());
        seed_corpus(&h.index, &["warranty is two years"]).await;

        h.service.handle(request("s1", "warranty?")).await.unwrap();
        h.service.handle(request("s2", "warranty?")).await.unwrap();

        assert_eq!(h.index.query_count(), 2);
        assert_eq!(h.cache.entry_count().await, 2);
        assert_eq!(h.sessions.history("s1").await.unwrap().len(), 1);
        assert_eq!(h.sessions.history("s2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn request_history_feeds_the_stored_turn_cap() {
        let h = harness(FakeLlm::default());

        let mut req = request("s1", "latest question");
        req.chat_history = (0..6)
            .map(|n| ChatTurn {
                user: format!("q{}", n),
                assistant: format!("a{}", n),
            })
            .collect();
        h.service.handle(req).await.unwrap();

        let history = h.sessions.history("s1").await.unwrap();
        assert_eq!(history.len(), 5);
        assert_eq!(history[4].user, "latest question");
        assert_eq!(history[0].user, "q2");
    }
}
