use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Cache key for retrieval results. Queries are trimmed and lowercased so
/// cased or re-whitespaced variants of one question share an entry, while
/// different sessions never do.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    session_id: String,
    query: String,
}

impl CacheKey {
    pub fn new(session_id: &str, query: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            query: query.trim().to_lowercase(),
        }
    }
}

struct CacheSlot {
    passages: Vec<String>,
    stored_at: Instant,
}

/// TTL and capacity bounded cache of retrieved passages per (session, query).
///
/// Expiry is checked lazily on access. At capacity, `set` drops the entry
/// with the oldest store time, not the least recently read one; reads never
/// refresh an entry's age.
pub struct ContextCache {
    entries: Mutex<HashMap<CacheKey, CacheSlot>>,
    ttl: Duration,
    max_entries: usize,
}

impl ContextCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub async fn get(&self, session_id: &str, query: &str) -> Option<Vec<String>> {
        let key = CacheKey::new(session_id, query);
        let mut entries = self.entries.lock().await;
        match entries.get(&key) {
            Some(slot) if slot.stored_at.elapsed() < self.ttl => Some(slot.passages.clone()),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    pub async fn set(&self, session_id: &str, query: &str, passages: Vec<String>) {
        let key = CacheKey::new(session_id, query);
        let mut entries = self.entries.lock().await;
        if entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, slot)| slot.stored_at)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }
        entries.insert(
            key,
            CacheSlot {
                passages,
                stored_at: Instant::now(),
            },
        );
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn entry_count(&self) -> usize {
        self.entries.lock().await.len()
    }
}
