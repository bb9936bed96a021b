use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// One exchange in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub user: String,
    pub assistant: String,
}

struct SessionState {
    history: Vec<ChatTurn>,
    last_access: Instant,
}

/// In-memory conversation state keyed by session id.
///
/// Sessions are created lazily, keep only the most recent turns, and are
/// removed by `sweep` once idle past the timeout. There is no background
/// timer; callers sweep opportunistically before handling a chat.
pub struct SessionStore {
    inner: Mutex<HashMap<String, SessionState>>,
    idle_timeout: Duration,
    max_turns: usize,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration, max_turns: usize) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            idle_timeout,
            max_turns: max_turns.max(1),
        }
    }

    /// Returns the stored history, creating an empty session on first use.
    /// Counts as activity for idle tracking.
    pub async fn get_or_create(&self, session_id: &str) -> Vec<ChatTurn> {
        let mut inner = self.inner.lock().await;
        let state = inner
            .entry(session_id.to_string())
            .or_insert_with(|| SessionState {
                history: Vec::new(),
                last_access: Instant::now(),
            });
        state.last_access = Instant::now();
        state.history.clone()
    }

    /// Marks the session as recently used without touching its history.
    pub async fn touch(&self, session_id: &str) {
        if let Some(state) = self.inner.lock().await.get_mut(session_id) {
            state.last_access = Instant::now();
        }
    }

    /// Overwrites the session's history, keeping only the last `max_turns`.
    pub async fn set_history(&self, session_id: &str, mut turns: Vec<ChatTurn>) {
        if turns.len() > self.max_turns {
            turns = turns.split_off(turns.len() - self.max_turns);
        }
        let mut inner = self.inner.lock().await;
        inner.insert(
            session_id.to_string(),
            SessionState {
                history: turns,
                last_access: Instant::now(),
            },
        );
    }

    pub async fn history(&self, session_id: &str) -> Option<Vec<ChatTurn>> {
        self.inner
            .lock()
            .await
            .get(session_id)
            .map(|state| state.history.clone())
    }

    /// Removes every session idle longer than the timeout.
    pub async fn sweep(&self) {
        let mut inner = self.inner.lock().await;
        let before = inner.len();
        inner.retain(|_, state| state.last_access.elapsed() < self.idle_timeout);
        let removed = before - inner.len();
        if removed > 0 {
            tracing::debug!("Swept {} idle session(s)", removed);
        }
    }

    pub async fn clear(&self) {
        self.inner.lock().await.clear();
    }

    pub async fn session_count(&self) -> usize {
        self.inner.lock().await.len()
    }
}
