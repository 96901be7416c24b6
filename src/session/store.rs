//! In-memory session store.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};

use crate::types::{Role, Turn};
use crate::util::tokens::approx_history_tokens;

/// Caller-supplied opaque session identifier.
pub type SessionId = i64;

/// One ongoing conversation.
///
/// Once initialized a session always holds at least the leading system turn;
/// truncation and compression replace it but never remove it.
#[derive(Debug, Clone)]
pub struct Session {
    pub turns: Vec<Turn>,
    pub last_activity: DateTime<Utc>,
    /// Set by the collaborator that injects image content; cleared on every
    /// (re)initialization.
    pub vision: bool,
}

impl Session {
    fn seeded(system_content: &str) -> Self {
        Self {
            turns: vec![Turn::system(system_content)],
            last_activity: Utc::now(),
            vision: false,
        }
    }
}

/// Shared mapping from session id to conversation state.
///
/// Sessions are created lazily, reset on age expiry or explicit reset, and
/// live for the life of the process. The store serializes individual map
/// accesses but provides no cross-call locking: callers must not run two
/// operations for the same session id concurrently.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
    init_content: String,
    reset_content: String,
    max_age: Duration,
}

impl SessionStore {
    /// `init_content` seeds the system turn on lazy initialization;
    /// `reset_content` is the default for explicit resets.
    pub fn new(
        init_content: impl Into<String>,
        reset_content: impl Into<String>,
        max_age_minutes: i64,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            init_content: init_content.into(),
            reset_content: reset_content.into(),
            max_age: Duration::minutes(max_age_minutes),
        }
    }

    /// Ensure a live session exists for `id`, reinitializing when absent or
    /// idle beyond the configured maximum age.
    pub fn get_or_init(&self, id: SessionId) {
        let mut sessions = self.sessions.write().expect("session store lock");
        match sessions.get(&id) {
            Some(session) if Utc::now() - session.last_activity <= self.max_age => {}
            _ => {
                sessions.insert(id, Session::seeded(&self.init_content));
            }
        }
    }

    /// Replace all turns with a single system turn and clear the vision flag.
    pub fn reset(&self, id: SessionId, content: Option<&str>) {
        let content = match content {
            Some(c) if !c.is_empty() => c,
            _ => &self.reset_content,
        };
        self.sessions
            .write()
            .expect("session store lock")
            .insert(id, Session::seeded(content));
    }

    /// Turn count and approximate token count, lazily initializing if absent.
    ///
    /// Unlike [`get_or_init`](Self::get_or_init) this never applies the age
    /// rule: a stale session keeps its history until the next chat turn.
    pub fn stats(&self, id: SessionId) -> (usize, u32) {
        let mut sessions = self.sessions.write().expect("session store lock");
        let session = sessions
            .entry(id)
            .or_insert_with(|| Session::seeded(&self.init_content));
        (session.turns.len(), approx_history_tokens(&session.turns))
    }

    /// Append a turn. Does not bump `last_activity`; compression rewrites go
    /// through here too and must not refresh the age clock.
    pub fn push(&self, id: SessionId, turn: Turn) {
        if let Some(session) = self
            .sessions
            .write()
            .expect("session store lock")
            .get_mut(&id)
        {
            session.turns.push(turn);
        }
    }

    /// Mark user activity (a new query was admitted).
    pub fn touch(&self, id: SessionId) {
        if let Some(session) = self
            .sessions
            .write()
            .expect("session store lock")
            .get_mut(&id)
        {
            session.last_activity = Utc::now();
        }
    }

    /// Keep only the most recent `keep` turns (truncate fallback).
    pub fn truncate_to_suffix(&self, id: SessionId, keep: usize) {
        if let Some(session) = self
            .sessions
            .write()
            .expect("session store lock")
            .get_mut(&id)
        {
            let len = session.turns.len();
            if len > keep {
                session.turns.drain(..len - keep);
            }
        }
    }

    /// Snapshot of a session's turns (empty if the session does not exist).
    pub fn turns(&self, id: SessionId) -> Vec<Turn> {
        self.sessions
            .read()
            .expect("session store lock")
            .get(&id)
            .map(|s| s.turns.clone())
            .unwrap_or_default()
    }

    /// Content of the leading system turn, if the session exists.
    pub fn system_content(&self, id: SessionId) -> Option<String> {
        self.sessions
            .read()
            .expect("session store lock")
            .get(&id)
            .and_then(|s| s.turns.first())
            .filter(|t| t.role == Role::System)
            .map(|t| t.content.clone())
    }

    /// Set the vision flag for a session.
    pub fn set_vision(&self, id: SessionId, vision: bool) {
        if let Some(session) = self
            .sessions
            .write()
            .expect("session store lock")
            .get_mut(&id)
        {
            session.vision = vision;
        }
    }

    /// Current vision flag (false if the session does not exist).
    pub fn vision(&self, id: SessionId) -> bool {
        self.sessions
            .read()
            .expect("session store lock")
            .get(&id)
            .map(|s| s.vision)
            .unwrap_or(false)
    }

    #[cfg(test)]
    pub(crate) fn backdate(&self, id: SessionId, minutes: i64) {
        if let Some(session) = self
            .sessions
            .write()
            .expect("session store lock")
            .get_mut(&id)
        {
            session.last_activity = Utc::now() - Duration::minutes(minutes);
        }
    }
}
