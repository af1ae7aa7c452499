use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::{AppError, Result};
use crate::types::{Event, Session};

/// In-memory store of active (not yet finished) sessions.
///
/// The outer map is keyed by user id; each user's sessions live in one
/// `HashMap` behind that user's dashmap entry, so a read-modify-write on one
/// user never contends with requests for other users. Sessions are never
/// deleted — an ended session stays queryable until the process exits.
pub struct SessionStore {
    /// user_id → session_id → Session
    sessions: DashMap<String, HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sessions: DashMap::new(),
        })
    }

    /// Append an event, creating the session record if absent.
    /// A new session's `start_time` defaults to the event's timestamp.
    pub fn append_event(&self, user_id: &str, session_id: &str, event: Event) {
        let mut user_sessions = self.sessions.entry(user_id.to_string()).or_default();
        let session = user_sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Session {
                start_time: Some(event.timestamp.clone()),
                end_time: None,
                events: Vec::new(),
            });
        session.events.push(event);
    }

    /// Set `end_time` to `ended_at` if it is not already set. Idempotent:
    /// a second call leaves the original end time in place.
    pub fn mark_ended(&self, user_id: &str, session_id: &str, ended_at: &str) -> Result<()> {
        let mut user_sessions = self
            .sessions
            .get_mut(user_id)
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;
        let session = user_sessions
            .get_mut(session_id)
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;
        if session.end_time.is_none() {
            session.end_time = Some(ended_at.to_string());
        }
        Ok(())
    }

    pub fn get(&self, user_id: &str, session_id: &str) -> Option<Session> {
        self.sessions.get(user_id)?.get(session_id).cloned()
    }
}
