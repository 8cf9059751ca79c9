use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use fixchain_core::{Message, Role};
use serde::{Deserialize, Serialize};

use crate::SessionError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub user_id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionInfo {
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            title: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// How an exchange ended for the turn that records it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnStatus {
    #[default]
    Completed,
    Cancelled,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    #[serde(default)]
    pub status: TurnStatus,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>, status: TurnStatus) -> Self {
        Self {
            role,
            text: text.into(),
            status,
            created_at: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text, TurnStatus::Completed)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text, TurnStatus::Completed)
    }

    /// Marker for an exchange the client abandoned before an answer arrived.
    pub fn cancelled() -> Self {
        Self::new(Role::Assistant, "", TurnStatus::Cancelled)
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::new(Role::Assistant, reason, TurnStatus::Failed)
    }

    /// Completed turns become pipeline context; markers do not.
    pub fn to_message(&self) -> Option<Message> {
        match self.status {
            TurnStatus::Completed if !self.text.trim().is_empty() => {
                Some(Message::new(self.role.clone(), self.text.clone()))
            }
            _ => None,
        }
    }
}

/// Durable conversation history, scoped by session.
///
/// Ownership checks are left to the caller: the store answers who owns a
/// session and trusts whoever asks.
#[async_trait::async_trait]
pub trait HistoryStore: Send + Sync + 'static {
    async fn create_session(&self, user_id: &str) -> Result<SessionInfo, SessionError>;

    async fn session(&self, session_id: &str) -> Result<Option<SessionInfo>, SessionError>;

    async fn session_owner(&self, session_id: &str) -> Result<Option<String>, SessionError> {
        Ok(self.session(session_id).await?.map(|info| info.user_id))
    }

    /// Newest first.
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionInfo>, SessionError>;

    /// Returns `false` when there was nothing to delete.
    async fn delete_session(&self, session_id: &str) -> Result<bool, SessionError>;

    async fn set_title(&self, session_id: &str, title: &str) -> Result<(), SessionError>;

    /// Every turn of the session in the order it was appended.
    async fn load(&self, session_id: &str) -> Result<Vec<Turn>, SessionError>;

    async fn append(&self, session_id: &str, turn: Turn) -> Result<(), SessionError>;
}

#[derive(Default)]
struct Sessions {
    // Creation order; listing walks it backwards.
    infos: Vec<SessionInfo>,
    turns: HashMap<String, Vec<Turn>>,
}

impl Sessions {
    fn find_mut(&mut self, session_id: &str) -> Option<&mut SessionInfo> {
        self.infos
            .iter_mut()
            .find(|info| info.session_id == session_id)
    }
}

#[derive(Default, Clone)]
pub struct InMemoryHistoryStore {
    inner: Arc<RwLock<Sessions>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn create_session(&self, user_id: &str) -> Result<SessionInfo, SessionError> {
        let info = SessionInfo::new(user_id);
        let mut guard = self.inner.write().map_err(|_| SessionError::Lock)?;
        guard.turns.insert(info.session_id.clone(), Vec::new());
        guard.infos.push(info.clone());
        Ok(info)
    }

    async fn session(&self, session_id: &str) -> Result<Option<SessionInfo>, SessionError> {
        let guard = self.inner.read().map_err(|_| SessionError::Lock)?;
        Ok(guard
            .infos
            .iter()
            .find(|info| info.session_id == session_id)
            .cloned())
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionInfo>, SessionError> {
        let guard = self.inner.read().map_err(|_| SessionError::Lock)?;
        Ok(guard
            .infos
            .iter()
            .rev()
            .filter(|info| info.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_session(&self, session_id: &str) -> Result<bool, SessionError> {
        let mut guard = self.inner.write().map_err(|_| SessionError::Lock)?;
        let before = guard.infos.len();
        guard.infos.retain(|info| info.session_id != session_id);
        guard.turns.remove(session_id);
        Ok(guard.infos.len() != before)
    }

    async fn set_title(&self, session_id: &str, title: &str) -> Result<(), SessionError> {
        let mut guard = self.inner.write().map_err(|_| SessionError::Lock)?;
        let info = guard
            .find_mut(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        info.title = Some(title.to_string());
        info.updated_at = Utc::now();
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Vec<Turn>, SessionError> {
        let guard = self.inner.read().map_err(|_| SessionError::Lock)?;
        guard
            .turns
            .get(session_id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }

    async fn append(&self, session_id: &str, turn: Turn) -> Result<(), SessionError> {
        let mut guard = self.inner.write().map_err(|_| SessionError::Lock)?;
        let updated_at = turn.created_at;
        guard
            .turns
            .get_mut(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?
            .push(turn);
        if let Some(info) = guard.find_mut(session_id) {
            info.updated_at = updated_at;
        }
        Ok(())
    }
}
