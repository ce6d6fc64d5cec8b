//! Storage seams — ideas, sessions, and reputation rows.
//!
//! The engine consumes persistence through these traits and never talks
//! to a concrete backend. In-memory implementations ship in-tree for
//! embedding and tests; they hold a `tokio::sync::RwLock` over plain
//! maps and are shared through `Arc` handles.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::catalog::AgentKind;
use crate::debate::state::DebateSession;
use crate::reputation::AgentReputation;

/// Error type for repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Lifecycle status of an idea, used only as a read filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdeaStatus {
    Proposed,
    Selected,
    Rejected,
}

impl std::fmt::Display for IdeaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Proposed => write!(f, "proposed"),
            Self::Selected => write!(f, "selected"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// A proposed unit of work. Read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Idea {
    pub id: String,
    pub project_id: String,
    /// Free-form category string matched against the selector's keyword table.
    pub category: String,
    pub title: String,
    pub description: String,
    pub reasoning: String,
    /// Effort estimate, 1 (small) to 3 (large).
    pub effort: u8,
    /// Impact estimate, 1 (low) to 3 (high).
    pub impact: u8,
    /// Agent kind that originated the idea, when known.
    pub source_agent: Option<AgentKind>,
    pub status: IdeaStatus,
}

/// Prompt context assembled from the read-only project accessors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectContext {
    pub project_id: String,
    pub goals: Vec<String>,
    pub context_notes: Vec<String>,
}

/// Read-only access to a project's ideas, goals, and context notes.
#[async_trait]
pub trait IdeaRepository: Send + Sync {
    /// Look up a single idea by id.
    async fn idea(&self, idea_id: &str) -> RepositoryResult<Option<Idea>>;

    /// Ideas for a project, optionally filtered by status.
    async fn ideas_for_project(
        &self,
        project_id: &str,
        status: Option<IdeaStatus>,
    ) -> RepositoryResult<Vec<Idea>>;

    /// Project goals, in declaration order.
    async fn goals(&self, project_id: &str) -> RepositoryResult<Vec<String>>;

    /// Free-form context notes for the project.
    async fn context_notes(&self, project_id: &str) -> RepositoryResult<Vec<String>>;
}

/// Key-value persistence for debate sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a session snapshot, overwriting any previous one.
    async fn save_session(&self, session: &DebateSession) -> RepositoryResult<()>;

    /// Load a session by id.
    async fn get_session(&self, session_id: &str) -> RepositoryResult<Option<DebateSession>>;

    /// Overwrite an existing session; `NotFound` if it was never saved.
    async fn update_session(&self, session: &DebateSession) -> RepositoryResult<()>;

    /// Remove a session.
    async fn delete_session(&self, session_id: &str) -> RepositoryResult<()>;
}

/// Closure applied inside a reputation read-modify-write.
pub type ReputationUpdate = Box<dyn FnOnce(&mut AgentReputation) + Send>;

/// Persistence for reputation rows keyed by (agent kind, project).
#[async_trait]
pub trait ReputationStore: Send + Sync {
    async fn get_reputation(
        &self,
        agent: AgentKind,
        project_id: &str,
    ) -> RepositoryResult<Option<AgentReputation>>;

    async fn upsert_reputation(&self, reputation: &AgentReputation) -> RepositoryResult<()>;

    /// Atomic read-modify-write for one (agent kind, project) key.
    ///
    /// Initializes a default row when none exists, applies the closure,
    /// and returns the updated row. Updates to different keys never
    /// contend with each other at the caller's level.
    async fn update_reputation(
        &self,
        agent: AgentKind,
        project_id: &str,
        apply: ReputationUpdate,
    ) -> RepositoryResult<AgentReputation>;
}

// =========================================================================
// In-memory implementations
// =========================================================================

/// In-memory idea repository for embedding and tests.
#[derive(Default)]
pub struct InMemoryIdeaRepository {
    ideas: RwLock<Vec<Idea>>,
    goals: RwLock<HashMap<String, Vec<String>>>,
    notes: RwLock<HashMap<String, Vec<String>>>,
}

impl InMemoryIdeaRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared handle.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub async fn add_idea(&self, idea: Idea) {
        self.ideas.write().await.push(idea);
    }

    pub async fn set_goals(&self, project_id: &str, goals: Vec<String>) {
        self.goals
            .write()
            .await
            .insert(project_id.to_string(), goals);
    }

    pub async fn set_context_notes(&self, project_id: &str, notes: Vec<String>) {
        self.notes
            .write()
            .await
            .insert(project_id.to_string(), notes);
    }
}

#[async_trait]
impl IdeaRepository for InMemoryIdeaRepository {
    async fn idea(&self, idea_id: &str) -> RepositoryResult<Option<Idea>> {
        Ok(self
            .ideas
            .read()
            .await
            .iter()
            .find(|i| i.id == idea_id)
            .cloned())
    }

    async fn ideas_for_project(
        &self,
        project_id: &str,
        status: Option<IdeaStatus>,
    ) -> RepositoryResult<Vec<Idea>> {
        Ok(self
            .ideas
            .read()
            .await
            .iter()
            .filter(|i| i.project_id == project_id)
            .filter(|i| status.map_or(true, |s| i.status == s))
            .cloned()
            .collect())
    }

    async fn goals(&self, project_id: &str) -> RepositoryResult<Vec<String>> {
        Ok(self
            .goals
            .read()
            .await
            .get(project_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn context_notes(&self, project_id: &str) -> RepositoryResult<Vec<String>> {
        Ok(self
            .notes
            .read()
            .await
            .get(project_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// In-memory session store.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, DebateSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Number of stored sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save_session(&self, session: &DebateSession) -> RepositoryResult<()> {
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> RepositoryResult<Option<DebateSession>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn update_session(&self, session: &DebateSession) -> RepositoryResult<()> {
        let mut sessions = self.sessions.write().await;
        if !sessions.contains_key(&session.id) {
            return Err(RepositoryError::NotFound(session.id.clone()));
        }
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> RepositoryResult<()> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}

/// In-memory reputation store.
#[derive(Default)]
pub struct InMemoryReputationStore {
    rows: RwLock<HashMap<(AgentKind, String), AgentReputation>>,
}

impl InMemoryReputationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl ReputationStore for InMemoryReputationStore {
    async fn get_reputation(
        &self,
        agent: AgentKind,
        project_id: &str,
    ) -> RepositoryResult<Option<AgentReputation>> {
        Ok(self
            .rows
            .read()
            .await
            .get(&(agent, project_id.to_string()))
            .cloned())
    }

    async fn upsert_reputation(&self, reputation: &AgentReputation) -> RepositoryResult<()> {
        self.rows.write().await.insert(
            (reputation.agent, reputation.project_id.clone()),
            reputation.clone(),
        );
        Ok(())
    }

    async fn update_reputation(
        &self,
        agent: AgentKind,
        project_id: &str,
        apply: ReputationUpdate,
    ) -> RepositoryResult<AgentReputation> {
        // The write lock spans the whole read-modify-write, so concurrent
        // updates to the same key serialize instead of losing increments.
        let mut rows = self.rows.write().await;
        let row = rows
            .entry((agent, project_id.to_string()))
            .or_insert_with(|| AgentReputation::new(agent, project_id));
        apply(row);
        Ok(row.clone())
    }
}
