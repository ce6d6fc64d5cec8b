//! Reputation tracking — per (agent kind, project) accuracy statistics.
//!
//! Scores are always recomputed from the full counters. Replaying the
//! same validation history produces the same score, so feedback events
//! can be applied in any order or batched without drift.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::catalog::AgentKind;
use crate::repository::{RepositoryResult, ReputationStore};

/// Accuracy statistics and derived score for one agent kind in one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentReputation {
    /// Which agent kind this row scores.
    pub agent: AgentKind,
    /// Project scope of the row.
    pub project_id: String,
    /// Total critiques that received validation feedback.
    pub total_critiques: u32,
    /// Critiques a human confirmed.
    pub validated: u32,
    /// Critiques a human rejected.
    pub rejected: u32,
    /// `validated / total`, 0.5 until the first feedback event.
    pub accuracy: f64,
    /// Derived score in [50, 100].
    pub score: u32,
}

impl AgentReputation {
    /// Fresh row: no history, neutral accuracy, base score.
    pub fn new(agent: AgentKind, project_id: &str) -> Self {
        Self {
            agent,
            project_id: project_id.to_string(),
            total_critiques: 0,
            validated: 0,
            rejected: 0,
            accuracy: 0.5,
            score: 50,
        }
    }

    /// Apply one validation event and recompute the derived fields.
    pub fn apply_validation(&mut self, validated: bool) {
        self.total_critiques += 1;
        if validated {
            self.validated += 1;
        } else {
            self.rejected += 1;
        }
        self.recompute();
    }

    /// Recompute `accuracy` and `score` from the counters.
    ///
    /// Accuracy contributes up to 30 points, critique volume (capped at
    /// 10 critiques) up to 20 points, atop a 50-point base.
    pub fn recompute(&mut self) {
        self.accuracy = if self.total_critiques == 0 {
            0.5
        } else {
            f64::from(self.validated) / f64::from(self.total_critiques)
        };
        let volume = (f64::from(self.total_critiques) / 10.0).min(1.0);
        self.score = (50.0 + self.accuracy * 30.0 + volume * 20.0).round() as u32;
    }

    /// Ballot weight derived from the score, bounded to [0.5, 1.0].
    pub fn vote_weight(&self) -> f64 {
        0.5 + f64::from(self.score) / 200.0
    }
}

/// Applies validation feedback through the reputation store.
///
/// Each event is a read-modify-write scoped to a single
/// (agent kind, project) key, so concurrent validations of different
/// agents never contend and same-key updates never lose increments.
pub struct ReputationTracker {
    store: Arc<dyn ReputationStore>,
}

impl ReputationTracker {
    pub fn new(store: Arc<dyn ReputationStore>) -> Self {
        Self { store }
    }

    /// Record one human validation verdict for an agent's critique.
    ///
    /// Initializes the row lazily on first feedback.
    pub async fn record_validation(
        &self,
        agent: AgentKind,
        project_id: &str,
        validated: bool,
    ) -> RepositoryResult<AgentReputation> {
        let updated = self
            .store
            .update_reputation(
                agent,
                project_id,
                Box::new(move |rep| rep.apply_validation(validated)),
            )
            .await?;
        debug!(
            agent = %agent,
            project_id,
            validated,
            score = updated.score,
            "Recorded critique validation"
        );
        Ok(updated)
    }

    /// Current reputation row, if any feedback has been recorded.
    pub async fn reputation(
        &self,
        agent: AgentKind,
        project_id: &str,
    ) -> RepositoryResult<Option<AgentReputation>> {
        self.store.get_reputation(agent, project_id).await
    }
}
