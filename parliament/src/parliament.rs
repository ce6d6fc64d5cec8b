//! Parliament service — the public evaluation entry points.
//!
//! Wires the repository, session store, reputation store, and generation
//! provider into `run_debate` / `run_quick_debate`. Callers always get a
//! `DebateResult` back; evaluation-fatal failures are folded into an
//! error-shaped result rather than surfaced as an `Err`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::catalog::AgentKind;
use crate::config::ParliamentConfig;
use crate::debate::orchestrator::DebateOrchestrator;
use crate::debate::state::DebateSession;
use crate::debate::tradeoff::TradeOffAnalysis;
use crate::error::{EvaluationError, EvaluationResult};
use crate::generation::{GenerationProvider, TokenUsage};
use crate::reputation::{AgentReputation, ReputationTracker};
use crate::repository::{
    Idea, IdeaRepository, ProjectContext, RepositoryResult, ReputationStore, SessionStore,
};
use crate::selector::select_agents;
use crate::voting::ParliamentaryVote;

/// Reasoning text used whenever an evaluation fails outright.
const ERROR_REASONING: &str = "Error during parliament evaluation";

/// Ideas debated per quick-debate batch, at most.
const QUICK_DEBATE_LIMIT: usize = 5;

/// The outcome of one idea's evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateResult {
    pub session_id: String,
    pub idea_id: String,
    /// Set only when the vote passed.
    pub selected_idea_id: Option<String>,
    pub passed: bool,
    pub reasoning: String,
    /// Agreement level of the last closed round.
    pub consensus_level: f64,
    pub trade_offs: Vec<TradeOffAnalysis>,
    pub vote: Option<ParliamentaryVote>,
    pub rounds_completed: u32,
    pub token_usage: TokenUsage,
    /// Present only for evaluation-fatal failures.
    pub error: Option<String>,
}

impl DebateResult {
    fn from_session(session: &DebateSession) -> Self {
        let vote = session.vote.clone();
        let reasoning = match &vote {
            Some(v) if v.passed => format!(
                "Idea selected: {} support vs {} oppose (weighted margin {:.2}) \
                 after {} rounds",
                v.support_count,
                v.oppose_count,
                v.margin,
                session.rounds_completed()
            ),
            Some(v) => format!(
                "Idea not selected: {} support vs {} oppose (weighted margin {:.2}) \
                 after {} rounds",
                v.support_count,
                v.oppose_count,
                v.margin,
                session.rounds_completed()
            ),
            None => "Debate ended without a vote".to_string(),
        };

        Self {
            session_id: session.id.clone(),
            idea_id: session.idea_id.clone(),
            selected_idea_id: session.selected_idea_id.clone(),
            passed: vote.as_ref().map(|v| v.passed).unwrap_or(false),
            reasoning,
            consensus_level: session
                .rounds
                .last()
                .map(|r| r.consensus_level)
                .unwrap_or(0.0),
            trade_offs: session.trade_offs.clone(),
            vote,
            rounds_completed: session.rounds_completed(),
            token_usage: session.token_usage,
            error: None,
        }
    }

    fn from_error(idea_id: &str, err: &EvaluationError) -> Self {
        Self {
            session_id: String::new(),
            idea_id: idea_id.to_string(),
            selected_idea_id: None,
            passed: false,
            reasoning: ERROR_REASONING.to_string(),
            consensus_level: 0.0,
            trade_offs: Vec::new(),
            vote: None,
            rounds_completed: 0,
            token_usage: TokenUsage::default(),
            error: Some(err.to_string()),
        }
    }
}

/// The outcome of a quick-debate batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickDebateResult {
    /// Winning idea id: the passed result with the highest consensus
    /// level, or none when no idea passed.
    pub selected_idea_id: Option<String>,
    pub results: Vec<DebateResult>,
}

/// Evaluation facade over the debate engine and its stores.
pub struct ParliamentService {
    ideas: Arc<dyn IdeaRepository>,
    sessions: Arc<dyn SessionStore>,
    reputation: Arc<dyn ReputationStore>,
    provider: Arc<dyn GenerationProvider>,
    config: ParliamentConfig,
    tracker: ReputationTracker,
}

impl ParliamentService {
    pub fn new(
        ideas: Arc<dyn IdeaRepository>,
        sessions: Arc<dyn SessionStore>,
        reputation: Arc<dyn ReputationStore>,
        provider: Arc<dyn GenerationProvider>,
        config: ParliamentConfig,
    ) -> Self {
        let tracker = ReputationTracker::new(Arc::clone(&reputation));
        Self {
            ideas,
            sessions,
            reputation,
            provider,
            config,
            tracker,
        }
    }

    /// Debate one idea to completion and persist the terminal session.
    ///
    /// Never returns an error: fatal failures come back as an
    /// error-shaped `DebateResult`.
    pub async fn run_debate(
        &self,
        idea_id: &str,
        project_id: &str,
        context: &ProjectContext,
        config: Option<ParliamentConfig>,
    ) -> DebateResult {
        let config = config.unwrap_or_else(|| self.config.clone());
        match self.evaluate(idea_id, project_id, context, &config).await {
            Ok(session) => DebateResult::from_session(&session),
            Err(e) => {
                error!(idea = idea_id, error = %e, "Evaluation failed");
                DebateResult::from_error(idea_id, &e)
            }
        }
    }

    /// Debate up to five ideas independently with a shortened round
    /// budget and pick the strongest passed result.
    pub async fn run_quick_debate(
        &self,
        idea_ids: &[String],
        project_id: &str,
        context: &ProjectContext,
    ) -> QuickDebateResult {
        let quick = self.config.quick();
        let mut results = Vec::new();
        for idea_id in idea_ids.iter().take(QUICK_DEBATE_LIMIT) {
            let result = self
                .run_debate(idea_id, project_id, context, Some(quick.clone()))
                .await;
            results.push(result);
        }

        let selected_idea_id = results
            .iter()
            .filter(|r| r.passed)
            .max_by(|a, b| {
                a.consensus_level
                    .partial_cmp(&b.consensus_level)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|r| r.idea_id.clone());

        info!(
            candidates = results.len(),
            selected = selected_idea_id.as_deref().unwrap_or("-"),
            "Quick debate finished"
        );
        QuickDebateResult {
            selected_idea_id,
            results,
        }
    }

    /// Record one human validation verdict against an agent's critique.
    pub async fn record_validation(
        &self,
        agent: AgentKind,
        project_id: &str,
        validated: bool,
    ) -> RepositoryResult<AgentReputation> {
        self.tracker
            .record_validation(agent, project_id, validated)
            .await
    }

    /// Assemble a `ProjectContext` from the idea repository.
    pub async fn load_project_context(&self, project_id: &str) -> RepositoryResult<ProjectContext> {
        Ok(ProjectContext {
            project_id: project_id.to_string(),
            goals: self.ideas.goals(project_id).await?,
            context_notes: self.ideas.context_notes(project_id).await?,
        })
    }

    async fn evaluate(
        &self,
        idea_id: &str,
        project_id: &str,
        context: &ProjectContext,
        config: &ParliamentConfig,
    ) -> EvaluationResult<DebateSession> {
        let idea: Idea = self
            .ideas
            .idea(idea_id)
            .await?
            .ok_or_else(|| EvaluationError::UnknownIdea(idea_id.to_string()))?;
        if idea.project_id != project_id {
            return Err(EvaluationError::UnknownIdea(format!(
                "{idea_id} (not in project {project_id})"
            )));
        }

        let roster = select_agents(&idea, config);
        let orchestrator =
            DebateOrchestrator::new(self.provider.as_ref(), self.reputation.as_ref(), config);
        let session = orchestrator.run(&idea, context, &roster).await?;

        // The session is only persisted once terminal, so storage never
        // holds a half-finished debate.
        self.sessions.save_session(&session).await?;
        Ok(session)
    }

    /// A previously persisted terminal session.
    pub async fn session(&self, session_id: &str) -> RepositoryResult<Option<DebateSession>> {
        self.sessions.get_session(session_id).await
    }
}
