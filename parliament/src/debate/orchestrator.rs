//! Debate orchestrator — the round loop that drives a session from
//! seating to terminal status.
//!
//! Each round executes one turn per seated agent in roster order, then
//! runs a consensus check that decides whether to keep debating. After
//! the loop the transcript is mined for trade-offs and the vote settles
//! the final status. A generation failure anywhere degrades to a
//! default turn or signal; the orchestrator itself only fails on
//! invalid session transitions, which would indicate a logic bug.

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::catalog::AgentKind;
use crate::config::ParliamentConfig;
use crate::debate::consensus::{check_consensus, Recommendation};
use crate::debate::state::{
    AgentDebateState, DebateRole, DebateRound, DebateSession, DebateTurn, RoundOutcome,
    SessionStatus, TurnAction,
};
use crate::debate::tradeoff::extract_trade_offs;
use crate::error::EvaluationResult;
use crate::generation::{
    parse_json_lenient, GenerationProvider, GenerationRequest, TokenUsage,
};
use crate::prompts;
use crate::repository::{Idea, ProjectContext, ReputationStore};
use crate::selector::Roster;
use crate::voting::conduct_vote;

/// Longest slice of a raw response kept when a turn cannot be parsed.
const DEGRADED_CONTENT_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
struct RawTurn {
    action: TurnAction,
    content: String,
    #[serde(default)]
    confidence: Option<u8>,
    #[serde(default)]
    target_agent: Option<String>,
    #[serde(default)]
    position_change: bool,
}

/// A parsed (or degraded) turn plus what it cost.
struct TurnResult {
    turn: DebateTurn,
    position_change: bool,
    usage: TokenUsage,
}

/// Drives one idea's debate to completion.
pub struct DebateOrchestrator<'a> {
    provider: &'a dyn GenerationProvider,
    reputation: &'a dyn ReputationStore,
    config: &'a ParliamentConfig,
}

impl<'a> DebateOrchestrator<'a> {
    pub fn new(
        provider: &'a dyn GenerationProvider,
        reputation: &'a dyn ReputationStore,
        config: &'a ParliamentConfig,
    ) -> Self {
        Self {
            provider,
            reputation,
            config,
        }
    }

    /// Run the full debate lifecycle and return the terminal session.
    pub async fn run(
        &self,
        idea: &Idea,
        context: &ProjectContext,
        roster: &Roster,
    ) -> EvaluationResult<DebateSession> {
        let mut session = DebateSession::new(&idea.project_id, &idea.id, roster, self.config);
        info!(
            session = %session.id,
            idea = %idea.id,
            seats = roster.len(),
            "Debate opened"
        );

        for round in 1..=self.config.max_rounds {
            let status = if round == 1 {
                SessionStatus::Proposing
            } else {
                SessionStatus::Challenging
            };
            session.advance(status, &format!("round {round} opened"))?;

            let outcome = self
                .execute_round(&mut session, idea, context, roster, round)
                .await;
            debug!(session = %session.id, round, %outcome, "Round closed");
            if outcome != RoundOutcome::Ongoing {
                break;
            }
        }

        let trade_offs = extract_trade_offs(&session.transcript());
        session.trade_offs = trade_offs;

        let mediator_spoke = session
            .transcript()
            .iter()
            .any(|t| t.role == DebateRole::Mediator);
        if mediator_spoke {
            session.advance(SessionStatus::Mediating, "mediator synthesis on record")?;
        }
        session.advance(SessionStatus::Voting, "collecting ballots")?;

        let summary = debate_summary(&session);
        let (vote, vote_usage) = conduct_vote(
            self.provider,
            self.reputation,
            idea,
            &session.roster,
            &summary,
            &session.trade_offs,
            self.config,
        )
        .await;
        session.token_usage.add(vote_usage);

        let support_ratio = vote.support_count as f64 / session.roster.len() as f64;
        let passed = vote.passed;
        if passed {
            session.selected_idea_id = Some(idea.id.clone());
        }
        session.vote = Some(vote);

        if support_ratio >= session.consensus_threshold {
            session.advance(
                SessionStatus::Consensus,
                &format!("support ratio {support_ratio:.2} met threshold"),
            )?;
        } else if !passed && self.rounds_exhausted_without_consensus(&session) {
            session.advance(SessionStatus::Deadlock, "rounds exhausted, vote failed")?;
            session.advance(SessionStatus::Completed, "deadlock resolved by vote")?;
        } else {
            session.advance(
                SessionStatus::Completed,
                &format!("support ratio {support_ratio:.2} below threshold"),
            )?;
        }

        session.finalize();
        info!(session = %session.id, "{}", session.summary_line());
        Ok(session)
    }

    fn rounds_exhausted_without_consensus(&self, session: &DebateSession) -> bool {
        session.rounds_completed() >= session.max_rounds
            && !session
                .rounds
                .iter()
                .any(|r| r.outcome == RoundOutcome::Consensus)
    }

    /// Execute every agent's turn for one round, then the consensus
    /// check, and append the closed round to the session.
    async fn execute_round(
        &self,
        session: &mut DebateSession,
        idea: &Idea,
        context: &ProjectContext,
        roster: &Roster,
        round: u32,
    ) -> RoundOutcome {
        let mut turns: Vec<DebateTurn> = Vec::new();

        for &agent in &roster.agents {
            let role = roster.role_of(agent);
            // Voters defer to the speaking roles until the final round.
            if role == DebateRole::Voter
                && round < session.max_rounds
                && roster.has_non_voter_roles()
            {
                continue;
            }

            let result = self
                .execute_turn(session, idea, context, roster, round, agent, role, &turns)
                .await;
            session.token_usage.add(result.usage);
            self.apply_turn(session, &result.turn, result.position_change);
            turns.push(result.turn);
        }

        let positions: Vec<(AgentKind, &AgentDebateState)> = roster
            .agents
            .iter()
            .filter_map(|&a| session.agent_states.get(&a).map(|s| (a, s)))
            .collect();
        let (signal, usage) = check_consensus(self.provider, &idea.title, &positions).await;
        session.token_usage.add(usage);

        let outcome = if signal.reached {
            RoundOutcome::Consensus
        } else if round == session.max_rounds
            || signal.recommendation == Recommendation::ProceedToVote
        {
            RoundOutcome::VoteRequired
        } else if signal.recommendation == Recommendation::Escalate {
            RoundOutcome::Escalate
        } else {
            RoundOutcome::Ongoing
        };

        let summary = format!(
            "round {round}: {} turns, agreement {:.2}, outcome {outcome}",
            turns.len(),
            signal.level
        );
        session.record_round(DebateRound {
            round_number: round,
            proposer: roster.proposer().unwrap_or(roster.agents[0]),
            challengers: roster.challengers(),
            mediator: roster.mediator(),
            turns,
            outcome,
            summary,
            consensus_level: signal.level,
        });

        outcome
    }

    /// One agent's turn: prompt, generate, parse defensively.
    #[allow(clippy::too_many_arguments)]
    async fn execute_turn(
        &self,
        session: &DebateSession,
        idea: &Idea,
        context: &ProjectContext,
        roster: &Roster,
        round: u32,
        agent: AgentKind,
        role: DebateRole,
        round_turns: &[DebateTurn],
    ) -> TurnResult {
        let others: Vec<(AgentKind, &AgentDebateState)> = roster
            .agents
            .iter()
            .filter(|&&a| a != agent)
            .filter_map(|&a| session.agent_states.get(&a).map(|s| (a, s)))
            .collect();

        // Closed rounds plus the turns already taken this round.
        let mut recent: Vec<&DebateTurn> = session.transcript();
        recent.extend(round_turns.iter());
        let skip = recent.len().saturating_sub(self.config.transcript_window);
        let recent: Vec<&DebateTurn> = recent.into_iter().skip(skip).collect();

        let request = GenerationRequest {
            prompt: prompts::turn_prompt(idea, context, round, &recent, &others),
            system_prompt: Some(prompts::turn_system_prompt(agent, role)),
            temperature: self.config.debate_temperature,
            max_tokens: self.config.debate_max_tokens,
        };

        let prior_confidence = session
            .agent_states
            .get(&agent)
            .map(|s| s.confidence)
            .unwrap_or(50);

        let (raw_text, usage) = match self.provider.generate(&request).await {
            Ok(generation) => (generation.text, generation.usage),
            Err(e) => {
                warn!(%agent, round, error = %e, "Turn generation failed, using default turn");
                (String::new(), TokenUsage::default())
            }
        };

        match parse_json_lenient::<RawTurn>(&raw_text) {
            Ok(raw) => TurnResult {
                turn: DebateTurn {
                    round,
                    agent,
                    role,
                    action: raw.action,
                    content: raw.content,
                    target_agent: raw.target_agent.as_deref().and_then(AgentKind::parse),
                    confidence: raw.confidence.unwrap_or(prior_confidence).min(100),
                    timestamp: Utc::now(),
                },
                position_change: raw.position_change,
                usage,
            },
            Err(e) => {
                if !raw_text.is_empty() {
                    warn!(%agent, round, error = %e, "Turn unparseable, degrading");
                }
                TurnResult {
                    turn: DebateTurn {
                        round,
                        agent,
                        role,
                        action: TurnAction::default_for(role),
                        content: truncate(&raw_text, DEGRADED_CONTENT_LIMIT),
                        target_agent: None,
                        confidence: prior_confidence,
                        timestamp: Utc::now(),
                    },
                    position_change: false,
                    usage,
                }
            }
        }
    }

    /// Fold one turn into the session: agent state, challenged flag.
    fn apply_turn(&self, session: &mut DebateSession, turn: &DebateTurn, position_change: bool) {
        if let Some(state) = session.agent_states.get_mut(&turn.agent) {
            if !turn.content.is_empty() {
                if position_change && state.has_position() {
                    state.changed_position = true;
                }
                state.position = turn.content.clone();
                state.arguments.push(turn.content.clone());
            }
            state.confidence = turn.confidence;
        }
        if let Some(target) = turn.target_agent {
            if target != turn.agent {
                if let Some(state) = session.agent_states.get_mut(&target) {
                    state.challenged = true;
                }
            }
        }
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

/// Condense the recorded rounds into the summary handed to voters.
fn debate_summary(session: &DebateSession) -> String {
    if session.rounds.is_empty() {
        return "No debate rounds were recorded.".to_string();
    }
    session
        .rounds
        .iter()
        .map(|r| r.summary.clone())
        .collect::<Vec<_>>()
        .join("\n")
}
