//! Debate session state machine — statuses, roles, turns, and rounds.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::AgentKind;
use crate::config::ParliamentConfig;
use crate::debate::tradeoff::TradeOffAnalysis;
use crate::generation::TokenUsage;
use crate::selector::Roster;
use crate::voting::ParliamentaryVote;

/// Status of a debate session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Session created but the first round has not started.
    Pending,
    /// First round — positions are being laid out.
    Proposing,
    /// Subsequent rounds — positions are being contested.
    Challenging,
    /// Mediator synthesis between the round loop and the vote.
    Mediating,
    /// Ballots are being collected.
    Voting,
    /// Vote passed the consensus threshold.
    Consensus,
    /// Rounds exhausted and the vote failed to pass.
    Deadlock,
    /// Vote resolved without threshold-level consensus.
    Completed,
}

impl SessionStatus {
    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Consensus | Self::Completed)
    }

    /// Valid forward transitions from this status.
    ///
    /// The table only permits forward motion through the lifecycle, so a
    /// session can never re-enter an earlier status.
    pub fn valid_transitions(self) -> &'static [SessionStatus] {
        match self {
            Self::Pending => &[Self::Proposing],
            Self::Proposing => &[Self::Challenging, Self::Mediating, Self::Voting],
            Self::Challenging => &[Self::Mediating, Self::Voting],
            Self::Mediating => &[Self::Voting],
            Self::Voting => &[Self::Consensus, Self::Deadlock, Self::Completed],
            Self::Deadlock => &[Self::Completed],
            Self::Consensus | Self::Completed => &[],
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Proposing => write!(f, "proposing"),
            Self::Challenging => write!(f, "challenging"),
            Self::Mediating => write!(f, "mediating"),
            Self::Voting => write!(f, "voting"),
            Self::Consensus => write!(f, "consensus"),
            Self::Deadlock => write!(f, "deadlock"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Role of an agent within one debate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebateRole {
    Proposer,
    Challenger,
    Mediator,
    Voter,
}

impl std::fmt::Display for DebateRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Proposer => write!(f, "proposer"),
            Self::Challenger => write!(f, "challenger"),
            Self::Mediator => write!(f, "mediator"),
            Self::Voter => write!(f, "voter"),
        }
    }
}

/// Kind of contribution an agent makes in a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnAction {
    Propose,
    Challenge,
    Defend,
    Mediate,
    Concede,
    Vote,
}

impl TurnAction {
    /// Fallback action when a turn cannot be parsed.
    pub fn default_for(role: DebateRole) -> Self {
        match role {
            DebateRole::Proposer => Self::Defend,
            DebateRole::Challenger => Self::Challenge,
            DebateRole::Mediator => Self::Mediate,
            DebateRole::Voter => Self::Vote,
        }
    }
}

impl std::fmt::Display for TurnAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Propose => write!(f, "propose"),
            Self::Challenge => write!(f, "challenge"),
            Self::Defend => write!(f, "defend"),
            Self::Mediate => write!(f, "mediate"),
            Self::Concede => write!(f, "concede"),
            Self::Vote => write!(f, "vote"),
        }
    }
}

/// One agent action in one round. Append-only; the ordered sequence
/// across rounds is the transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateTurn {
    /// Round number (1-indexed).
    pub round: u32,
    pub agent: AgentKind,
    pub role: DebateRole,
    pub action: TurnAction,
    pub content: String,
    /// Agent this turn challenges or responds to, if any.
    pub target_agent: Option<AgentKind>,
    /// Self-reported confidence (0-100).
    pub confidence: u8,
    pub timestamp: DateTime<Utc>,
}

/// Per-agent mutable state, held only while the debate is in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDebateState {
    pub role: DebateRole,
    /// Latest stated position, empty until the agent's first turn.
    pub position: String,
    pub confidence: u8,
    /// All argument texts this agent has produced, in order.
    pub arguments: Vec<String>,
    /// Whether another agent has targeted this one.
    pub challenged: bool,
    /// Whether the agent ever revised its position.
    pub changed_position: bool,
}

impl AgentDebateState {
    pub fn new(role: DebateRole) -> Self {
        Self {
            role,
            position: String::new(),
            confidence: 50,
            arguments: Vec::new(),
            challenged: false,
            changed_position: false,
        }
    }

    /// Whether the agent has stated any position yet.
    pub fn has_position(&self) -> bool {
        !self.position.is_empty()
    }
}

/// How a round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcome {
    /// Debate continues into the next round.
    Ongoing,
    /// Consensus check reported agreement.
    Consensus,
    /// Escalated beyond the round loop.
    Escalate,
    /// Rounds exhausted or the check recommended a vote.
    VoteRequired,
}

impl std::fmt::Display for RoundOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ongoing => write!(f, "ongoing"),
            Self::Consensus => write!(f, "consensus"),
            Self::Escalate => write!(f, "escalate"),
            Self::VoteRequired => write!(f, "vote_required"),
        }
    }
}

/// Record of one completed round. Never mutated after being closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateRound {
    pub round_number: u32,
    pub proposer: AgentKind,
    pub challengers: Vec<AgentKind>,
    pub mediator: Option<AgentKind>,
    pub turns: Vec<DebateTurn>,
    pub outcome: RoundOutcome,
    pub summary: String,
    /// Agreement level reported by the consensus check (0.0-1.0).
    pub consensus_level: f64,
}

/// A status transition record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusTransition {
    pub from: SessionStatus,
    pub to: SessionStatus,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
}

/// Error for invalid status transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub from: SessionStatus,
    pub to: SessionStatus,
    pub reason: String,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid transition {} → {}: {}",
            self.from, self.to, self.reason
        )
    }
}

impl std::error::Error for TransitionError {}

/// The aggregate root: one idea's full debate lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateSession {
    /// Unique session identifier.
    pub id: String,
    pub project_id: String,
    pub idea_id: String,
    pub status: SessionStatus,
    /// Closed rounds, in order.
    pub rounds: Vec<DebateRound>,
    /// In-flight per-agent state; cleared from the terminal snapshot.
    pub agent_states: HashMap<AgentKind, AgentDebateState>,
    /// Seating order. Turns execute in this order within a round.
    pub roster: Vec<AgentKind>,
    pub roles: HashMap<AgentKind, DebateRole>,
    pub min_agents: usize,
    pub max_agents: usize,
    pub max_rounds: u32,
    pub consensus_threshold: f64,
    /// Set only when the final vote passes.
    pub selected_idea_id: Option<String>,
    pub vote: Option<ParliamentaryVote>,
    pub trade_offs: Vec<TradeOffAnalysis>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub token_usage: TokenUsage,
    /// Status transition history.
    pub transitions: Vec<StatusTransition>,
}

impl DebateSession {
    /// Create a new session from a selected roster and a config snapshot.
    pub fn new(project_id: &str, idea_id: &str, roster: &Roster, config: &ParliamentConfig) -> Self {
        let agent_states = roster
            .agents
            .iter()
            .map(|&agent| (agent, AgentDebateState::new(roster.role_of(agent))))
            .collect();

        Self {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            idea_id: idea_id.to_string(),
            status: SessionStatus::Pending,
            rounds: Vec::new(),
            agent_states,
            roster: roster.agents.clone(),
            roles: roster.roles.clone(),
            min_agents: config.min_agents,
            max_agents: config.max_agents,
            max_rounds: config.max_rounds,
            consensus_threshold: config.consensus_threshold,
            selected_idea_id: None,
            vote: None,
            trade_offs: Vec::new(),
            created_at: Utc::now(),
            completed_at: None,
            token_usage: TokenUsage::default(),
            transitions: Vec::new(),
        }
    }

    /// Transition to a new status with a reason.
    ///
    /// Setting the current status again is a no-op; anything else must be
    /// listed in the transition table.
    pub fn advance(&mut self, to: SessionStatus, reason: &str) -> Result<(), TransitionError> {
        if to == self.status {
            return Ok(());
        }
        if !self.status.valid_transitions().contains(&to) {
            return Err(TransitionError {
                from: self.status,
                to,
                reason: format!(
                    "not a valid transition (allowed: {:?})",
                    self.status.valid_transitions()
                ),
            });
        }

        self.transitions.push(StatusTransition {
            from: self.status,
            to,
            timestamp: Utc::now(),
            reason: reason.to_string(),
        });
        self.status = to;
        Ok(())
    }

    /// Role of a roster member. Panics on non-members, which cannot occur
    /// for sessions built through `new`.
    pub fn role_of(&self, agent: AgentKind) -> DebateRole {
        self.roles[&agent]
    }

    /// Append a closed round.
    pub fn record_round(&mut self, round: DebateRound) {
        self.rounds.push(round);
    }

    /// Number of rounds recorded so far.
    pub fn rounds_completed(&self) -> u32 {
        self.rounds.len() as u32
    }

    /// The full transcript across rounds, in order.
    pub fn transcript(&self) -> Vec<&DebateTurn> {
        self.rounds.iter().flat_map(|r| r.turns.iter()).collect()
    }

    /// The trailing `window` turns of the transcript.
    pub fn recent_turns(&self, window: usize) -> Vec<&DebateTurn> {
        let transcript = self.transcript();
        let skip = transcript.len().saturating_sub(window);
        transcript.into_iter().skip(skip).collect()
    }

    /// Whether the session has reached a terminal status.
    pub fn is_complete(&self) -> bool {
        self.status.is_terminal()
    }

    /// Mark completion: stamp the time and drop in-flight agent state.
    ///
    /// Only the transcript is retained in the terminal snapshot.
    pub fn finalize(&mut self) {
        self.completed_at = Some(Utc::now());
        self.agent_states.clear();
    }

    /// Compact status line.
    pub fn status_line(&self) -> String {
        format!(
            "[{}] round {}/{} | {} seats | idea={}",
            self.status,
            self.rounds_completed(),
            self.max_rounds,
            self.roster.len(),
            self.idea_id
        )
    }

    /// One-line terminal summary.
    ///
    /// Example: `[consensus] passed | support 4/5 | 2 rounds | 3 trade-offs`
    pub fn summary_line(&self) -> String {
        let verdict = match &self.vote {
            Some(v) if v.passed => "passed",
            Some(_) => "failed",
            None => "no vote",
        };
        let support = self
            .vote
            .as_ref()
            .map(|v| format!("support {}/{}", v.support_count, self.roster.len()))
            .unwrap_or_else(|| "support -".to_string());
        format!(
            "[{}] {} | {} | {} rounds | {} trade-offs",
            self.status,
            verdict,
            support,
            self.rounds_completed(),
            self.trade_offs.len()
        )
    }
}

/// A versioned JSON snapshot of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCheckpoint {
    /// Schema version for forward compatibility.
    pub version: u32,
    pub session: DebateSession,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// Error during checkpoint serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointError {
    SerializeFailed { reason: String },
    DeserializeFailed { reason: String },
    VersionMismatch { expected: u32, found: u32 },
}

impl std::fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SerializeFailed { reason } => write!(f, "serialize failed: {}", reason),
            Self::DeserializeFailed { reason } => write!(f, "deserialize failed: {}", reason),
            Self::VersionMismatch { expected, found } => {
                write!(f, "version mismatch: expected {}, found {}", expected, found)
            }
        }
    }
}

impl std::error::Error for CheckpointError {}

impl SessionCheckpoint {
    /// Current schema version.
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new(session: &DebateSession, reason: &str) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            session: session.clone(),
            reason: reason.to_string(),
            created_at: Utc::now(),
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self).map_err(|e| CheckpointError::SerializeFailed {
            reason: e.to_string(),
        })
    }

    /// Deserialize from JSON, rejecting snapshots from a newer schema.
    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self =
            serde_json::from_str(json).map_err(|e| CheckpointError::DeserializeFailed {
                reason: e.to_string(),
            })?;

        if checkpoint.version > Self::CURRENT_VERSION {
            return Err(CheckpointError::VersionMismatch {
                expected: Self::CURRENT_VERSION,
                found: checkpoint.version,
            });
        }

        Ok(checkpoint)
    }
}
