//! Parliament — multi-agent debate and parliamentary voting engine
//!
//! This library provides:
//! - Deterministic agent selection over a nineteen-persona catalog
//! - A round-based debate state machine with checkpointable sessions
//! - Consensus detection, trade-off extraction, and weighted voting
//! - Reputation tracking that feeds back into ballot weights
//!
//! # Flow
//!
//! An idea enters through [`ParliamentService::run_debate`]. The selector
//! seats a roster (proposer, challengers, optional mediator, voters), the
//! orchestrator runs up to `max_rounds` debate rounds against an
//! OpenAI-compatible generation endpoint, trade-offs are mined from the
//! transcript, and a weighted parliamentary vote decides the outcome.
//! Generation failures degrade to neutral turns and abstentions; only
//! storage failures and unknown idea ids abort an evaluation.
//!
//! # Usage
//!
//! ```bash
//! # Debate one idea against a local llama.cpp-style server
//! parliament --title "Cache hot paths" --category performance
//!
//! # Point at a different endpoint and emit the full result as JSON
//! PARLIAMENT_LLM_URL=http://10.0.0.7:8080/v1 parliament \
//!     --title "Cache hot paths" --category performance --json
//! ```

pub mod catalog;
pub mod config;
pub mod debate;
pub mod error;
pub mod generation;
pub mod parliament;
pub mod prompts;
pub mod repository;
pub mod reputation;
pub mod selector;
pub mod voting;

// Re-export key catalog types
pub use catalog::{AgentCategory, AgentKind};

// Re-export key config types
pub use config::{EndpointConfig, ParliamentConfig};

// Re-export key debate state types
pub use debate::state::{
    AgentDebateState, DebateRole, DebateRound, DebateSession, DebateTurn, RoundOutcome,
    SessionCheckpoint, SessionStatus, TransitionError, TurnAction,
};

// Re-export key consensus and trade-off types
pub use debate::consensus::{check_consensus, ConsensusSignal, Recommendation};
pub use debate::tradeoff::{
    extract_trade_offs, TradeOffAnalysis, TradeOffDimension, TradeOffImportance,
};

// Re-export the orchestrator
pub use debate::orchestrator::DebateOrchestrator;

// Re-export key error types
pub use error::{EvaluationError, EvaluationResult};

// Re-export key generation types
pub use generation::{
    Generation, GenerationError, GenerationProvider, GenerationRequest, HttpGenerationProvider,
    TokenUsage,
};

// Re-export key service types
pub use parliament::{DebateResult, ParliamentService, QuickDebateResult};

// Re-export key repository types
pub use repository::{
    Idea, IdeaRepository, IdeaStatus, InMemoryIdeaRepository, InMemoryReputationStore,
    InMemorySessionStore, ProjectContext, RepositoryError, RepositoryResult, ReputationStore,
    ReputationUpdate, SessionStore,
};

// Re-export key reputation types
pub use reputation::{AgentReputation, ReputationTracker};

// Re-export key selector types
pub use selector::{select_agents, Roster};

// Re-export key voting types
pub use voting::{conduct_vote, AgentBallot, BallotChoice, ParliamentaryVote};
