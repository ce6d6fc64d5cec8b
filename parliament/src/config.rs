//! Engine configuration — debate limits, sampling knobs, endpoint wiring.
//!
//! Defaults are tuned for a three-round debate over a five-seat roster.
//! Every knob can be overridden through `PARLIAMENT_*` environment
//! variables so embedders and the CLI share one configuration path.

use serde::{Deserialize, Serialize};

/// Configuration for one debate session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParliamentConfig {
    /// Minimum roster size.
    pub min_agents: usize,
    /// Maximum roster size.
    pub max_agents: usize,
    /// Maximum number of debate rounds before a forced vote.
    pub max_rounds: u32,
    /// Fraction of support ballots required for consensus status.
    pub consensus_threshold: f64,
    /// Per-generation-call timeout in seconds.
    pub turn_timeout_secs: u64,
    /// Cap on concurrent ballot generation calls.
    pub vote_concurrency: usize,
    /// Sampling temperature for debate turns.
    pub debate_temperature: f32,
    /// Token budget for debate turns.
    pub debate_max_tokens: u32,
    /// Sampling temperature for ballots (lower, voting should be steadier).
    pub vote_temperature: f32,
    /// Token budget for ballots.
    pub vote_max_tokens: u32,
    /// How many trailing transcript turns are spliced into each prompt.
    pub transcript_window: usize,
}

impl Default for ParliamentConfig {
    fn default() -> Self {
        Self {
            min_agents: 3,
            max_agents: 5,
            max_rounds: 3,
            consensus_threshold: 0.7,
            turn_timeout_secs: 45,
            vote_concurrency: 3,
            debate_temperature: 0.7,
            debate_max_tokens: 1024,
            vote_temperature: 0.2,
            vote_max_tokens: 512,
            transcript_window: 10,
        }
    }
}

impl ParliamentConfig {
    /// Build a config from the environment, falling back to defaults
    /// for anything unset or unparseable.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            min_agents: env_parse("PARLIAMENT_MIN_AGENTS", d.min_agents),
            max_agents: env_parse("PARLIAMENT_MAX_AGENTS", d.max_agents),
            max_rounds: env_parse("PARLIAMENT_MAX_ROUNDS", d.max_rounds),
            consensus_threshold: env_parse("PARLIAMENT_CONSENSUS_THRESHOLD", d.consensus_threshold),
            turn_timeout_secs: env_parse("PARLIAMENT_TURN_TIMEOUT_SECS", d.turn_timeout_secs),
            vote_concurrency: env_parse("PARLIAMENT_VOTE_CONCURRENCY", d.vote_concurrency),
            debate_temperature: env_parse("PARLIAMENT_DEBATE_TEMPERATURE", d.debate_temperature),
            debate_max_tokens: env_parse("PARLIAMENT_DEBATE_MAX_TOKENS", d.debate_max_tokens),
            vote_temperature: env_parse("PARLIAMENT_VOTE_TEMPERATURE", d.vote_temperature),
            vote_max_tokens: env_parse("PARLIAMENT_VOTE_MAX_TOKENS", d.vote_max_tokens),
            transcript_window: env_parse("PARLIAMENT_TRANSCRIPT_WINDOW", d.transcript_window),
        }
    }

    /// Variant used by quick debates: shorter loop, everything else shared.
    pub fn quick(&self) -> Self {
        Self {
            max_rounds: 2,
            ..self.clone()
        }
    }
}

/// OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base URL, e.g. `http://localhost:8080/v1`.
    pub url: String,
    /// Model name sent in the request body.
    pub model: String,
    /// Bearer token; local llama.cpp-style servers need none.
    pub api_key: Option<String>,
}

impl EndpointConfig {
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("PARLIAMENT_LLM_URL")
                .unwrap_or_else(|_| "http://localhost:8080/v1".into()),
            model: std::env::var("PARLIAMENT_LLM_MODEL")
                .unwrap_or_else(|_| "qwen2.5-coder-32b-instruct".into()),
            api_key: std::env::var("PARLIAMENT_LLM_API_KEY").ok(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
