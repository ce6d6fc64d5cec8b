//! Consensus detection — end-of-round agreement check.
//!
//! After each round the moderator prompt asks the generation backend how
//! close the stated positions are. Failures never stop a debate: a
//! failed check reads as "no consensus yet, keep going".

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::AgentKind;
use crate::debate::state::AgentDebateState;
use crate::generation::{
    parse_json_lenient, GenerationProvider, GenerationRequest, TokenUsage,
};
use crate::prompts;

/// Moderator recommendation for the next step of the debate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    ProceedToVote,
    Escalate,
    #[serde(other)]
    ContinueDebate,
}

/// Outcome of one end-of-round consensus check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsensusSignal {
    pub reached: bool,
    /// Agreement level in `[0, 1]`.
    pub level: f64,
    pub recommendation: Recommendation,
}

impl ConsensusSignal {
    /// Unanimity by absence: fewer than two stated positions cannot
    /// disagree.
    pub fn trivial() -> Self {
        Self {
            reached: true,
            level: 1.0,
            recommendation: Recommendation::ProceedToVote,
        }
    }

    /// Fallback when the check itself fails.
    pub fn undecided() -> Self {
        Self {
            reached: false,
            level: 0.5,
            recommendation: Recommendation::ContinueDebate,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSignal {
    reached: bool,
    level: f64,
    recommendation: Recommendation,
}

/// Check how close the seated agents are to agreement.
///
/// Returns the signal plus the tokens the check consumed. Positions the
/// agents have not yet stated are ignored; with fewer than two stated
/// positions the check short-circuits to trivial consensus without
/// calling the provider.
pub async fn check_consensus(
    provider: &dyn GenerationProvider,
    idea_title: &str,
    positions: &[(AgentKind, &AgentDebateState)],
) -> (ConsensusSignal, TokenUsage) {
    let stated = positions
        .iter()
        .filter(|(_, state)| state.has_position())
        .count();
    if stated < 2 {
        debug!(stated, "Consensus check short-circuited");
        return (ConsensusSignal::trivial(), TokenUsage::default());
    }

    let request = GenerationRequest {
        prompt: prompts::consensus_prompt(idea_title, positions),
        system_prompt: Some(prompts::consensus_system_prompt().to_string()),
        temperature: 0.2,
        max_tokens: 256,
    };

    let generation = match provider.generate(&request).await {
        Ok(generation) => generation,
        Err(e) => {
            warn!(error = %e, "Consensus check failed, continuing debate");
            return (ConsensusSignal::undecided(), TokenUsage::default());
        }
    };

    let signal = match parse_json_lenient::<RawSignal>(&generation.text) {
        Ok(raw) => ConsensusSignal {
            reached: raw.reached,
            level: raw.level.clamp(0.0, 1.0),
            recommendation: raw.recommendation,
        },
        Err(e) => {
            warn!(error = %e, "Consensus response unparseable, continuing debate");
            ConsensusSignal::undecided()
        }
    };

    debug!(
        reached = signal.reached,
        level = signal.level,
        recommendation = ?signal.recommendation,
        "Consensus check completed"
    );
    (signal, generation.usage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debate::state::DebateRole;
    use crate::generation::{Generation, GenerationError};
    use async_trait::async_trait;

    struct Scripted {
        text: String,
    }

    #[async_trait]
    impl GenerationProvider for Scripted {
        async fn generate(
            &self,
            _request: &GenerationRequest,
        ) -> Result<Generation, GenerationError> {
            Ok(Generation {
                text: self.text.clone(),
                usage: TokenUsage {
                    prompt_tokens: 20,
                    completion_tokens: 10,
                },
            })
        }
    }

    struct Failing;

    #[async_trait]
    impl GenerationProvider for Failing {
        async fn generate(
            &self,
            _request: &GenerationRequest,
        ) -> Result<Generation, GenerationError> {
            Err(GenerationError::Timeout(45))
        }
    }

    fn state(position: &str, confidence: u8) -> AgentDebateState {
        AgentDebateState {
            role: DebateRole::Challenger,
            position: position.to_string(),
            confidence,
            arguments: vec![],
            challenged: false,
            changed_position: false,
        }
    }

    #[test]
    fn test_recommendation_parses_snake_case() {
        let r: Recommendation = serde_json::from_str("\"proceed_to_vote\"").unwrap();
        assert_eq!(r, Recommendation::ProceedToVote);
        let r: Recommendation = serde_json::from_str("\"escalate\"").unwrap();
        assert_eq!(r, Recommendation::Escalate);
    }

    #[test]
    fn test_unknown_recommendation_falls_back_to_continue() {
        let r: Recommendation = serde_json::from_str("\"ponder_more\"").unwrap();
        assert_eq!(r, Recommendation::ContinueDebate);
    }

    #[tokio::test]
    async fn test_single_position_is_trivial_consensus() {
        let s = state("ship it", 80);
        let positions = vec![(AgentKind::ZenArchitect, &s)];
        let (signal, usage) = check_consensus(&Failing, "Cache hot paths", &positions).await;
        assert!(signal.reached);
        assert_eq!(signal.level, 1.0);
        assert_eq!(usage.total(), 0);
    }

    #[tokio::test]
    async fn test_agreement_above_threshold_is_reached() {
        let a = state("ship it", 80);
        let b = state("ship it with a guard", 75);
        let positions = vec![
            (AgentKind::ZenArchitect, &a),
            (AgentKind::BugHunter, &b),
        ];
        let provider = Scripted {
            text: "{\"reached\": true, \"level\": 0.85, \
                   \"recommendation\": \"proceed_to_vote\"}"
                .to_string(),
        };
        let (signal, usage) = check_consensus(&provider, "Cache hot paths", &positions).await;
        assert!(signal.reached);
        assert_eq!(signal.level, 0.85);
        assert_eq!(signal.recommendation, Recommendation::ProceedToVote);
        assert_eq!(usage.total(), 30);
    }

    #[tokio::test]
    async fn test_disagreement_passes_through() {
        let a = state("ship it", 80);
        let b = state("too risky", 70);
        let positions = vec![
            (AgentKind::ZenArchitect, &a),
            (AgentKind::SecurityProtector, &b),
        ];
        let provider = Scripted {
            text: "{\"reached\": false, \"level\": 0.3, \
                   \"recommendation\": \"continue_debate\"}"
                .to_string(),
        };
        let (signal, _) = check_consensus(&provider, "Cache hot paths", &positions).await;
        assert!(!signal.reached);
        assert_eq!(signal.level, 0.3);
        assert_eq!(signal.recommendation, Recommendation::ContinueDebate);
    }

    #[tokio::test]
    async fn test_provider_failure_degrades_to_undecided() {
        let a = state("ship it", 80);
        let b = state("too risky", 70);
        let positions = vec![
            (AgentKind::ZenArchitect, &a),
            (AgentKind::SecurityProtector, &b),
        ];
        let (signal, usage) = check_consensus(&Failing, "Cache hot paths", &positions).await;
        assert!(!signal.reached);
        assert_eq!(signal.level, 0.5);
        assert_eq!(signal.recommendation, Recommendation::ContinueDebate);
        assert_eq!(usage.total(), 0);
    }

    #[tokio::test]
    async fn test_unparseable_response_degrades_to_undecided() {
        let a = state("ship it", 80);
        let b = state("too risky", 70);
        let positions = vec![
            (AgentKind::ZenArchitect, &a),
            (AgentKind::SecurityProtector, &b),
        ];
        let provider = Scripted {
            text: "the parliament remains divided".to_string(),
        };
        let (signal, _) = check_consensus(&provider, "Cache hot paths", &positions).await;
        assert_eq!(signal, ConsensusSignal::undecided());
    }

    #[tokio::test]
    async fn test_level_is_clamped() {
        let a = state("ship it", 80);
        let b = state("agreed", 90);
        let positions = vec![
            (AgentKind::ZenArchitect, &a),
            (AgentKind::BugHunter, &b),
        ];
        let provider = Scripted {
            text: "{\"reached\": true, \"level\": 1.4, \
                   \"recommendation\": \"proceed_to_vote\"}"
                .to_string(),
        };
        let (signal, _) = check_consensus(&provider, "Cache hot paths", &positions).await;
        assert_eq!(signal.level, 1.0);
        assert!(signal.reached);
    }
}
