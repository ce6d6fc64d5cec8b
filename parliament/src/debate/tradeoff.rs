//! Trade-off extraction — pairing opposing arguments by dimension.
//!
//! Runs once over the full transcript after the debate closes. For each
//! dimension the first proposer turn and the first challenger turn whose
//! content mentions the dimension's keywords are paired into one
//! `TradeOffAnalysis`. At most one trade-off per dimension per debate.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::AgentKind;
use crate::debate::state::{DebateRole, DebateTurn};

/// The fixed vocabulary of evaluation dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeOffDimension {
    Performance,
    Security,
    Maintainability,
    Usability,
    Accessibility,
    Complexity,
}

impl TradeOffDimension {
    pub fn all() -> &'static [TradeOffDimension] {
        &[
            TradeOffDimension::Performance,
            TradeOffDimension::Security,
            TradeOffDimension::Maintainability,
            TradeOffDimension::Usability,
            TradeOffDimension::Accessibility,
            TradeOffDimension::Complexity,
        ]
    }

    /// Keywords matched against turn content, lowercase substring.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            TradeOffDimension::Performance => {
                &["speed", "latency", "fast", "slow", "efficient", "cpu", "memory"]
            }
            TradeOffDimension::Security => {
                &["security", "vulnerab", "attack", "exploit", "auth", "encrypt"]
            }
            TradeOffDimension::Maintainability => {
                &["maintain", "readab", "technical debt", "refactor", "coupling"]
            }
            TradeOffDimension::Usability => {
                &["usability", "user experience", "intuitive", "workflow", "friction"]
            }
            TradeOffDimension::Accessibility => {
                &["accessib", "a11y", "screen reader", "contrast", "keyboard"]
            }
            TradeOffDimension::Complexity => {
                &["complex", "simple", "overhead", "moving parts", "abstraction"]
            }
        }
    }
}

impl fmt::Display for TradeOffDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TradeOffDimension::Performance => "performance",
            TradeOffDimension::Security => "security",
            TradeOffDimension::Maintainability => "maintainability",
            TradeOffDimension::Usability => "usability",
            TradeOffDimension::Accessibility => "accessibility",
            TradeOffDimension::Complexity => "complexity",
        };
        write!(f, "{name}")
    }
}

/// Importance of a surfaced trade-off, from the average confidence of
/// the two paired turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeOffImportance {
    Critical,
    Significant,
    Minor,
}

impl TradeOffImportance {
    /// Critical at average confidence 80+, significant at 60+, else minor.
    pub fn from_confidence(average: f64) -> Self {
        if average >= 80.0 {
            TradeOffImportance::Critical
        } else if average >= 60.0 {
            TradeOffImportance::Significant
        } else {
            TradeOffImportance::Minor
        }
    }
}

impl fmt::Display for TradeOffImportance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TradeOffImportance::Critical => "critical",
            TradeOffImportance::Significant => "significant",
            TradeOffImportance::Minor => "minor",
        };
        write!(f, "{name}")
    }
}

/// One opposing pair of arguments on a single dimension. Immutable once
/// extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOffAnalysis {
    pub dimension: TradeOffDimension,
    pub proposer_agent: AgentKind,
    pub challenger_agent: AgentKind,
    pub proposer_argument: String,
    pub challenger_argument: String,
    pub importance: TradeOffImportance,
}

fn mentions(turn: &DebateTurn, dimension: TradeOffDimension) -> bool {
    let content = turn.content.to_ascii_lowercase();
    dimension.keywords().iter().any(|k| content.contains(k))
}

/// Extract trade-offs from a completed debate's transcript.
///
/// Transcript order decides which turns get paired: the first matching
/// proposer turn against the first matching challenger turn.
pub fn extract_trade_offs(transcript: &[&DebateTurn]) -> Vec<TradeOffAnalysis> {
    let mut found = Vec::new();

    for &dimension in TradeOffDimension::all() {
        let proposer = transcript
            .iter()
            .find(|t| t.role == DebateRole::Proposer && mentions(t, dimension));
        let challenger = transcript
            .iter()
            .find(|t| t.role == DebateRole::Challenger && mentions(t, dimension));

        if let (Some(p), Some(c)) = (proposer, challenger) {
            let average = (f64::from(p.confidence) + f64::from(c.confidence)) / 2.0;
            found.push(TradeOffAnalysis {
                dimension,
                proposer_agent: p.agent,
                challenger_agent: c.agent,
                proposer_argument: p.content.clone(),
                challenger_argument: c.content.clone(),
                importance: TradeOffImportance::from_confidence(average),
            });
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debate::state::TurnAction;
    use chrono::Utc;

    fn turn(agent: AgentKind, role: DebateRole, content: &str, confidence: u8) -> DebateTurn {
        DebateTurn {
            round: 1,
            agent,
            role,
            action: TurnAction::default_for(role),
            content: content.to_string(),
            target_agent: None,
            confidence,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_importance_thresholds() {
        assert_eq!(
            TradeOffImportance::from_confidence(80.0),
            TradeOffImportance::Critical
        );
        assert_eq!(
            TradeOffImportance::from_confidence(79.9),
            TradeOffImportance::Significant
        );
        assert_eq!(
            TradeOffImportance::from_confidence(60.0),
            TradeOffImportance::Significant
        );
        assert_eq!(
            TradeOffImportance::from_confidence(59.0),
            TradeOffImportance::Minor
        );
    }

    #[test]
    fn test_opposing_pair_on_security() {
        let turns = vec![
            turn(
                AgentKind::ZenArchitect,
                DebateRole::Proposer,
                "The auth layer stays untouched, this is safe to ship",
                85,
            ),
            turn(
                AgentKind::SecurityProtector,
                DebateRole::Challenger,
                "Caching responses risks leaking auth tokens between users",
                90,
            ),
        ];
        let refs: Vec<&DebateTurn> = turns.iter().collect();
        let found = extract_trade_offs(&refs);
        assert_eq!(found.len(), 1);
        let t = &found[0];
        assert_eq!(t.dimension, TradeOffDimension::Security);
        assert_eq!(t.proposer_agent, AgentKind::ZenArchitect);
        assert_eq!(t.challenger_agent, AgentKind::SecurityProtector);
        assert_eq!(t.importance, TradeOffImportance::Critical);
    }

    #[test]
    fn test_one_side_only_yields_nothing() {
        let turns = vec![turn(
            AgentKind::PerfOptimizer,
            DebateRole::Challenger,
            "Latency will regress under load",
            70,
        )];
        let refs: Vec<&DebateTurn> = turns.iter().collect();
        assert!(extract_trade_offs(&refs).is_empty());
    }

    #[test]
    fn test_first_matching_turns_win() {
        let turns = vec![
            turn(
                AgentKind::ZenArchitect,
                DebateRole::Proposer,
                "This will be fast in the common case",
                60,
            ),
            turn(
                AgentKind::PerfOptimizer,
                DebateRole::Challenger,
                "The slow path dominates at p99",
                70,
            ),
            turn(
                AgentKind::DataFlowOptimizer,
                DebateRole::Challenger,
                "Memory pressure is the real concern",
                95,
            ),
        ];
        let refs: Vec<&DebateTurn> = turns.iter().collect();
        let found = extract_trade_offs(&refs);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].challenger_agent, AgentKind::PerfOptimizer);
        assert_eq!(found[0].importance, TradeOffImportance::Significant);
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let turns = vec![
            turn(
                AgentKind::ZenArchitect,
                DebateRole::Proposer,
                "CPU usage stays flat",
                50,
            ),
            turn(
                AgentKind::PerfOptimizer,
                DebateRole::Challenger,
                "LATENCY doubles on cold start",
                50,
            ),
        ];
        let refs: Vec<&DebateTurn> = turns.iter().collect();
        let found = extract_trade_offs(&refs);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].dimension, TradeOffDimension::Performance);
        assert_eq!(found[0].importance, TradeOffImportance::Minor);
    }

    #[test]
    fn test_multiple_dimensions_extracted_independently() {
        let turns = vec![
            turn(
                AgentKind::ZenArchitect,
                DebateRole::Proposer,
                "Simple design, fast lookups, no auth changes",
                75,
            ),
            turn(
                AgentKind::SecurityProtector,
                DebateRole::Challenger,
                "An attack surface grows with every cache key",
                80,
            ),
            turn(
                AgentKind::PerfOptimizer,
                DebateRole::Challenger,
                "Eviction makes the slow path slower",
                65,
            ),
            turn(
                AgentKind::RefactorSurgeon,
                DebateRole::Challenger,
                "Adds complexity we will carry forever",
                60,
            ),
        ];
        let refs: Vec<&DebateTurn> = turns.iter().collect();
        let found = extract_trade_offs(&refs);
        let dims: Vec<TradeOffDimension> = found.iter().map(|t| t.dimension).collect();
        assert!(dims.contains(&TradeOffDimension::Performance));
        assert!(dims.contains(&TradeOffDimension::Security));
        assert!(dims.contains(&TradeOffDimension::Complexity));
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn test_mediator_turns_never_pair() {
        let turns = vec![
            turn(
                AgentKind::InsightSynthesizer,
                DebateRole::Mediator,
                "Both sides agree latency matters",
                70,
            ),
            turn(
                AgentKind::PerfOptimizer,
                DebateRole::Challenger,
                "Latency will regress",
                70,
            ),
        ];
        let refs: Vec<&DebateTurn> = turns.iter().collect();
        assert!(extract_trade_offs(&refs).is_empty());
    }
}
