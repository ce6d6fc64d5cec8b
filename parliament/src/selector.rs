//! Roster selection — deterministic seating and role assignment.
//!
//! Selection never uses randomness: the same idea against the same
//! catalog always yields the same roster, which keeps debates
//! reproducible in tests and audits.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::AgentKind;
use crate::config::ParliamentConfig;
use crate::debate::state::DebateRole;
use crate::repository::Idea;

/// Challenger picks per category keyword group. Rows are checked in
/// declared order; the first row with a keyword contained in the idea's
/// category wins.
const KEYWORD_TABLE: &[(&[&str], &[AgentKind])] = &[
    (
        &["performance", "perf", "optimization"],
        &[AgentKind::PerfOptimizer, AgentKind::DataFlowOptimizer],
    ),
    (
        &["security", "auth", "privacy"],
        &[AgentKind::SecurityProtector, AgentKind::DataPrivacyOfficer],
    ),
    (
        &["ux", "ui", "usability", "design"],
        &[AgentKind::UserEmpathyChampion, AgentKind::UxPerfectionist],
    ),
    (
        &["accessibility", "a11y"],
        &[
            AgentKind::AccessibilityAdvocate,
            AgentKind::UserEmpathyChampion,
        ],
    ),
    (
        &["business", "market", "revenue"],
        &[AgentKind::BusinessStrategist, AgentKind::MarketAnalyst],
    ),
    (
        &["testing", "quality", "bug"],
        &[AgentKind::TestMaestro, AgentKind::BugHunter],
    ),
    (
        &["refactor", "maintainability", "cleanup"],
        &[AgentKind::RefactorSurgeon, AgentKind::ZenArchitect],
    ),
    (
        &["api", "interface", "contract"],
        &[AgentKind::ApiDesigner, AgentKind::AmbiguityGuardian],
    ),
];

/// Challengers for categories no table row matches.
const DEFAULT_CHALLENGERS: &[AgentKind] = &[
    AgentKind::BugHunter,
    AgentKind::SecurityProtector,
    AgentKind::PerfOptimizer,
];

/// Mediator candidates, most preferred first.
const MEDIATOR_PREFERENCE: &[AgentKind] = &[
    AgentKind::InsightSynthesizer,
    AgentKind::AmbiguityGuardian,
    AgentKind::UserEmpathyChampion,
    AgentKind::ZenArchitect,
    AgentKind::ParadigmShifter,
];

/// The seated agents for one debate, with their immutable roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    /// Seating order. Turns execute front to back.
    pub agents: Vec<AgentKind>,
    pub roles: HashMap<AgentKind, DebateRole>,
}

impl Roster {
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Role of a seated agent. Panics on non-members.
    pub fn role_of(&self, agent: AgentKind) -> DebateRole {
        self.roles[&agent]
    }

    /// The single proposer seat.
    pub fn proposer(&self) -> Option<AgentKind> {
        self.agents
            .iter()
            .copied()
            .find(|&a| self.roles[&a] == DebateRole::Proposer)
    }

    pub fn challengers(&self) -> Vec<AgentKind> {
        self.agents
            .iter()
            .copied()
            .filter(|&a| self.roles[&a] == DebateRole::Challenger)
            .collect()
    }

    pub fn mediator(&self) -> Option<AgentKind> {
        self.agents
            .iter()
            .copied()
            .find(|&a| self.roles[&a] == DebateRole::Mediator)
    }

    pub fn voters(&self) -> Vec<AgentKind> {
        self.agents
            .iter()
            .copied()
            .filter(|&a| self.roles[&a] == DebateRole::Voter)
            .collect()
    }

    /// Whether anyone holds a role other than voter. When nobody does,
    /// voter deferral is lifted and voters speak every round.
    pub fn has_non_voter_roles(&self) -> bool {
        self.roles.values().any(|&r| r != DebateRole::Voter)
    }
}

/// Challenger candidates for a category string.
fn challenger_candidates(category: &str) -> &'static [AgentKind] {
    let category = category.to_ascii_lowercase();
    KEYWORD_TABLE
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| category.contains(k)))
        .map(|(_, challengers)| *challengers)
        .unwrap_or(DEFAULT_CHALLENGERS)
}

/// Select the roster and role map for an idea.
///
/// The idea's origin agent (when known) always debates first as the
/// proposer. Challengers come from the keyword table, the mediator from
/// a fixed preference list, and remaining seats are filled with voters
/// in catalog order.
pub fn select_agents(idea: &Idea, config: &ParliamentConfig) -> Roster {
    let mut agents: Vec<AgentKind> = Vec::new();
    let mut roles: HashMap<AgentKind, DebateRole> = HashMap::new();

    if let Some(origin) = idea.source_agent {
        agents.push(origin);
        roles.insert(origin, DebateRole::Proposer);
    }

    let budget = 2.min(config.max_agents.saturating_sub(agents.len()));
    let mut appended = 0;
    for &kind in challenger_candidates(&idea.category) {
        if appended == budget {
            break;
        }
        if agents.contains(&kind) {
            continue;
        }
        agents.push(kind);
        roles.insert(kind, DebateRole::Challenger);
        appended += 1;
    }

    // No known origin: the first seat is promoted to proposer.
    if idea.source_agent.is_none() {
        if let Some(&first) = agents.first() {
            roles.insert(first, DebateRole::Proposer);
        }
    }

    if agents.len() < config.max_agents {
        if let Some(&mediator) = MEDIATOR_PREFERENCE.iter().find(|k| !agents.contains(k)) {
            agents.push(mediator);
            roles.insert(mediator, DebateRole::Mediator);
        }
    }

    // Voter fill runs the whole catalog, so the roster only lands below
    // min_agents when the catalog itself is exhausted.
    for &kind in AgentKind::all() {
        if agents.len() >= config.max_agents {
            break;
        }
        if agents.contains(&kind) {
            continue;
        }
        agents.push(kind);
        roles.insert(kind, DebateRole::Voter);
    }

    Roster { agents, roles }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::IdeaStatus;

    fn idea(category: &str, source_agent: Option<AgentKind>) -> Idea {
        Idea {
            id: "i-1".to_string(),
            project_id: "p-1".to_string(),
            category: category.to_string(),
            title: "title".to_string(),
            description: "desc".to_string(),
            reasoning: "because".to_string(),
            effort: 1,
            impact: 2,
            source_agent,
            status: IdeaStatus::Proposed,
        }
    }

    #[test]
    fn test_selection_is_deterministic() {
        let config = ParliamentConfig::default();
        let i = idea("performance", Some(AgentKind::ZenArchitect));
        let a = select_agents(&i, &config);
        let b = select_agents(&i, &config);
        assert_eq!(a, b);
    }

    #[test]
    fn test_known_origin_sits_first_as_proposer() {
        let config = ParliamentConfig::default();
        let roster = select_agents(&idea("performance", Some(AgentKind::ZenArchitect)), &config);
        assert_eq!(roster.agents[0], AgentKind::ZenArchitect);
        assert_eq!(roster.role_of(AgentKind::ZenArchitect), DebateRole::Proposer);
        assert_eq!(
            roster.challengers(),
            vec![AgentKind::PerfOptimizer, AgentKind::DataFlowOptimizer]
        );
    }

    #[test]
    fn test_unknown_origin_promotes_first_challenger() {
        let config = ParliamentConfig::default();
        let roster = select_agents(&idea("performance", None), &config);
        assert_eq!(roster.agents[0], AgentKind::PerfOptimizer);
        assert_eq!(roster.role_of(AgentKind::PerfOptimizer), DebateRole::Proposer);
        assert_eq!(roster.challengers(), vec![AgentKind::DataFlowOptimizer]);
    }

    #[test]
    fn test_full_roster_shape_for_performance_idea() {
        let config = ParliamentConfig::default();
        let roster = select_agents(&idea("performance", None), &config);
        assert_eq!(
            roster.agents,
            vec![
                AgentKind::PerfOptimizer,
                AgentKind::DataFlowOptimizer,
                AgentKind::InsightSynthesizer,
                AgentKind::BugHunter,
                AgentKind::SecurityProtector,
            ]
        );
        assert_eq!(roster.mediator(), Some(AgentKind::InsightSynthesizer));
        assert_eq!(
            roster.voters(),
            vec![AgentKind::BugHunter, AgentKind::SecurityProtector]
        );
    }

    #[test]
    fn test_unmatched_category_uses_default_challengers() {
        let config = ParliamentConfig::default();
        let roster = select_agents(&idea("miscellaneous", None), &config);
        assert_eq!(roster.agents[0], AgentKind::BugHunter);
        assert_eq!(roster.challengers(), vec![AgentKind::SecurityProtector]);
    }

    #[test]
    fn test_category_match_is_case_insensitive() {
        let config = ParliamentConfig::default();
        let roster = select_agents(&idea("Security Hardening", None), &config);
        assert_eq!(roster.agents[0], AgentKind::SecurityProtector);
        assert!(roster.agents.contains(&AgentKind::DataPrivacyOfficer));
    }

    #[test]
    fn test_origin_never_duplicated_as_challenger() {
        let config = ParliamentConfig::default();
        let roster = select_agents(
            &idea("performance", Some(AgentKind::PerfOptimizer)),
            &config,
        );
        let perf_seats = roster
            .agents
            .iter()
            .filter(|&&a| a == AgentKind::PerfOptimizer)
            .count();
        assert_eq!(perf_seats, 1);
        assert_eq!(roster.role_of(AgentKind::PerfOptimizer), DebateRole::Proposer);
        assert_eq!(roster.challengers(), vec![AgentKind::DataFlowOptimizer]);
    }

    #[test]
    fn test_role_exclusivity_and_bounds() {
        let config = ParliamentConfig::default();
        for category in ["performance", "security", "ux", "business", "whatever"] {
            for origin in [None, Some(AgentKind::DocCurator)] {
                let roster = select_agents(&idea(category, origin), &config);
                assert!(roster.len() >= config.min_agents);
                assert!(roster.len() <= config.max_agents);

                let proposers = roster
                    .agents
                    .iter()
                    .filter(|&&a| roster.role_of(a) == DebateRole::Proposer)
                    .count();
                assert_eq!(proposers, 1, "category {category}");

                let mediators = roster
                    .agents
                    .iter()
                    .filter(|&&a| roster.role_of(a) == DebateRole::Mediator)
                    .count();
                assert!(mediators <= 1);
            }
        }
    }

    #[test]
    fn test_small_roster_has_no_voters() {
        let config = ParliamentConfig {
            max_agents: 3,
            min_agents: 3,
            ..Default::default()
        };
        let roster = select_agents(&idea("performance", None), &config);
        assert_eq!(roster.len(), 3);
        assert!(roster.voters().is_empty());
        assert!(roster.has_non_voter_roles());
        assert_eq!(roster.mediator(), Some(AgentKind::InsightSynthesizer));
    }

    #[test]
    fn test_mediator_preference_skips_seated_agents() {
        let config = ParliamentConfig::default();
        let roster = select_agents(
            &idea("unknown-category", Some(AgentKind::InsightSynthesizer)),
            &config,
        );
        // Preferred mediator already sits as proposer; next choice steps in.
        assert_eq!(roster.mediator(), Some(AgentKind::AmbiguityGuardian));
    }
}
