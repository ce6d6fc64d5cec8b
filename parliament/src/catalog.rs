//! Agent catalog — the closed set of specialist reviewer personas.
//!
//! Each kind carries a category tag (used only by the selector heuristics)
//! and a persona text (used only when composing prompts). No behavioral
//! polymorphism: the catalog is a static table, not a class hierarchy.

use serde::{Deserialize, Serialize};

/// Category tag for an agent kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentCategory {
    Performance,
    Security,
    Ux,
    Business,
    Quality,
    Architecture,
    Analysis,
    Maintainability,
}

impl std::fmt::Display for AgentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Performance => write!(f, "performance"),
            Self::Security => write!(f, "security"),
            Self::Ux => write!(f, "ux"),
            Self::Business => write!(f, "business"),
            Self::Quality => write!(f, "quality"),
            Self::Architecture => write!(f, "architecture"),
            Self::Analysis => write!(f, "analysis"),
            Self::Maintainability => write!(f, "maintainability"),
        }
    }
}

/// A specialist reviewer persona.
///
/// Catalog order (the order of `all()`) is load-bearing: the selector fills
/// voter slots by walking it front to back, so reordering variants changes
/// roster composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    BugHunter,
    SecurityProtector,
    PerfOptimizer,
    DataFlowOptimizer,
    ZenArchitect,
    ParadigmShifter,
    InsightSynthesizer,
    AmbiguityGuardian,
    UserEmpathyChampion,
    AccessibilityAdvocate,
    UxPerfectionist,
    BusinessStrategist,
    MarketAnalyst,
    CostOptimizer,
    TestMaestro,
    RefactorSurgeon,
    DocCurator,
    ApiDesigner,
    DataPrivacyOfficer,
}

impl AgentKind {
    /// All catalog members, in catalog order.
    pub fn all() -> &'static [AgentKind] {
        &[
            Self::BugHunter,
            Self::SecurityProtector,
            Self::PerfOptimizer,
            Self::DataFlowOptimizer,
            Self::ZenArchitect,
            Self::ParadigmShifter,
            Self::InsightSynthesizer,
            Self::AmbiguityGuardian,
            Self::UserEmpathyChampion,
            Self::AccessibilityAdvocate,
            Self::UxPerfectionist,
            Self::BusinessStrategist,
            Self::MarketAnalyst,
            Self::CostOptimizer,
            Self::TestMaestro,
            Self::RefactorSurgeon,
            Self::DocCurator,
            Self::ApiDesigner,
            Self::DataPrivacyOfficer,
        ]
    }

    /// The category tag used by the selector heuristics.
    pub fn category(self) -> AgentCategory {
        match self {
            Self::BugHunter | Self::TestMaestro => AgentCategory::Quality,
            Self::SecurityProtector | Self::DataPrivacyOfficer => AgentCategory::Security,
            Self::PerfOptimizer | Self::DataFlowOptimizer => AgentCategory::Performance,
            Self::ZenArchitect | Self::ParadigmShifter | Self::ApiDesigner => {
                AgentCategory::Architecture
            }
            Self::InsightSynthesizer | Self::AmbiguityGuardian => AgentCategory::Analysis,
            Self::UserEmpathyChampion | Self::AccessibilityAdvocate | Self::UxPerfectionist => {
                AgentCategory::Ux
            }
            Self::BusinessStrategist | Self::MarketAnalyst | Self::CostOptimizer => {
                AgentCategory::Business
            }
            Self::RefactorSurgeon | Self::DocCurator => AgentCategory::Maintainability,
        }
    }

    /// Persona text spliced into prompts for this agent's turns.
    pub fn persona(self) -> &'static str {
        match self {
            Self::BugHunter => {
                "a relentless bug hunter who probes every proposal for failure modes, \
                 edge cases, and silent data corruption"
            }
            Self::SecurityProtector => {
                "a security reviewer who evaluates proposals for attack surface, \
                 privilege boundaries, and unsafe data handling"
            }
            Self::PerfOptimizer => {
                "a performance engineer who weighs latency, throughput, and resource \
                 cost of every change"
            }
            Self::DataFlowOptimizer => {
                "a data-flow specialist focused on how information moves through the \
                 system: batching, caching, and redundant work"
            }
            Self::ZenArchitect => {
                "a minimalist architect who values simple, composable designs and \
                 pushes back on accidental complexity"
            }
            Self::ParadigmShifter => {
                "a contrarian thinker who challenges the framing of a proposal and \
                 surfaces alternative approaches"
            }
            Self::InsightSynthesizer => {
                "a synthesizer who reconciles conflicting viewpoints into a coherent \
                 recommendation"
            }
            Self::AmbiguityGuardian => {
                "a precision-minded reviewer who flags underspecified requirements \
                 and ambiguous contracts"
            }
            Self::UserEmpathyChampion => {
                "a user advocate who judges proposals by their effect on real users' \
                 workflows and frustrations"
            }
            Self::AccessibilityAdvocate => {
                "an accessibility specialist who checks that changes remain usable \
                 with assistive technology"
            }
            Self::UxPerfectionist => {
                "a UX perfectionist who scrutinizes interaction details, consistency, \
                 and polish"
            }
            Self::BusinessStrategist => {
                "a business strategist who weighs proposals against product goals and \
                 long-term positioning"
            }
            Self::MarketAnalyst => {
                "a market analyst who compares proposals against competitor behavior \
                 and user demand signals"
            }
            Self::CostOptimizer => {
                "a cost-conscious reviewer who tracks engineering effort and \
                 operational spend against expected impact"
            }
            Self::TestMaestro => {
                "a testing specialist who asks how a change will be verified and what \
                 regressions it risks"
            }
            Self::RefactorSurgeon => {
                "a refactoring surgeon who cares about incremental, reversible change \
                 and codebase health"
            }
            Self::DocCurator => {
                "a documentation curator who evaluates whether a change can be \
                 explained, discovered, and maintained"
            }
            Self::ApiDesigner => {
                "an API designer who reviews contracts, naming, and compatibility \
                 implications"
            }
            Self::DataPrivacyOfficer => {
                "a privacy officer who checks data collection, retention, and \
                 regulatory exposure"
            }
        }
    }

    /// Stable identifier string (matches the serde representation).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BugHunter => "bug_hunter",
            Self::SecurityProtector => "security_protector",
            Self::PerfOptimizer => "perf_optimizer",
            Self::DataFlowOptimizer => "data_flow_optimizer",
            Self::ZenArchitect => "zen_architect",
            Self::ParadigmShifter => "paradigm_shifter",
            Self::InsightSynthesizer => "insight_synthesizer",
            Self::AmbiguityGuardian => "ambiguity_guardian",
            Self::UserEmpathyChampion => "user_empathy_champion",
            Self::AccessibilityAdvocate => "accessibility_advocate",
            Self::UxPerfectionist => "ux_perfectionist",
            Self::BusinessStrategist => "business_strategist",
            Self::MarketAnalyst => "market_analyst",
            Self::CostOptimizer => "cost_optimizer",
            Self::TestMaestro => "test_maestro",
            Self::RefactorSurgeon => "refactor_surgeon",
            Self::DocCurator => "doc_curator",
            Self::ApiDesigner => "api_designer",
            Self::DataPrivacyOfficer => "data_privacy_officer",
        }
    }

    /// Parse a kind from its identifier string (case-insensitive, accepts
    /// both `snake_case` and `kebab-case` forms).
    pub fn parse(s: &str) -> Option<AgentKind> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::all()
            .iter()
            .copied()
            .find(|k| k.as_str() == normalized)
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
