//! Voting engine — reputation-weighted parliamentary ballots.
//!
//! One ballot per seated agent, collected concurrently behind a
//! semaphore cap. Ballots use a lower temperature and token budget than
//! debate turns; a failed or unparseable ballot degrades to an
//! abstention rather than aborting the vote.

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::catalog::AgentKind;
use crate::config::ParliamentConfig;
use crate::debate::tradeoff::TradeOffAnalysis;
use crate::generation::{
    parse_json_lenient, GenerationProvider, GenerationRequest, TokenUsage,
};
use crate::prompts;
use crate::repository::{Idea, ReputationStore};

/// A single agent's vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BallotChoice {
    Support,
    Oppose,
    Abstain,
}

impl fmt::Display for BallotChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BallotChoice::Support => "support",
            BallotChoice::Oppose => "oppose",
            BallotChoice::Abstain => "abstain",
        };
        write!(f, "{name}")
    }
}

/// One cast ballot with the weight it carried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentBallot {
    pub agent: AgentKind,
    pub choice: BallotChoice,
    pub reasoning: String,
    pub confidence: u8,
    pub weight: f64,
}

/// The aggregate outcome of a parliamentary vote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParliamentaryVote {
    pub ballots: Vec<AgentBallot>,
    pub support_count: usize,
    pub oppose_count: usize,
    pub abstain_count: usize,
    pub weighted_support: f64,
    pub weighted_oppose: f64,
    /// Strict comparison: a tie fails.
    pub passed: bool,
    pub margin: f64,
}

impl ParliamentaryVote {
    /// Aggregate a set of cast ballots into the final tally.
    pub fn tally(ballots: Vec<AgentBallot>) -> Self {
        let mut support_count = 0;
        let mut oppose_count = 0;
        let mut abstain_count = 0;
        let mut weighted_support = 0.0;
        let mut weighted_oppose = 0.0;

        for ballot in &ballots {
            match ballot.choice {
                BallotChoice::Support => {
                    support_count += 1;
                    weighted_support += ballot.weight;
                }
                BallotChoice::Oppose => {
                    oppose_count += 1;
                    weighted_oppose += ballot.weight;
                }
                BallotChoice::Abstain => abstain_count += 1,
            }
        }

        Self {
            ballots,
            support_count,
            oppose_count,
            abstain_count,
            weighted_support,
            weighted_oppose,
            passed: weighted_support > weighted_oppose,
            margin: weighted_support - weighted_oppose,
        }
    }

    /// Compact tally for logs: "3s/1o/1a (weighted 2.50 vs 0.75)".
    pub fn tally_line(&self) -> String {
        format!(
            "{}s/{}o/{}a (weighted {:.2} vs {:.2})",
            self.support_count,
            self.oppose_count,
            self.abstain_count,
            self.weighted_support,
            self.weighted_oppose
        )
    }
}

#[derive(Debug, Deserialize)]
struct RawBallot {
    vote: BallotChoice,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    confidence: u8,
}

fn abstention(agent: AgentKind, weight: f64) -> AgentBallot {
    AgentBallot {
        agent,
        choice: BallotChoice::Abstain,
        reasoning: "No usable ballot returned".to_string(),
        confidence: 0,
        weight,
    }
}

/// Vote weight for one agent: `0.5 + score/200` when a reputation row
/// exists for the (agent, project) pair, else full weight.
async fn vote_weight(store: &dyn ReputationStore, agent: AgentKind, project_id: &str) -> f64 {
    match store.get_reputation(agent, project_id).await {
        Ok(Some(reputation)) => reputation.vote_weight(),
        Ok(None) => 1.0,
        Err(e) => {
            warn!(%agent, error = %e, "Reputation lookup failed, using full weight");
            1.0
        }
    }
}

/// Collect one ballot from every seated agent and tally the result.
///
/// Ballots run concurrently, at most `vote_concurrency` in flight, and
/// the returned ballot order matches the roster's seating order.
pub async fn conduct_vote(
    provider: &dyn GenerationProvider,
    reputation: &dyn ReputationStore,
    idea: &Idea,
    agents: &[AgentKind],
    debate_summary: &str,
    trade_offs: &[TradeOffAnalysis],
    config: &ParliamentConfig,
) -> (ParliamentaryVote, TokenUsage) {
    let semaphore = Arc::new(Semaphore::new(config.vote_concurrency.max(1)));

    let futures: Vec<_> = agents
        .iter()
        .map(|&agent| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                let _permit = semaphore.acquire().await.expect("semaphore closed");
                let weight = vote_weight(reputation, agent, &idea.project_id).await;

                let request = GenerationRequest {
                    prompt: prompts::ballot_prompt(idea, debate_summary, trade_offs),
                    system_prompt: Some(prompts::ballot_system_prompt(agent)),
                    temperature: config.vote_temperature,
                    max_tokens: config.vote_max_tokens,
                };

                match provider.generate(&request).await {
                    Ok(generation) => {
                        let ballot = match parse_json_lenient::<RawBallot>(&generation.text) {
                            Ok(raw) => AgentBallot {
                                agent,
                                choice: raw.vote,
                                reasoning: raw.reasoning,
                                confidence: raw.confidence.min(100),
                                weight,
                            },
                            Err(e) => {
                                warn!(%agent, error = %e, "Ballot unparseable, abstaining");
                                abstention(agent, weight)
                            }
                        };
                        (ballot, generation.usage)
                    }
                    Err(e) => {
                        warn!(%agent, error = %e, "Ballot generation failed, abstaining");
                        (abstention(agent, weight), TokenUsage::default())
                    }
                }
            }
        })
        .collect();

    let mut usage = TokenUsage::default();
    let mut ballots = Vec::with_capacity(agents.len());
    for (ballot, ballot_usage) in join_all(futures).await {
        usage.add(ballot_usage);
        ballots.push(ballot);
    }

    let vote = ParliamentaryVote::tally(ballots);
    debug!(
        idea = %idea.id,
        tally = %vote.tally_line(),
        passed = vote.passed,
        "Vote concluded"
    );
    (vote, usage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{Generation, GenerationError};
    use crate::repository::{InMemoryReputationStore, IdeaStatus};
    use crate::reputation::AgentReputation;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn ballot(agent: AgentKind, choice: BallotChoice, weight: f64) -> AgentBallot {
        AgentBallot {
            agent,
            choice,
            reasoning: "because".to_string(),
            confidence: 70,
            weight,
        }
    }

    fn idea() -> Idea {
        Idea {
            id: "i-1".to_string(),
            project_id: "p-1".to_string(),
            category: "performance".to_string(),
            title: "Cache hot paths".to_string(),
            description: "Add a response cache".to_string(),
            reasoning: "P95 latency is high".to_string(),
            effort: 2,
            impact: 3,
            source_agent: None,
            status: IdeaStatus::Proposed,
        }
    }

    /// Scripted per-agent ballots keyed on the system prompt's persona.
    struct ScriptedBallots {
        by_persona: HashMap<&'static str, &'static str>,
        fallback: &'static str,
        calls: Mutex<u32>,
    }

    #[async_trait]
    impl GenerationProvider for ScriptedBallots {
        async fn generate(
            &self,
            request: &GenerationRequest,
        ) -> Result<Generation, GenerationError> {
            *self.calls.lock().unwrap() += 1;
            let system = request.system_prompt.as_deref().unwrap_or("");
            let text = self
                .by_persona
                .iter()
                .find(|(persona, _)| system.contains(*persona))
                .map(|(_, text)| *text)
                .unwrap_or(self.fallback);
            Ok(Generation {
                text: text.to_string(),
                usage: TokenUsage {
                    prompt_tokens: 50,
                    completion_tokens: 20,
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
            Err(GenerationError::RequestFailed("connection refused".to_string()))
        }
    }

    #[test]
    fn test_tally_counts_and_weights() {
        let vote = ParliamentaryVote::tally(vec![
            ballot(AgentKind::BugHunter, BallotChoice::Support, 1.0),
            ballot(AgentKind::PerfOptimizer, BallotChoice::Support, 0.75),
            ballot(AgentKind::SecurityProtector, BallotChoice::Oppose, 0.9),
            ballot(AgentKind::DocCurator, BallotChoice::Abstain, 1.0),
        ]);
        assert_eq!(vote.support_count, 2);
        assert_eq!(vote.oppose_count, 1);
        assert_eq!(vote.abstain_count, 1);
        assert!((vote.weighted_support - 1.75).abs() < 1e-9);
        assert!((vote.weighted_oppose - 0.9).abs() < 1e-9);
        assert!(vote.passed);
        assert!((vote.margin - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_tie_fails() {
        let vote = ParliamentaryVote::tally(vec![
            ballot(AgentKind::BugHunter, BallotChoice::Support, 0.8),
            ballot(AgentKind::SecurityProtector, BallotChoice::Oppose, 0.8),
        ]);
        assert!(!vote.passed);
        assert_eq!(vote.margin, 0.0);
    }

    #[test]
    fn test_abstentions_carry_no_weight() {
        let vote = ParliamentaryVote::tally(vec![
            ballot(AgentKind::BugHunter, BallotChoice::Support, 0.5),
            ballot(AgentKind::DocCurator, BallotChoice::Abstain, 1.0),
            ballot(AgentKind::TestMaestro, BallotChoice::Abstain, 1.0),
        ]);
        assert!(vote.passed);
        assert!((vote.weighted_support - 0.5).abs() < 1e-9);
        assert_eq!(vote.weighted_oppose, 0.0);
    }

    #[test]
    fn test_tally_line_format() {
        let vote = ParliamentaryVote::tally(vec![
            ballot(AgentKind::BugHunter, BallotChoice::Support, 1.0),
            ballot(AgentKind::SecurityProtector, BallotChoice::Oppose, 0.75),
        ]);
        assert_eq!(vote.tally_line(), "1s/1o/0a (weighted 1.00 vs 0.75)");
    }

    #[tokio::test]
    async fn test_ballots_preserve_roster_order() {
        let store = InMemoryReputationStore::new();
        let provider = ScriptedBallots {
            by_persona: HashMap::new(),
            fallback: "{\"vote\": \"support\", \"reasoning\": \"fine\", \"confidence\": 70}",
            calls: Mutex::new(0),
        };
        let agents = vec![
            AgentKind::PerfOptimizer,
            AgentKind::BugHunter,
            AgentKind::SecurityProtector,
        ];
        let config = ParliamentConfig::default();
        let (vote, usage) = conduct_vote(
            &provider,
            &store,
            &idea(),
            &agents,
            "short debate",
            &[],
            &config,
        )
        .await;
        let order: Vec<AgentKind> = vote.ballots.iter().map(|b| b.agent).collect();
        assert_eq!(order, agents);
        assert_eq!(vote.support_count, 3);
        assert_eq!(usage.total(), 3 * 70);
        assert_eq!(*provider.calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_mixed_ballots_and_parse_failure() {
        let store = InMemoryReputationStore::new();
        let mut by_persona = HashMap::new();
        by_persona.insert(
            "bug hunter",
            "{\"vote\": \"oppose\", \"reasoning\": \"untested\", \"confidence\": 85}",
        );
        by_persona.insert("documentation curator", "I decline to answer in JSON");
        let provider = ScriptedBallots {
            by_persona,
            fallback: "{\"vote\": \"support\", \"reasoning\": \"fine\", \"confidence\": 60}",
            calls: Mutex::new(0),
        };
        let agents = vec![
            AgentKind::PerfOptimizer,
            AgentKind::BugHunter,
            AgentKind::DocCurator,
        ];
        let config = ParliamentConfig::default();
        let (vote, _) = conduct_vote(
            &provider,
            &store,
            &idea(),
            &agents,
            "short debate",
            &[],
            &config,
        )
        .await;
        assert_eq!(vote.support_count, 1);
        assert_eq!(vote.oppose_count, 1);
        assert_eq!(vote.abstain_count, 1);
        assert_eq!(vote.ballots[2].choice, BallotChoice::Abstain);
        assert_eq!(vote.ballots[2].reasoning, "No usable ballot returned");
    }

    #[tokio::test]
    async fn test_provider_failure_means_all_abstain() {
        let store = InMemoryReputationStore::new();
        let agents = vec![AgentKind::PerfOptimizer, AgentKind::BugHunter];
        let config = ParliamentConfig::default();
        let (vote, usage) = conduct_vote(
            &Failing,
            &store,
            &idea(),
            &agents,
            "short debate",
            &[],
            &config,
        )
        .await;
        assert_eq!(vote.abstain_count, 2);
        assert!(!vote.passed);
        assert_eq!(usage.total(), 0);
    }

    #[tokio::test]
    async fn test_known_agent_uses_reputation_weight() {
        let store = InMemoryReputationStore::new();
        let rep = AgentReputation::new(AgentKind::BugHunter, "p-1");
        store.upsert_reputation(&rep).await.unwrap();

        let provider = ScriptedBallots {
            by_persona: HashMap::new(),
            fallback: "{\"vote\": \"support\", \"reasoning\": \"fine\", \"confidence\": 70}",
            calls: Mutex::new(0),
        };
        let agents = vec![AgentKind::BugHunter, AgentKind::PerfOptimizer];
        let config = ParliamentConfig::default();
        let (vote, _) = conduct_vote(
            &provider,
            &store,
            &idea(),
            &agents,
            "short debate",
            &[],
            &config,
        )
        .await;
        // Fresh reputation row scores 50, weight 0.75; unknown agent 1.0.
        assert!((vote.ballots[0].weight - 0.75).abs() < 1e-9);
        assert!((vote.ballots[1].weight - 1.0).abs() < 1e-9);
        assert!((vote.weighted_support - 1.75).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_out_of_range_confidence_is_clamped() {
        let store = InMemoryReputationStore::new();
        let provider = ScriptedBallots {
            by_persona: HashMap::new(),
            fallback: "{\"vote\": \"support\", \"reasoning\": \"sure\", \"confidence\": 250}",
            calls: Mutex::new(0),
        };
        let agents = vec![AgentKind::BugHunter];
        let config = ParliamentConfig::default();
        let (vote, _) = conduct_vote(
            &provider,
            &store,
            &idea(),
            &agents,
            "short debate",
            &[],
            &config,
        )
        .await;
        assert_eq!(vote.ballots[0].confidence, 100);
    }
}
