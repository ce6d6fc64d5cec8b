//! Prompt builders for debate turns, consensus checks, and ballots.
//!
//! Prompt versioning: bump `PROMPT_VERSION` whenever builder content
//! changes, so a logged agent response can be traced back to the prompt
//! wording that produced it.

use crate::catalog::AgentKind;
use crate::debate::state::{AgentDebateState, DebateRole, DebateTurn};
use crate::debate::tradeoff::TradeOffAnalysis;
use crate::repository::{Idea, ProjectContext};

/// Prompt version. Bump on any builder content change.
pub const PROMPT_VERSION: &str = "1.2.0";

/// System prompt for one agent's debate turn.
pub fn turn_system_prompt(agent: AgentKind, role: DebateRole) -> String {
    format!(
        "You are {persona}. You sit in a review parliament evaluating a proposed \
         unit of work, serving as a {role}. Argue from your specialty; be concrete \
         and brief.\n\n\
         Respond with a single JSON object:\n\
         {{\"action\": \"propose|challenge|defend|mediate|concede|vote\", \
         \"content\": \"your argument\", \"confidence\": 0-100, \
         \"target_agent\": \"agent id or null\", \"position_change\": true|false}}",
        persona = agent.persona(),
        role = role,
    )
}

/// User prompt for one debate turn: the idea, project context, the other
/// agents' current positions, and the trailing transcript window.
pub fn turn_prompt(
    idea: &Idea,
    context: &ProjectContext,
    round: u32,
    recent_turns: &[&DebateTurn],
    others: &[(AgentKind, &AgentDebateState)],
) -> String {
    let mut sections = Vec::new();

    sections.push(format!(
        "## Idea under review\n\
         Title: {}\nCategory: {}\nEffort: {}/3, Impact: {}/3\n\
         Description: {}\nReasoning: {}",
        idea.title, idea.category, idea.effort, idea.impact, idea.description, idea.reasoning
    ));

    if !context.goals.is_empty() {
        sections.push(format!(
            "## Project goals\n{}",
            context
                .goals
                .iter()
                .map(|g| format!("- {g}"))
                .collect::<Vec<_>>()
                .join("\n")
        ));
    }
    if !context.context_notes.is_empty() {
        sections.push(format!(
            "## Project notes\n{}",
            context
                .context_notes
                .iter()
                .map(|n| format!("- {n}"))
                .collect::<Vec<_>>()
                .join("\n")
        ));
    }

    let positions: Vec<String> = others
        .iter()
        .filter(|(_, state)| state.has_position())
        .map(|(agent, state)| {
            format!(
                "- {} ({}, confidence {}): {}",
                agent, state.role, state.confidence, state.position
            )
        })
        .collect();
    if !positions.is_empty() {
        sections.push(format!("## Current positions\n{}", positions.join("\n")));
    }

    if !recent_turns.is_empty() {
        let transcript: Vec<String> = recent_turns
            .iter()
            .map(|t| format!("[round {}] {} ({}): {}", t.round, t.agent, t.action, t.content))
            .collect();
        sections.push(format!("## Recent transcript\n{}", transcript.join("\n")));
    }

    sections.push(format!(
        "## Your task\nThis is round {round}. Give your contribution as the JSON \
         object described in the system prompt."
    ));

    sections.join("\n\n")
}

/// System prompt for the end-of-round consensus check.
pub fn consensus_system_prompt() -> &'static str {
    "You moderate a review parliament. Given the members' stated positions, \
     judge how close they are to agreement.\n\n\
     Respond with a single JSON object:\n\
     {\"reached\": true|false, \"level\": 0.0-1.0, \
     \"recommendation\": \"continue_debate|proceed_to_vote|escalate\"}"
}

/// User prompt for the end-of-round consensus check.
pub fn consensus_prompt(idea_title: &str, positions: &[(AgentKind, &AgentDebateState)]) -> String {
    let listed: Vec<String> = positions
        .iter()
        .filter(|(_, state)| state.has_position())
        .map(|(agent, state)| {
            format!(
                "- {} ({}, confidence {}): {}",
                agent, state.role, state.confidence, state.position
            )
        })
        .collect();
    format!(
        "Idea: {}\n\n## Stated positions\n{}\n\nJudge the level of agreement and \
         respond with the JSON object described in the system prompt.",
        idea_title,
        listed.join("\n")
    )
}

/// System prompt for one agent's ballot.
pub fn ballot_system_prompt(agent: AgentKind) -> String {
    format!(
        "You are {persona}. The debate is over; cast your ballot on whether the \
         idea should be selected.\n\n\
         Respond with a single JSON object:\n\
         {{\"vote\": \"support|oppose|abstain\", \"reasoning\": \"one or two \
         sentences\", \"confidence\": 0-100}}",
        persona = agent.persona(),
    )
}

/// User prompt for one agent's ballot: idea, debate summary, trade-offs.
pub fn ballot_prompt(idea: &Idea, debate_summary: &str, trade_offs: &[TradeOffAnalysis]) -> String {
    let mut sections = vec![format!(
        "## Idea\nTitle: {}\nCategory: {}\nDescription: {}",
        idea.title, idea.category, idea.description
    )];

    sections.push(format!("## Debate summary\n{debate_summary}"));

    if !trade_offs.is_empty() {
        let listed: Vec<String> = trade_offs
            .iter()
            .map(|t| {
                format!(
                    "- {} ({}): {} vs {}",
                    t.dimension, t.importance, t.proposer_agent, t.challenger_agent
                )
            })
            .collect();
        sections.push(format!("## Trade-offs surfaced\n{}", listed.join("\n")));
    }

    sections.push(
        "## Your task\nCast your ballot as the JSON object described in the system prompt."
            .to_string(),
    );

    sections.join("\n\n")
}
