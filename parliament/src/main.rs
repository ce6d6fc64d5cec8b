//! Parliament CLI
//!
//! Debates a single idea against an OpenAI-compatible generation
//! endpoint and prints the verdict. Endpoint and engine knobs come from
//! `PARLIAMENT_*` environment variables with per-flag overrides.
//!
//! # Usage
//!
//! ```bash
//! # Local llama.cpp-style server on the default port
//! parliament --title "Cache hot paths" --category performance
//!
//! # Remote endpoint, shorter debate, machine-readable output
//! parliament --title "Cache hot paths" --category performance \
//!     --url http://10.0.0.7:8080/v1 --rounds 2 --json
//! ```

use anyhow::Result;
use clap::Parser;
use uuid::Uuid;

use parliament::{
    EndpointConfig, HttpGenerationProvider, Idea, IdeaStatus, InMemoryIdeaRepository,
    InMemoryReputationStore, InMemorySessionStore, ParliamentConfig, ParliamentService,
};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Idea title to put before the parliament
    #[arg(long)]
    title: String,

    /// Longer description; defaults to the title
    #[arg(long)]
    description: Option<String>,

    /// Category matched against the selector's keyword table
    /// (e.g. performance, security, refactoring, testing)
    #[arg(long, default_value = "general")]
    category: String,

    /// Rationale recorded alongside the idea
    #[arg(long, default_value = "proposed from the command line")]
    reasoning: String,

    /// Project id used for session and reputation keys
    #[arg(long, default_value = "cli")]
    project: String,

    /// Project goal; repeat for multiple goals
    #[arg(long = "goal")]
    goals: Vec<String>,

    /// Project context note; repeat for multiple notes
    #[arg(long = "note")]
    notes: Vec<String>,

    /// Effort estimate, 1 (small) to 3 (large)
    #[arg(long, default_value_t = 2)]
    effort: u8,

    /// Impact estimate, 1 (low) to 3 (high)
    #[arg(long, default_value_t = 2)]
    impact: u8,

    /// Endpoint base URL (overrides PARLIAMENT_LLM_URL)
    #[arg(long)]
    url: Option<String>,

    /// Model name (overrides PARLIAMENT_LLM_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Maximum debate rounds (overrides PARLIAMENT_MAX_ROUNDS)
    #[arg(long)]
    rounds: Option<u32>,

    /// Print the full result as JSON instead of a summary
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("parliament=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut endpoint = EndpointConfig::from_env();
    if let Some(url) = args.url {
        endpoint.url = url;
    }
    if let Some(model) = args.model {
        endpoint.model = model;
    }

    let mut config = ParliamentConfig::from_env();
    if let Some(rounds) = args.rounds {
        config.max_rounds = rounds;
    }

    let idea = Idea {
        id: Uuid::new_v4().to_string(),
        project_id: args.project.clone(),
        category: args.category,
        title: args.title.clone(),
        description: args.description.unwrap_or_else(|| args.title.clone()),
        reasoning: args.reasoning,
        effort: args.effort,
        impact: args.impact,
        source_agent: None,
        status: IdeaStatus::Proposed,
    };
    let idea_id = idea.id.clone();

    let ideas = InMemoryIdeaRepository::new();
    ideas.add_idea(idea).await;
    if !args.goals.is_empty() {
        ideas.set_goals(&args.project, args.goals).await;
    }
    if !args.notes.is_empty() {
        ideas.set_context_notes(&args.project, args.notes).await;
    }

    let turn_timeout = config.turn_timeout_secs;
    let service = ParliamentService::new(
        ideas.shared(),
        InMemorySessionStore::new().shared(),
        InMemoryReputationStore::new().shared(),
        std::sync::Arc::new(HttpGenerationProvider::new(endpoint, turn_timeout)),
        config,
    );

    let context = service.load_project_context(&args.project).await?;
    let result = service
        .run_debate(&idea_id, &args.project, &context, None)
        .await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Verdict: {} after {} round(s), agreement {:.2}",
            if result.passed { "PASSED" } else { "REJECTED" },
            result.rounds_completed,
            result.consensus_level,
        );
        if let Some(vote) = &result.vote {
            println!("Vote: {}", vote.tally_line());
            for ballot in &vote.ballots {
                println!(
                    "  {} voted {} (weight {:.2}, confidence {}): {}",
                    ballot.agent, ballot.choice, ballot.weight, ballot.confidence, ballot.reasoning
                );
            }
        }
        for t in &result.trade_offs {
            println!(
                "Trade-off ({}) {}: {} vs {}",
                t.importance, t.dimension, t.proposer_agent, t.challenger_agent
            );
        }
        println!("{}", result.reasoning);
        println!(
            "Tokens: {} prompt, {} completion",
            result.token_usage.prompt_tokens, result.token_usage.completion_tokens
        );
    }

    if let Some(error) = result.error {
        anyhow::bail!(error);
    }
    Ok(())
}
