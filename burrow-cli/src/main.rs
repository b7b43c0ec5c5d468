//! Burrow Agent CLI
//!
//! Binary entry point: parses the prompt, loads configuration and the API
//! key, wires the Gemini provider and tool dispatcher together, runs the
//! conversation loop, and prints the final answer.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use burrow_core::{
    run_agent_loop, system_prompt, AgentConfig, AgentLoopConfig, Message, SandboxRoot,
    ToolDispatcher,
};
use burrow_provider_gemini::GeminiProvider;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "burrow", version, about = "Burrow — sandboxed LLM tool-calling agent")]
struct Cli {
    /// User prompt (words are joined with spaces)
    #[arg(required = true, num_args = 1..)]
    prompt: Vec<String>,

    /// Enable verbose output (per-turn token counts, tool arguments, raw
    /// tool results)
    #[arg(long)]
    verbose: bool,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // All logging goes to stderr; stdout carries only the final answer.
    // Disable ANSI color codes when stderr is not a real terminal.
    let is_tty = std::io::IsTerminal::is_terminal(&std::io::stderr());
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_ansi(is_tty)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        // Every fatal condition surfaces as a single reported line.
        println!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AgentConfig::load_default()?;
    config.validate()?;
    let api_key = config
        .resolve_api_key()
        .context("no API key configured")?;

    let provider = Arc::new(GeminiProvider::new(&api_key, &config.model));
    let sandbox = SandboxRoot::new(&config.working_dir)?;
    let dispatcher = ToolDispatcher::new(sandbox, config.tools.clone());

    let prompt = cli.prompt.join(" ");
    let initial_messages = vec![
        system_prompt::system_message(&dispatcher.definitions()),
        Message::user(prompt),
    ];

    let loop_config = AgentLoopConfig::from(&config.agent);
    let result = run_agent_loop(provider, &dispatcher, initial_messages, &loop_config).await?;

    info!(
        turns = result.turns,
        prompt_tokens = result.total_usage.prompt_tokens,
        response_tokens = result.total_usage.response_tokens,
        "run complete"
    );

    println!("Final response:");
    println!("{}", result.final_text);
    Ok(())
}
