//! Conversation Loop
//!
//! Core loop: prompt → LLM → if tool calls, execute tools sequentially →
//! feed results back → repeat until the model produces a final text answer
//! or the iteration ceiling is hit.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

use crate::dispatch::ToolDispatcher;
use crate::provider::{LlmProvider, TokenUsage};
use crate::types::{History, Message, MessageContent, Role};

// ---------------------------------------------------------------------------
// Loop configuration and result
// ---------------------------------------------------------------------------

/// Configuration for the conversation loop.
#[derive(Debug, Clone)]
pub struct AgentLoopConfig {
    /// Maximum model turns before the run is declared failed (default 20).
    pub max_iterations: usize,
    /// Consecutive turns with no tool calls and blank text tolerated before
    /// failing for lack of forward progress (default 3).
    pub max_stalled_turns: usize,
}

impl Default for AgentLoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            max_stalled_turns: 3,
        }
    }
}

impl From<&crate::config::AgentSettings> for AgentLoopConfig {
    fn from(settings: &crate::config::AgentSettings) -> Self {
        Self {
            max_iterations: settings.max_iterations,
            max_stalled_turns: settings.max_stalled_turns,
        }
    }
}

/// Result of a successful run.
#[derive(Debug)]
pub struct AgentLoopResult {
    /// The model's final answer (non-blank by construction).
    pub final_text: String,
    /// Token usage accumulated across all model calls.
    pub total_usage: TokenUsage,
    /// Number of turns performed.
    pub turns: usize,
    /// The full conversation, for diagnostics.
    pub history: History,
}

// ---------------------------------------------------------------------------
// The loop
// ---------------------------------------------------------------------------

/// Run the conversation loop to completion.
///
/// `initial_messages` seeds the history (system instruction plus the user
/// prompt). Every tool call the model requests in a turn is answered, in
/// request order, before the next model call is issued.
pub async fn run_agent_loop(
    provider: Arc<dyn LlmProvider>,
    dispatcher: &ToolDispatcher,
    initial_messages: Vec<Message>,
    config: &AgentLoopConfig,
) -> Result<AgentLoopResult> {
    let tools = dispatcher.definitions();
    let mut history = History::new(initial_messages);
    let mut total_usage = TokenUsage::default();
    let mut stalled_turns = 0usize;
    let mut last_had_tool_calls = false;
    let mut last_text_present = false;

    for turn in 1..=config.max_iterations {
        debug!(turn, messages = history.len(), "conversation turn");

        let response = provider
            .complete(history.messages(), &tools)
            .await
            .context("LLM request failed")?;

        total_usage.add(response.usage);
        info!(
            turn,
            prompt_tokens = response.usage.prompt_tokens,
            response_tokens = response.usage.response_tokens,
            tool_calls = response.tool_calls.len(),
            "model call complete"
        );

        if !response.content.is_empty() {
            history.push(Message::assistant(response.content.clone()));
        }

        last_had_tool_calls = !response.tool_calls.is_empty();
        last_text_present = !response.content.trim().is_empty();

        if response.tool_calls.is_empty() {
            if last_text_present {
                return Ok(AgentLoopResult {
                    final_text: response.content,
                    total_usage,
                    turns: turn,
                    history,
                });
            }

            // No tool calls, no text: nothing happened this turn. Tolerate a
            // few before giving up instead of burning the whole budget.
            stalled_turns += 1;
            warn!(turn, stalled_turns, "model returned neither tool calls nor text");
            if stalled_turns >= config.max_stalled_turns {
                bail!(
                    "no forward progress after {stalled_turns} consecutive turns \
                     with no tool calls and no text"
                );
            }
            continue;
        }
        stalled_turns = 0;

        history.push(Message {
            role: Role::Assistant,
            content: MessageContent::ToolCalls(response.tool_calls.clone()),
        });

        // Strictly sequential: later calls may depend on earlier side effects
        // and the protocol declares no dependencies.
        let mut results = Vec::with_capacity(response.tool_calls.len());
        for call in &response.tool_calls {
            results.push(dispatcher.dispatch(call).await);
        }

        // One tool-role message bundles every result for the turn, so no
        // request is left dangling when the next model call goes out.
        history.push(Message {
            role: Role::Tool,
            content: MessageContent::ToolResults(results),
        });
    }

    bail!(
        "reached max iterations ({}) without finishing. \
         last_had_function_calls={}, last_response_text_present={}",
        config.max_iterations,
        last_had_tool_calls,
        last_text_present
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
