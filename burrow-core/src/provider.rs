//! LLM Provider Trait and Types
//!
//! Defines the `LlmProvider` trait and supporting types for LLM responses,
//! model information, and token usage.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{Message, ToolCallRequest, ToolDefinition};

// ---------------------------------------------------------------------------
// LLM response types
// ---------------------------------------------------------------------------

/// Information about a model offered by a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier (e.g. "gemini-2.5-flash").
    pub name: String,
    /// Maximum input context tokens.
    pub max_context_tokens: usize,
    /// Maximum output tokens per response.
    pub max_output_tokens: usize,
    /// Provider name (e.g. "gemini").
    pub provider_name: String,
}

/// Token usage for a single LLM call.
///
/// Advisory: consumed for diagnostics, never for control flow.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: usize,
    pub response_tokens: usize,
}

impl TokenUsage {
    /// Accumulate another call's usage into this total.
    pub fn add(&mut self, other: TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.response_tokens += other.response_tokens;
    }
}

/// Response from an LLM provider `complete()` call.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Text content (may be empty if only tool calls).
    pub content: String,
    /// Tool calls requested by the LLM, in the order the model emitted them.
    pub tool_calls: Vec<ToolCallRequest>,
    /// Token usage for this call. Required: a response without usage
    /// metadata is a broken provider contract and never reaches here.
    pub usage: TokenUsage,
}

// ---------------------------------------------------------------------------
// LLM Provider trait
// ---------------------------------------------------------------------------

/// Trait implemented by each LLM provider.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider identifier (e.g. "gemini").
    fn name(&self) -> &str;

    /// Send a completion request with the conversation so far and the
    /// advertised tool declarations, and return the aggregated response.
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse>;

    /// Return metadata about the active model.
    fn model_info(&self) -> ModelInfo;
}
