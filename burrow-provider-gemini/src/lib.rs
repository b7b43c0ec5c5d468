//! Google Gemini LLM Provider
//!
//! Implements `LlmProvider` for the Gemini `generateContent` API: request
//! body construction, function-calling declarations, and response parsing
//! including the mandatory usage metadata.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tracing::debug;

use burrow_core::provider::{LlmProvider, LlmResponse, ModelInfo, TokenUsage};
use burrow_core::types::{Message, MessageContent, Role, ToolCallRequest, ToolDefinition};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Google Gemini LLM provider.
pub struct GeminiProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    /// Construct against a custom endpoint (used by tests).
    pub fn with_base_url(api_key: &str, model: &str, base_url: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Convert internal messages to the Gemini API format.
    ///
    /// The system instruction travels out-of-band; assistant tool calls
    /// become `functionCall` parts and tool results become `functionResponse`
    /// parts keyed by tool name, carried in a user-role content (the wire
    /// convention for function responses).
    fn build_request_body(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> serde_json::Value {
        let mut contents = Vec::new();
        let mut system_instruction = None;

        for msg in messages {
            match (&msg.role, &msg.content) {
                (Role::System, MessageContent::Text(t)) => {
                    system_instruction = Some(serde_json::json!({
                        "parts": [{ "text": t }]
                    }));
                }
                (Role::User, MessageContent::Text(t)) => {
                    contents.push(serde_json::json!({
                        "role": "user",
                        "parts": [{ "text": t }]
                    }));
                }
                (Role::Assistant, MessageContent::Text(t)) => {
                    contents.push(serde_json::json!({
                        "role": "model",
                        "parts": [{ "text": t }]
                    }));
                }
                (Role::Assistant, MessageContent::ToolCalls(calls)) => {
                    let parts: Vec<serde_json::Value> = calls
                        .iter()
                        .map(|c| {
                            serde_json::json!({
                                "functionCall": {
                                    "name": c.name,
                                    "args": c.arguments
                                }
                            })
                        })
                        .collect();
                    contents.push(serde_json::json!({
                        "role": "model",
                        "parts": parts
                    }));
                }
                (Role::Tool, MessageContent::ToolResults(results)) => {
                    let parts: Vec<serde_json::Value> = results
                        .iter()
                        .map(|r| {
                            let response = if r.is_error {
                                serde_json::json!({ "error": r.content })
                            } else {
                                serde_json::json!({ "result": r.content })
                            };
                            serde_json::json!({
                                "functionResponse": {
                                    "name": r.tool_name,
                                    "response": response
                                }
                            })
                        })
                        .collect();
                    contents.push(serde_json::json!({
                        "role": "user",
                        "parts": parts
                    }));
                }
                _ => {}
            }
        }

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": 8192,
            }
        });

        if let Some(sys) = system_instruction {
            body["systemInstruction"] = sys;
        }

        if !tools.is_empty() {
            let declarations: Vec<serde_json::Value> = tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters
                    })
                })
                .collect();
            body["tools"] = serde_json::json!([{
                "functionDeclarations": declarations
            }]);
        }

        body
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse> {
        let body = self.build_request_body(messages, tools);
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        debug!(model = %self.model, "calling Gemini API");

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .context("failed to call Gemini API")?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            bail!("Gemini API error (HTTP {}): {}", status, body);
        }

        let parsed: serde_json::Value = response
            .json()
            .await
            .context("failed to parse Gemini response body")?;

        // Extract text and function calls from the first candidate.
        let mut content = String::new();
        let mut tool_calls = Vec::new();

        if let Some(parts) = parsed
            .get("candidates")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|candidate| candidate.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
        {
            for part in parts {
                if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
                    content.push_str(text);
                }
                if let Some(fc) = part.get("functionCall") {
                    tool_calls.push(ToolCallRequest {
                        name: fc
                            .get("name")
                            .and_then(|n| n.as_str())
                            .unwrap_or("")
                            .to_string(),
                        arguments: fc
                            .get("args")
                            .cloned()
                            .unwrap_or_else(|| serde_json::json!({})),
                    });
                }
            }
        }

        // Usage metadata is part of the provider contract; its absence is a
        // broken response, not a zero.
        let Some(usage_meta) = parsed.get("usageMetadata") else {
            bail!(
                "Gemini response for model {} is missing usage metadata",
                self.model
            );
        };
        let usage = TokenUsage {
            prompt_tokens: usage_meta
                .get("promptTokenCount")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as usize,
            response_tokens: usage_meta
                .get("candidatesTokenCount")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as usize,
        };

        debug!(
            text_len = content.len(),
            tool_call_count = tool_calls.len(),
            prompt_tokens = usage.prompt_tokens,
            response_tokens = usage.response_tokens,
            "Gemini call complete"
        );

        Ok(LlmResponse {
            content,
            tool_calls,
            usage,
        })
    }

    fn model_info(&self) -> ModelInfo {
        let (max_context, max_output) = match self.model.as_str() {
            m if m.contains("pro") => (1_048_576, 65_536),
            m if m.contains("flash") => (1_048_576, 8_192),
            _ => (1_048_576, 8_192),
        };
        ModelInfo {
            name: self.model.clone(),
            max_context_tokens: max_context,
            max_output_tokens: max_output,
            provider_name: "gemini".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
