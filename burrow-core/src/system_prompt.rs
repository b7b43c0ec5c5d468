//! System Prompt
//!
//! The fixed system instruction sent with every model call, with `{{key}}`
//! template substitution for the advertised tool list.

use std::collections::HashMap;

use crate::types::{Message, MessageContent, Role, ToolDefinition};

/// Default system instruction for the agent.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a helpful AI coding agent operating inside a fixed working directory.

When the user asks a question or makes a request, make a plan and carry it out using the available tools:
{{tools}}

All paths you provide must be relative to the working directory. Do not specify the working directory itself in your arguments; it is injected automatically for security reasons.

When you have gathered enough information, answer the user in plain text instead of calling another function."#;

/// Substitute `{{key}}` placeholders in a prompt template.
pub fn render(template: &str, variables: &HashMap<String, String>) -> String {
    let mut prompt = template.to_string();
    for (key, value) in variables {
        let placeholder = format!("{{{{{key}}}}}");
        prompt = prompt.replace(&placeholder, value);
    }
    prompt
}

/// Build the system message for a run from the advertised tool set.
pub fn system_message(tools: &[ToolDefinition]) -> Message {
    let tool_list = tools
        .iter()
        .map(|t| format!("- {}: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n");

    let mut variables = HashMap::new();
    variables.insert("tools".to_string(), tool_list);

    Message {
        role: Role::System,
        content: MessageContent::Text(render(DEFAULT_SYSTEM_PROMPT, &variables)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
