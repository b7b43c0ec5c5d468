//! Tool Dispatcher
//!
//! Maps a model-requested tool name and argument bag onto the tool set,
//! injects the sandbox root, and packages every outcome (including unknown
//! names and argument mismatches) as a normal tool-result payload. Nothing
//! on this path panics or returns `Err`; the conversation always continues.

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::ToolSettings;
use crate::sandbox::SandboxRoot;
use crate::tools::{self, ToolError};
use crate::types::{ToolCallRequest, ToolCallResult, ToolDefinition};

// ---------------------------------------------------------------------------
// Tool invocations
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ListDirectoryArgs {
    #[serde(default = "default_directory")]
    pub directory: String,
}

fn default_directory() -> String {
    ".".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ReadFileArgs {
    pub file_path: String,
}

#[derive(Debug, Deserialize)]
pub struct RunScriptArgs {
    pub file_path: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct WriteFileArgs {
    pub file_path: String,
    pub content: String,
}

/// A model-requested tool call, parsed into the closed set of known
/// operations. Unknown names stay representable so the model can be told
/// about them instead of faulting the run.
#[derive(Debug)]
pub enum ToolInvocation {
    ListDirectory(ListDirectoryArgs),
    ReadFile(ReadFileArgs),
    RunScript(RunScriptArgs),
    WriteFile(WriteFileArgs),
    Unrecognized { name: String },
}

impl ToolInvocation {
    /// Parse a raw request. An unknown name is `Ok(Unrecognized)`; a known
    /// name with a bad argument shape is `Err` with a descriptive message.
    pub fn parse(request: &ToolCallRequest) -> Result<Self, String> {
        // Some models send null instead of an empty argument object.
        let arguments = if request.arguments.is_null() {
            serde_json::json!({})
        } else {
            request.arguments.clone()
        };

        let parsed = match request.name.as_str() {
            "list_directory" => serde_json::from_value(arguments).map(Self::ListDirectory),
            "read_file" => serde_json::from_value(arguments).map(Self::ReadFile),
            "run_script" => serde_json::from_value(arguments).map(Self::RunScript),
            "write_file" => serde_json::from_value(arguments).map(Self::WriteFile),
            other => {
                return Ok(Self::Unrecognized {
                    name: other.to_string(),
                })
            }
        };

        parsed.map_err(|e| format!("invalid arguments for {}: {e}", request.name))
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Executes tool calls against a fixed sandbox root.
#[derive(Debug)]
pub struct ToolDispatcher {
    sandbox: SandboxRoot,
    settings: ToolSettings,
}

impl ToolDispatcher {
    pub fn new(sandbox: SandboxRoot, settings: ToolSettings) -> Self {
        Self { sandbox, settings }
    }

    /// The tool declarations advertised to the LLM.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        tools::tool_definitions(&self.settings)
    }

    /// Execute one tool call and package the outcome.
    pub async fn dispatch(&self, request: &ToolCallRequest) -> ToolCallResult {
        info!(tool = %request.name, "calling function");
        debug!(tool = %request.name, args = %request.arguments, "function arguments");

        let invocation = match ToolInvocation::parse(request) {
            Ok(invocation) => invocation,
            Err(message) => {
                return self.finish(request.name.clone(), format!("Error: {message}"), false)
            }
        };

        let outcome: Result<String, ToolError> = match invocation {
            ToolInvocation::Unrecognized { name } => {
                warn!(tool = %name, "unknown function requested");
                return self.finish(name.clone(), format!("Unknown function: {name}"), true);
            }
            ToolInvocation::ListDirectory(args) => {
                tools::list_directory(&self.sandbox, &args.directory).await
            }
            ToolInvocation::ReadFile(args) => {
                tools::read_file(&self.sandbox, &args.file_path, self.settings.read_limit).await
            }
            ToolInvocation::RunScript(args) => {
                tools::run_script(&self.sandbox, &args.file_path, &args.args, &self.settings).await
            }
            ToolInvocation::WriteFile(args) => {
                tools::write_file(&self.sandbox, &args.file_path, &args.content).await
            }
        };

        let content = match outcome {
            Ok(output) => output,
            Err(err) => format!("Error: {err}"),
        };
        self.finish(request.name.clone(), content, false)
    }

    fn finish(&self, tool_name: String, content: String, is_error: bool) -> ToolCallResult {
        debug!(tool = %tool_name, result = %content, "function result");
        ToolCallResult {
            tool_name,
            content,
            is_error,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
