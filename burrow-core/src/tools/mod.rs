//! Tool Set
//!
//! The four operations the model may invoke: `list_directory`, `read_file`,
//! `run_script`, and `write_file`. Each takes the sandbox root plus
//! tool-specific arguments and produces a human-readable string. Failures are
//! a structured [`ToolError`] internally and become `Error: …` strings only
//! at the dispatcher boundary.

mod fs;
mod script;

pub use fs::{list_directory, read_file, write_file};
pub use script::{run_script, SCRIPT_SUFFIX};

use thiserror::Error;

use crate::config::ToolSettings;
use crate::sandbox::SandboxError;
use crate::types::ToolDefinition;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure of a single tool invocation. Never escapes the dispatcher; the
/// Display string is the wire payload.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    #[error("File not found or is not a regular file: \"{0}\"")]
    NotAFile(String),

    #[error("\"{0}\" is not a directory")]
    NotADirectory(String),

    #[error("File \"{0}\" not found.")]
    ScriptNotFound(String),

    #[error("\"{0}\" is not a Python file.")]
    NotAScript(String),

    #[error("execution of \"{file}\" timed out after {secs} seconds")]
    Timeout { file: String, secs: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Tool declarations
// ---------------------------------------------------------------------------

/// The fixed declaration of the four tools, advertised to the LLM.
pub fn tool_definitions(settings: &ToolSettings) -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "list_directory".to_string(),
            description: "Lists files in the specified directory along with their sizes, constrained to the working directory.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "directory": {
                        "type": "string",
                        "description": "The directory to list files from, relative to the working directory. If not provided, lists files in the working directory itself."
                    }
                }
            }),
        },
        ToolDefinition {
            name: "read_file".to_string(),
            description: format!(
                "Get the content of the specified file (max {} chars), constrained to the working directory.",
                settings.read_limit
            ),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "The path of the target file, relative to the working directory."
                    }
                },
                "required": ["file_path"]
            }),
        },
        ToolDefinition {
            name: "run_script".to_string(),
            description: "Run the provided python file called with the given args, constrained to the working directory.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "The path of the target file, relative to the working directory."
                    },
                    "args": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "The list of args to call the script with."
                    }
                },
                "required": ["file_path"]
            }),
        },
        ToolDefinition {
            name: "write_file".to_string(),
            description: "Write to the given file with the provided content, constrained to the working directory.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "The path of the target file, relative to the working directory."
                    },
                    "content": {
                        "type": "string",
                        "description": "The content to write to the target file."
                    }
                },
                "required": ["file_path", "content"]
            }),
        },
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
