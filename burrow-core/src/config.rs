//! Configuration
//!
//! TOML-based configuration: model selection, API key, sandbox working
//! directory, iteration ceiling, and tool limits. Loaded once at startup and
//! threaded explicitly into the loop and dispatcher, with no ambient globals.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Environment variable consulted when the config file carries no API key.
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";

// ---------------------------------------------------------------------------
// Configuration structures
// ---------------------------------------------------------------------------

/// Top-level agent configuration (maps to TOML).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sandbox root. Every tool call is confined to this directory.
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,

    /// API key. If absent, falls back to the `GEMINI_API_KEY` env var.
    pub api_key: Option<String>,

    /// Conversation loop settings.
    #[serde(default)]
    pub agent: AgentSettings,

    /// Tool execution limits.
    #[serde(default)]
    pub tools: ToolSettings,
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_working_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Conversation loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Maximum model turns per run (default 20).
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Consecutive turns with no tool calls and blank text tolerated
    /// before the run fails for lack of forward progress (default 3).
    #[serde(default = "default_max_stalled_turns")]
    pub max_stalled_turns: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            max_stalled_turns: default_max_stalled_turns(),
        }
    }
}

fn default_max_iterations() -> usize {
    20
}

fn default_max_stalled_turns() -> usize {
    3
}

/// Tool execution limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    /// Maximum characters returned by `read_file` (default 10000).
    #[serde(default = "default_read_limit")]
    pub read_limit: usize,
    /// Wall-clock timeout for `run_script` subprocesses, in seconds
    /// (default 30).
    #[serde(default = "default_script_timeout_secs")]
    pub script_timeout_secs: u64,
    /// Interpreter used by `run_script` (default "python3").
    #[serde(default = "default_script_interpreter")]
    pub script_interpreter: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            read_limit: default_read_limit(),
            script_timeout_secs: default_script_timeout_secs(),
            script_interpreter: default_script_interpreter(),
        }
    }
}

fn default_read_limit() -> usize {
    10_000
}

fn default_script_timeout_secs() -> u64 {
    30
}

fn default_script_interpreter() -> String {
    "python3".to_string()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

impl AgentConfig {
    /// Load config from the default location:
    /// `~/.config/burrow/config.toml`
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            info!("no config file found at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config: {}", path.display()))?;
        info!(path = %path.display(), model = %config.model, "loaded config");
        Ok(config)
    }

    /// Default config file path.
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;
        Ok(dir.join("burrow").join("config.toml"))
    }

    /// Resolve the API key, checking config and then the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        if self.api_key.is_some() {
            return self.api_key.clone();
        }
        std::env::var(ENV_GEMINI_API_KEY).ok()
    }

    /// Validate the config on startup, before any model call is attempted.
    pub fn validate(&self) -> Result<()> {
        if self.resolve_api_key().is_none() {
            bail!(
                "no API key configured. Set {} or add api_key to {}",
                ENV_GEMINI_API_KEY,
                Self::default_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| "the config file".to_string())
            );
        }

        if !self.working_dir.is_dir() {
            bail!(
                "working directory \"{}\" does not exist or is not a directory",
                self.working_dir.display()
            );
        }

        if self.agent.max_iterations == 0 {
            bail!("agent.max_iterations must be at least 1");
        }

        Ok(())
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            working_dir: default_working_dir(),
            api_key: None,
            agent: AgentSettings::default(),
            tools: ToolSettings::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config generation
// ---------------------------------------------------------------------------

/// Generate a sample config TOML string.
pub fn sample_config() -> String {
    r#"# Burrow Agent Configuration

model = "gemini-2.5-flash"

# Sandbox root. Tools cannot read, write, list, or execute outside it.
working_dir = "."

# api_key = "..."  # Or set GEMINI_API_KEY env var

[agent]
max_iterations = 20
max_stalled_turns = 3

[tools]
read_limit = 10000
script_timeout_secs = 30
script_interpreter = "python3"
"#
    .to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
