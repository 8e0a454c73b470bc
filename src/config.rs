use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub agent: AgentConfig,
    #[serde(default)]
    pub sandbox: SandboxConfig,
    #[serde(default)]
    pub state: StateConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Users allowed to talk to the bot ("*" allows everyone)
    pub allowed_users: Vec<String>,
    /// User id the console session speaks as.
    /// Supports ${ENV_VAR} substitution
    #[serde(default = "default_console_user")]
    pub console_user: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SandboxConfig {
    /// Wall-clock budget for every submission, in seconds
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
    #[serde(default = "default_max_call_levels")]
    pub max_call_levels: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StateConfig {
    #[serde(default = "default_state_path")]
    pub path: PathBuf,
}

fn default_name() -> String {
    "das System".to_string()
}

fn default_console_user() -> String {
    "console".to_string()
}

fn default_deadline_secs() -> u64 {
    60
}

fn default_max_call_levels() -> usize {
    64
}

fn default_state_path() -> PathBuf {
    PathBuf::from("./data/state")
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            deadline_secs: default_deadline_secs(),
            max_call_levels: default_max_call_levels(),
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        // Expand environment variables like ${KATA_USER}
        let expanded = shellexpand::env(content)?;
        let config: Config = toml::from_str(&expanded)?;
        if config.sandbox.deadline_secs == 0 {
            anyhow::bail!("sandbox.deadline_secs must be positive");
        }
        Ok(config)
    }

    /// Checks if a user is allowed to talk to the bot
    pub fn is_allowed(&self, user: &str) -> bool {
        self.agent
            .allowed_users
            .iter()
            .any(|allowed| allowed == user || allowed == "*")
    }
}
