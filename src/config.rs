/// Configuration system for commit-audit
///
/// Supports loading from multiple sources with priority:
/// CLI args > Environment variables > Config file > Defaults
use crate::error::{AuditError, ConfigError};
use crate::git::CommitOrder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Inference service configuration
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Commit discovery configuration
    #[serde(default)]
    pub git: GitConfig,

    /// Prompt template configuration
    #[serde(default)]
    pub prompt: PromptConfig,

    /// Report output configuration
    #[serde(default)]
    pub report: ReportConfig,

    /// End-of-run notification configuration
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// Inference service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Generate endpoint URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model name; unset means discover models at run start
    #[serde(default)]
    pub model: Option<String>,

    /// Per-commit request timeout in seconds
    #[serde(default = "default_inference_timeout")]
    pub timeout_secs: u64,

    /// Timeout for the model listing request in seconds
    #[serde(default = "default_list_timeout")]
    pub list_timeout_secs: u64,
}

/// Commit discovery configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitConfig {
    /// Processing order of discovered commits
    #[serde(default)]
    pub order: CommitOrder,

    /// Truncate diffs above this many bytes (0 = never)
    #[serde(default)]
    pub max_diff_bytes: usize,
}

/// Prompt template configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Custom template file; the built-in template is used when unset
    #[serde(default)]
    pub template_path: Option<PathBuf>,
}

/// Report output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Report path; defaults to `{repo-name}-report.json`
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Rewrite the report after every commit
    #[serde(default = "default_checkpoint")]
    pub checkpoint: bool,

    /// Keep raw model responses
    #[serde(default)]
    pub debug: bool,
}

/// Notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Slack incoming webhook URL
    #[serde(default)]
    pub slack_webhook: Option<String>,

    /// Webhook request timeout in seconds
    #[serde(default = "default_notify_timeout")]
    pub timeout_secs: u64,
}

// Default value functions
fn default_api_url() -> String {
    "http://localhost:11434/api/generate".to_string()
}

fn default_inference_timeout() -> u64 {
    120
}

fn default_list_timeout() -> u64 {
    10
}

fn default_checkpoint() -> bool {
    true
}

fn default_notify_timeout() -> u64 {
    10
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            model: None,
            timeout_secs: default_inference_timeout(),
            list_timeout_secs: default_list_timeout(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: None,
            checkpoint: default_checkpoint(),
            debug: false,
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            slack_webhook: None,
            timeout_secs: default_notify_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, AuditError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        Ok(config)
    }

    /// Load from `path` when given, else the default location, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self, AuditError> {
        if let Some(path) = path {
            tracing::info!("Loading config from: {}", path.display());
            return Self::from_file(path);
        }

        let config_path = crate::paths::PlatformPaths::default_config_path();
        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            Self::from_file(&config_path)
        } else {
            tracing::debug!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), AuditError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::SaveFailed(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), AuditError> {
        if !is_http_url(&self.inference.api_url) {
            return Err(invalid(
                "inference.api_url",
                format!("must be an http(s) URL, got '{}'", self.inference.api_url),
            ));
        }

        if self
            .inference
            .model
            .as_deref()
            .is_some_and(|m| m.trim().is_empty())
        {
            return Err(invalid("inference.model", "must not be empty"));
        }

        if self.inference.timeout_secs == 0 {
            return Err(invalid("inference.timeout_secs", "must be greater than 0"));
        }

        if self.inference.list_timeout_secs == 0 {
            return Err(invalid("inference.list_timeout_secs", "must be greater than 0"));
        }

        if let Some(webhook) = &self.notify.slack_webhook
            && !is_http_url(webhook)
        {
            return Err(invalid(
                "notify.slack_webhook",
                format!("must be an http(s) URL, got '{}'", webhook),
            ));
        }

        if self.notify.timeout_secs == 0 {
            return Err(invalid("notify.timeout_secs", "must be greater than 0"));
        }

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("COMMIT_AUDIT_API_URL") {
            self.inference.api_url = url;
        }

        if let Ok(model) = std::env::var("COMMIT_AUDIT_MODEL") {
            self.inference.model = Some(model);
        }

        if let Ok(timeout) = std::env::var("COMMIT_AUDIT_TIMEOUT")
            && let Ok(secs) = timeout.parse()
        {
            self.inference.timeout_secs = secs;
        }

        if let Ok(webhook) = std::env::var("COMMIT_AUDIT_SLACK_WEBHOOK") {
            self.notify.slack_webhook = Some(webhook);
        }

        if let Ok(order) = std::env::var("COMMIT_AUDIT_ORDER")
            && let Ok(order) = order.parse()
        {
            self.git.order = order;
        }
    }

    /// Load from file or defaults, then apply environment overrides.
    ///
    /// Not validated yet: command-line flags may still replace any value.
    pub fn new(path: Option<&Path>) -> Result<Self, AuditError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn invalid(key: &str, reason: impl Into<String>) -> AuditError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.into(),
    }
    .into()
}
