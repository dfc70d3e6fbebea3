/// Centralized error types for commit-audit using thiserror
///
/// Errors are split by pipeline stage. `AuditError::is_fatal` decides which of them
/// abort a run and which are converted into an `ERROR` verdict for a single commit.
use thiserror::Error;

/// Main error type for an audit run
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors raised while reading commits from the repository
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Git repository not found at: {0}")]
    RepositoryNotFound(String),

    #[error("Failed to open git repository: {0}")]
    OpenFailed(String),

    #[error("Failed to iterate commits: {0}")]
    IterFailed(String),

    #[error("Failed to read commit {hash}: {reason}")]
    CommitReadFailed { hash: String, reason: String },
}

/// Errors related to prompt templates
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Prompt template '{path}' is missing required placeholder {placeholder}")]
    MissingPlaceholder { path: String, placeholder: String },

    #[error("Failed to load prompt template '{path}': {reason}")]
    LoadFailed { path: String, reason: String },

    #[error("Failed to write prompt template '{path}': {reason}")]
    WriteFailed { path: String, reason: String },
}

/// Errors from the inference service. None of these are retried by the client.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Inference service unavailable at {url}: {reason}")]
    ServiceUnavailable { url: String, reason: String },

    #[error("Inference request timed out after {0} seconds")]
    RequestTimeout(u64),

    #[error("Unexpected response from inference service: {message}")]
    UnexpectedResponse {
        message: String,
        /// Status and full body when the service answered
        status: Option<u16>,
        body: Option<String>,
    },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// Errors raised while resolving which model to use
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("No model selected: {0}")]
    NoModelSelected(String),

    #[error("No models available on the inference service")]
    NoModelsAvailable,

    #[error("Model selection aborted")]
    SelectionAborted,
}

/// Errors related to writing the report
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report to '{path}': {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("Failed to read report from '{path}': {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Failed to serialize report: {0}")]
    SerializeFailed(String),
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Errors related to input validation
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid date '{0}'")]
    InvalidDate(String),
}

impl From<anyhow::Error> for AuditError {
    fn from(err: anyhow::Error) -> Self {
        AuditError::Other(format!("{:#}", err))
    }
}

impl AuditError {
    /// Whether this error aborts the whole run.
    ///
    /// Inference failures only ever affect the commit being analyzed.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AuditError::Inference(_))
    }
}

impl InferenceError {
    /// Check if this is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, InferenceError::RequestTimeout(_))
    }

    /// Protocol failure with no response body to keep
    pub fn unexpected(message: impl Into<String>) -> Self {
        InferenceError::UnexpectedResponse {
            message: message.into(),
            status: None,
            body: None,
        }
    }

    /// Protocol failure that keeps the status and body the service sent
    pub fn unexpected_body(message: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        InferenceError::UnexpectedResponse {
            message: message.into(),
            status: Some(status),
            body: Some(body.into()),
        }
    }

    /// What the service actually sent, as stored in debug dumps
    pub fn raw_response(&self) -> Option<serde_json::Value> {
        match self {
            InferenceError::UnexpectedResponse {
                status,
                body: Some(body),
                ..
            } => Some(serde_json::json!({
                "status_code": status,
                "content": body,
            })),
            _ => None,
        }
    }
}
