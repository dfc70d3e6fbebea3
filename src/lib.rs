//! # commit-audit - LLM-assisted security review of git history
//!
//! Walks the commits of a repository within a date range, asks a locally running
//! inference service (Ollama) whether each diff looks suspicious, and writes the
//! verdicts to a JSON report.
//!
//! ## Pipeline
//!
//! ```text
//! git commits ──> prompt ──> inference ──> verdict ──> report ──> webhook
//!  (git2)      (template)    (HTTP)     (PASS/FAIL/   (JSON)    (optional)
//!                                         ERROR)
//! ```
//!
//! Commits are processed one at a time. A failure while analyzing one commit is
//! recorded as an `ERROR` verdict and the run moves on; only an unreadable
//! repository, an unresolvable model or an unwritable report end the run early.
//!
//! ## Modules
//!
//! - [`git`]: Commit discovery and diff extraction
//! - [`prompt`]: Prompt templates and rendering
//! - [`inference`]: Inference service client and model selection
//! - [`verdict`]: Verdict extraction from model output
//! - [`report`]: Result aggregation and the JSON report
//! - [`notify`]: End-of-run webhook notification
//! - [`audit`]: Run orchestration
//! - [`config`]: Configuration with environment variable overrides
//! - [`error`]: Error types
//! - [`paths`]: Platform paths
//!
//! ## Usage Example
//!
//! ```no_run
//! use commit_audit::audit::{AuditSettings, Auditor};
//! use commit_audit::git::{CommitOrder, DateRange, GitWalker};
//! use commit_audit::inference::{InteractiveSelector, OllamaClient};
//! use commit_audit::prompt::PromptTemplate;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let walker = GitWalker::open("/path/to/repo")?;
//!     let client = OllamaClient::new(
//!         "http://localhost:11434/api/generate",
//!         Duration::from_secs(120),
//!     )?;
//!
//!     let settings = AuditSettings {
//!         range: DateRange::parse("2024-01-01", Some("2024-01-31"))?,
//!         order: CommitOrder::NewestFirst,
//!         model: Some("llama3".to_string()),
//!         output: "repo-report.json".into(),
//!         checkpoint: true,
//!         debug: false,
//!         repo_name: walker.repo_name(),
//!     };
//!
//!     let auditor = Auditor::new(walker, client, PromptTemplate::builtin(), settings);
//!     let outcome = auditor.run(&mut InteractiveSelector::stdio()).await?;
//!     println!("{} commits failed", outcome.report.analysis_summary.fail_count);
//!     Ok(())
//! }
//! ```

/// Run orchestration
pub mod audit;

/// Configuration management with environment variable overrides
pub mod config;

/// Error types
pub mod error;

/// Commit discovery and diff extraction
pub mod git;

/// Inference service client and model selection
pub mod inference;

/// End-of-run webhook notification
pub mod notify;

/// Platform-specific paths
pub mod paths;

/// Prompt templates
pub mod prompt;

/// Result aggregation and the JSON report
pub mod report;

/// Verdict extraction from model output
pub mod verdict;
