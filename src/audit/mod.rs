//! Audit run orchestration
//!
//! An [`Auditor`] drives one run through
//! `Init -> Discover -> SelectModel -> ProcessCommit* -> Summarize -> Notify -> Done`.
//! Each commit is folded into the report as a `Result<AnalysisResult, AuditError>`:
//! recoverable errors become `ERROR` results, fatal ones end the run.

/// Raw response dumps for debug runs
pub mod dump;
mod interrupt;

pub use dump::DebugDump;
pub use interrupt::watch_interrupts;

use crate::error::AuditError;
use crate::git::{CommitOrder, CommitRecord, CommitSource, DateRange};
use crate::inference::{InferenceBackend, ModelSelector, resolve_model};
use crate::notify::SlackNotifier;
use crate::prompt::PromptTemplate;
use crate::report::{AnalysisResult, Report, ReportAggregator, RunMetadata, truncate_chars};
use crate::verdict::{ParsedVerdict, Verdict, parse_response};
use chrono::Utc;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Stages of an audit run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Discover,
    SelectModel,
    ProcessCommit,
    Summarize,
    Notify,
    Done,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Init => "INIT",
            RunState::Discover => "DISCOVER",
            RunState::SelectModel => "SELECT_MODEL",
            RunState::ProcessCommit => "PROCESS_COMMIT",
            RunState::Summarize => "SUMMARIZE",
            RunState::Notify => "NOTIFY",
            RunState::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// Per-run settings resolved from CLI and configuration
#[derive(Debug, Clone)]
pub struct AuditSettings {
    pub range: DateRange,
    pub order: CommitOrder,
    /// Explicit model; `None` triggers model discovery
    pub model: Option<String>,
    /// Report destination
    pub output: PathBuf,
    /// Rewrite the report after every commit
    pub checkpoint: bool,
    /// Keep raw responses on disk and in ERROR results
    pub debug: bool,
    /// Name used in notifications
    pub repo_name: String,
}

/// Result of a completed or interrupted run
#[derive(Debug, Clone)]
pub struct AuditOutcome {
    pub report: Report,
    /// Stopped early by cancellation
    pub interrupted: bool,
    /// Commits discovered but unreadable, so never analyzed
    pub skipped: usize,
    /// Whether the webhook accepted the summary; `None` when not configured
    pub notified: Option<bool>,
}

impl AuditOutcome {
    /// Console summary of the report, plus commits that never made it into it
    pub fn render_summary(&self, output: &Path) -> String {
        let mut text = self.report.render_summary(output);
        if self.skipped > 0 {
            text.push_str(&format!(
                "\nSkipped commits: {} (unreadable, not in the report)\n",
                self.skipped
            ));
        }
        text
    }
}

/// Orchestrates one audit run over a commit source and an inference backend
pub struct Auditor<S, B> {
    source: S,
    backend: B,
    template: PromptTemplate,
    settings: AuditSettings,
    notifier: Option<SlackNotifier>,
    cancel_token: CancellationToken,
}

impl<S, B> Auditor<S, B>
where
    S: CommitSource,
    B: InferenceBackend,
{
    pub fn new(source: S, backend: B, template: PromptTemplate, settings: AuditSettings) -> Self {
        Self {
            source,
            backend,
            template,
            settings,
            notifier: None,
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn with_notifier(mut self, notifier: SlackNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Token checked between commits; cancelling it ends the run after the current commit
    pub fn with_cancellation(mut self, cancel_token: CancellationToken) -> Self {
        self.cancel_token = cancel_token;
        self
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Run the pipeline to completion or cancellation.
    ///
    /// Only discovery, model resolution and report writing can fail the run.
    pub async fn run(&self, selector: &mut dyn ModelSelector) -> Result<AuditOutcome, AuditError> {
        let run_start = Instant::now();
        let mut state = RunState::Init;

        transition(&mut state, RunState::Discover);
        let hashes = self
            .source
            .discover(&self.settings.range, self.settings.order)?;
        tracing::info!(
            "Found {} commits between {} and {} ({})",
            hashes.len(),
            self.settings.range.start,
            self.settings.range.end,
            self.settings.order
        );

        transition(&mut state, RunState::SelectModel);
        let model = resolve_model(self.settings.model.as_deref(), &self.backend, selector).await?;
        tracing::info!("Using model {} at {}", model, self.backend.endpoint());

        let mut aggregator = ReportAggregator::new(RunMetadata {
            model_used: model.clone(),
            prompt_type: self.template.prompt_type().to_string(),
            prompt_file: self.template.prompt_file(),
            date_range: self.settings.range,
        });
        let dump = self
            .settings
            .debug
            .then(|| DebugDump::for_report(&self.settings.output));

        let total = hashes.len();
        let mut skipped = 0;
        let mut interrupted = false;

        for (index, hash) in hashes.iter().enumerate() {
            if self.cancel_token.is_cancelled() {
                tracing::warn!(
                    "Run cancelled after {} of {} commits",
                    aggregator.len(),
                    total
                );
                interrupted = true;
                break;
            }

            if state != RunState::ProcessCommit {
                transition(&mut state, RunState::ProcessCommit);
            }

            let record = match self.source.load(hash) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!("Skipping commit {}: {}", hash, e);
                    skipped += 1;
                    continue;
                }
            };

            tracing::info!(
                "Processing commit {}/{}: {} - {}",
                index + 1,
                total,
                short(&record.hash),
                truncate_chars(record.subject(), 60)
            );

            let started = Instant::now();
            let result = match self.analyze(&model, &record, dump.as_ref()).await {
                Ok(result) => result,
                Err(e) if !e.is_fatal() => {
                    tracing::warn!("Analysis failed for {}: {}", short(&record.hash), e);
                    let result =
                        AnalysisResult::new(&record, ParsedVerdict::error(e.to_string()), started.elapsed());
                    match (dump.as_ref(), failed_response(&e)) {
                        (Some(dump), Some(raw)) => {
                            save_dump(dump, &record.hash, &raw);
                            result.with_raw_response(raw)
                        }
                        _ => result,
                    }
                }
                Err(e) => return Err(e),
            };

            tracing::info!(
                "Verdict: {} ({}s)",
                result.verdict,
                result.analysis_time_seconds
            );
            tracing::info!("Reasoning: {}", truncate_chars(&result.reasoning, 200));

            aggregator.record(result);

            if self.settings.checkpoint {
                aggregator
                    .to_report(Utc::now())
                    .write(&self.settings.output)?;
            }
        }

        transition(&mut state, RunState::Summarize);
        let report = aggregator.into_report(Utc::now());
        report.write(&self.settings.output)?;
        tracing::info!(
            "Analyzed {} commits in {:.1}s; report written to {}",
            report.commits.len(),
            run_start.elapsed().as_secs_f64(),
            self.settings.output.display()
        );

        let notified = match &self.notifier {
            Some(notifier) => {
                transition(&mut state, RunState::Notify);
                Some(
                    notifier
                        .notify(&report.analysis_summary, &self.settings.repo_name)
                        .await,
                )
            }
            None => None,
        };

        transition(&mut state, RunState::Done);
        Ok(AuditOutcome {
            report,
            interrupted,
            skipped,
            notified,
        })
    }

    /// Prompt, infer and parse one commit
    async fn analyze(
        &self,
        model: &str,
        record: &CommitRecord,
        dump: Option<&DebugDump>,
    ) -> Result<AnalysisResult, AuditError> {
        let started = Instant::now();
        let request = self.template.render(record);
        let response = self.backend.generate(model, &request.prompt).await?;

        if let Some(dump) = dump {
            save_dump(dump, &record.hash, &response.raw);
        }

        let parsed = parse_response(&response.text);
        let result = AnalysisResult::new(record, parsed, started.elapsed());

        if dump.is_some() && result.verdict == Verdict::Error {
            return Ok(result.with_raw_response(response.raw));
        }
        Ok(result)
    }
}

fn transition(state: &mut RunState, next: RunState) {
    tracing::debug!("Run state {} -> {}", state, next);
    *state = next;
}

fn save_dump(dump: &DebugDump, hash: &str, raw: &serde_json::Value) {
    if let Err(e) = dump.write(hash, raw) {
        tracing::warn!("Could not save raw response for {}: {}", short(hash), e);
    }
}

/// Body the inference service sent back with a failed request, if any
fn failed_response(err: &AuditError) -> Option<serde_json::Value> {
    match err {
        AuditError::Inference(inner) => inner.raw_response(),
        _ => None,
    }
}

fn short(hash: &str) -> &str {
    hash.get(..8).unwrap_or(hash)
}
