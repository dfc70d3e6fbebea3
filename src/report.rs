//! Report aggregation and serialization
//!
//! [`ReportAggregator`] collects one [`AnalysisResult`] per commit in processing
//! order. A [`Report`] can be produced from it at any point, so a run stopped
//! after N commits still yields a valid report covering exactly those N.

use crate::error::ReportError;
use crate::git::{CommitRecord, DateRange};
use crate::verdict::{ParsedVerdict, Verdict};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

/// Outcome of analyzing one commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub hash: String,
    pub author: String,
    /// RFC 3339 author date
    pub date: String,
    pub message: String,
    pub verdict: Verdict,
    pub reasoning: String,
    pub analysis_time_seconds: f64,
    /// Raw service response, kept for ERROR verdicts in debug runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<Value>,
}

impl AnalysisResult {
    pub fn new(commit: &CommitRecord, parsed: ParsedVerdict, elapsed: Duration) -> Self {
        Self {
            hash: commit.hash.clone(),
            author: commit.author.clone(),
            date: commit.date.to_rfc3339(),
            message: commit.message.clone(),
            verdict: parsed.verdict,
            reasoning: parsed.reasoning,
            analysis_time_seconds: round_secs(elapsed.as_secs_f64()),
            raw_response: None,
        }
    }

    pub fn with_raw_response(mut self, raw: Value) -> Self {
        self.raw_response = Some(raw);
        self
    }

    /// First line of the commit message
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    pub fn short_hash(&self) -> &str {
        self.hash.get(..8).unwrap_or(&self.hash)
    }
}

/// `{start, end}` as calendar dates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRangeSummary {
    pub start: String,
    pub end: String,
}

impl From<&DateRange> for DateRangeSummary {
    fn from(range: &DateRange) -> Self {
        Self {
            start: range.start.format("%Y-%m-%d").to_string(),
            end: range.end.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Counts and timings over the commits in a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_commits: usize,
    pub pass_count: usize,
    pub fail_count: usize,
    pub error_count: usize,
    pub total_analysis_time_seconds: f64,
    pub average_analysis_time_seconds: f64,
    pub model_used: String,
    pub prompt_type: String,
    pub prompt_file: Option<String>,
    pub analysis_date: String,
    pub date_range: DateRangeSummary,
}

/// The persisted artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub analysis_summary: RunSummary,
    pub commits: Vec<AnalysisResult>,
}

/// Run-level facts that are fixed before the first commit is processed
#[derive(Debug, Clone)]
pub struct RunMetadata {
    pub model_used: String,
    pub prompt_type: String,
    pub prompt_file: Option<String>,
    pub date_range: DateRange,
}

/// Accumulates results for one run
#[derive(Debug, Clone)]
pub struct ReportAggregator {
    metadata: RunMetadata,
    results: Vec<AnalysisResult>,
}

impl ReportAggregator {
    pub fn new(metadata: RunMetadata) -> Self {
        Self {
            metadata,
            results: Vec::new(),
        }
    }

    /// Append a result in processing order
    pub fn record(&mut self, result: AnalysisResult) {
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Summary over the results recorded so far
    pub fn summary(&self, analysis_date: DateTime<Utc>) -> RunSummary {
        let count = |verdict: Verdict| self.results.iter().filter(|r| r.verdict == verdict).count();

        let total_time: f64 = self.results.iter().map(|r| r.analysis_time_seconds).sum();
        let average = if self.results.is_empty() {
            0.0
        } else {
            total_time / self.results.len() as f64
        };

        RunSummary {
            total_commits: self.results.len(),
            pass_count: count(Verdict::Pass),
            fail_count: count(Verdict::Fail),
            error_count: count(Verdict::Error),
            total_analysis_time_seconds: round_secs(total_time),
            average_analysis_time_seconds: round_secs(average),
            model_used: self.metadata.model_used.clone(),
            prompt_type: self.metadata.prompt_type.clone(),
            prompt_file: self.metadata.prompt_file.clone(),
            analysis_date: analysis_date.to_rfc3339_opts(SecondsFormat::Secs, true),
            date_range: DateRangeSummary::from(&self.metadata.date_range),
        }
    }

    /// Snapshot the results into a report
    pub fn to_report(&self, analysis_date: DateTime<Utc>) -> Report {
        Report {
            analysis_summary: self.summary(analysis_date),
            commits: self.results.clone(),
        }
    }

    pub fn into_report(self, analysis_date: DateTime<Utc>) -> Report {
        let analysis_summary = self.summary(analysis_date);
        Report {
            analysis_summary,
            commits: self.results,
        }
    }
}

impl Report {
    pub fn to_json(&self) -> Result<String, ReportError> {
        serde_json::to_string_pretty(self).map_err(|e| ReportError::SerializeFailed(e.to_string()))
    }

    /// Write the report as pretty JSON, replacing any previous file atomically
    pub fn write(&self, path: &Path) -> Result<(), ReportError> {
        let write_failed = |e: std::io::Error| ReportError::WriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_failed)?;
        }

        let content = self.to_json()?;
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = Path::new(&tmp);

        std::fs::write(tmp, content).map_err(write_failed)?;
        std::fs::rename(tmp, path).map_err(write_failed)?;

        tracing::debug!("Saved report to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ReportError> {
        let content = std::fs::read_to_string(path).map_err(|e| ReportError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| ReportError::SerializeFailed(e.to_string()))
    }

    /// Human-readable end-of-run summary
    pub fn render_summary(&self, output: &Path) -> String {
        let summary = &self.analysis_summary;
        let mut out = String::new();

        let _ = writeln!(out, "\n--- ANALYSIS SUMMARY ---");
        let _ = writeln!(out, "Model: {}", summary.model_used);
        let _ = writeln!(
            out,
            "Date range: {} to {}",
            summary.date_range.start, summary.date_range.end
        );
        let _ = writeln!(out, "Total commits analyzed: {}", summary.total_commits);
        let _ = writeln!(out, "Passed: {}", summary.pass_count);
        let _ = writeln!(out, "Failed: {}", summary.fail_count);
        let _ = writeln!(out, "Errors encountered: {}", summary.error_count);
        let _ = writeln!(
            out,
            "Total analysis time: {}",
            format_duration(summary.total_analysis_time_seconds)
        );
        if summary.total_commits > 0 {
            let _ = writeln!(
                out,
                "Average time per commit: {}",
                format_duration(summary.average_analysis_time_seconds)
            );
        }
        let _ = writeln!(out, "Detailed report saved to: {}", output.display());

        let failed: Vec<_> = self
            .commits
            .iter()
            .filter(|r| r.verdict == Verdict::Fail)
            .collect();
        if !failed.is_empty() {
            let _ = writeln!(out, "\nFailed commits:");
            for result in failed {
                let _ = writeln!(
                    out,
                    "- {}: {} (analyzed in {})",
                    result.short_hash(),
                    truncate_chars(result.subject(), 60),
                    format_duration(result.analysis_time_seconds)
                );
            }
        }

        let errored: Vec<_> = self
            .commits
            .iter()
            .filter(|r| r.verdict == Verdict::Error)
            .collect();
        if !errored.is_empty() {
            let _ = writeln!(out, "\nCommits with errors:");
            for result in errored {
                let _ = writeln!(
                    out,
                    "- {}: {} (failed after {})",
                    result.short_hash(),
                    truncate_chars(&result.reasoning, 100),
                    format_duration(result.analysis_time_seconds)
                );
            }
        }

        out
    }
}

/// Round seconds to two decimals
pub fn round_secs(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}

/// `850ms`, `12.3s` or `2m 5.0s`
pub fn format_duration(seconds: f64) -> String {
    if seconds < 1.0 {
        format!("{:.0}ms", seconds * 1000.0)
    } else if seconds < 60.0 {
        format!("{:.1}s", seconds)
    } else {
        let minutes = (seconds / 60.0).floor();
        format!("{}m {:.1}s", minutes as u64, seconds - minutes * 60.0)
    }
}

/// Truncate to `max` characters, marking the cut with `...`
pub fn truncate_chars(text: &str, max: usize) -> String {
    let single_line = text.lines().next().unwrap_or("");
    if single_line.chars().count() > max || single_line.len() < text.trim_end().len() {
        let cut: String = single_line.chars().take(max).collect();
        format!("{}...", cut)
    } else {
        single_line.to_string()
    }
}
