//! Commit source for the audit pipeline
//!
//! Lists the commits of a repository within a date range and reads each commit's
//! metadata and unified diff. Only reads from the repository.

/// Calendar date parsing and inclusive date ranges
pub mod range;
/// libgit2-backed commit walking and diff extraction
pub mod walker;

pub use range::{DateRange, parse_date};
pub use walker::GitWalker;

use crate::error::GitError;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single commit as handed to the prompt builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// Full commit SHA hash (40 characters)
    pub hash: String,
    /// `Name <email>`
    pub author: String,
    /// Author date with its original UTC offset
    pub date: DateTime<FixedOffset>,
    /// Subject and body
    pub message: String,
    /// Unified diff against the first parent
    pub diff: String,
}

impl CommitRecord {
    /// First line of the commit message
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// Order in which discovered commits are processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitOrder {
    /// Reverse chronological, like `git log`
    #[default]
    NewestFirst,
    OldestFirst,
}

impl FromStr for CommitOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest-first" | "desc" | "descending" => Ok(CommitOrder::NewestFirst),
            "oldest-first" | "asc" | "ascending" => Ok(CommitOrder::OldestFirst),
            other => Err(format!(
                "unknown commit order '{}', expected 'newest-first' or 'oldest-first'",
                other
            )),
        }
    }
}

impl fmt::Display for CommitOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitOrder::NewestFirst => write!(f, "newest-first"),
            CommitOrder::OldestFirst => write!(f, "oldest-first"),
        }
    }
}

/// Source of commits for an audit run.
///
/// Discovery returns hashes only; records are loaded one at a time as the
/// orchestrator reaches them, so a run never holds every diff in memory.
pub trait CommitSource {
    /// List commit hashes in the range, in the requested order
    fn discover(&self, range: &DateRange, order: CommitOrder) -> Result<Vec<String>, GitError>;

    /// Read metadata and diff for one commit
    fn load(&self, hash: &str) -> Result<CommitRecord, GitError>;
}
