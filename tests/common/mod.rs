//! Shared fixtures for integration tests: scratch git repositories and a
//! scripted inference backend.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use commit_audit::audit::AuditSettings;
use commit_audit::error::{InferenceError, ModelError};
use commit_audit::git::{CommitOrder, DateRange};
use commit_audit::inference::{InferenceBackend, InferenceResponse, ModelInfo, ModelSelector};
use git2::{Commit, Oid, Repository, Signature, Time};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

/// 2024-01-01T00:00:00Z
pub const JAN_1: i64 = 1_704_067_200;
pub const DAY: i64 = 86_400;

/// Commit `content` to `name` on HEAD at `time` (seconds since epoch)
pub fn commit_file(repo: &Repository, name: &str, content: &str, message: &str, time: i64) -> Oid {
    let workdir = repo.workdir().unwrap().to_path_buf();
    std::fs::write(workdir.join(name), content).unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::new("Mallory Dev", "mallory@example.com", &Time::new(time, 0)).unwrap();
    let parents: Vec<Commit> = repo
        .head()
        .ok()
        .map(|head| vec![head.peel_to_commit().unwrap()])
        .unwrap_or_default();
    let parent_refs: Vec<&Commit> = parents.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
        .unwrap()
}

/// Repository with one commit per day on Jan 1..=count, oldest first in the returned list
pub fn repo_with_commits(count: usize) -> (TempDir, Vec<Oid>) {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let mut content = String::new();
    let oids = (0..count)
        .map(|i| {
            content.push_str(&format!("line {}\n", i));
            commit_file(
                &repo,
                "src.txt",
                &content,
                &format!("change {}", i),
                JAN_1 + i as i64 * DAY + 3600,
            )
        })
        .collect();
    (dir, oids)
}

pub fn january() -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
    )
}

pub fn settings(output: &Path, range: DateRange) -> AuditSettings {
    AuditSettings {
        range,
        order: CommitOrder::OldestFirst,
        model: Some("llama3".to_string()),
        output: output.to_path_buf(),
        checkpoint: true,
        debug: false,
        repo_name: "fixture".to_string(),
    }
}

/// Replays a fixed list of replies, then answers PASS
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, InferenceError>>>,
    prompts: Mutex<Vec<String>>,
    pub models: Vec<ModelInfo>,
}

impl ScriptedBackend {
    pub fn new(replies: Vec<Result<String, InferenceError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
            models: vec![ModelInfo::new("llama3")],
        }
    }

    pub fn replying(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    async fn generate(&self, model: &str, prompt: &str) -> Result<InferenceResponse, InferenceError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("VERDICT: PASS\nREASONING: default".to_string()))?;
        Ok(InferenceResponse {
            raw: serde_json::json!({"model": model, "response": reply, "done": true}),
            text: reply,
        })
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, InferenceError> {
        Ok(self.models.clone())
    }

    fn endpoint(&self) -> &str {
        "scripted"
    }
}

/// Selector that must never be consulted
pub struct NoSelection;

impl ModelSelector for NoSelection {
    fn select(&mut self, _models: &[ModelInfo]) -> Result<String, ModelError> {
        Err(ModelError::SelectionAborted)
    }
}
