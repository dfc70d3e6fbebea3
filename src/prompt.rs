//! Prompt templates
//!
//! A template is plain text with `{placeholder}` tokens that are filled from a
//! [`CommitRecord`]. Substitution is a single left-to-right pass, so braces that
//! appear inside a diff or commit message are never expanded a second time.

use crate::error::PromptError;
use crate::git::CommitRecord;
use std::path::{Path, PathBuf};

/// File written by `--create-sample-prompt`
pub const SAMPLE_PROMPT_FILE: &str = "custom_prompt.txt";

/// Built-in instruction template
pub const DEFAULT_TEMPLATE: &str = r#"You are a security expert analyzing git commits for suspicious or malicious code.
Look for backdoors, credential theft, obfuscated payloads, unexpected network calls,
weakened authentication or cryptography, and anything that does not match the
stated purpose of the commit.

COMMIT HASH: {hash}
AUTHOR: {author}
DATE: {date}
COMMIT MESSAGE:
{message}

DIFF:
{diff}

RESPONSE FORMAT REQUIREMENTS:
1. Your first line MUST be exactly "VERDICT: PASS" if the change looks benign,
   or exactly "VERDICT: FAIL" if it looks suspicious or malicious.
2. Your second line MUST start with "REASONING: " followed by your reasoning.
3. Do not use any emojis in your response.
4. Do not include any additional text before the verdict.
"#;

/// Tokens recognized in a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    Hash,
    Author,
    Date,
    Message,
    Diff,
}

impl Placeholder {
    const ALL: [Placeholder; 5] = [
        Placeholder::Hash,
        Placeholder::Author,
        Placeholder::Date,
        Placeholder::Message,
        Placeholder::Diff,
    ];

    fn token(self) -> &'static str {
        match self {
            Placeholder::Hash => "{hash}",
            Placeholder::Author => "{author}",
            Placeholder::Date => "{date}",
            Placeholder::Message => "{message}",
            Placeholder::Diff => "{diff}",
        }
    }
}

/// Where the active template came from
#[derive(Debug, Clone, PartialEq, Eq)]
enum PromptSource {
    Builtin,
    File(PathBuf),
}

/// Completed prompt for one commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub prompt: String,
}

/// Instruction template combined with each commit's diff
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
    source: PromptSource,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PromptTemplate {
    /// The built-in template
    pub fn builtin() -> Self {
        Self {
            text: DEFAULT_TEMPLATE.to_string(),
            source: PromptSource::Builtin,
        }
    }

    /// Load a user-supplied template; it must contain `{diff}`
    pub fn from_file(path: &Path) -> Result<Self, PromptError> {
        let text = std::fs::read_to_string(path).map_err(|e| PromptError::LoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::validate(&text, path)?;

        tracing::info!("Loaded custom prompt template from {}", path.display());
        Ok(Self {
            text,
            source: PromptSource::File(path.to_path_buf()),
        })
    }

    /// Load from `path` when given, otherwise use the built-in template
    pub fn load(path: Option<&Path>) -> Result<Self, PromptError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::builtin()),
        }
    }

    fn validate(text: &str, path: &Path) -> Result<(), PromptError> {
        let required = Placeholder::Diff.token();
        if !text.contains(required) {
            return Err(PromptError::MissingPlaceholder {
                path: path.display().to_string(),
                placeholder: required.to_string(),
            });
        }
        Ok(())
    }

    /// `"default"` for the built-in template, `"custom"` otherwise
    pub fn prompt_type(&self) -> &'static str {
        match self.source {
            PromptSource::Builtin => "default",
            PromptSource::File(_) => "custom",
        }
    }

    /// Path of the user-supplied template, if any
    pub fn prompt_file(&self) -> Option<String> {
        match &self.source {
            PromptSource::Builtin => None,
            PromptSource::File(path) => Some(path.display().to_string()),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Fill the template with one commit's metadata and diff
    pub fn render(&self, commit: &CommitRecord) -> AnalysisRequest {
        let date = commit.date.to_rfc3339();
        let mut prompt =
            String::with_capacity(self.text.len() + commit.diff.len() + commit.message.len());
        let mut rest = self.text.as_str();

        while let Some(open) = rest.find('{') {
            prompt.push_str(&rest[..open]);
            let tail = &rest[open..];

            match Placeholder::ALL
                .iter()
                .find(|placeholder| tail.starts_with(placeholder.token()))
            {
                Some(placeholder) => {
                    let value = match placeholder {
                        Placeholder::Hash => commit.hash.as_str(),
                        Placeholder::Author => commit.author.as_str(),
                        Placeholder::Date => date.as_str(),
                        Placeholder::Message => commit.message.as_str(),
                        Placeholder::Diff => commit.diff.as_str(),
                    };
                    prompt.push_str(value);
                    rest = &tail[placeholder.token().len()..];
                }
                None => {
                    prompt.push('{');
                    rest = &tail[1..];
                }
            }
        }
        prompt.push_str(rest);

        AnalysisRequest { prompt }
    }
}

/// Write the built-in template unmodified to `path`
pub fn write_sample_prompt(path: &Path) -> Result<(), PromptError> {
    std::fs::write(path, DEFAULT_TEMPLATE).map_err(|e| PromptError::WriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    tracing::info!("Wrote sample prompt template to {}", path.display());
    Ok(())
}
