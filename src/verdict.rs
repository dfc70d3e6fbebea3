//! Verdict extraction from free-form model output
//!
//! The first standalone `PASS` or `FAIL` word (case-insensitive, scanning left to
//! right) decides the verdict, so markup such as `**PASS**` or `Verdict: fail`
//! is tolerated. A response with neither word becomes an `ERROR` verdict that
//! keeps the raw text as its reasoning.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static VERDICT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(pass|fail)\b").expect("valid verdict regex"));

static REASONING_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[\s*_#>]*reasoning\b[*_]*\s*[:\-]?").expect("valid reasoning regex"));

/// Separator between the verdict word and reasoning on the same line, e.g. `PASS - ok`
static TOKEN_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)\A[ \t]*[:.\-]+(?:[ \t]+|$)").expect("valid separator regex"));

/// Fallback reasoning when the model gave a verdict and nothing else
pub const NO_REASONING: &str = "No reasoning provided";

/// Classification of one commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Fail,
    Error,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Fail => "FAIL",
            Verdict::Error => "ERROR",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict and reasoning extracted from one response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVerdict {
    pub verdict: Verdict,
    pub reasoning: String,
}

impl ParsedVerdict {
    /// An `ERROR` verdict carrying `reasoning` verbatim
    pub fn error(reasoning: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Error,
            reasoning: reasoning.into(),
        }
    }
}

/// Extract the verdict and reasoning from raw response text
pub fn parse_response(raw: &str) -> ParsedVerdict {
    let Some(token) = VERDICT_TOKEN.find(raw) else {
        if raw.trim().is_empty() {
            return ParsedVerdict::error("Model returned an empty response");
        }
        return ParsedVerdict::error(raw);
    };

    let verdict = if token.as_str().eq_ignore_ascii_case("pass") {
        Verdict::Pass
    } else {
        Verdict::Fail
    };

    // Closing markup around the word itself, as in `**PASS**`
    let after_token = raw[token.end()..].trim_start_matches(['*', '_', '`']);

    let reasoning = match REASONING_LABEL.find(after_token) {
        Some(label) => after_label(&after_token[label.end()..]),
        None => {
            let after_token = match TOKEN_SEPARATOR.find(after_token) {
                Some(sep) => &after_token[sep.end()..],
                None => after_token,
            };
            let (rest_of_line, following_lines) =
                after_token.split_once('\n').unwrap_or((after_token, ""));
            let following = following_lines.trim();
            if following.is_empty() {
                rest_of_line.trim()
            } else {
                following
            }
        }
    };

    ParsedVerdict {
        verdict,
        reasoning: if reasoning.is_empty() {
            NO_REASONING.to_string()
        } else {
            reasoning.to_string()
        },
    }
}

/// Reasoning text after its label, minus the label's own bold/italic closer
fn after_label(text: &str) -> &str {
    text.trim_start_matches(['*', '_']).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labelled_pass() {
        let parsed = parse_response("VERDICT: PASS\nREASONING: looks fine");
        assert_eq!(parsed.verdict, Verdict::Pass);
        assert_eq!(parsed.reasoning, "looks fine");
    }

    #[test]
    fn test_labelled_fail() {
        let parsed = parse_response("VERDICT: FAIL\nREASONING: adds a reverse shell to install.sh");
        assert_eq!(parsed.verdict, Verdict::Fail);
        assert_eq!(parsed.reasoning, "adds a reverse shell to install.sh");
    }

    #[test]
    fn test_no_token_is_error_with_raw_text() {
        let parsed = parse_response("I think this is okay");
        assert_eq!(parsed.verdict, Verdict::Error);
        assert_eq!(parsed.reasoning, "I think this is okay");
    }

    #[test]
    fn test_empty_response_is_error() {
        let parsed = parse_response("   \n  ");
        assert_eq!(parsed.verdict, Verdict::Error);
        assert_eq!(parsed.reasoning, "Model returned an empty response");
    }

    #[test]
    fn test_case_insensitive_and_markup() {
        let parsed = parse_response("  **Verdict:** `pass`  \n\nThe change only touches docs.");
        assert_eq!(parsed.verdict, Verdict::Pass);
        assert_eq!(parsed.reasoning, "The change only touches docs.");
    }

    #[test]
    fn test_first_token_wins_when_both_present() {
        let parsed = parse_response("FAIL\nREASONING: it would never PASS review");
        assert_eq!(parsed.verdict, Verdict::Fail);
        assert_eq!(parsed.reasoning, "it would never PASS review");

        let parsed = parse_response("PASS. Earlier drafts would FAIL, this one is fine.");
        assert_eq!(parsed.verdict, Verdict::Pass);
        assert_eq!(parsed.reasoning, "Earlier drafts would FAIL, this one is fine.");
    }

    #[test]
    fn test_repeated_tokens() {
        let parsed = parse_response("PASS PASS PASS\nreasoning - harmless refactor");
        assert_eq!(parsed.verdict, Verdict::Pass);
        assert_eq!(parsed.reasoning, "harmless refactor");
    }

    #[test]
    fn test_words_containing_tokens_do_not_match() {
        let parsed = parse_response("The password handling failed to compile; bypassed checks.");
        assert_eq!(parsed.verdict, Verdict::Error);
    }

    #[test]
    fn test_reasoning_on_following_lines() {
        let parsed = parse_response("FAIL\nUploads ~/.ssh to a remote host.\nObfuscated with base64.");
        assert_eq!(parsed.verdict, Verdict::Fail);
        assert_eq!(
            parsed.reasoning,
            "Uploads ~/.ssh to a remote host.\nObfuscated with base64."
        );
    }

    #[test]
    fn test_reasoning_punctuation_is_kept() {
        let cases = [
            ("VERDICT: FAIL\nREASONING: .env file with AWS keys committed", ".env file with AWS keys committed"),
            ("VERDICT: FAIL\nREASONING: --no-verify passed to git push", "--no-verify passed to git push"),
            (
                "VERDICT: FAIL\nREASONING: `curl | sh` added to install script",
                "`curl | sh` added to install script",
            ),
            ("**Verdict:** FAIL\n**Reasoning:** deletes `.git/hooks`.", "deletes `.git/hooks`."),
            ("FAIL - .npmrc token leaked", ".npmrc token leaked"),
            ("FAIL --no-verify everywhere", "--no-verify everywhere"),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_response(input).reasoning, expected, "input: {:?}", input);
        }
    }

    #[test]
    fn test_separator_does_not_swallow_next_line() {
        let parsed = parse_response("PASS:\nOnly docs changed.");
        assert_eq!(parsed.verdict, Verdict::Pass);
        assert_eq!(parsed.reasoning, "Only docs changed.");
    }

    #[test]
    fn test_verdict_without_reasoning() {
        let parsed = parse_response("PASS");
        assert_eq!(parsed.verdict, Verdict::Pass);
        assert_eq!(parsed.reasoning, NO_REASONING);
    }

    #[test]
    fn test_parse_is_deterministic() {
        let input = "VERDICT: FAIL\nREASONING: hardcoded token";
        assert_eq!(parse_response(input), parse_response(input));
    }

    #[test]
    fn test_verdict_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Verdict::Pass).unwrap(), "\"PASS\"");
        assert_eq!(serde_json::to_string(&Verdict::Error).unwrap(), "\"ERROR\"");
        let parsed: Verdict = serde_json::from_str("\"FAIL\"").unwrap();
        assert_eq!(parsed, Verdict::Fail);
        assert_eq!(Verdict::Fail.to_string(), "FAIL");
    }
}
