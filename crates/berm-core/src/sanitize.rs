//! Output sanitization for strings leaving the pipeline toward a reporter.

use crate::limits::Limits;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Suffix appended to truncated output.
pub const TRUNCATION_MARKER: &str = "... (truncated)";

/// CSI sequences, OSC sequences (BEL or ST terminated) and two-byte ESC sequences.
static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[@-Z\\-_]").unwrap()
});

/// Where sanitized text is headed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputContext {
    /// Interactive terminal.
    #[default]
    Terminal,
    /// GitHub Actions workflow commands.
    Github,
    /// Machine-readable JSON.
    Json,
}

impl OutputContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputContext::Terminal => "terminal",
            OutputContext::Github => "github",
            OutputContext::Json => "json",
        }
    }
}

impl fmt::Display for OutputContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "terminal" => Ok(OutputContext::Terminal),
            "github" => Ok(OutputContext::Github),
            "json" => Ok(OutputContext::Json),
            other => Err(format!(
                "unknown output context '{other}', expected terminal, github or json"
            )),
        }
    }
}

/// Makes `text` safe to hand to a reporter in `context`.
///
/// - strips terminal escape sequences and every control character except TAB
/// - in [`OutputContext::Github`], breaks each `::` with a zero-width space
/// - truncates to `limits.max_output_length` characters
///
/// Other Unicode is preserved. Applying it twice equals applying it once.
pub fn sanitize_for_output(text: &str, context: OutputContext, limits: &Limits) -> String {
    let stripped = ANSI_ESCAPE.replace_all(text, "");
    let mut sanitized: String = stripped
        .chars()
        .filter(|c| *c == '\t' || !c.is_control())
        .collect();

    if context == OutputContext::Github {
        // A single pass leaves "::" behind for runs like ":::".
        while sanitized.contains("::") {
            sanitized = sanitized.replace("::", ":\u{200B}:");
        }
    }

    truncate(sanitized, limits.max_output_length)
}

fn truncate(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            let mut truncated = text[..cut].to_string();
            truncated.push_str(TRUNCATION_MARKER);
            truncated
        }
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitize(text: &str, context: OutputContext) -> String {
        sanitize_for_output(text, context, &Limits::default())
    }

    #[test]
    fn test_strips_ansi_sequences() {
        assert_eq!(
            sanitize("\x1b[31mred\x1b[0m text", OutputContext::Terminal),
            "red text"
        );
        assert_eq!(
            sanitize("\x1b]0;evil title\x07after", OutputContext::Terminal),
            "after"
        );
        assert_eq!(sanitize("\x1b[2Jclear", OutputContext::Terminal), "clear");
    }

    #[test]
    fn test_strips_control_characters() {
        assert_eq!(
            sanitize("line1\nline2\r\0\x7fend", OutputContext::Json),
            "line1line2end"
        );
        assert_eq!(sanitize("a\tb", OutputContext::Json), "a\tb");
    }

    #[test]
    fn test_github_command_delimiters_broken() {
        let out = sanitize("::error::pwned", OutputContext::Github);
        assert!(!out.contains("::"));
        assert_eq!(out, ":\u{200B}:error:\u{200B}:pwned");

        let out = sanitize(":::", OutputContext::Github);
        assert!(!out.contains("::"));
    }

    #[test]
    fn test_github_delimiters_kept_in_other_contexts() {
        assert_eq!(sanitize("a::b", OutputContext::Terminal), "a::b");
    }

    #[test]
    fn test_newline_injected_command_neutralized() {
        let out = sanitize("ok\n::set-output name=x::y", OutputContext::Github);
        assert!(!out.contains('\n'));
        assert!(!out.contains("::"));
    }

    #[test]
    fn test_truncation() {
        let limits = Limits {
            max_output_length: 5,
            ..Default::default()
        };
        let out = sanitize_for_output("abcdefgh", OutputContext::Terminal, &limits);
        assert_eq!(out, format!("abcde{TRUNCATION_MARKER}"));
        assert_eq!(
            sanitize_for_output(&out, OutputContext::Terminal, &limits),
            out
        );
        assert_eq!(
            sanitize_for_output("abcde", OutputContext::Terminal, &limits),
            "abcde"
        );
    }

    #[test]
    fn test_unicode_preserved() {
        let text = "Bucket ✓ für 日本語 (ok)";
        assert_eq!(sanitize(text, OutputContext::Github), text);
    }

    #[test]
    fn test_context_parse() {
        assert_eq!("GitHub".parse::<OutputContext>(), Ok(OutputContext::Github));
        assert!("xml".parse::<OutputContext>().is_err());
    }
}
