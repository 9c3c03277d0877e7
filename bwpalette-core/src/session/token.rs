//! Session token extraction from `bw unlock` output

use std::sync::LazyLock;

use regex::Regex;

use crate::process::ToolOutput;

/// Matches shell-style `KEY="value"` assignments, e.g. `export BW_SESSION="..."`
static ASSIGNMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_][A-Za-z0-9_]*)="([^"]+)""#)
        .expect("ASSIGNMENT_REGEX is a valid regex pattern")
});

const SESSION_VARIABLE: &str = "BW_SESSION";

/// Extracts the session token from unlock output.
///
/// Two strategies are tried in order and the first hit wins:
/// 1. raw: the command succeeded and stdout is a single bare token
///    (what `--raw` prints);
/// 2. assignment: stdout contains `KEY="value"`; `BW_SESSION` is preferred
///    over any other key.
#[must_use]
pub fn extract_session_token(output: &ToolOutput) -> Option<String> {
    raw_token(output).or_else(|| assigned_token(&output.stdout))
}

fn raw_token(output: &ToolOutput) -> Option<String> {
    let stdout = output.stdout.trim();
    let bare = !stdout.is_empty()
        && !stdout.contains(char::is_whitespace)
        && !stdout.contains('"');
    (output.success() && bare).then(|| stdout.to_string())
}

fn assigned_token(stdout: &str) -> Option<String> {
    let mut first = None;
    for caps in ASSIGNMENT_REGEX.captures_iter(stdout) {
        let value = caps[2].to_string();
        if &caps[1] == SESSION_VARIABLE {
            return Some(value);
        }
        first.get_or_insert(value);
    }
    first
}
