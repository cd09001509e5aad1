//! Section extraction from free-text planner output
//!
//! Planners are asked to answer with `SYSTEM PROMPT:`, `PLAN:` and `RATIONALE:`
//! sections, but models do not always comply. Label matching is tried first;
//! only the system prompt has a heuristic fallback when no label is found.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// Longest first line returned verbatim by the system-prompt heuristic
pub const MAX_HEURISTIC_LINE_CHARS: usize = 200;

/// Number of leading lines the system-prompt heuristic keeps
pub const MAX_HEURISTIC_LINES: usize = 3;

const ELLIPSIS: &str = "...";

static SYSTEM_PROMPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ims)^[ \t#*]*(?:SYSTEM PROMPT|SYSTEM)[ \t]*:\**[ \t]*(.*?)(?:\n[ \t]*\n|\n[ \t#*]*(?:PLAN|IMPLEMENTATION PLAN|RATIONALE|REASONING)[ \t*]*:|\z)",
    )
    .expect("Invalid system prompt regex")
});

static PLAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ims)^[ \t#*]*(?:IMPLEMENTATION PLAN|PLAN)[ \t]*:\**[ \t]*(.*?)(?:\n[ \t]*\n|\n[ \t#*]*(?:RATIONALE|REASONING|SYSTEM PROMPT|SYSTEM)[ \t*]*:|\z)",
    )
    .expect("Invalid plan regex")
});

static RATIONALE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ims)^[ \t#*]*(?:RATIONALE|REASONING)[ \t]*:\**\s*(.*)").expect("Invalid rationale regex")
});

/// The three logical sections of one planner response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    pub system_prompt: String,
    pub plan: String,
    pub rationale: String,
}

impl Sections {
    /// Extract all three sections from one response
    pub fn parse(text: &str) -> Self {
        Self {
            system_prompt: extract_system_prompt(text),
            plan: extract_plan(text),
            rationale: extract_rationale(text),
        }
    }
}

/// Extract the system-prompt section, falling back to the leading lines
pub fn extract_system_prompt(text: &str) -> String {
    debug!(text_len = text.len(), "extract_system_prompt: called");
    let text = normalize(text);

    if let Some(section) = capture(&SYSTEM_PROMPT_RE, &text) {
        debug!("extract_system_prompt: label matched");
        return section;
    }

    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let Some(first) = lines.first() else {
        debug!("extract_system_prompt: no non-blank lines");
        return text.trim().to_string();
    };

    if first.chars().count() > MAX_HEURISTIC_LINE_CHARS {
        debug!("extract_system_prompt: truncating long first line");
        let head: String = first.chars().take(MAX_HEURISTIC_LINE_CHARS).collect();
        return format!("{}{}", head, ELLIPSIS);
    }

    debug!(line_count = lines.len(), "extract_system_prompt: joining leading lines");
    lines
        .iter()
        .take(MAX_HEURISTIC_LINES)
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract the plan section; empty when no label is present
pub fn extract_plan(text: &str) -> String {
    debug!(text_len = text.len(), "extract_plan: called");
    capture(&PLAN_RE, &normalize(text)).unwrap_or_default()
}

/// Extract the rationale section (to end of text); empty when no label is present
pub fn extract_rationale(text: &str) -> String {
    debug!(text_len = text.len(), "extract_rationale: called");
    capture(&RATIONALE_RE, &normalize(text)).unwrap_or_default()
}

/// Lines of the labeled system-prompt section, or every line when unlabeled
///
/// Unlike [`extract_system_prompt`] this keeps line boundaries, so callers can
/// filter the section line by line.
pub fn system_prompt_lines(text: &str) -> Vec<String> {
    let text = normalize(text);
    let body = capture(&SYSTEM_PROMPT_RE, &text).unwrap_or(text);
    body.lines().map(str::to_string).collect()
}

fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n")
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}
