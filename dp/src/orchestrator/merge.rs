//! Merge two planner proposals into a prompt and reference notes

use tracing::debug;

use crate::extract::{extract_system_prompt, system_prompt_lines};
use crate::planner::PlanResult;

/// Used when the primary planner produced no approach at all
pub const DEFAULT_APPROACH: &str = "Execute the task with precision and clarity.";

/// Secondary lines containing one of these survive into the considerations
pub const CONSIDERATION_KEYWORDS: [&str; 4] = ["consider", "ensure", "avoid", "note"];

const PLAN_PLACEHOLDER: &str = "(see rationale)";
const SEPARATOR: &str = "---";

/// Build the short prompt handed to the executing agent
pub fn merge_prompt(task: &str, primary: Option<&PlanResult>, secondary: Option<&PlanResult>) -> String {
    debug!(task_len = task.len(), "merge_prompt: called");
    let primary_core = primary.map(|p| extract_system_prompt(&p.system_prompt)).unwrap_or_default();
    let secondary_core = secondary.map(|s| extract_system_prompt(&s.system_prompt)).unwrap_or_default();

    let mut parts = vec![format!("Task: {}", task)];

    if !primary_core.is_empty() {
        parts.push(format!("Approach: {}", primary_core));
    }

    if let Some(secondary) = secondary
        && !secondary_core.is_empty()
        && secondary_core != primary_core
    {
        let considerations = considerations(&secondary.system_prompt);
        if !considerations.is_empty() {
            parts.push(format!("Considerations: {}", considerations));
        }
    }

    if parts.len() == 1 {
        debug!("merge_prompt: nothing beyond the task, using fallback form");
        let approach = if primary_core.is_empty() {
            DEFAULT_APPROACH
        } else {
            primary_core.as_str()
        };
        return format!("{}\n\n{}", task, approach);
    }

    parts.join("\n")
}

fn considerations(raw: &str) -> String {
    system_prompt_lines(raw)
        .iter()
        .map(|line| line.trim().to_lowercase())
        .filter(|line| CONSIDERATION_KEYWORDS.iter().any(|k| line.contains(k)))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Build the verbose notes holding both raw proposals
pub fn merge_notes(primary: Option<&PlanResult>, secondary: Option<&PlanResult>) -> String {
    debug!(
        has_primary = primary.is_some(),
        has_secondary = secondary.is_some(),
        "merge_notes: called"
    );
    let mut blocks = Vec::new();

    if let Some(p) = primary {
        blocks.extend(proposal_blocks("CODEX", p));
    }
    if primary.is_some() && secondary.is_some() {
        blocks.push(SEPARATOR.to_string());
    }
    if let Some(s) = secondary {
        blocks.extend(proposal_blocks("CLAUDE", s));
    }

    blocks.join("\n")
}

fn proposal_blocks(label: &str, result: &PlanResult) -> Vec<String> {
    let plan = [result.plan.as_str(), result.rationale.as_str()]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or(PLAN_PLACEHOLDER);

    let labeled = [
        ("System Prompt", result.system_prompt.as_str()),
        ("Plan", plan),
        ("Rationale", result.rationale.as_str()),
    ];

    std::iter::once(format!("=== {} PROPOSAL ===", label))
        .chain(
            labeled
                .into_iter()
                .filter(|(_, content)| !content.is_empty())
                .map(|(heading, content)| format!("{}:\n{}", heading, content)),
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::Provider;

    fn result(provider: Provider, system_prompt: &str, plan: &str, rationale: &str) -> PlanResult {
        PlanResult {
            provider,
            system_prompt: system_prompt.to_string(),
            plan: plan.to_string(),
            rationale: rationale.to_string(),
        }
    }

    #[test]
    fn test_merge_prompt_add_logging_example() {
        let primary = result(
            Provider::Primary,
            "SYSTEM PROMPT:\nBuild it carefully\n\nPLAN:\nStep 1",
            "Step 1",
            "",
        );
        let secondary = result(Provider::Secondary, "Consider edge cases.\nNote potential race.", "", "");

        let merged = merge_prompt("Add logging", Some(&primary), Some(&secondary));

        assert_eq!(
            merged,
            "Task: Add logging\nApproach: Build it carefully\nConsiderations: consider edge cases.; note potential race."
        );
    }

    #[test]
    fn test_merge_prompt_empty_outputs_use_default() {
        let primary = result(Provider::Primary, "", "", "");
        let secondary = result(Provider::Secondary, "", "", "");

        assert_eq!(
            merge_prompt("Add logging", Some(&primary), Some(&secondary)),
            "Add logging\n\nExecute the task with precision and clarity."
        );
        assert_eq!(
            merge_prompt("Add logging", None, None),
            "Add logging\n\nExecute the task with precision and clarity."
        );
    }

    #[test]
    fn test_merge_prompt_identical_cores_skip_considerations() {
        let primary = result(Provider::Primary, "Ensure tests pass", "", "");
        let secondary = result(Provider::Secondary, "Ensure tests pass", "", "");

        assert_eq!(
            merge_prompt("t", Some(&primary), Some(&secondary)),
            "Task: t\nApproach: Ensure tests pass"
        );
    }

    #[test]
    fn test_merge_prompt_secondary_without_keywords() {
        let secondary = result(Provider::Secondary, "Looks fine to me.", "", "");

        assert_eq!(
            merge_prompt("t", None, Some(&secondary)),
            "t\n\nExecute the task with precision and clarity."
        );
    }

    #[test]
    fn test_merge_prompt_secondary_only_considerations() {
        let secondary = result(
            Provider::Secondary,
            "SYSTEM PROMPT:\n  Avoid global state\nKeep it short\n  ENSURE idempotency\n\nPLAN:\n1. note this",
            "",
            "",
        );

        assert_eq!(
            merge_prompt("t", None, Some(&secondary)),
            "Task: t\nConsiderations: avoid global state; ensure idempotency"
        );
    }

    #[test]
    fn test_merge_notes_both_proposals() {
        let primary = result(Provider::Primary, "raw primary", "1. do", "because");
        let secondary = result(Provider::Secondary, "raw secondary", "", "");

        let notes = merge_notes(Some(&primary), Some(&secondary));

        assert_eq!(
            notes,
            "=== CODEX PROPOSAL ===\n\
             System Prompt:\nraw primary\n\
             Plan:\n1. do\n\
             Rationale:\nbecause\n\
             ---\n\
             === CLAUDE PROPOSAL ===\n\
             System Prompt:\nraw secondary\n\
             Plan:\n(see rationale)"
        );
    }

    #[test]
    fn test_merge_notes_plan_falls_back_to_rationale() {
        let primary = result(Provider::Primary, "sp", "", "why");

        let notes = merge_notes(Some(&primary), None);

        assert_eq!(notes, "=== CODEX PROPOSAL ===\nSystem Prompt:\nsp\nPlan:\nwhy\nRationale:\nwhy");
    }

    #[test]
    fn test_merge_notes_has_no_orphan_headings() {
        let primary = result(Provider::Primary, "", "", "");
        let notes = merge_notes(Some(&primary), None);

        assert!(!notes.contains("System Prompt:"));
        assert!(!notes.contains("Rationale:"));
        assert!(!notes.contains("---"));
        assert_eq!(notes, "=== CODEX PROPOSAL ===\nPlan:\n(see rationale)");

        let lines: Vec<&str> = notes.lines().collect();
        for (i, line) in lines.iter().enumerate() {
            if line.ends_with(':') {
                let next = lines.get(i + 1).copied().unwrap_or_default();
                assert!(!next.is_empty(), "orphan heading {line:?} in {notes:?}");
            }
        }
    }

    #[test]
    fn test_merge_notes_single_side_has_no_separator() {
        let secondary = result(Provider::Secondary, "sp", "p", "r");
        let notes = merge_notes(None, Some(&secondary));

        assert!(notes.starts_with("=== CLAUDE PROPOSAL ==="));
        assert!(!notes.contains(SEPARATOR));
    }
}
