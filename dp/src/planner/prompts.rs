//! Planner instructions

/// System instruction for the implementation-focused primary planner
pub const PRIMARY_INSTRUCTION: &str = "You are an implementation planner. \
Given a software task, answer with exactly three labeled sections:\n\
SYSTEM PROMPT: a short system prompt for the agent that will execute the task.\n\
PLAN: a numbered, step-by-step implementation plan.\n\
RATIONALE: why this approach fits the task.\n\
Keep each section concise.";

/// System instruction for the critique-focused secondary planner
pub const SECONDARY_INSTRUCTION: &str = "You are a careful reviewer planning the same task \
from a safety and correctness angle. Answer with exactly three labeled sections:\n\
SYSTEM PROMPT: guidance for the executing agent, one point per line, each starting \
with Consider, Ensure, Avoid or Note.\n\
PLAN: a numbered plan that addresses the risks you found.\n\
RATIONALE: the risks and edge cases behind your guidance.";

/// Instruction used when the primary provider stands in for the secondary planner
pub const SIMULATION_INSTRUCTION: &str = "Act as a second, independent reviewer. \
Critique the obvious approach to the task below and propose refinements: edge cases, \
failure modes, and safety checks. Write one point per line, each starting with \
Consider, Ensure, Avoid or Note.";

/// Rationale attached to simulated secondary results
pub const SIMULATED_RATIONALE: &str =
    "Simulated critique from the primary provider; no secondary transport was configured.";

/// User message sent to the API-backed planners
pub fn task_message(task: &str) -> String {
    format!("Task: {}", task)
}

/// Operator-facing text returned when no secondary transport can run
pub fn unavailable_message(api_key_env: &str, service_url_env: &str, cli_command_env: &str, primary_key_env: &str) -> String {
    format!(
        "Secondary planner unavailable. Set {} for direct API access, {} for an HTTP planning service, \
         or {} for a local CLI; set {} to simulate a critique with the primary provider.",
        api_key_env, service_url_env, cli_command_env, primary_key_env
    )
}
