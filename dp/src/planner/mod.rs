//! Planner adapters
//!
//! - [`PrimaryPlanner`] - single OpenAI-style transport, failures are fatal
//! - [`FallbackPlanner`] - ordered stages (API, HTTP, CLI, simulation) where
//!   the first non-empty answer wins

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::extract::{extract_plan, extract_rationale};

mod error;
mod fallback;
mod primary;
pub mod prompts;
mod stages;

pub use error::PlanError;
pub use fallback::{FallbackPlanner, Resolution, Stage, StageStatus};
pub use primary::PrimaryPlanner;
pub use stages::{ApiStage, CliStage, HttpStage, SimulatedStage};

/// Which side of the pair produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Primary,
    Secondary,
}

impl Provider {
    /// Event-log source name for this provider
    pub fn source(&self) -> &'static str {
        match self {
            Provider::Primary => "codex",
            Provider::Secondary => "claude",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Primary => write!(f, "primary"),
            Provider::Secondary => write!(f, "secondary"),
        }
    }
}

/// Output of one planner adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResult {
    pub provider: Provider,
    pub system_prompt: String,
    pub plan: String,
    pub rationale: String,
}

impl PlanResult {
    /// Build a result from raw model text
    ///
    /// The raw text is kept as the system prompt; plan and rationale are the
    /// labeled sections found in it.
    pub fn from_response(provider: Provider, raw: &str) -> Self {
        Self {
            provider,
            system_prompt: raw.trim().to_string(),
            plan: extract_plan(raw),
            rationale: extract_rationale(raw),
        }
    }

    /// True when there is no usable content
    pub fn is_empty(&self) -> bool {
        self.system_prompt.trim().is_empty()
    }
}

/// Something that can produce a plan for a task
#[async_trait]
pub trait Planner: Send + Sync {
    fn provider(&self) -> Provider;

    async fn plan(&self, task: &str) -> Result<PlanResult, PlanError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response_keeps_raw_text() {
        let raw = "\nSYSTEM PROMPT:\nBuild it\n\nPLAN:\n1. a\n\nRATIONALE:\nr\n";
        let result = PlanResult::from_response(Provider::Primary, raw);

        assert_eq!(result.system_prompt, raw.trim());
        assert_eq!(result.plan, "1. a");
        assert_eq!(result.rationale, "r");
        assert!(!result.is_empty());
    }

    #[test]
    fn test_is_empty() {
        assert!(PlanResult::from_response(Provider::Secondary, "  \n ").is_empty());
    }

    #[test]
    fn test_serializes_camel_case() {
        let result = PlanResult::from_response(Provider::Secondary, "hello");
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["provider"], "secondary");
        assert_eq!(json["systemPrompt"], "hello");
        assert_eq!(json["plan"], "");
    }

    #[test]
    fn test_provider_sources() {
        assert_eq!(Provider::Primary.source(), "codex");
        assert_eq!(Provider::Secondary.source(), "claude");
        assert_eq!(Provider::Secondary.to_string(), "secondary");
    }
}
