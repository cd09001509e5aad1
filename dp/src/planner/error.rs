//! Planner error types

use std::time::Duration;
use thiserror::Error;

use crate::llm::LlmError;

/// Errors raised by planners and fallback stages
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Missing credential: set the {0} environment variable")]
    MissingCredential(String),

    #[error("Task is empty")]
    EmptyTask,

    #[error("{0} planner returned an empty response")]
    EmptyResponse(&'static str),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP service returned {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Invalid command: {0:?}")]
    InvalidCommand(String),

    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with code {code:?}: {output}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        output: String,
    },

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl PlanError {
    /// Map client construction errors, keeping missing keys distinct
    pub fn from_client(err: LlmError) -> Self {
        match err {
            LlmError::MissingApiKey(var) => PlanError::MissingCredential(var),
            other => PlanError::Llm(other),
        }
    }

    /// Server-suggested wait when the failure was a rate limit
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            PlanError::Llm(e) => e.retry_after(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_client_maps_missing_key() {
        let err = PlanError::from_client(LlmError::MissingApiKey("OPENAI_API_KEY".to_string()));
        assert!(matches!(err, PlanError::MissingCredential(ref v) if v == "OPENAI_API_KEY"));

        let err = PlanError::from_client(LlmError::InvalidResponse("x".to_string()));
        assert!(matches!(err, PlanError::Llm(_)));
    }

    #[test]
    fn test_retry_after_only_for_rate_limits() {
        let err = PlanError::from(LlmError::RateLimited {
            retry_after: Duration::from_secs(30),
        });
        assert_eq!(err.retry_after(), Some(Duration::from_secs(30)));

        assert_eq!(PlanError::Timeout(Duration::from_secs(30)).retry_after(), None);
        assert_eq!(PlanError::from(LlmError::InvalidResponse("x".to_string())).retry_after(), None);
    }

    #[test]
    fn test_command_failed_message() {
        let err = PlanError::CommandFailed {
            command: "claude".to_string(),
            code: Some(2),
            output: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "'claude' exited with code Some(2): boom");
    }
}
