//! Primary (implementation-focused) planner

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::prompts::{PRIMARY_INSTRUCTION, task_message};
use super::{PlanError, PlanResult, Planner, Provider};
use crate::config::ProviderConfig;
use crate::llm::{CompletionRequest, LlmClient, OpenAIClient};

/// Single-transport planner backed by an OpenAI-style API
pub struct PrimaryPlanner {
    client: Arc<dyn LlmClient>,
    max_tokens: u32,
}

impl PrimaryPlanner {
    pub fn new(client: Arc<dyn LlmClient>, max_tokens: u32) -> Self {
        Self { client, max_tokens }
    }

    /// Build from config; a missing API key is a hard error
    pub fn from_config(config: &ProviderConfig) -> Result<Self, PlanError> {
        debug!(model = %config.model, "PrimaryPlanner::from_config: called");
        let client = OpenAIClient::from_config(config).map_err(PlanError::from_client)?;
        Ok(Self::new(Arc::new(client), config.max_tokens))
    }
}

#[async_trait]
impl Planner for PrimaryPlanner {
    fn provider(&self) -> Provider {
        Provider::Primary
    }

    async fn plan(&self, task: &str) -> Result<PlanResult, PlanError> {
        debug!(task_len = task.len(), "PrimaryPlanner::plan: called");
        let request = CompletionRequest::single(PRIMARY_INSTRUCTION, task_message(task), self.max_tokens);
        let response = self.client.complete(request).await?;

        let text = response.text_or_empty();
        if text.is_empty() {
            return Err(PlanError::EmptyResponse("primary"));
        }

        info!(
            output_tokens = response.usage.output_tokens,
            "PrimaryPlanner::plan: received plan"
        );
        Ok(PlanResult::from_response(Provider::Primary, &text))
    }
}
