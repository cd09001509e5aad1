//! Secondary planner transports

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::fallback::Stage;
use super::prompts::{SECONDARY_INSTRUCTION, SIMULATED_RATIONALE, SIMULATION_INSTRUCTION, task_message, unavailable_message};
use super::{PlanError, PlanResult, Provider};
use crate::config::{Config, ProviderConfig, SecondaryConfig};
use crate::llm::{AnthropicClient, CompletionRequest, LlmClient, OpenAIClient};

/// Direct call to the secondary provider's own API
pub struct ApiStage {
    client: Option<Arc<dyn LlmClient>>,
    max_tokens: u32,
}

impl ApiStage {
    /// Available only when the API key variable is set
    pub fn from_config(config: &ProviderConfig) -> Self {
        let client = config.api_key().and_then(|key| match AnthropicClient::with_api_key(config, key) {
            Ok(client) => Some(Arc::new(client) as Arc<dyn LlmClient>),
            Err(e) => {
                warn!(error = %e, "ApiStage::from_config: failed to build client");
                None
            }
        });
        Self {
            client,
            max_tokens: config.max_tokens,
        }
    }

    pub fn with_client(client: Arc<dyn LlmClient>, max_tokens: u32) -> Self {
        Self {
            client: Some(client),
            max_tokens,
        }
    }
}

#[async_trait]
impl Stage for ApiStage {
    fn name(&self) -> &'static str {
        "api"
    }

    fn is_available(&self) -> bool {
        self.client.is_some()
    }

    async fn invoke(&self, task: &str) -> Result<PlanResult, PlanError> {
        debug!("ApiStage::invoke: called");
        let Some(client) = &self.client else {
            return Err(PlanError::MissingCredential("secondary API key".to_string()));
        };

        let request = CompletionRequest::single(SECONDARY_INSTRUCTION, task_message(task), self.max_tokens);
        let response = client.complete(request).await?;
        Ok(PlanResult::from_response(Provider::Secondary, &response.text_or_empty()))
    }
}

/// POST the task to an HTTP planning service
pub struct HttpStage {
    url: Option<String>,
    http: Client,
    timeout: Duration,
}

impl HttpStage {
    pub fn from_config(config: &SecondaryConfig) -> Self {
        Self::new(config.service_url(), Duration::from_millis(config.timeout_ms))
    }

    pub fn new(url: Option<String>, timeout: Duration) -> Self {
        // builder only fails when the TLS backend cannot initialize
        let http = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
            warn!(error = %e, "HttpStage::new: falling back to default client");
            Client::new()
        });
        Self { url, http, timeout }
    }
}

#[async_trait]
impl Stage for HttpStage {
    fn name(&self) -> &'static str {
        "http"
    }

    fn is_available(&self) -> bool {
        self.url.is_some()
    }

    async fn invoke(&self, task: &str) -> Result<PlanResult, PlanError> {
        let Some(url) = &self.url else {
            return Err(PlanError::InvalidCommand("no service URL configured".to_string()));
        };
        debug!(%url, "HttpStage::invoke: called");

        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({ "task": task }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PlanError::Timeout(self.timeout)
                } else {
                    PlanError::Http(e)
                }
            })?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(PlanError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(parse_service_body(&body))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceResponse {
    system_prompt: Option<String>,
    content: Option<String>,
    plan: Option<String>,
    rationale: Option<String>,
}

/// Interpret a service response body
///
/// JSON with a non-empty `systemPrompt` (or else `content`) supplies the fields directly; any
/// other body is taken verbatim as both system prompt and plan.
fn parse_service_body(body: &str) -> PlanResult {
    let non_empty = |field: Option<String>| field.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

    if let Ok(parsed) = serde_json::from_str::<ServiceResponse>(body)
        && let Some(system_prompt) = non_empty(parsed.system_prompt).or_else(|| non_empty(parsed.content))
    {
        debug!("parse_service_body: structured response");
        return PlanResult {
            provider: Provider::Secondary,
            system_prompt,
            plan: parsed.plan.unwrap_or_default(),
            rationale: parsed.rationale.unwrap_or_default(),
        };
    }

    debug!("parse_service_body: using raw body");
    let text = body.trim().to_string();
    PlanResult {
        provider: Provider::Secondary,
        system_prompt: text.clone(),
        plan: text,
        rationale: String::new(),
    }
}

/// Run a local command with the task as its last argument
pub struct CliStage {
    command: Option<String>,
    timeout: Duration,
}

impl CliStage {
    pub fn from_config(config: &SecondaryConfig) -> Self {
        Self::new(config.cli_command(), Duration::from_millis(config.timeout_ms))
    }

    pub fn new(command: Option<String>, timeout: Duration) -> Self {
        Self { command, timeout }
    }
}

#[async_trait]
impl Stage for CliStage {
    fn name(&self) -> &'static str {
        "cli"
    }

    fn is_available(&self) -> bool {
        self.command.is_some()
    }

    async fn invoke(&self, task: &str) -> Result<PlanResult, PlanError> {
        let command = self.command.clone().unwrap_or_default();
        debug!(%command, "CliStage::invoke: called");

        let mut parts = command.split_whitespace();
        let program = parts.next().ok_or_else(|| PlanError::InvalidCommand(command.clone()))?;

        let child = tokio::process::Command::new(program)
            .args(parts)
            .arg(task)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => return Err(PlanError::Spawn { command, source }),
            Err(_) => return Err(PlanError::Timeout(self.timeout)),
        };

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        debug!(stdout_len = %stdout.len(), stderr_len = %stderr.len(), "CliStage::invoke: output lengths");

        let content = if stdout.is_empty() { stderr } else { stdout };

        if !output.status.success() {
            return Err(PlanError::CommandFailed {
                command,
                code: output.status.code(),
                output: content,
            });
        }

        Ok(PlanResult::from_response(Provider::Secondary, &content))
    }
}

/// Terminal stage: the primary provider playing reviewer, or a stub
pub struct SimulatedStage {
    client: Option<Arc<dyn LlmClient>>,
    max_tokens: u32,
    stub_message: String,
}

impl SimulatedStage {
    pub fn from_config(config: &Config) -> Self {
        let primary = &config.primary;
        let client = primary.api_key().and_then(|key| match OpenAIClient::with_api_key(primary, key) {
            Ok(client) => Some(Arc::new(client) as Arc<dyn LlmClient>),
            Err(e) => {
                warn!(error = %e, "SimulatedStage::from_config: failed to build client");
                None
            }
        });
        Self::new(client, primary.max_tokens, Self::stub_message_for(config))
    }

    pub fn new(client: Option<Arc<dyn LlmClient>>, max_tokens: u32, stub_message: impl Into<String>) -> Self {
        Self {
            client,
            max_tokens,
            stub_message: stub_message.into(),
        }
    }

    fn stub_message_for(config: &Config) -> String {
        unavailable_message(
            &config.secondary.api.api_key_env,
            &config.secondary.service_url_env,
            &config.secondary.cli_command_env,
            &config.primary.api_key_env,
        )
    }

    fn stub(&self) -> PlanResult {
        PlanResult {
            provider: Provider::Secondary,
            system_prompt: self.stub_message.clone(),
            plan: String::new(),
            rationale: String::new(),
        }
    }
}

#[async_trait]
impl Stage for SimulatedStage {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn invoke(&self, task: &str) -> Result<PlanResult, PlanError> {
        let Some(client) = &self.client else {
            debug!("SimulatedStage::invoke: no primary credential, returning stub");
            return Ok(self.stub());
        };

        debug!("SimulatedStage::invoke: asking primary provider for a critique");
        let request = CompletionRequest::single(SIMULATION_INSTRUCTION, task_message(task), self.max_tokens);
        let content = client.complete(request).await?.text_or_empty();

        if content.is_empty() {
            warn!("SimulatedStage::invoke: empty critique, returning stub");
            return Ok(self.stub());
        }

        Ok(PlanResult {
            provider: Provider::Secondary,
            system_prompt: content.clone(),
            plan: content,
            rationale: SIMULATED_RATIONALE.to_string(),
        })
    }
}
