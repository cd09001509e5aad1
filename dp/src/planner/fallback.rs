//! Fallback-chain planner
//!
//! Stages are tried in order. A stage that is not configured is skipped
//! without any I/O; a stage that fails or answers with nothing is logged and
//! skipped. The terminal stage always runs last and its result is returned
//! as-is, so the chain only errors when the terminal stage itself errors.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::stages::{ApiStage, CliStage, HttpStage, SimulatedStage};
use super::{PlanError, PlanResult, Planner, Provider};
use crate::config::Config;

/// One transport option in the chain
#[async_trait]
pub trait Stage: Send + Sync {
    /// Short name used in logs and diagnostics
    fn name(&self) -> &'static str;

    /// Whether the stage is configured; must not perform I/O
    fn is_available(&self) -> bool;

    async fn invoke(&self, task: &str) -> Result<PlanResult, PlanError>;
}

/// Which stage answered, and with what
#[derive(Debug, Clone)]
pub struct Resolution {
    pub stage: &'static str,
    pub result: PlanResult,
}

/// Availability of one stage, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageStatus {
    pub name: &'static str,
    pub available: bool,
}

/// Secondary planner resolving through an ordered list of stages
pub struct FallbackPlanner {
    stages: Vec<Box<dyn Stage>>,
    terminal: Box<dyn Stage>,
}

impl FallbackPlanner {
    pub fn new(stages: Vec<Box<dyn Stage>>, terminal: Box<dyn Stage>) -> Self {
        Self { stages, terminal }
    }

    /// The fixed production order: API, HTTP service, CLI, then simulation
    pub fn from_config(config: &Config) -> Self {
        debug!("FallbackPlanner::from_config: called");
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(ApiStage::from_config(&config.secondary.api)),
            Box::new(HttpStage::from_config(&config.secondary)),
            Box::new(CliStage::from_config(&config.secondary)),
        ];
        let terminal = Box::new(SimulatedStage::from_config(config));
        Self::new(stages, terminal)
    }

    /// Availability of every stage in resolution order
    pub fn stage_status(&self) -> Vec<StageStatus> {
        self.stages
            .iter()
            .chain(std::iter::once(&self.terminal))
            .map(|s| StageStatus {
                name: s.name(),
                available: s.is_available(),
            })
            .collect()
    }

    /// Try each stage in order and return the first non-empty result
    pub async fn resolve(&self, task: &str) -> Result<Resolution, PlanError> {
        debug!(stage_count = self.stages.len(), "FallbackPlanner::resolve: called");

        for stage in &self.stages {
            let name = stage.name();
            if !stage.is_available() {
                debug!(stage = name, "FallbackPlanner::resolve: not configured, skipping");
                continue;
            }

            match stage.invoke(task).await {
                Ok(result) if !result.is_empty() => {
                    info!(stage = name, "FallbackPlanner::resolve: stage answered");
                    return Ok(Resolution { stage: name, result });
                }
                Ok(_) => {
                    warn!(stage = name, "FallbackPlanner::resolve: empty result, trying next stage");
                }
                Err(e) => {
                    warn!(
                        stage = name,
                        error = %e,
                        retry_after = ?e.retry_after(),
                        "FallbackPlanner::resolve: stage failed, trying next stage"
                    );
                }
            }
        }

        let name = self.terminal.name();
        debug!(stage = name, "FallbackPlanner::resolve: falling back to terminal stage");
        let result = self.terminal.invoke(task).await?;
        Ok(Resolution { stage: name, result })
    }
}

#[async_trait]
impl Planner for FallbackPlanner {
    fn provider(&self) -> Provider {
        Provider::Secondary
    }

    async fn plan(&self, task: &str) -> Result<PlanResult, PlanError> {
        Ok(self.resolve(task).await?.result)
    }
}
