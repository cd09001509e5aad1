//! Orchestrator - runs both planners and merges their proposals
//!
//! The planners run concurrently and are joined before merging. Either one
//! failing fails the whole run; no partial merge is produced.

use std::sync::Arc;

use eventstore::EventRecorder;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::planner::{FallbackPlanner, PlanError, PlanResult, Planner, PrimaryPlanner};

mod merge;

pub use merge::{CONSIDERATION_KEYWORDS, DEFAULT_APPROACH, merge_notes, merge_prompt};

/// Event-log source for orchestrator-level events
pub const ORCHESTRATOR_SOURCE: &str = "orchestrator";

/// Which planners take part in a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlannerSelection {
    #[default]
    Both,
    PrimaryOnly,
    SecondaryOnly,
}

impl PlannerSelection {
    pub fn includes_primary(&self) -> bool {
        matches!(self, PlannerSelection::Both | PlannerSelection::PrimaryOnly)
    }

    pub fn includes_secondary(&self) -> bool {
        matches!(self, PlannerSelection::Both | PlannerSelection::SecondaryOnly)
    }
}

/// Artifact produced for one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedOutput {
    #[serde(rename = "codex", skip_serializing_if = "Option::is_none", default)]
    pub primary: Option<PlanResult>,
    #[serde(rename = "claude", skip_serializing_if = "Option::is_none", default)]
    pub secondary: Option<PlanResult>,
    #[serde(rename = "mergedPrompt")]
    pub merged_prompt: String,
    #[serde(rename = "mergedNotes")]
    pub merged_notes: String,
}

impl MergedOutput {
    /// Merge two (optional) planner results for `task`
    pub fn build(task: &str, primary: Option<PlanResult>, secondary: Option<PlanResult>) -> Self {
        let merged_prompt = merge_prompt(task, primary.as_ref(), secondary.as_ref());
        let merged_notes = merge_notes(primary.as_ref(), secondary.as_ref());
        Self {
            primary,
            secondary,
            merged_prompt,
            merged_notes,
        }
    }
}

/// Runs the selected planners for a task and merges the results
#[derive(Default)]
pub struct Orchestrator {
    primary: Option<Arc<dyn Planner>>,
    secondary: Option<Arc<dyn Planner>>,
    recorder: Option<Arc<dyn EventRecorder>>,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_primary(mut self, planner: Arc<dyn Planner>) -> Self {
        self.primary = Some(planner);
        self
    }

    pub fn with_secondary(mut self, planner: Arc<dyn Planner>) -> Self {
        self.secondary = Some(planner);
        self
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn EventRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Build the production planners for `selection`
    ///
    /// The primary planner needs its credential; a missing key is an error here
    /// rather than at run time.
    pub fn from_config(config: &Config, selection: PlannerSelection) -> Result<Self, PlanError> {
        debug!(?selection, "Orchestrator::from_config: called");
        let mut orchestrator = Self::new();

        if selection.includes_primary() {
            orchestrator = orchestrator.with_primary(Arc::new(PrimaryPlanner::from_config(&config.primary)?));
        }
        if selection.includes_secondary() {
            orchestrator = orchestrator.with_secondary(Arc::new(FallbackPlanner::from_config(config)));
        }

        Ok(orchestrator)
    }

    /// Plan `task` with every configured planner and merge the answers
    pub async fn run(&self, task: &str) -> Result<MergedOutput, PlanError> {
        if task.trim().is_empty() {
            return Err(PlanError::EmptyTask);
        }

        let run_id = Uuid::now_v7();
        debug!(%run_id, task_len = task.len(), "Orchestrator::run: called");

        let joined = tokio::try_join!(
            run_planner(self.primary.as_deref(), task),
            run_planner(self.secondary.as_deref(), task),
        );

        let (primary, secondary) = match joined {
            Ok(results) => results,
            Err(e) => {
                warn!(%run_id, error = %e, "Orchestrator::run: planner failed");
                self.record(
                    ORCHESTRATOR_SOURCE,
                    "error",
                    json!({ "runId": run_id, "task": task, "error": e.to_string() }),
                );
                return Err(e);
            }
        };

        for result in primary.iter().chain(secondary.iter()) {
            self.record(
                result.provider.source(),
                "plan",
                json!({ "runId": run_id, "task": task, "result": result }),
            );
        }

        let output = MergedOutput::build(task, primary, secondary);
        self.record(
            ORCHESTRATOR_SOURCE,
            "merge",
            json!({
                "runId": run_id,
                "task": task,
                "mergedPrompt": output.merged_prompt,
                "mergedNotes": output.merged_notes,
            }),
        );

        info!(%run_id, prompt_len = output.merged_prompt.len(), "Orchestrator::run: merged");
        Ok(output)
    }

    fn record(&self, source: &str, event_type: &str, data: serde_json::Value) {
        let Some(recorder) = &self.recorder else {
            return;
        };
        if let Err(e) = recorder.record_json(source, event_type, data) {
            warn!(source, event_type, error = %e, "Orchestrator::record: failed to record event");
        }
    }
}

async fn run_planner(planner: Option<&dyn Planner>, task: &str) -> Result<Option<PlanResult>, PlanError> {
    match planner {
        Some(planner) => {
            debug!(provider = %planner.provider(), "run_planner: called");
            planner.plan(task).await.map(Some)
        }
        None => Ok(None),
    }
}
