//! duoplan - ask two LLM planners, merge their answers
//!
//! A task is planned by two planners at once: the primary ("codex") planner,
//! which calls an OpenAI-style API, and the secondary ("claude") planner, which
//! falls back through several transports until one answers. Their free-text
//! output is split into sections and merged into a short prompt for an
//! executing agent plus verbose reference notes.
//!
//! # Modules
//!
//! - [`extract`] - section extraction from loosely formatted model output
//! - [`llm`] - LLM client trait with OpenAI and Anthropic implementations
//! - [`planner`] - primary planner and the fallback-chain secondary planner
//! - [`orchestrator`] - concurrent planning and the merge protocol
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod extract;
pub mod llm;
pub mod orchestrator;
pub mod planner;

// Re-export commonly used types
pub use config::{Config, ProviderConfig, SecondaryConfig, StorageConfig};
pub use extract::{Sections, extract_plan, extract_rationale, extract_system_prompt};
pub use llm::{AnthropicClient, CompletionRequest, CompletionResponse, LlmClient, LlmError, OpenAIClient};
pub use orchestrator::{MergedOutput, Orchestrator, PlannerSelection, merge_notes, merge_prompt};
pub use planner::{FallbackPlanner, PlanError, PlanResult, Planner, PrimaryPlanner, Provider, Stage};
