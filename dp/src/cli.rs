//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;
use crate::orchestrator::PlannerSelection;

/// duoplan - two planners, one merged prompt
#[derive(Parser)]
#[command(
    name = "dp",
    about = "Ask two LLM planners for a plan and merge their answers",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Plan a task with both planners and print the merged result
    Plan {
        /// Task description (words are joined with spaces)
        #[arg(required = true, num_args = 1.., value_name = "TASK")]
        task: Vec<String>,

        /// Run only one planner (codex or claude)
        #[arg(long, value_name = "PLANNER")]
        only: Option<Only>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Do not write to the event log
        #[arg(long)]
        no_log: bool,
    },

    /// List recent events from the event log
    Events {
        /// Number of events to show
        #[arg(short = 'n', long, default_value_t = eventstore::DEFAULT_LIST_LIMIT)]
        limit: usize,

        /// Filter by source (codex, claude, orchestrator)
        #[arg(short, long)]
        source: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show which planner transports are configured
    Doctor,
}

/// Restrict a run to one planner
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Only {
    Codex,
    Claude,
}

impl std::str::FromStr for Only {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "Only::from_str: called");
        match s.to_lowercase().as_str() {
            "codex" | "primary" => Ok(Self::Codex),
            "claude" | "secondary" => Ok(Self::Claude),
            _ => Err(format!("Unknown planner: {}. Use: codex or claude", s)),
        }
    }
}

impl From<Option<Only>> for PlannerSelection {
    fn from(only: Option<Only>) -> Self {
        match only {
            None => PlannerSelection::Both,
            Some(Only::Codex) => PlannerSelection::PrimaryOnly,
            Some(Only::Claude) => PlannerSelection::SecondaryOnly,
        }
    }
}

/// Output format for plan/events commands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => {
                debug!("OutputFormat::from_str: matched Text");
                Ok(Self::Text)
            }
            "json" => {
                debug!("OutputFormat::from_str: matched Json");
                Ok(Self::Json)
            }
            _ => {
                debug!(%s, "OutputFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use: text or json", s))
            }
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("duoplan")
        .join("logs")
        .join("duoplan.log")
}

/// Generate the after_help text with credential status and the log location
pub fn generate_after_help(config: &Config) -> String {
    debug!("generate_after_help: called");
    let mut help = String::new();

    help.push_str("Credentials:\n");
    let vars = [
        ("codex", config.primary.api_key_env.as_str()),
        ("claude", config.secondary.api.api_key_env.as_str()),
    ];
    for (name, var) in vars {
        let set = std::env::var(var).is_ok_and(|v| !v.trim().is_empty());
        let icon = if set { "✅" } else { "❌" };
        help.push_str(&format!("  {} {:<8} {}\n", icon, name, var));
    }

    help.push_str(&format!("\nLogs are written to: {}", get_log_path().display().to_string().cyan()));
    help
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_plan_flags() {
        let cli = Cli::try_parse_from(["dp", "plan", "Add", "logging", "--only", "claude", "-f", "json"]).unwrap();

        match cli.command {
            Command::Plan {
                task,
                only,
                format,
                no_log,
            } => {
                assert_eq!(task, vec!["Add", "logging"]);
                assert_eq!(only, Some(Only::Claude));
                assert_eq!(format, OutputFormat::Json);
                assert!(!no_log);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_plan_requires_task() {
        assert!(Cli::try_parse_from(["dp", "plan"]).is_err());
    }

    #[test]
    fn test_parse_events_defaults() {
        let cli = Cli::try_parse_from(["dp", "events", "-s", "codex"]).unwrap();

        match cli.command {
            Command::Events { limit, source, format } => {
                assert_eq!(limit, eventstore::DEFAULT_LIST_LIMIT);
                assert_eq!(source.as_deref(), Some("codex"));
                assert_eq!(format, OutputFormat::Text);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["dp", "doctor", "-l", "debug", "-c", "/tmp/x.yml"]).unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/x.yml")));
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("plain".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("table".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_only_into_selection() {
        assert_eq!(PlannerSelection::from(None), PlannerSelection::Both);
        assert_eq!(PlannerSelection::from(Some(Only::Codex)), PlannerSelection::PrimaryOnly);
        assert_eq!(PlannerSelection::from(Some(Only::Claude)), PlannerSelection::SecondaryOnly);
        assert!("gemini".parse::<Only>().is_err());
    }

    #[test]
    fn test_log_path_under_duoplan() {
        assert!(get_log_path().ends_with("duoplan/logs/duoplan.log"));
    }
}
