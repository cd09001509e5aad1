//! dp - duoplan command-line entry point

use std::fs;
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use duoplan::cli::{Cli, Command, OutputFormat, generate_after_help, get_log_path};
use duoplan::config::Config;
use duoplan::orchestrator::{MergedOutput, Orchestrator, PlannerSelection};
use duoplan::planner::FallbackPlanner;
use eventstore::{Event, EventStore};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Credential status in --help reflects the default config chain
    let help_config = Config::load(None).unwrap_or_default();
    let cmd = Cli::command().after_help(generate_after_help(&help_config));
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(model = %config.primary.model, "duoplan loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Plan {
            task,
            only,
            format,
            no_log,
        } => {
            debug!(?only, %format, no_log, "main: matched Plan command");
            cmd_plan(&config, &task.join(" "), only.into(), format, no_log).await
        }
        Command::Events { limit, source, format } => {
            debug!(limit, ?source, %format, "main: matched Events command");
            cmd_events(&config, limit, source.as_deref(), format)
        }
        Command::Doctor => {
            debug!("main: matched Doctor command");
            cmd_doctor(&config)
        }
    }
}

/// Plan a task and print the merged artifact
async fn cmd_plan(
    config: &Config,
    task: &str,
    selection: PlannerSelection,
    format: OutputFormat,
    no_log: bool,
) -> Result<()> {
    debug!(?selection, "cmd_plan: called");
    let mut orchestrator = Orchestrator::from_config(config, selection).context("Failed to set up planners")?;

    if !no_log {
        match EventStore::open(&config.storage.db_path) {
            Ok(store) => orchestrator = orchestrator.with_recorder(Arc::new(store)),
            Err(e) => warn!(error = %e, "cmd_plan: event log unavailable, continuing without it"),
        }
    }

    let output = orchestrator.run(task).await.context("Planning failed")?;
    print_output(&output, format)
}

fn print_output(output: &MergedOutput, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(output)?);
        }
        OutputFormat::Text => {
            println!("{}", "=== MERGED PROMPT ===".bold().green());
            println!("{}", output.merged_prompt);
            println!();
            println!("{}", "=== REFERENCE NOTES ===".bold().cyan());
            println!("{}", output.merged_notes);
        }
    }
    Ok(())
}

/// List recent events
fn cmd_events(config: &Config, limit: usize, source: Option<&str>, format: OutputFormat) -> Result<()> {
    debug!(limit, ?source, "cmd_events: called");
    let db_path = &config.storage.db_path;

    let events = if db_path.exists() {
        let store = EventStore::open(db_path).context("Failed to open event log")?;
        store.recent(limit, source).context("Failed to read events")?
    } else {
        debug!(?db_path, "cmd_events: no event log yet");
        Vec::new()
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&events)?);
        }
        OutputFormat::Text if events.is_empty() => {
            println!("No events recorded yet.");
        }
        OutputFormat::Text => {
            for event in &events {
                println!("{}", format_event_line(event));
            }
        }
    }
    Ok(())
}

fn format_event_line(event: &Event) -> String {
    let task = event.data.get("task").and_then(|t| t.as_str()).unwrap_or("");
    format!(
        "{:>5}  {}  {:<12} {:<6} {}",
        event.id,
        event.created_at.format("%Y-%m-%d %H:%M:%S"),
        event.source.yellow(),
        event.event_type,
        task
    )
}

/// Show which transports are configured; performs no network I/O
fn cmd_doctor(config: &Config) -> Result<()> {
    debug!("cmd_doctor: called");

    println!("{}", "Primary planner (codex)".bold());
    let primary_ready = config.primary.api_key().is_some();
    println!(
        "  {} {} ({})",
        status_icon(primary_ready),
        config.primary.api_key_env,
        config.primary.model
    );

    println!();
    println!("{}", "Secondary planner (claude), in resolution order".bold());
    let planner = FallbackPlanner::from_config(config);
    for stage in planner.stage_status() {
        println!("  {} {}", status_icon(stage.available), stage.name);
    }

    println!();
    println!("Event log: {}", config.storage.db_path.display());
    println!("Log file:  {}", get_log_path().display());
    Ok(())
}

fn status_icon(ok: bool) -> colored::ColoredString {
    if ok { "✓".green() } else { "✗".red() }
}
