//! `tripcrew` - plan a trip with a crew of language-model agents.

#![allow(clippy::print_stdout, clippy::print_stderr)] // CLI program intentionally uses stdout

mod config;
mod error;

use std::io::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tripcrew::prelude::*;

use crate::config::{AppConfig, IssueLevel};
use crate::error::{CliError, Result};

/// Plan a trip with a crew of AI travel agents
#[derive(Parser)]
#[command(name = "tripcrew")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "TRIPCREW_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan a trip
    Plan(PlanArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for the plan command
#[derive(Args)]
struct PlanArgs {
    /// Where you are traveling from
    #[arg(long)]
    origin: Option<String>,

    /// The cities you are choosing between
    #[arg(long)]
    cities: Option<String>,

    /// The date range of the trip
    #[arg(long)]
    dates: Option<String>,

    /// Your high level interests and hobbies
    #[arg(long)]
    interests: Option<String>,

    /// Ask for every field not given as a flag
    #[arg(short, long)]
    interactive: bool,

    /// Orchestration process (overrides config)
    #[arg(short, long)]
    process: Option<Process>,

    /// Model provider (overrides config)
    #[arg(long)]
    provider: Option<ProviderKind>,

    /// Model of the expert travel agent (overrides config)
    #[arg(short, long)]
    model: Option<String>,
}

/// Arguments for the config command
#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Show configuration file path
    Path,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Validate configuration
    Validate,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given verbosity level.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "tripcrew={level},tripcrew_cli={level},{}",
            if verbosity >= 2 { "debug" } else { "warn" }
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let path = cli.config.unwrap_or_else(config::config_path);
    match cli.command {
        Commands::Plan(args) => cmd_plan(args, &path, cli.verbose).await,
        Commands::Config(args) => cmd_config(args, &path).await,
    }
}

/// Plan a trip.
async fn cmd_plan(args: PlanArgs, path: &std::path::Path, verbosity: u8) -> Result<()> {
    let config = config::load_config_from(path)
        .await?
        .with_env()
        .with_overrides(args.provider, args.model.clone());
    check(&config)?;

    let request = trip_request(&args, &config).await?;
    let process = args.process.unwrap_or(config.crew.process);
    let agents = travel_agents(&config)?;

    let cancel = CancelSignal::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if watch_interrupts(tokio::signal::ctrl_c, &on_interrupt).await {
            eprintln!("Interrupted again, exiting");
            std::process::exit(130);
        }
    });

    let mut trip = TripCrew::new(agents, request).cancel_signal(cancel);
    if config.crew.verbose || verbosity > 0 {
        trip = trip.hooks(Arc::new(LoggingHooks::new()));
    }

    println!("## Welcome to Trip Planner Crew");
    println!("-------------------------------");

    let output = trip.run(process).await?;

    println!("\n\n########################");
    println!("## Here is your Trip Plan");
    println!("########################\n");
    println!("{output}");

    if verbosity > 0 {
        let usage = &output.usage;
        println!(
            "\n[run {}] {} process, {} invocations, tokens: {} in / {} out / {} total",
            output.run_id,
            output.process,
            output.invocations.len(),
            usage.input_tokens,
            usage.output_tokens,
            usage.total_tokens,
        );
    }

    Ok(())
}

/// Cancel the run on the first interrupt.
///
/// Returns `true` once a second interrupt arrives, and `false` if the
/// signal source fails.
async fn watch_interrupts<S, F>(mut next_interrupt: S, cancel: &CancelSignal) -> bool
where
    S: FnMut() -> F,
    F: Future<Output = std::io::Result<()>>,
{
    if next_interrupt().await.is_err() {
        return false;
    }
    println!("\nInterrupted, stopping after the current step... (press Ctrl-C again to exit)");
    cancel.cancel_with_reason("interrupted by user");
    next_interrupt().await.is_ok()
}

/// Fail on error-level issues, log the rest.
fn check(config: &AppConfig) -> Result<()> {
    let issues = config.validate();
    for issue in issues.iter().filter(|i| i.level == IssueLevel::Warning) {
        tracing::warn!("{issue}");
    }
    let errors: Vec<String> = issues
        .iter()
        .filter(|i| i.level == IssueLevel::Error)
        .map(ToString::to_string)
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CliError::InvalidConfig(errors.join("\n")))
    }
}

/// Build the agent registry from the resolved configuration.
fn travel_agents(config: &AppConfig) -> Result<TravelAgents> {
    let llm = &config.llm;
    let mut client = OpenAIConfig::for_provider(llm.provider)?;
    if llm.timeout_secs > 0 {
        client = client.with_timeout(llm.timeout_secs);
    }
    if let Some(url) = &llm.base_url {
        client = client.with_base_url(url.clone());
    }
    if let Some(model) = &llm.model {
        client = client.with_model(model.clone());
    }
    let provider: SharedChatProvider = Arc::new(OpenAI::new(client)?);
    tracing::info!(provider = %llm.provider, model = provider.default_model(), "Using model");

    let handle = |model: Option<&String>| {
        let handle = ModelHandle::new(Arc::clone(&provider)).temperature(llm.temperature);
        match model {
            Some(model) => handle.model(model.clone()),
            None => handle,
        }
    };

    let advanced = handle(llm.advanced_model.as_ref().or(llm.model.as_ref()));
    let mut agents = TravelAgents::new(handle(llm.model.as_ref()))
        .with_advanced(advanced)
        .with_max_steps(config.crew.max_steps)
        .with_tool_timeout(config.crew.tool_timeout());
    if let Some(model) = &llm.manager_model {
        agents = agents.with_manager_model(handle(Some(model)));
    }
    Ok(agents)
}

/// Resolve the four trip fields: flags first, then prompts, then defaults.
async fn trip_request(args: &PlanArgs, config: &AppConfig) -> Result<TripRequest> {
    let mut request = TripRequest::new(
        args.origin.clone().unwrap_or_default(),
        args.cities.clone().unwrap_or_default(),
        args.dates.clone().unwrap_or_default(),
        args.interests.clone().unwrap_or_default(),
    );

    if args.interactive {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        for (field, question) in [
            (&mut request.origin, "From where will you be traveling from?"),
            (
                &mut request.cities,
                "What are the cities options you are interested in visiting?",
            ),
            (
                &mut request.travel_dates,
                "What is the date range you are interested in traveling?",
            ),
            (
                &mut request.interests,
                "What are some of your high level interests and hobbies?",
            ),
        ] {
            if field.trim().is_empty() {
                println!("{question}");
                std::io::stdout().flush()?;
                *field = lines.next_line().await?.unwrap_or_default();
            }
        }
    }

    let request = request.with_defaults(&config.trip);
    let missing = request.missing_fields();
    if missing.is_empty() {
        Ok(request)
    } else {
        Err(CliError::MissingFields(missing.join(", ")))
    }
}

/// Configuration management.
async fn cmd_config(args: ConfigArgs, path: &std::path::Path) -> Result<()> {
    match args.command {
        ConfigCommands::Path => {
            println!("{}", path.display());
        }
        ConfigCommands::Show => {
            let config = config::load_config_from(path).await?.with_env();
            let rendered = toml::to_string_pretty(&config)
                .map_err(|e| ConfigError::TomlSerialize(e.to_string()))?;
            if !path.exists() {
                println!("# {} does not exist, showing defaults", path.display());
            }
            println!("{rendered}");
        }
        ConfigCommands::Init { force } => {
            if config::init_config(path, force).await? {
                println!("Configuration created: {}", path.display());
                println!();
                println!("Next steps:");
                println!("  1. set a provider and trip defaults in the file");
                println!("  2. export GEMINI_API_KEY=<key> (or the key of your provider)");
                println!("  3. tripcrew plan --interactive");
            } else {
                println!("Configuration already exists at: {}", path.display());
                println!("Use --force to overwrite.");
            }
        }
        ConfigCommands::Validate => {
            let config = config::load_config_from(path).await?.with_env();
            let issues = config.validate();
            for issue in &issues {
                println!("{issue}");
            }
            if !config.is_valid() {
                return Err(CliError::InvalidConfig(format!(
                    "{} has errors",
                    path.display()
                )));
            }
            if issues.is_empty() {
                println!("Configuration is valid");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn first_interrupt_cancels_second_exits() {
        let cancel = CancelSignal::new();
        let seen = AtomicUsize::new(0);

        let exit = watch_interrupts(
            || {
                seen.fetch_add(1, Ordering::SeqCst);
                std::future::ready(Ok(()))
            },
            &cancel,
        )
        .await;

        assert!(exit);
        assert!(cancel.is_cancelled());
        assert_eq!(cancel.reason(), Some("interrupted by user"));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_signal_source_leaves_the_run_alone() {
        let cancel = CancelSignal::new();
        let exit = watch_interrupts(
            || std::future::ready(Err(io::Error::other("no signal handler"))),
            &cancel,
        )
        .await;

        assert!(!exit);
        assert!(!cancel.is_cancelled());
    }

    #[test]
    fn cli_parses_plan_flags() {
        let cli = Cli::try_parse_from([
            "tripcrew",
            "-v",
            "plan",
            "--provider",
            "ollama",
            "--process",
            "hierarchical",
        ])
        .unwrap();
        let Commands::Plan(args) = cli.command else {
            panic!("expected plan");
        };
        assert_eq!(args.provider, Some(ProviderKind::Ollama));
        assert_eq!(args.process, Some(Process::Hierarchical));
        assert!(args.model.is_none());
    }
}
