//! Command-line runner for the reference app UI scenarios.
//!
//! # Usage
//!
//! ```bash
//! # Run every scenario against the booted simulator
//! refui run
//!
//! # Run two scenarios, stopping each at its first failure
//! refui run initial_layout generate_value --stop-on-failure
//!
//! # Keep failure records and screenshots, and write JUnit XML for CI
//! refui run --report-dir target/refui --junit target/refui/junit.xml
//!
//! # Target a specific simulator and app
//! refui run --udid A1B2C3D4-... --bundle-id com.example.Reference
//!
//! # Machine-readable results
//! refui --format json run
//!
//! # List scenarios, simulators, and the effective configuration
//! refui list
//! refui devices
//! refui config
//!
//! # Persist a setting in ~/.refui/config.json
//! refui config --bundle-id com.example.Reference --save
//! ```
//!
//! Exit status is 0 when every scenario passed, 1 when any failed and 2 when
//! the run could not start (bad arguments, config, or simulator setup).

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use refui_core::axe::Axe;
use refui_core::config::RefuiConfig;
use refui_core::driver::AutomationDriver;
use refui_core::report::{console, junit, FanoutReporter, JsonlReporter, TracingReporter};
use refui_core::runner::{ScenarioRunner, SuiteReport};
use refui_core::scenario::Scenario;
use refui_core::simctl::Simctl;
use refui_core::simulator::SimulatorDriver;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Run end-to-end UI scenarios for the reference iOS app.
#[derive(Parser)]
#[command(name = "refui")]
#[command(about = "Run the reference app UI scenarios on the iOS Simulator")]
#[command(version)]
struct Cli {
    /// Output format: text or json
    #[arg(short, long, default_value = "text", global = true)]
    format: OutputFormat,

    /// Config file (defaults to ~/.refui/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Run scenarios (all of them when none are named)
    Run {
        /// Scenario names, see `refui list`
        scenarios: Vec<String>,

        #[command(flatten)]
        overrides: Overrides,

        /// Stop a scenario at its first failure
        #[arg(long)]
        stop_on_failure: bool,

        /// Directory for failures.jsonl and failure screenshots
        #[arg(long)]
        report_dir: Option<PathBuf>,

        /// Write a JUnit XML report to this path
        #[arg(long)]
        junit: Option<PathBuf>,
    },

    /// List the available scenarios
    List,

    /// List simulator devices
    Devices,

    /// Print the effective configuration
    Config {
        #[command(flatten)]
        overrides: Overrides,

        /// Write the effective configuration back to the config file
        #[arg(long)]
        save: bool,
    },
}

/// Settings that override the config file.
#[derive(clap::Args)]
struct Overrides {
    /// Bundle identifier of the app under test
    #[arg(short, long, env = "REFUI_BUNDLE_ID")]
    bundle_id: Option<String>,

    /// Simulator UDID (defaults to the booted simulator)
    #[arg(short, long, env = "REFUI_UDID")]
    udid: Option<String>,

    /// Element wait budget in milliseconds
    #[arg(short, long, env = "REFUI_WAIT_MS")]
    wait_ms: Option<u64>,
}

impl Overrides {
    fn apply(&self, config: &mut RefuiConfig) {
        if let Some(bundle_id) = &self.bundle_id {
            config.bundle_id = bundle_id.clone();
        }
        if let Some(udid) = &self.udid {
            config.udid = Some(udid.clone());
        }
        if let Some(wait_ms) = self.wait_ms {
            config.wait_timeout_ms = wait_ms;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    match &cli.log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            let dir = dir.unwrap_or_else(|| std::path::Path::new("."));
            let name = path
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("refui.log"));
            let file_appender = tracing_appender::rolling::never(dir, name);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file_appender)
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

#[derive(Debug)]
enum CliError {
    Usage(String),
    Config(String),
    Setup(String),
    Output(String),
    ScenariosFailed { failed: usize, total: usize },
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::ScenariosFailed { .. } => ExitCode::from(1),
            CliError::Usage(_)
            | CliError::Config(_)
            | CliError::Setup(_)
            | CliError::Output(_) => ExitCode::from(2),
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{}", msg),
            CliError::Config(msg) => write!(f, "Config error: {}", msg),
            CliError::Setup(msg) => write!(f, "Setup failed: {}", msg),
            CliError::Output(msg) => write!(f, "Output error: {}", msg),
            CliError::ScenariosFailed { failed, total } => {
                write!(f, "{} of {} scenario(s) failed", failed, total)
            }
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<RefuiConfig, CliError> {
    match path {
        Some(path) => RefuiConfig::load_from(path).map_err(|e| CliError::Config(e.to_string())),
        None => Ok(RefuiConfig::load()),
    }
}

fn select_scenarios(names: &[String]) -> Result<Vec<Scenario>, CliError> {
    if names.is_empty() {
        return Ok(Scenario::all().to_vec());
    }
    names
        .iter()
        .map(|name| name.parse::<Scenario>().map_err(CliError::Usage))
        .collect()
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(|e| CliError::Output(e.to_string()))
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::List => {
            if cli.format == OutputFormat::Json {
                let scenarios: Vec<_> = Scenario::all()
                    .iter()
                    .map(|s| {
                        serde_json::json!({ "name": s.name(), "description": s.description() })
                    })
                    .collect();
                println!("{}", to_json(&scenarios)?);
            } else {
                for scenario in Scenario::all() {
                    println!("{:<30} {}", scenario.name(), scenario.description());
                }
            }
            Ok(())
        }
        Command::Devices => {
            let devices = Simctl::list_devices()
                .map_err(|e| CliError::Setup(format!("Failed to list devices: {}", e)))?;
            if cli.format == OutputFormat::Json {
                println!("{}", to_json(&devices)?);
            } else if devices.is_empty() {
                eprintln!("No simulator devices found");
            } else {
                for device in &devices {
                    let state = if device.state == "Booted" {
                        " (Booted)"
                    } else {
                        ""
                    };
                    println!("{} -- {}{}", device.udid, device.name, state);
                }
            }
            Ok(())
        }
        Command::Config { ref overrides, save } => {
            let mut config = load_config(cli.config.as_ref())?;
            overrides.apply(&mut config);
            if save {
                let saved = match &cli.config {
                    Some(path) => config.save_to(path),
                    None => config.save(),
                };
                saved.map_err(|e| CliError::Config(e.to_string()))?;
                info!("configuration saved");
            }
            println!("{}", to_json(&config)?);
            Ok(())
        }
        Command::Run {
            ref scenarios,
            ref overrides,
            stop_on_failure,
            ref report_dir,
            junit: ref junit_path,
        } => {
            let selected = select_scenarios(scenarios)?;
            let mut config = load_config(cli.config.as_ref())?;
            overrides.apply(&mut config);
            if stop_on_failure {
                config.continue_after_failure = false;
            }
            if let Some(dir) = report_dir {
                config.report_dir = Some(dir.clone());
            }

            let suite = run_scenarios(&config, &selected).await?;

            if cli.format == OutputFormat::Json {
                println!("{}", to_json(&suite)?);
            } else {
                print!("{}", console::render(&suite));
            }
            if let Some(path) = junit_path {
                std::fs::write(path, junit::render(&suite)).map_err(|e| {
                    CliError::Output(format!("cannot write {}: {}", path.display(), e))
                })?;
            }

            if suite.passed() {
                Ok(())
            } else {
                Err(CliError::ScenariosFailed {
                    failed: suite.failed_count(),
                    total: suite.total(),
                })
            }
        }
    }
}

async fn run_scenarios(
    config: &RefuiConfig,
    scenarios: &[Scenario],
) -> Result<SuiteReport, CliError> {
    if !Axe::is_installed() {
        return Err(CliError::Setup(
            "axe tool not found - install with: brew install cameroncooke/axe/axe".to_string(),
        ));
    }
    let driver = SimulatorDriver::from_config(config.driver_config())
        .map_err(|e| CliError::Setup(e.to_string()))?;
    info!(
        udid = driver.udid(),
        bundle_id = driver.bundle_id(),
        "running {} scenario(s)",
        scenarios.len()
    );

    let mut reporter = FanoutReporter::new().with(TracingReporter);
    if let Some(dir) = &config.report_dir {
        let jsonl = JsonlReporter::create(dir).map_err(|e| {
            CliError::Setup(format!("cannot open report dir {}: {}", dir.display(), e))
        })?;
        reporter = reporter.with(jsonl);
    }

    let runner = ScenarioRunner::new(config.runner_config(), Arc::new(reporter))
        .with_expectations(config.expectations.clone());
    let suite = runner
        .run_suite(scenarios, || Ok(Box::new(driver.clone()) as Box<dyn AutomationDriver>))
        .await;
    Ok(suite)
}
