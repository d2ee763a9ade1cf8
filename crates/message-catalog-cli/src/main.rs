// crates/message-catalog-cli/src/main.rs
// ============================================================================
// Module: Message Catalog CLI Entry Point
// Description: Command dispatcher for definitions checks and catalog syncs.
// Purpose: Run catalog configuration from the shell and print JSON results.
// Dependencies: clap, message-catalog-config, message-catalog-core, serde_json, tracing-subscriber.
// ============================================================================

//! ## Overview
//! The message catalog CLI validates definitions documents, runs a catalog
//! sync against the configured store, and prints the persisted catalog. Results
//! go to stdout as JSON; diagnostics go to stderr through `tracing`.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use message_catalog_config::CatalogConfig;
use message_catalog_core::CatalogService;
use message_catalog_core::CatalogSnapshot;
use message_catalog_core::Definitions;
use message_catalog_core::IdentityResolver;
use message_catalog_core::MessageName;
use message_catalog_core::RuntimeSettings;
use message_catalog_core::StoreConnector;
use message_catalog_core::SyncReport;
use serde::Serialize;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: CLI Definitions
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "message-catalog", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse and validate a definitions document.
    Check(CheckCommand),
    /// Configure the catalog against the store and print the sync report.
    Sync(SyncCommand),
    /// Print the persisted catalog without writing to the store.
    Show(ShowCommand),
}

/// Arguments for `check`.
#[derive(Args, Debug)]
struct CheckCommand {
    /// Path to the definitions JSON document.
    #[arg(long, value_name = "PATH")]
    definitions: PathBuf,
}

/// Arguments for `sync`.
#[derive(Args, Debug)]
struct SyncCommand {
    /// Optional config file path (defaults to message-catalog.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Overrides `[definitions].path`.
    #[arg(long, value_name = "PATH")]
    definitions: Option<PathBuf>,
    /// Force-overwrite hard-listed names.
    #[arg(long)]
    hard: bool,
    /// Adds a name to the hard list (repeatable).
    #[arg(long = "hard-list", value_name = "NAME")]
    hard_list: Vec<String>,
    /// Overrides `[project].name`.
    #[arg(long, value_name = "NAME")]
    project: Option<String>,
}

/// Arguments for `show`.
#[derive(Args, Debug)]
struct ShowCommand {
    /// Optional config file path (defaults to message-catalog.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Overrides `[project].name`.
    #[arg(long, value_name = "NAME")]
    project: Option<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying the user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    init_tracing();
    match cli.command {
        Commands::Check(command) => command_check(&command),
        Commands::Sync(command) => command_sync(command),
        Commands::Show(command) => command_show(command),
    }
}

/// Installs the stderr log subscriber (`RUST_LOG`, default `info`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ============================================================================
// SECTION: Check Command
// ============================================================================

/// One entry of the `check` summary.
#[derive(Debug, Serialize)]
struct DefinitionSummary {
    /// Message name.
    name: MessageName,
    /// Number of declared variables.
    variables: usize,
}

/// Output of the `check` command.
#[derive(Debug, Serialize)]
struct CheckOutput {
    /// Number of messages in the document.
    count: usize,
    /// Messages in authored order.
    messages: Vec<DefinitionSummary>,
}

/// Executes the `check` command.
fn command_check(command: &CheckCommand) -> CliResult<ExitCode> {
    let output = check_definitions(&command.definitions)?;
    write_json(&output)?;
    Ok(ExitCode::SUCCESS)
}

/// Loads a definitions document and summarizes it.
fn check_definitions(path: &Path) -> CliResult<CheckOutput> {
    let definitions = Definitions::load(path)
        .map_err(|err| CliError::new(format!("{}: {err}", path.display())))?;
    let messages: Vec<DefinitionSummary> = definitions
        .iter()
        .map(|(name, definition)| DefinitionSummary {
            name: name.clone(),
            variables: definition.variables().len(),
        })
        .collect();
    Ok(CheckOutput {
        count: messages.len(),
        messages,
    })
}

// ============================================================================
// SECTION: Sync Command
// ============================================================================

/// Output of the `sync` command.
#[derive(Debug, Serialize)]
struct SyncOutput<'a> {
    /// What the configuration run changed.
    report: &'a SyncReport,
    /// Catalog served after the run.
    catalog: &'a CatalogSnapshot,
}

/// Executes the `sync` command.
fn command_sync(command: SyncCommand) -> CliResult<ExitCode> {
    let mut config = load_config(command.config.as_deref())?;
    apply_sync_overrides(&mut config, command)?;
    let service = CatalogService::new();
    let report = configure(&service, &config)?;
    let catalog = service.actualize();
    write_json(&SyncOutput {
        report: &report,
        catalog: catalog.as_ref(),
    })?;
    Ok(ExitCode::SUCCESS)
}

/// Applies `sync` flags on top of the loaded configuration.
fn apply_sync_overrides(config: &mut CatalogConfig, command: SyncCommand) -> CliResult<()> {
    if let Some(path) = command.definitions {
        config.definitions.path = path;
    }
    if command.hard {
        config.sync.hard = true;
    }
    config.sync.hard_list.extend(command.hard_list);
    if command.project.is_some() {
        config.project.name = command.project;
    }
    config.validate().map_err(|err| CliError::new(err.to_string()))
}

// ============================================================================
// SECTION: Show Command
// ============================================================================

/// Executes the `show` command.
fn command_show(command: ShowCommand) -> CliResult<ExitCode> {
    let mut config = load_config(command.config.as_deref())?;
    apply_show_overrides(&mut config, command)?;
    let catalog = read_catalog(&config)?;
    write_json(&catalog)?;
    Ok(ExitCode::SUCCESS)
}

/// Applies `show` flags on top of the loaded configuration.
fn apply_show_overrides(config: &mut CatalogConfig, command: ShowCommand) -> CliResult<()> {
    if command.project.is_some() {
        config.project.name = command.project;
    }
    config.validate().map_err(|err| CliError::new(err.to_string()))
}

/// Reads the catalog without writing to the store.
///
/// Offline configs show the local definitions. Otherwise the persisted rows of
/// the project are shown, empty when the project has never been synced.
fn read_catalog(config: &CatalogConfig) -> CliResult<CatalogSnapshot> {
    if config.offline() {
        return Definitions::load(&config.definitions.path)
            .map(|definitions| definitions.to_snapshot())
            .map_err(|err| CliError::new(err.to_string()));
    }
    let project = config.resolve_identity().map_err(|err| CliError::new(err.to_string()))?;
    let store = config.store.connect().map_err(|err| CliError::new(err.to_string()))?;
    let Some(project_id) =
        store.find_project(&project).map_err(|err| CliError::new(err.to_string()))?
    else {
        return Ok(CatalogSnapshot::new());
    };
    let rows = store.list_messages(project_id).map_err(|err| CliError::new(err.to_string()))?;
    Ok(CatalogSnapshot::from_entries(rows))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads the configuration file.
fn load_config(path: Option<&Path>) -> CliResult<CatalogConfig> {
    CatalogConfig::load(path).map_err(|err| CliError::new(err.to_string()))
}

/// Runs catalog configuration using the config as identity and runtime.
fn configure(service: &CatalogService, config: &CatalogConfig) -> CliResult<SyncReport> {
    service
        .configure(config, config, &config.configure_request())
        .map_err(|err| CliError::new(err.to_string()))
}

/// Serializes a value as pretty JSON to stdout.
fn write_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("failed to render output: {err}")))?;
    write_stdout_line(&rendered)
        .map_err(|err| CliError::new(format!("failed to write stdout: {err}")))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
