//! fleet-gateway: safety-gated access to a fleet-management API.

mod server;

use anyhow::Context;
use clap::{Parser, Subcommand};
use fleet_tools::{FleetTools, ToolRegistry, TOOLS};
use gateway_config_and_utils::{init_logging, Config};
use gateway_lifecycle::ShutdownGate;
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::BufReader;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "fleet-gateway")]
#[command(about = "Safety-gated gateway to a fleet-management API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error). Overrides LOG_LEVEL.
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Also write JSON logs to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve tool calls as JSON lines over stdin/stdout (default)
    Serve,
    /// Run a single tool call and print its result
    Call {
        /// Tool name, e.g. sites_list
        tool: String,
        /// Tool arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
    /// List available tools
    Tools,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    if let Some(Commands::Tools) = cli.command {
        for spec in TOOLS {
            println!("{:<24} {}", spec.name, spec.description);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = Config::from_env().context("Invalid gateway configuration")?;
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    init_logging(level, cli.log_file);

    info!(
        api = %config.api_base_url,
        rate_limit_per_minute = config.rate_limit_per_minute,
        test_mode = config.safety.test_mode,
        dry_run_by_default = config.safety.dry_run_by_default,
        require_bulk_confirmation = config.safety.require_bulk_confirmation,
        "Configuration loaded"
    );

    let tools = FleetTools::from_config(&config).context("Failed to build API client")?;
    let registry = ToolRegistry::new(tools);

    match cli.command {
        Some(Commands::Call { tool, args }) => {
            let arguments: Value =
                serde_json::from_str(&args).context("--args must be a JSON value")?;
            let result = registry.dispatch(&tool, arguments).await;
            println!("{}", result.text);
            Ok(if result.is_error {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Some(Commands::Serve) | None => {
            run_server(registry).await?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Tools) => Ok(ExitCode::SUCCESS),
    }
}

async fn run_server(registry: ToolRegistry) -> anyhow::Result<()> {
    let gate = ShutdownGate::new();

    let signal_gate = gate.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => signal_gate.begin_shutdown(),
            Err(e) => error!(error = %e, "Failed to listen for Ctrl-C"),
        }
    });

    server::serve(
        registry,
        gate,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await
    .context("Server I/O failed")?;

    info!("Gateway stopped");
    Ok(())
}
