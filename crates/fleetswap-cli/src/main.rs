use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use tracing::{debug, warn};

use fleetswap_core::{DeploySettings, FleetRole, FleetswapConfig, GatewayKind, format_duration};
use fleetswap_gateway::{CapacityUpdate, CloudGateway, CloudSnapshot, FileGateway, MemoryGateway};
use fleetswap_rollout::{CapacityWait, Orchestrator};

mod commands;
mod output;

use commands::deploy::DeployArgs;
use commands::init::InitArgs;
use output::{OutputFormat, TableReporter};

#[derive(Parser)]
#[command(
    name = "fleetswap",
    about = "fleetswap — Blue/Green deploys for a pair of scaling groups behind one weighted rule",
    version,
    propagate_version = true
)]
struct Cli {
    /// Configuration file (TOML, or JSON with a .json extension)
    #[arg(short, long, global = true, default_value = "fleetswap.toml")]
    config: PathBuf,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a scaffold configuration file
    Init {
        #[arg(long)]
        listener_rule_id: String,
        #[arg(long)]
        blue_fleet: String,
        #[arg(long)]
        blue_target_group: String,
        #[arg(long)]
        green_fleet: String,
        #[arg(long)]
        green_target_group: String,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    #[command(flatten)]
    Fleet(FleetCommand),
}

/// Commands that talk to the cloud through the configured gateway.
#[derive(Subcommand)]
enum FleetCommand {
    /// Show weight, capacity and target health of both fleets
    Status {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Bring up the idling fleet, gate on its health, then swap traffic to it
    Deploy {
        /// Stop after the health gate; leave traffic where it is
        #[arg(long)]
        no_swap: bool,
        /// Keep the old fleet's min capacity after the swap
        #[arg(long)]
        no_cleanup: bool,
        /// Do not drain leftover instances of the idling fleet first
        #[arg(long)]
        skip_pre_cleanup: bool,
        /// Hold traffic at 50/50 for this long during the swap (e.g. "30s")
        #[arg(long, value_parser = commands::parse_hold)]
        hold: Option<Duration>,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Send traffic back to the idling fleet
    Rollback {
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Scale the idling fleet to zero and wait for it to drain
    CleanupIdle,
    /// Exchange blue and green traffic weights
    Swap {
        /// Hold traffic at 50/50 for this long first
        #[arg(long, value_parser = commands::parse_hold)]
        hold: Option<Duration>,
    },
    /// Change the capacity of one fleet; negative values mean "no change"
    SetCapacity {
        #[arg(long)]
        fleet: FleetRole,
        #[arg(long, allow_negative_numbers = true)]
        desired: Option<i64>,
        #[arg(long, allow_negative_numbers = true)]
        min: Option<i64>,
        #[arg(long, allow_negative_numbers = true)]
        max: Option<i64>,
        /// none, drain or provisioned
        #[arg(long, default_value = "none")]
        wait: CapacityWait,
    },
    /// Move scheduled capacity actions from one fleet to another
    MoveScheduledActions {
        /// blue, green, or a fleet name
        #[arg(long)]
        from: String,
        /// blue, green, or a fleet name
        #[arg(long)]
        to: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "fleetswap=debug" } else { "fleetswap=info" };
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match level.parse::<tracing_subscriber::filter::Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(cli).await {
        Ok(()) => {
            output::print_command_succeeded();
            ExitCode::SUCCESS
        }
        Err(e) => {
            output::print_command_failure(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let command = match cli.command {
        Commands::Init {
            listener_rule_id,
            blue_fleet,
            blue_target_group,
            green_fleet,
            green_target_group,
            force,
        } => {
            return commands::init::init(
                &cli.config,
                InitArgs {
                    listener_rule_id,
                    blue_fleet,
                    blue_target_group,
                    green_fleet,
                    green_target_group,
                    force,
                },
            );
        }
        Commands::Fleet(command) => command,
    };

    let config = FleetswapConfig::from_file(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let settings = config.settings()?;
    let gateway = open_gateway(&config, &settings).await?;
    let timeout = settings.command_timeout;
    let mut orchestrator =
        Orchestrator::new(gateway, settings).with_reporter(Arc::new(TableReporter));

    // Prompt before the signal and timeout guards take over the terminal.
    let action = match &command {
        FleetCommand::Deploy { yes: false, .. } => Some("Deploy to the idling fleet"),
        FleetCommand::Rollback { yes: false } => Some("Roll traffic back to the idling fleet"),
        _ => None,
    };
    if let Some(action) = action {
        commands::deploy::confirm_traffic_change(&orchestrator, action).await?;
    }

    tokio::select! {
        result = tokio::time::timeout(timeout, dispatch(&mut orchestrator, command)) => {
            result.map_err(|_| anyhow!("command timed out after {}", format_duration(timeout)))?
        }
        signal = shutdown_signal() => {
            warn!(signal, "signal received, aborting");
            Err(anyhow!("interrupted by {signal}"))
        }
    }
}

/// Resolves with the signal name on Ctrl-C or SIGTERM.
async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}

async fn dispatch(orchestrator: &mut Orchestrator, command: FleetCommand) -> anyhow::Result<()> {
    match command {
        FleetCommand::Status { output } => commands::status::status(orchestrator, output).await,
        FleetCommand::Deploy {
            no_swap,
            no_cleanup,
            skip_pre_cleanup,
            hold,
            ..
        } => {
            commands::deploy::deploy(
                orchestrator,
                DeployArgs {
                    swap: !no_swap,
                    cleanup_before: !skip_pre_cleanup,
                    cleanup_after: !no_cleanup,
                    hold,
                },
            )
            .await
        }
        FleetCommand::Rollback { .. } => commands::deploy::rollback(orchestrator).await,
        FleetCommand::CleanupIdle => commands::capacity::cleanup_idle(orchestrator).await,
        FleetCommand::Swap { hold } => commands::traffic::swap(orchestrator, hold).await,
        FleetCommand::SetCapacity {
            fleet,
            desired,
            min,
            max,
            wait,
        } => {
            let update = CapacityUpdate::from_signed(desired, min, max);
            commands::capacity::set_capacity(orchestrator, fleet, update, wait).await
        }
        FleetCommand::MoveScheduledActions { from, to } => {
            commands::schedule::move_scheduled_actions(orchestrator, &from, &to).await
        }
    }
}

/// The simulated cloud starts out seeded from the configured slots.
async fn open_gateway(
    config: &FleetswapConfig,
    settings: &DeploySettings,
) -> anyhow::Result<Arc<dyn CloudGateway>> {
    let blue = &settings.fleets.blue;
    let green = &settings.fleets.green;
    let seed = CloudSnapshot::seeded(
        &settings.listener_rule_id,
        (blue.fleet_name.as_str(), blue.target_group_id.as_str()),
        (green.fleet_name.as_str(), green.target_group_id.as_str()),
    );

    match config.gateway.kind {
        GatewayKind::Memory => {
            debug!("using in-memory gateway");
            Ok(Arc::new(MemoryGateway::new(seed)))
        }
        GatewayKind::File => {
            let path: &Path = config
                .gateway
                .path
                .as_deref()
                .context("gateway.path is required for the file gateway")?;
            debug!(path = %path.display(), "using file gateway");
            Ok(Arc::new(FileGateway::open_or_seed(path, seed).await?))
        }
    }
}
