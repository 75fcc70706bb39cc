//! Venue-code daemon: serves the REST API or runs one-shot admin commands.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use venue_codes::IssueRequest;
use venue_node::{init_logging, NodeConfig, VenueNode};
use venue_types::VenueCodeId;

#[derive(Parser)]
#[command(name = "venue-daemon", about = "Venue attendance code service")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "VENUE_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for the LMDB environment.
    #[arg(long, env = "VENUE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Interface the REST server binds to.
    #[arg(long, env = "VENUE_RPC_HOST")]
    rpc_host: Option<String>,

    /// REST server port.
    #[arg(long, env = "VENUE_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Enable the Prometheus metrics endpoint.
    #[arg(long, env = "VENUE_ENABLE_METRICS")]
    metrics: bool,

    /// Do not run the periodic sweep in-process (an external scheduler
    /// calls `sweep` instead).
    #[arg(long, env = "VENUE_DISABLE_SWEEPER")]
    disable_sweeper: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "VENUE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "VENUE_LOG_FORMAT")]
    log_format: Option<String>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the REST server and the background sweeper.
    Serve,
    /// Delete expired codes once and exit.
    Sweep,
    /// Administer venue codes.
    Code {
        #[command(subcommand)]
        action: CodeAction,
    },
    /// Check a submitted code against the active one.
    Verify {
        /// The code as typed by the fan.
        code: String,
    },
}

#[derive(clap::Subcommand)]
enum CodeAction {
    /// Issue a code, replacing the active one.
    Create {
        /// Explicit code; omitted draws a random five-digit code.
        #[arg(long)]
        code: Option<String>,
        /// Venue label shown to fans on a match.
        #[arg(long)]
        venue: Option<String>,
        /// Issuing admin.
        #[arg(long)]
        created_by: Option<String>,
    },
    /// List active codes, newest first.
    List,
    /// Delete a code by id.
    Delete { id: String },
}

fn load_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let base = match &cli.config {
        Some(path) => NodeConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => NodeConfig::default(),
    };

    Ok(NodeConfig {
        data_dir: cli.data_dir.clone().unwrap_or(base.data_dir.clone()),
        rpc_host: cli.rpc_host.clone().unwrap_or(base.rpc_host.clone()),
        rpc_port: cli.rpc_port.unwrap_or(base.rpc_port),
        enable_metrics: cli.metrics || base.enable_metrics,
        enable_sweeper: !cli.disable_sweeper && base.enable_sweeper,
        log_level: cli.log_level.clone().unwrap_or(base.log_level.clone()),
        log_format: cli.log_format.clone().unwrap_or(base.log_format.clone()),
        ..base
    })
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(config.log_format(), &config.log_level);

    match cli.command {
        Command::Serve => {
            tracing::info!(
                "Starting venue node (REST:{}, sweeper:{})",
                if config.enable_rpc {
                    format!("{}:{}", config.rpc_host, config.rpc_port)
                } else {
                    "off".into()
                },
                if config.enable_sweeper {
                    format!("every {}s", config.codes.sweep_interval_secs)
                } else {
                    "external".into()
                },
            );
            let mut node = VenueNode::new(config)?;
            node.run().await?;
            tracing::info!("venue daemon exited cleanly");
        }
        Command::Sweep => {
            let node = VenueNode::new(config)?;
            let report = node.sweep_once()?;
            print_json(&serde_json::json!({
                "expiredFound": report.expired_found,
                "deleted": report.deleted,
                "batches": report.batches,
                "failedBatches": report.failed_batches,
            }))?;
        }
        Command::Code { action } => {
            let node = VenueNode::new(config)?;
            match action {
                CodeAction::Create {
                    code,
                    venue,
                    created_by,
                } => {
                    let stored = node.service.create_or_regenerate_code(&IssueRequest {
                        code,
                        venue_name: venue,
                        created_by,
                    })?;
                    print_json(&serde_json::json!({
                        "id": stored.id.to_string(),
                        "code": stored.code,
                        "venueName": stored.venue_name,
                        "createdBy": stored.created_by,
                        "expiresAtMs": stored.expires_at.as_millis(),
                    }))?;
                }
                CodeAction::List => {
                    let codes: Vec<serde_json::Value> = node
                        .service
                        .list_active_codes()?
                        .into_iter()
                        .map(|c| {
                            serde_json::json!({
                                "id": c.id.to_string(),
                                "code": c.code,
                                "venueName": c.venue_name,
                                "expiresAtMs": c.expires_at.as_millis(),
                            })
                        })
                        .collect();
                    print_json(&serde_json::Value::Array(codes))?;
                }
                CodeAction::Delete { id } => {
                    let parsed: VenueCodeId = id.parse()?;
                    let deleted = node.service.delete_code(&parsed)?;
                    print_json(&serde_json::json!({ "id": id, "deleted": deleted }))?;
                }
            }
        }
        Command::Verify { code } => {
            let node = VenueNode::new(config)?;
            let outcome = node.service.verify(&code);
            print_json(&serde_json::json!({
                "match": outcome.matched,
                "venueName": outcome.venue_name,
                "reason": outcome.reason.map(|r| r.as_str()),
            }))?;
        }
    }

    Ok(())
}
