//! Pipedrive MCP Server - Rust Implementation
//!
//! A Model Context Protocol (MCP) server for the Pipedrive CRM.
//! Serves Pipedrive tools over stdio to MCP clients.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use pipedrive_mcp_server::config::Config;
use pipedrive_mcp_server::error::Result;
use pipedrive_mcp_server::features::{FeatureConfig, FeatureRegistry};
use pipedrive_mcp_server::mcp::{feature_registry, McpServer, ToolHandler};
use pipedrive_mcp_server::pipedrive::PipedriveClient;

/// Pipedrive MCP Server
#[derive(Parser)]
#[command(name = "pipedrive-mcp-server")]
#[command(author, version, about = "Pipedrive MCP Server - A Model Context Protocol server for Pipedrive CRM")]
struct Cli {
    /// Path of the feature configuration file (overrides FEATURE_CONFIG_PATH)
    #[arg(long, global = true)]
    feature_config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server on stdio (default)
    Serve,

    /// Print the resolved features and their tools
    Features,

    /// Write the resolved feature configuration to disk
    InitFeatures,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging; stdout belongs to the protocol
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let config = match cli.feature_config {
        Some(path) => config.with_feature_config_path(path),
        None => config,
    };

    if let Err(e) = run(cli.command.unwrap_or(Commands::Serve), config).await {
        error!("Fatal error: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: Config) -> Result<()> {
    let feature_config = FeatureConfig::new(&config.feature_config_path);

    match command {
        Commands::Serve => {
            let registry = resolve_features(&feature_config);
            let client = PipedriveClient::new(&config)?;

            // Create and run MCP server
            let mut server = McpServer::new(ToolHandler::new(Arc::new(client), registry));
            server.run_stdio().await?;
        }
        Commands::Features => {
            let registry = resolve_features(&feature_config);
            print!("{}", registry.summary());
        }
        Commands::InitFeatures => {
            let registry = resolve_features(&feature_config);
            feature_config.save(&registry)?;
            eprintln!("Feature configuration written to {}", feature_config.path().display());
        }
    }

    Ok(())
}

fn resolve_features(feature_config: &FeatureConfig) -> FeatureRegistry {
    let mut registry = feature_registry();
    let source = feature_config.load(&mut registry);
    let enabled: Vec<&str> = registry.enabled_features().into_keys().collect();
    info!("Enabled features ({:?}): {}", source, enabled.join(", "));
    registry
}

