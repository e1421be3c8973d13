use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::Config;
use stl_viewer_mcp::gateway::{InvocationGateway, InvocationRequest};
use stl_viewer_mcp::protocol::{self, McpHandler};
use stl_viewer_mcp::tools::CapabilityRegistry;

fn setup_logging(level: &str) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stl-viewer-mcp")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("stl-viewer-mcp.log");

    // stdout carries protocol traffic, so logs go to a file
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn build_gateway(config: &Config) -> Result<Arc<InvocationGateway>> {
    let launcher = config.launcher().context("Failed to configure viewer launcher")?;
    info!(
        "Viewer executable: {} (working dir: {})",
        launcher.target().executable.display(),
        launcher.target().working_dir.display()
    );

    let registry = Arc::new(CapabilityRegistry::standard());
    Ok(Arc::new(InvocationGateway::new(registry, Arc::new(launcher))))
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    match &cli.command {
        None | Some(Commands::Serve) => handle_serve_command(config).await,
        Some(Commands::Tools) => handle_tools_command(),
        Some(Commands::Display { file }) => handle_display_command(file, config).await,
    }
}

async fn handle_serve_command(config: &Config) -> Result<()> {
    let gateway = build_gateway(config)?;
    let handler = Arc::new(McpHandler::new(gateway));

    info!("Serving MCP on stdio");
    protocol::serve(tokio::io::stdin(), tokio::io::stdout(), handler)
        .await
        .context("MCP server failed")?;
    info!("Input closed, shutting down");
    Ok(())
}

fn handle_tools_command() -> Result<()> {
    let tools = CapabilityRegistry::standard().list_tools();
    let json = serde_json::to_string_pretty(&tools).context("Failed to serialize tools")?;
    println!("{}", json);
    Ok(())
}

async fn handle_display_command(file: &str, config: &Config) -> Result<()> {
    info!("Displaying model: {}", file);
    let gateway = build_gateway(config)?;

    let outcome = gateway
        .invoke(InvocationRequest::display(file))
        .await
        .context("Invalid display request")?;

    if outcome.success {
        println!("{}", outcome.message.green());
        Ok(())
    } else {
        println!("{}", outcome.message.red());
        Err(eyre::eyre!("Viewer launch failed"))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging once the level is known
    let level = if cli.is_verbose() {
        "debug"
    } else {
        config.log_level.as_deref().unwrap_or("info")
    };
    setup_logging(level).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
