// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # AgentCore CLI
//!
//! The `agentcore` binary manages a declarative AgentCore project: the
//! agents and resources it contains, the AWS targets it deploys to, and the
//! deploy/teardown lifecycle against those targets.
//!
//! ## Commands
//!
//! - `agentcore init` - Create an empty project spec
//! - `agentcore add agent|memory|identity|gateway|mcp-tool|target` - Declare resources
//! - `agentcore attach memory|identity|gateway|agent|mcp-tool` - Share resources between agents
//! - `agentcore remove <kind> --name <name> [--policy restrict|cascade] [--dry-run]`
//! - `agentcore deploy [--target] [--yes]` / `agentcore destroy [--target] [--yes]`
//! - `agentcore status` / `agentcore validate`

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use agentcore_orchestrator::commands::{
    self, AddCommand, AttachCommand, DeployCommand, DestroyCommand, RemoveCommand,
};
use agentcore_orchestrator::context::ProjectContext;

/// AgentCore project controller - declare, deploy and tear down agents
#[derive(Parser)]
#[command(name = "agentcore")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project root (default: working directory)
    #[arg(long, global = true, env = "AGENTCORE_PROJECT_DIR", value_name = "DIR")]
    project_dir: Option<PathBuf>,

    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "AGENTCORE_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "AGENTCORE_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty project spec
    Init {
        #[arg(long)]
        name: String,
    },

    /// Declare an agent, resource or deployment target
    Add {
        #[command(subcommand)]
        command: AddCommand,
    },

    /// Share a resource with another agent
    Attach {
        #[command(subcommand)]
        command: AttachCommand,
    },

    /// Remove a resource
    Remove(RemoveCommand),

    /// Deploy the project to a target
    Deploy(DeployCommand),

    /// Destroy a target's deployed stack
    Destroy(DestroyCommand),

    /// Show declared agents and deployed state
    Status,

    /// Validate the project documents
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    let Some(command) = cli.command else {
        eprintln!("{}", "No command specified. Use --help for usage.".yellow());
        std::process::exit(1);
    };

    let ctx = ProjectContext::load(cli.project_dir, cli.config)?;

    match command {
        Commands::Init { name } => commands::status::init(name, &ctx).await,
        Commands::Add { command } => commands::add::handle_command(command, &ctx).await,
        Commands::Attach { command } => commands::attach::handle_command(command, &ctx).await,
        Commands::Remove(command) => commands::remove::handle_command(command, &ctx).await,
        Commands::Deploy(command) => commands::deploy::deploy(command, &ctx).await,
        Commands::Destroy(command) => commands::deploy::destroy(command, &ctx).await,
        Commands::Status => commands::status::status(&ctx).await,
        Commands::Validate => commands::status::validate(&ctx).await,
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
