// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Attach commands: give an agent `use` access to a resource another agent
//! owns, or an outbound edge to another agent or tool.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use crate::context::ProjectContext;

#[derive(Subcommand)]
pub enum AttachCommand {
    /// Let an agent read and write another agent's memory
    Memory {
        /// Agent gaining access
        #[arg(long)]
        source: String,

        /// Memory name
        #[arg(long)]
        target: String,
    },

    /// Let an agent use another agent's credential
    Identity {
        #[arg(long)]
        source: String,

        #[arg(long)]
        target: String,
    },

    /// Let an agent call through another agent's gateway
    Gateway {
        #[arg(long)]
        source: String,

        #[arg(long)]
        target: String,
    },

    /// Let an agent invoke another agent
    Agent {
        #[arg(long)]
        source: String,

        #[arg(long)]
        target: String,

        /// Edge name seen by the calling agent (default: Invoke<target>)
        #[arg(long)]
        name: Option<String>,
    },

    /// Let an agent call an MCP tool
    #[command(name = "mcp-tool")]
    McpTool {
        #[arg(long)]
        source: String,

        #[arg(long)]
        target: String,

        /// Edge name seen by the calling agent (default: the tool name)
        #[arg(long)]
        name: Option<String>,
    },
}

pub async fn handle_command(command: AttachCommand, ctx: &ProjectContext) -> Result<()> {
    let service = ctx.resource_service();

    let (kind, source, target) = match command {
        AttachCommand::Memory { source, target } => {
            service.attach_memory(&source, &target).await.context("Failed to attach memory")?;
            ("memory", source, target)
        }
        AttachCommand::Identity { source, target } => {
            service
                .attach_identity(&source, &target)
                .await
                .context("Failed to attach identity")?;
            ("identity", source, target)
        }
        AttachCommand::Gateway { source, target } => {
            service
                .attach_gateway(&source, &target)
                .await
                .context("Failed to attach gateway")?;
            ("gateway", source, target)
        }
        AttachCommand::Agent { source, target, name } => {
            let edge = name.unwrap_or_else(|| format!("Invoke{}", target));
            service
                .attach_agent(&source, &target, &edge)
                .await
                .context("Failed to attach agent")?;
            ("agent", source, target)
        }
        AttachCommand::McpTool { source, target, name } => {
            let edge = name.unwrap_or_else(|| target.clone());
            service
                .attach_mcp_tool(&source, &target, &edge)
                .await
                .context("Failed to attach MCP tool")?;
            ("MCP tool", source, target)
        }
    };

    println!(
        "{}",
        format!("✓ {} '{}' attached to {}", kind, target, source).green()
    );
    Ok(())
}
