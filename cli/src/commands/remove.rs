// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `remove` command with restrict/cascade policies and dry-run preview.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use agentcore_core::domain::graph::ResourceKind;
use agentcore_core::domain::removal::{RemovalPolicy, RemovalPreview};

use crate::context::ProjectContext;

#[derive(Args)]
pub struct RemoveCommand {
    /// agent, memory, identity, gateway or mcp-tool
    #[arg(value_name = "KIND")]
    kind: ResourceKind,

    #[arg(long)]
    name: String,

    /// restrict refuses while anything references the resource; cascade
    /// removes dependents too
    #[arg(long, default_value = "restrict")]
    policy: RemovalPolicy,

    /// Print what would change without writing
    #[arg(long)]
    dry_run: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    yes: bool,
}

pub async fn handle_command(command: RemoveCommand, ctx: &ProjectContext) -> Result<()> {
    let service = ctx.resource_service();
    let preview = service
        .preview_removal(command.kind, &command.name, command.policy)
        .await
        .context("Failed to plan removal")?;

    print_preview(&preview);
    if command.dry_run {
        println!("{}", "Dry run: nothing written.".dimmed());
        return Ok(());
    }

    if !command.yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("Remove {} '{}'?", command.kind, command.name))
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
        if !confirmed {
            println!("{}", "Cancelled.".yellow());
            return Ok(());
        }
    }

    let plan = service
        .remove(command.kind, &command.name, command.policy)
        .await
        .context("Failed to remove resource")?;
    println!(
        "{}",
        format!("✓ Removed {} resource(s)", plan.removed.len()).green()
    );
    if !plan.removed.is_empty() && command.kind == ResourceKind::Agent {
        println!("  Run 'agentcore deploy' to apply the change remotely.");
    }
    Ok(())
}

fn print_preview(preview: &RemovalPreview) {
    println!("{}", "Planned changes:".bold());
    for line in &preview.summary {
        println!("  - {}", line);
    }
    for change in &preview.changes {
        println!("  {} {}", "modifies".dimmed(), change.path);
    }
}
