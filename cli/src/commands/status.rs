// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Read-only project commands: init, status, validate.

use anyhow::{Context, Result};
use colored::Colorize;

use agentcore_core::domain::project::{Project, Relation};
use agentcore_core::domain::repository::{DeployedStateRepository, ProjectRepository};

use crate::context::ProjectContext;

/// Write an empty spec for a new project.
pub async fn init(name: String, ctx: &ProjectContext) -> Result<()> {
    let spec_path = ctx.layout.spec_path();
    if spec_path.exists() {
        anyhow::bail!("Project already initialized: {}", spec_path.display());
    }
    ctx.projects()
        .write(&Project::new(&name))
        .await
        .context("Failed to create project")?;
    println!("{}", format!("✓ Project '{}' created", name).green());
    println!("  Spec: {}", spec_path.display());
    println!("  Next: agentcore add agent --name <Name>");
    Ok(())
}

pub async fn status(ctx: &ProjectContext) -> Result<()> {
    let project = ctx.projects().read().await.context("Failed to read project")?;
    let state = ctx
        .deployed_state()
        .read()
        .await
        .context("Failed to read deployed state")?;

    println!("{} {}", "Project:".bold(), project.name);
    println!();

    if project.agents.is_empty() {
        println!("{}", "No agents declared".yellow());
    } else {
        println!("{:<24} {:<10} {:<10} {}", "AGENT", "BUILD", "PROVIDER", "RESOURCES");
        for agent in &project.agents {
            let owned = agent
                .memory_providers
                .iter()
                .filter(|m| m.relation == Relation::Own)
                .count()
                + agent.owned_identities().count()
                + agent
                    .mcp_providers
                    .iter()
                    .filter(|m| m.relation == Relation::Own)
                    .count();
            println!(
                "{:<24} {:<10} {:<10} {} owned, {} edges",
                agent.name.bold(),
                agent.build,
                agent.model_provider,
                owned,
                agent.remote_tools.len()
            );
        }
    }
    println!();

    if state.is_empty() {
        println!("{}", "Nothing deployed".dimmed());
        return Ok(());
    }
    for (target, entry) in &state.targets {
        println!(
            "{} {} ({})",
            "Target:".bold(),
            target,
            entry.resources.stack_name
        );
        for (agent, deployed) in &entry.resources.agents {
            println!("  {:<22} {}", agent, deployed.runtime_arn);
        }
    }
    Ok(())
}

pub async fn validate(ctx: &ProjectContext) -> Result<()> {
    println!("Validating project...");
    let violations = ctx
        .resource_service()
        .check()
        .await
        .context("Project failed validation")?;

    if violations.is_empty() {
        println!("{}", "✓ Project is valid".green());
        return Ok(());
    }
    for violation in &violations {
        println!("  {} {}", "✗".red(), violation);
    }
    anyhow::bail!("{} integrity problem(s) found", violations.len())
}
