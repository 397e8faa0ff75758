// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `deploy` and `destroy` commands.
//!
//! Both render pipeline progress with a spinner and print the structured
//! outcome. A failed run exits non-zero after printing the failing step and
//! the run log path.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tracing::debug;

use agentcore_core::domain::deployment::{DeployOptions, DeployOutcome, DeployStep};

use crate::context::ProjectContext;
use crate::progress::TerminalProgress;

#[derive(Args)]
pub struct DeployCommand {
    /// Target to deploy to (default: the first configured target)
    #[arg(long)]
    target: Option<String>,

    /// Bootstrap automatically and confirm a teardown without prompting
    #[arg(short, long)]
    yes: bool,
}

#[derive(Args)]
pub struct DestroyCommand {
    /// Target whose stack is destroyed (default: the first configured target)
    #[arg(long)]
    target: Option<String>,

    /// Skip confirmation prompt
    #[arg(short, long)]
    yes: bool,
}

pub async fn deploy(command: DeployCommand, ctx: &ProjectContext) -> Result<()> {
    let orchestrator = ctx.orchestrator()?;

    let mut teardown_confirmed = command.yes;
    if !teardown_confirmed {
        // a failing preflight is reported by the pipeline itself
        if let Ok(context) = orchestrator.preflight().await {
            if context.is_teardown {
                println!(
                    "{}",
                    "No agents are declared but resources are still deployed.".yellow()
                );
                teardown_confirmed = confirm("Tear down the deployed stack?")?;
                if !teardown_confirmed {
                    println!("{}", "Cancelled.".yellow());
                    return Ok(());
                }
            }
        }
    }

    let options = DeployOptions {
        target: command.target,
        auto_confirm: command.yes,
        teardown_confirmed,
    };
    debug!(?options, "Deploying");

    let progress = TerminalProgress::new(&DeployStep::PIPELINE);
    let outcome = orchestrator.deploy(options, &progress).await;
    progress.finish();
    report(outcome)
}

pub async fn destroy(command: DestroyCommand, ctx: &ProjectContext) -> Result<()> {
    let orchestrator = ctx.orchestrator()?;

    let target_label = command.target.as_deref().unwrap_or("the default target");
    let confirmed = command.yes
        || confirm(&format!(
            "Destroy every deployed resource on {}?",
            target_label
        ))?;
    if !confirmed {
        println!("{}", "Cancelled.".yellow());
        return Ok(());
    }

    let progress = TerminalProgress::new(&DeployStep::DESTROY_PIPELINE);
    let outcome = orchestrator.destroy(command.target, confirmed, &progress).await;
    progress.finish();
    report(outcome)
}

fn confirm(prompt: &str) -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context("Failed to read confirmation")
}

fn report(outcome: DeployOutcome) -> Result<()> {
    match outcome {
        DeployOutcome::Succeeded(success) => {
            if success.teardown {
                println!(
                    "{}",
                    format!("✓ Stack {} torn down on {}", success.stack_name, success.target)
                        .green()
                        .bold()
                );
            } else {
                println!(
                    "{}",
                    format!("✓ Deployed {} to {}", success.stack_name, success.target)
                        .green()
                        .bold()
                );
                for (key, value) in &success.outputs {
                    println!("  {:<40} {}", key, value);
                }
            }
            println!("  Log: {}", success.log_path.display().to_string().dimmed());

            if !success.next_steps.is_empty() {
                println!();
                println!("{}", "Next steps:".bold());
                for step in &success.next_steps {
                    println!("  {}", step);
                }
            }
            Ok(())
        }
        DeployOutcome::Failed(failure) => {
            eprintln!("{}", format!("✗ {} failed", failure.step).red().bold());
            eprintln!("  {}", failure.message);
            if let Some(path) = &failure.log_path {
                eprintln!("  Log: {}", path.display());
            }
            std::process::exit(1);
        }
    }
}
