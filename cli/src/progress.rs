// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Terminal rendering of pipeline progress.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use agentcore_core::domain::deployment::{DeployProgress, DeployStep, StepStatus};

pub struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    pub fn new(steps: &[DeployStep]) -> Self {
        let bar = ProgressBar::new(steps.len() as u64);
        let style = ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl DeployProgress for TerminalProgress {
    fn on_step(&self, step: DeployStep, status: &StepStatus) {
        match status {
            StepStatus::Start => self.bar.set_message(step.label()),
            StepStatus::Success => {
                self.bar.println(format!("{} {}", "✓".green(), step.label()));
                self.bar.inc(1);
            }
            StepStatus::Skipped { reason } => {
                self.bar
                    .println(format!("- {} ({})", step.label(), reason).dimmed().to_string());
                self.bar.inc(1);
            }
            StepStatus::Error { .. } => {
                self.bar.println(format!("{} {}", "✗".red(), step.label()));
            }
        }
    }
}
