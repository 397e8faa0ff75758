// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! External command execution shared by the CLI-backed adapters.

use anyhow::{Context, Result};
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// A configured command line such as `npx cdk`, split into program and leading args.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    base_args: Vec<String>,
}

impl CommandLine {
    pub fn parse(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .with_context(|| format!("Empty command line: '{}'", line))?;
        Ok(Self {
            program,
            base_args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run to completion and return stdout. A non-zero exit is an error carrying stderr.
    pub async fn run(
        &self,
        args: &[&str],
        cwd: Option<&Path>,
        envs: &[(String, String)],
    ) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.base_args).args(args);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in envs {
            cmd.env(key, value);
        }

        debug!(program = %self.program, ?args, "Running external command");
        let output = cmd
            .output()
            .await
            .with_context(|| format!("Failed to start '{}'", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "'{} {}' exited with {}: {}",
                self.program,
                args.join(" "),
                output.status,
                stderr.trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
