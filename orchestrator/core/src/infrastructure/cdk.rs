// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! CDK Provisioning Engine
//!
//! Drives the project's CDK app (`agentcore/cdk`) through the CDK toolkit
//! CLI. The app reads `agentcore.json` itself; this adapter only selects the
//! target environment and the stacks to act on.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::process::CommandLine;
use crate::domain::provisioning::{DeployRequest, ProvisioningEngine};
use crate::domain::target::AwsDeploymentTarget;

const CLOUD_ASSEMBLY_DIR: &str = "cdk.out";

pub struct CdkProvisioningEngine {
    cdk: CommandLine,
    npm: CommandLine,
    project_dir: PathBuf,
}

impl CdkProvisioningEngine {
    pub fn new(cdk_command: &str, project_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            cdk: CommandLine::parse(cdk_command)?,
            npm: CommandLine::parse("npm")?,
            project_dir: project_dir.into(),
        })
    }

    fn target_env(target: &AwsDeploymentTarget) -> Vec<(String, String)> {
        vec![
            ("CDK_DEFAULT_ACCOUNT".to_string(), target.account.clone()),
            ("CDK_DEFAULT_REGION".to_string(), target.region.clone()),
            ("AWS_REGION".to_string(), target.region.clone()),
            ("AGENTCORE_TARGET".to_string(), target.name.clone()),
        ]
    }

    async fn cdk(&self, args: &[&str], target: &AwsDeploymentTarget) -> Result<String> {
        self.cdk
            .run(args, Some(&self.project_dir), &Self::target_env(target))
            .await
    }
}

/// Remove lock files a previous, interrupted toolkit run left in the cloud assembly.
pub fn clean_stale_locks(assembly_dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(assembly_dir) else {
        return 0;
    };
    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("lock") {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => warn!(path = %path.display(), "Failed to remove stale lock: {}", e),
        }
    }
    removed
}

/// Stack names from `cdk list` output, one per line.
fn parse_stack_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        // `cdk list` prints nested-stage stacks as "Stage/Stack (Stage-Stack)"
        .map(|l| match (l.find('('), l.rfind(')')) {
            (Some(open), Some(close)) if close > open => l[open + 1..close].to_string(),
            _ => l.to_string(),
        })
        .collect()
}

#[async_trait]
impl ProvisioningEngine for CdkProvisioningEngine {
    async fn build(&self) -> Result<()> {
        if !self.project_dir.join("package.json").exists() {
            anyhow::bail!(
                "No CDK project found at {} (missing package.json)",
                self.project_dir.display()
            );
        }
        info!(dir = %self.project_dir.display(), "Installing CDK project dependencies");
        self.npm
            .run(&["install", "--no-audit", "--no-fund"], Some(&self.project_dir), &[])
            .await
            .context("npm install failed")?;
        self.npm
            .run(&["run", "build", "--if-present"], Some(&self.project_dir), &[])
            .await
            .context("npm run build failed")?;
        Ok(())
    }

    async fn synth(&self, target: &AwsDeploymentTarget) -> Result<Vec<String>> {
        let removed = clean_stale_locks(&self.project_dir.join(CLOUD_ASSEMBLY_DIR));
        if removed > 0 {
            debug!(removed, "Removed stale cloud assembly locks");
        }

        self.cdk(&["synth", "--quiet"], target)
            .await
            .context("cdk synth failed")?;
        let listing = self.cdk(&["list"], target).await.context("cdk list failed")?;
        let stacks = parse_stack_list(&listing);
        if stacks.is_empty() {
            anyhow::bail!("Synthesis produced no stacks");
        }
        Ok(stacks)
    }

    async fn bootstrap(&self, target: &AwsDeploymentTarget) -> Result<()> {
        let environment = format!("aws://{}/{}", target.account, target.region);
        info!(environment = %environment, "Bootstrapping CDK environment");
        self.cdk(&["bootstrap", &environment], target)
            .await
            .context("cdk bootstrap failed")?;
        Ok(())
    }

    async fn deploy(&self, request: &DeployRequest) -> Result<()> {
        let mut args: Vec<String> = vec!["deploy".into()];
        args.extend(request.stack_names.iter().cloned());
        args.extend(["--require-approval".into(), "never".into()]);
        if let Some(kms) = &request.kms_key_arn {
            args.extend(["--context".into(), format!("kmsKeyArn={}", kms)]);
        }
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.cdk(&args, &request.target)
            .await
            .context("cdk deploy failed")?;
        Ok(())
    }

    async fn destroy(&self, request: &DeployRequest) -> Result<()> {
        let mut args: Vec<&str> = vec!["destroy"];
        args.extend(request.stack_names.iter().map(String::as_str));
        args.push("--force");
        self.cdk(&args, &request.target)
            .await
            .context("cdk destroy failed")?;
        Ok(())
    }

    async fn dispose(&self) -> Result<()> {
        clean_stale_locks(&self.project_dir.join(CLOUD_ASSEMBLY_DIR));
        Ok(())
    }
}
