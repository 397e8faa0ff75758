// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Deployment pipeline vocabulary: the ordered step list, progress reporting
//! and the structured outcome handed back to the CLI.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::domain::project::Project;
use crate::domain::target::AwsDeploymentTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeployStep {
    ResolveTarget,
    Preflight,
    ValidateCredentials,
    Package,
    Build,
    Synthesize,
    Bootstrap,
    StackStatus,
    ProvisionIdentity,
    Deploy,
    ParseOutputs,
    PersistState,
    Destroy,
}

impl DeployStep {
    /// Every step of a deploy, in execution order.
    pub const PIPELINE: [DeployStep; 12] = [
        DeployStep::ResolveTarget,
        DeployStep::Preflight,
        DeployStep::ValidateCredentials,
        DeployStep::Package,
        DeployStep::Build,
        DeployStep::Synthesize,
        DeployStep::Bootstrap,
        DeployStep::StackStatus,
        DeployStep::ProvisionIdentity,
        DeployStep::Deploy,
        DeployStep::ParseOutputs,
        DeployStep::PersistState,
    ];

    /// Steps of `destroy`. Synthesis happens inside the engine's destroy call.
    pub const DESTROY_PIPELINE: [DeployStep; 5] = [
        DeployStep::ResolveTarget,
        DeployStep::ValidateCredentials,
        DeployStep::Build,
        DeployStep::Destroy,
        DeployStep::PersistState,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DeployStep::ResolveTarget => "Resolve deployment target",
            DeployStep::Preflight => "Preflight checks",
            DeployStep::ValidateCredentials => "Validate AWS credentials",
            DeployStep::Package => "Package agent code",
            DeployStep::Build => "Build provisioning project",
            DeployStep::Synthesize => "Synthesize templates",
            DeployStep::Bootstrap => "Check environment bootstrap",
            DeployStep::StackStatus => "Check stack status",
            DeployStep::ProvisionIdentity => "Provision credential providers",
            DeployStep::Deploy => "Deploy stack",
            DeployStep::ParseOutputs => "Read stack outputs",
            DeployStep::PersistState => "Save deployed state",
            DeployStep::Destroy => "Destroy stack",
        }
    }
}

impl fmt::Display for DeployStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StepStatus {
    Start,
    Success,
    Skipped { reason: String },
    Error { message: String },
}

/// Receives step transitions while a pipeline runs.
pub trait DeployProgress: Send + Sync {
    fn on_step(&self, step: DeployStep, status: &StepStatus);
}

pub struct NoopProgress;

impl DeployProgress for NoopProgress {
    fn on_step(&self, _step: DeployStep, _status: &StepStatus) {}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployOptions {
    /// Target to deploy to; the first configured target when absent.
    pub target: Option<String>,
    /// Pre-confirmed: bootstrap automatically when needed.
    pub auto_confirm: bool,
    /// The caller confirmed tearing down remote resources.
    pub teardown_confirmed: bool,
}

/// Everything preflight validated, consumed by the rest of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreflightContext {
    pub project: Project,
    pub targets: Vec<AwsDeploymentTarget>,
    pub is_teardown: bool,
}

/// Suggested follow-ups printed after a successful deploy.
pub const NEXT_STEPS: [&str; 3] = [
    "agentcore status          # inspect deployed runtimes",
    "agentcore invoke <agent>  # send a test prompt",
    "agentcore logs <agent>    # tail runtime logs",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploySuccess {
    pub target: String,
    pub stack_name: String,
    pub outputs: BTreeMap<String, String>,
    pub log_path: PathBuf,
    pub next_steps: Vec<String>,
    pub teardown: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployFailure {
    pub step: DeployStep,
    pub message: String,
    pub log_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    Succeeded(DeploySuccess),
    Failed(DeployFailure),
}

impl DeployOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DeployOutcome::Succeeded(_))
    }

    pub fn log_path(&self) -> Option<&PathBuf> {
        match self {
            DeployOutcome::Succeeded(s) => Some(&s.log_path),
            DeployOutcome::Failed(f) => f.log_path.as_ref(),
        }
    }
}
