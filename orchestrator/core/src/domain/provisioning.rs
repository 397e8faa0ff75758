// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Provisioning Collaborators
//!
//! Narrow contracts for everything the controller treats as a black box:
//! the infrastructure engine (CDK), the cloud control plane queries, remote
//! identity registration and code packaging.
//!
//! Adapters return `anyhow::Result`; the orchestrator wraps failures into
//! `ControllerError::Provisioning` / `ControllerError::Environment` together
//! with the failing step.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::domain::project::{Agent, ModelProvider};
use crate::domain::stack::StackStatus;
use crate::domain::target::AwsDeploymentTarget;

/// Inputs for a deploy or destroy call against one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
    pub target: AwsDeploymentTarget,
    pub stack_names: Vec<String>,
    /// KMS key from identity provisioning, passed through to the template.
    pub kms_key_arn: Option<String>,
}

#[async_trait]
pub trait ProvisioningEngine: Send + Sync {
    /// Install dependencies and compile the provisioning project.
    async fn build(&self) -> anyhow::Result<()>;

    /// Synthesize templates; returns the stack names they define.
    async fn synth(&self, target: &AwsDeploymentTarget) -> anyhow::Result<Vec<String>>;

    /// One-time environment scaffolding for `target`.
    async fn bootstrap(&self, target: &AwsDeploymentTarget) -> anyhow::Result<()>;

    async fn deploy(&self, request: &DeployRequest) -> anyhow::Result<()>;

    async fn destroy(&self, request: &DeployRequest) -> anyhow::Result<()>;

    /// Release engine resources; called once at the end of every run.
    async fn dispose(&self) -> anyhow::Result<()>;
}

/// Read-only queries against the cloud account of a target.
#[async_trait]
pub trait CloudInspector: Send + Sync {
    /// Confirm usable credentials for the target's account.
    async fn validate_credentials(&self, target: &AwsDeploymentTarget) -> anyhow::Result<()>;

    async fn query_bootstrap_status(&self, target: &AwsDeploymentTarget) -> anyhow::Result<bool>;

    /// `None` when the stack does not exist.
    async fn query_stack_status(
        &self,
        region: &str,
        stack_name: &str,
    ) -> anyhow::Result<Option<StackStatus>>;

    async fn fetch_stack_outputs(
        &self,
        region: &str,
        stack_name: &str,
    ) -> anyhow::Result<BTreeMap<String, String>>;
}

/// An API-key credential provider to register remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRegistration {
    pub name: String,
    pub provider: ModelProvider,
    pub api_key: String,
}

#[async_trait]
pub trait IdentityProvisioner: Send + Sync {
    /// Create or update the providers; returns the KMS key protecting them, if any.
    async fn register(
        &self,
        target: &AwsDeploymentTarget,
        credentials: &[CredentialRegistration],
    ) -> anyhow::Result<Option<String>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedArtifact {
    pub agent: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

#[async_trait]
pub trait Packager: Send + Sync {
    async fn package(&self, agent: &Agent) -> anyhow::Result<PackagedArtifact>;
}
