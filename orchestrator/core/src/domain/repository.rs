// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contracts for the three project documents and the local
//! secret store. Interfaces live in the domain layer and are implemented in
//! `crate::infrastructure::repositories`.
//!
//! | Trait | Document | File-backed implementation |
//! |-------|----------|----------------------------|
//! | `ProjectRepository` | `agentcore.json` | `JsonProjectRepository` |
//! | `TargetRepository` | `aws-targets.json` | `JsonTargetRepository` |
//! | `DeployedStateRepository` | `.cli/deployed-state.json` | `JsonDeployedStateRepository` |
//! | `SecretStore` | `.env.local` | `DotenvSecretStore` |
//!
//! Each has an `InMemory*` counterpart for tests.
//!
//! Every write validates before it touches disk; a failed write leaves the
//! previous document in place.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::domain::deployed_state::{DeployedState, TargetState};
use crate::domain::error::ControllerResult;
use crate::domain::project::Project;
use crate::domain::target::AwsDeploymentTarget;

/// Repository for the declarative spec.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Read and validate the spec. Missing → `NotFound`, undecodable → `Parse`.
    async fn read(&self) -> ControllerResult<Project>;

    /// Validate and persist the spec.
    async fn write(&self, project: &Project) -> ControllerResult<()>;

    /// Where the document lives, for previews and messages.
    fn location(&self) -> String;
}

/// Repository for the deployment-target list.
#[async_trait]
pub trait TargetRepository: Send + Sync {
    /// Read all targets; an absent document is an empty list.
    async fn read(&self) -> ControllerResult<Vec<AwsDeploymentTarget>>;

    async fn write(&self, targets: &[AwsDeploymentTarget]) -> ControllerResult<()>;
}

/// Repository for per-target deployed identifiers.
#[async_trait]
pub trait DeployedStateRepository: Send + Sync {
    /// Read the state; an absent document is the empty state.
    async fn read(&self) -> ControllerResult<DeployedState>;

    /// Replace `targets[target]` only.
    async fn merge_target(&self, target: &str, state: TargetState) -> ControllerResult<()>;

    /// Drop `targets[target]`, leaving the rest untouched.
    async fn clear_target(&self, target: &str) -> ControllerResult<()>;
}

/// Local-only credential secrets keyed by environment-variable name.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn load(&self) -> ControllerResult<BTreeMap<String, String>>;

    async fn save(&self, secrets: &BTreeMap<String, String>) -> ControllerResult<()>;

    fn location(&self) -> String;
}
