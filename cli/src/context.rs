// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Project context
//!
//! Resolves the project root and controller configuration once per
//! invocation and assembles the core services from them.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use agentcore_core::application::deploy::{DeploymentDependencies, DeploymentOrchestrator};
use agentcore_core::application::resources::ResourceService;
use agentcore_core::domain::config::{ControllerConfig, ProjectLayout};
use agentcore_core::infrastructure::repositories::{
    JsonDeployedStateRepository, JsonProjectRepository, JsonTargetRepository,
};
use agentcore_core::infrastructure::{
    AwsCliIdentityProvisioner, AwsCliInspector, CdkProvisioningEngine, DirectoryPackager,
    DotenvSecretStore,
};

pub struct ProjectContext {
    pub layout: ProjectLayout,
    pub config: ControllerConfig,
}

impl ProjectContext {
    /// `project_dir` defaults to the working directory.
    pub fn load(project_dir: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<Self> {
        let root = match project_dir {
            Some(dir) => dir,
            None => std::env::current_dir().context("Failed to read working directory")?,
        };
        let config =
            ControllerConfig::load_or_default(config_path).context("Failed to load configuration")?;
        config.validate().context("Invalid configuration")?;
        debug!(root = %root.display(), "Resolved project root");

        Ok(Self {
            layout: ProjectLayout::new(root),
            config,
        })
    }

    pub fn projects(&self) -> Arc<JsonProjectRepository> {
        Arc::new(JsonProjectRepository::new(self.layout.spec_path()))
    }

    pub fn deployed_state(&self) -> Arc<JsonDeployedStateRepository> {
        Arc::new(JsonDeployedStateRepository::new(self.layout.deployed_state_path()))
    }

    pub fn resource_service(&self) -> ResourceService {
        ResourceService::new(
            self.projects(),
            Arc::new(JsonTargetRepository::new(self.layout.targets_path())),
            Arc::new(DotenvSecretStore::new(self.layout.secrets_path())),
        )
    }

    pub fn orchestrator(&self) -> Result<DeploymentOrchestrator> {
        let cdk_dir = self.layout.resolve(&self.config.cdk_project_dir);
        let engine = CdkProvisioningEngine::new(&self.config.cdk_command, cdk_dir)
            .context("Failed to configure CDK command")?;
        let inspector = AwsCliInspector::new(&self.config.aws_command)
            .context("Failed to configure AWS command")?;
        let identity = AwsCliIdentityProvisioner::new(&self.config.aws_command)
            .context("Failed to configure AWS command")?;

        let deps = DeploymentDependencies {
            projects: self.projects(),
            targets: Arc::new(JsonTargetRepository::new(self.layout.targets_path())),
            deployed_state: self.deployed_state(),
            secrets: Arc::new(DotenvSecretStore::new(self.layout.secrets_path())),
            engine: Arc::new(engine),
            inspector: Arc::new(inspector),
            identity: Arc::new(identity),
            packager: Arc::new(DirectoryPackager::new(self.layout.root())),
        };
        Ok(DeploymentOrchestrator::new(
            deps,
            self.layout.root(),
            self.layout.resolve(&self.config.log_dir),
        ))
    }
}
