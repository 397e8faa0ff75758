// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Deployment Preflight
//!
//! Linear checks run before anything touches the provisioning engine. Each
//! stage fails fast; the container check aggregates every violation first.
//!
//! 1. Load the spec and targets, detecting a teardown deploy
//! 2. Runtime naming limits
//! 3. Container build prerequisites
//! 4. Cloud credentials (a separate call, deferred for teardown deploys until
//!    the caller has confirmed)

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::deployment::PreflightContext;
use crate::domain::error::{ControllerError, ControllerResult};
use crate::domain::project::{
    runtime_name, BuildKind, Project, CONTAINER_BUILD_DESCRIPTOR, RUNTIME_NAME_LIMIT,
};
use crate::domain::provisioning::CloudInspector;
use crate::domain::repository::{DeployedStateRepository, ProjectRepository, TargetRepository};
use crate::domain::target::AwsDeploymentTarget;

pub struct DeploymentPreflight {
    projects: Arc<dyn ProjectRepository>,
    targets: Arc<dyn TargetRepository>,
    deployed_state: Arc<dyn DeployedStateRepository>,
    inspector: Arc<dyn CloudInspector>,
    project_root: PathBuf,
}

impl DeploymentPreflight {
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        targets: Arc<dyn TargetRepository>,
        deployed_state: Arc<dyn DeployedStateRepository>,
        inspector: Arc<dyn CloudInspector>,
        project_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            projects,
            targets,
            deployed_state,
            inspector,
            project_root: project_root.into(),
        }
    }

    /// Stages 1-3.
    pub async fn run(&self) -> ControllerResult<PreflightContext> {
        let project = self.projects.read().await?;
        let targets = self.targets.read().await?;

        let is_teardown = if project.agents.is_empty() {
            let state = self.deployed_state.read().await?;
            if state.is_empty() {
                return Err(ControllerError::validation(
                    "agents",
                    "no agents declared; add one with `agentcore add agent` before deploying",
                ));
            }
            info!(
                targets = state.targets.len(),
                "No agents declared but resources are deployed; treating as teardown"
            );
            true
        } else {
            false
        };

        check_naming_limits(&project)?;
        check_container_prerequisites(&project, &self.project_root)?;

        debug!(
            project = %project.name,
            agents = project.agents.len(),
            is_teardown,
            "Preflight passed"
        );
        Ok(PreflightContext {
            project,
            targets,
            is_teardown,
        })
    }

    /// Stage 4.
    pub async fn validate_credentials(&self, target: &AwsDeploymentTarget) -> ControllerResult<()> {
        self.inspector
            .validate_credentials(target)
            .await
            .map_err(|e| ControllerError::Environment(format!("{:#}", e)))
    }
}

/// Pick the named target, or the first configured one.
pub fn resolve_target(
    targets: &[AwsDeploymentTarget],
    name: Option<&str>,
) -> ControllerResult<AwsDeploymentTarget> {
    match name {
        Some(name) => targets
            .iter()
            .find(|t| t.name == name)
            .cloned()
            .ok_or_else(|| ControllerError::not_found("Deployment target", name)),
        None => targets.first().cloned().ok_or_else(|| {
            ControllerError::validation(
                "targets",
                "no deployment targets configured; add one with `agentcore add target`",
            )
        }),
    }
}

pub fn check_naming_limits(project: &Project) -> ControllerResult<()> {
    for agent in &project.agents {
        let name = runtime_name(&project.name, &agent.name);
        let length = name.chars().count();
        if length > RUNTIME_NAME_LIMIT {
            return Err(ControllerError::NamingLimit {
                name,
                length,
                limit: RUNTIME_NAME_LIMIT,
            });
        }
    }
    Ok(())
}

/// Every container agent needs a build descriptor at its code location.
pub fn check_container_prerequisites(
    project: &Project,
    project_root: &Path,
) -> ControllerResult<()> {
    let violations: Vec<String> = project
        .agents
        .iter()
        .filter(|a| a.build == BuildKind::Container)
        .filter_map(|a| {
            let descriptor = project_root.join(&a.code_location).join(CONTAINER_BUILD_DESCRIPTOR);
            (!descriptor.is_file()).then(|| {
                format!(
                    "agent '{}': {} not found at {}",
                    a.name,
                    CONTAINER_BUILD_DESCRIPTOR,
                    descriptor.display()
                )
            })
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ControllerError::Prerequisite { violations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::project::Agent;
    use tempfile::TempDir;

    #[test]
    fn test_naming_limit_boundary() {
        let mut project = Project::new("Shop");
        // "Shop_" + 43 chars = 48
        project.agents.push(Agent::new("A".repeat(43), BuildKind::CodeZip, "app/A"));
        assert!(check_naming_limits(&project).is_ok());

        project.agents.push(Agent::new("B".repeat(44), BuildKind::CodeZip, "app/B"));
        match check_naming_limits(&project) {
            Err(ControllerError::NamingLimit { length, limit, .. }) => {
                assert_eq!(length, 49);
                assert_eq!(limit, RUNTIME_NAME_LIMIT);
            }
            other => panic!("expected naming limit error, got {:?}", other),
        }
    }

    #[test]
    fn test_container_violations_are_aggregated() {
        let dir = TempDir::new().unwrap();
        let mut project = Project::new("Shop");
        project.agents.push(Agent::new("One", BuildKind::Container, "app/One"));
        project.agents.push(Agent::new("Two", BuildKind::Container, "app/Two"));
        project.agents.push(Agent::new("Three", BuildKind::Container, "app/Three"));
        project.agents.push(Agent::new("Zip", BuildKind::CodeZip, "app/Zip"));
        std::fs::create_dir_all(dir.path().join("app/Two")).unwrap();
        std::fs::write(dir.path().join("app/Two/Dockerfile"), "FROM python:3.12\n").unwrap();

        match check_container_prerequisites(&project, dir.path()) {
            Err(ControllerError::Prerequisite { violations }) => {
                assert_eq!(violations.len(), 2);
                assert!(violations[0].contains("'One'"));
                assert!(violations[1].contains("'Three'"));
            }
            other => panic!("expected prerequisite error, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_target() {
        let targets = vec![
            AwsDeploymentTarget::new("dev", "123456789012", "us-east-1"),
            AwsDeploymentTarget::new("prod", "123456789012", "eu-west-1"),
        ];
        assert_eq!(resolve_target(&targets, None).unwrap().name, "dev");
        assert_eq!(resolve_target(&targets, Some("prod")).unwrap().region, "eu-west-1");
        assert!(matches!(
            resolve_target(&targets, Some("qa")),
            Err(ControllerError::NotFound { .. })
        ));
        assert!(resolve_target(&[], None).is_err());
    }
}
