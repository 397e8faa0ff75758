// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! JSON document repositories
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Parse external JSON → Domain objects and back
//! - **Anti-Corruption:** Raw documents are shape-checked before typed decoding

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{read_optional, to_document, validate_for_write, write_atomic};
use crate::domain::deployed_state::{DeployedState, TargetState};
use crate::domain::error::{ControllerError, ControllerResult};
use crate::domain::project::Project;
use crate::domain::repository::{DeployedStateRepository, ProjectRepository, TargetRepository};
use crate::domain::schema::{validate_project_document, validate_targets_document};
use crate::domain::target::{validate_targets, AwsDeploymentTarget};

fn parse_value(path: &Path, content: &str) -> ControllerResult<serde_json::Value> {
    serde_json::from_str(content).map_err(|source| ControllerError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn decode<T: serde::de::DeserializeOwned>(
    path: &Path,
    value: serde_json::Value,
) -> ControllerResult<T> {
    serde_json::from_value(value).map_err(|source| ControllerError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// `agentcore.json`
#[derive(Debug, Clone)]
pub struct JsonProjectRepository {
    path: PathBuf,
}

impl JsonProjectRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ProjectRepository for JsonProjectRepository {
    async fn read(&self) -> ControllerResult<Project> {
        let content = read_optional(&self.path).await?.ok_or_else(|| {
            ControllerError::not_found("Project spec", self.path.display().to_string())
        })?;
        let value = parse_value(&self.path, &content)?;
        validate_project_document(&value)?;
        let project: Project = decode(&self.path, value)?;
        project.validate()?;
        debug!(path = %self.path.display(), agents = project.agents.len(), "Loaded project spec");
        Ok(project)
    }

    async fn write(&self, project: &Project) -> ControllerResult<()> {
        validate_for_write(project)?;
        let text = to_document(project, &self.path)?;
        write_atomic(&self.path, &text).await?;
        debug!(path = %self.path.display(), "Wrote project spec");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// `aws-targets.json`
#[derive(Debug, Clone)]
pub struct JsonTargetRepository {
    path: PathBuf,
}

impl JsonTargetRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TargetRepository for JsonTargetRepository {
    async fn read(&self) -> ControllerResult<Vec<AwsDeploymentTarget>> {
        let Some(content) = read_optional(&self.path).await? else {
            return Ok(Vec::new());
        };
        let value = parse_value(&self.path, &content)?;
        validate_targets_document(&value)?;
        let targets: Vec<AwsDeploymentTarget> = decode(&self.path, value)?;
        validate_targets(&targets)?;
        Ok(targets)
    }

    async fn write(&self, targets: &[AwsDeploymentTarget]) -> ControllerResult<()> {
        validate_targets(targets)?;
        let text = to_document(&targets, &self.path)?;
        write_atomic(&self.path, &text).await
    }
}

/// `.cli/deployed-state.json`
#[derive(Debug, Clone)]
pub struct JsonDeployedStateRepository {
    path: PathBuf,
}

impl JsonDeployedStateRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn persist(&self, state: &DeployedState) -> ControllerResult<()> {
        let text = to_document(state, &self.path)?;
        write_atomic(&self.path, &text).await
    }
}

#[async_trait]
impl DeployedStateRepository for JsonDeployedStateRepository {
    async fn read(&self) -> ControllerResult<DeployedState> {
        match read_optional(&self.path).await? {
            None => Ok(DeployedState::default()),
            Some(content) => {
                let value = parse_value(&self.path, &content)?;
                decode(&self.path, value)
            }
        }
    }

    async fn merge_target(&self, target: &str, state: TargetState) -> ControllerResult<()> {
        let mut current = self.read().await?;
        current.merge_target(target, state);
        self.persist(&current).await?;
        debug!(target = %target, "Merged deployed state");
        Ok(())
    }

    async fn clear_target(&self, target: &str) -> ControllerResult<()> {
        let mut current = self.read().await?;
        if current.clear_target(target) {
            self.persist(&current).await?;
            debug!(target = %target, "Cleared deployed state");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::project::{Agent, BuildKind, MemoryProvider, Relation};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn sample_project() -> Project {
        let mut project = Project::new("Support");
        let mut agent = Agent::new("Triage", BuildKind::CodeZip, "app/Triage");
        agent.memory_providers.push(MemoryProvider {
            name: "Notes".into(),
            relation: Relation::Own,
            description: Some("ticket history".into()),
            event_expiry_days: Some(30),
            strategies: vec!["SEMANTIC".into()],
        });
        project.agents.push(agent);
        project
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let repo = JsonProjectRepository::new(dir.path().join("agentcore.json"));
        let project = sample_project();

        repo.write(&project).await.unwrap();
        let loaded = repo.read().await.unwrap();

        assert_eq!(loaded, project);
    }

    #[tokio::test]
    async fn test_missing_document_is_not_found() {
        let dir = TempDir::new().unwrap();
        let repo = JsonProjectRepository::new(dir.path().join("agentcore.json"));
        assert!(matches!(repo.read().await, Err(ControllerError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_corrupt_document_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agentcore.json");
        std::fs::write(&path, "{ not json").unwrap();
        let repo = JsonProjectRepository::new(path);
        assert!(matches!(repo.read().await, Err(ControllerError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_unknown_enum_is_validation_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agentcore.json");
        std::fs::write(
            &path,
            r#"{"name":"Support","version":"1","agents":[{"name":"A","build":"Wasm",
                "entrypoint":"main.py","codeLocation":"app/A","runtimeVersion":"PYTHON_3_12"}]}"#,
        )
        .unwrap();
        let repo = JsonProjectRepository::new(path);
        match repo.read().await {
            Err(ControllerError::Validation { field, .. }) => assert_eq!(field, "agents[0].build"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_write_leaves_document_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agentcore.json");
        let repo = JsonProjectRepository::new(&path);
        repo.write(&sample_project()).await.unwrap();
        let before = std::fs::read(&path).unwrap();

        let mut broken = sample_project();
        broken.agents[0].memory_providers.push(MemoryProvider::reference("Ghost"));
        assert!(repo.write(&broken).await.is_err());

        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_targets_absent_is_empty() {
        let dir = TempDir::new().unwrap();
        let repo = JsonTargetRepository::new(dir.path().join("aws-targets.json"));
        assert!(repo.read().await.unwrap().is_empty());

        let targets = vec![AwsDeploymentTarget::new("dev", "123456789012", "us-east-1")];
        repo.write(&targets).await.unwrap();
        assert_eq!(repo.read().await.unwrap(), targets);
    }

    #[tokio::test]
    async fn test_deployed_state_merge_keeps_other_targets() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".cli").join("deployed-state.json");
        let repo = JsonDeployedStateRepository::new(path);
        assert!(repo.read().await.unwrap().is_empty());

        repo.merge_target("t1", TargetState::new("AgentCore-P-t1", BTreeMap::new()))
            .await
            .unwrap();
        repo.merge_target("t2", TargetState::new("AgentCore-P-t2", BTreeMap::new()))
            .await
            .unwrap();

        let state = repo.read().await.unwrap();
        assert_eq!(state.target("t1").unwrap().resources.stack_name, "AgentCore-P-t1");
        assert_eq!(state.targets.len(), 2);

        repo.clear_target("t1").await.unwrap();
        let state = repo.read().await.unwrap();
        assert!(state.target("t1").is_none());
        assert!(state.target("t2").is_some());
    }
}
