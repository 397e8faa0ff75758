// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the document repositories defined in the
//! domain layer.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist and retrieve the project documents
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! ## JSON File Repositories
//!
//! Backed by the documents under `agentcore/`:
//! - **JsonProjectRepository** - `agentcore.json`, shape-checked on read and write
//! - **JsonTargetRepository** - `aws-targets.json`
//! - **JsonDeployedStateRepository** - `.cli/deployed-state.json`, merged per target
//!
//! ## In-Memory Repositories
//!
//! Lightweight implementations for tests:
//! - **InMemoryProjectRepository**
//! - **InMemoryTargetRepository**
//! - **InMemoryDeployedStateRepository**
//!
//! Every file write goes to a sibling temp file, is synced, then renamed over
//! the original, so a failure never leaves a half-written document.

pub mod json;

pub use json::{JsonDeployedStateRepository, JsonProjectRepository, JsonTargetRepository};

use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tokio::io::AsyncWriteExt;

use crate::domain::deployed_state::{DeployedState, TargetState};
use crate::domain::error::{ControllerError, ControllerResult};
use crate::domain::graph::ResourceGraph;
use crate::domain::project::Project;
use crate::domain::repository::{DeployedStateRepository, ProjectRepository, TargetRepository};
use crate::domain::target::{validate_targets, AwsDeploymentTarget};

/// Read a file, mapping "absent" to `None`.
pub(crate) async fn read_optional(path: &Path) -> ControllerResult<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ControllerError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Write `content` to `path` via temp file + rename.
pub(crate) async fn write_atomic(path: &Path, content: &str) -> ControllerResult<()> {
    let mut temp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let result = async {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&temp_path, path).await
    }
    .await;

    if let Err(source) = result {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(ControllerError::Write {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

/// Pretty JSON with a trailing newline.
pub(crate) fn to_document<T: serde::Serialize>(value: &T, path: &Path) -> ControllerResult<String> {
    let mut text = serde_json::to_string_pretty(value).map_err(|source| ControllerError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    text.push('\n');
    Ok(text)
}

/// Shape, entity and integrity checks a spec must pass before it is persisted.
pub(crate) fn validate_for_write(project: &Project) -> ControllerResult<()> {
    project.validate()?;
    let violations = ResourceGraph::integrity_violations(project);
    if let Some(first) = violations.first() {
        return Err(ControllerError::validation("agents", first.clone()));
    }
    Ok(())
}

#[derive(Clone, Default)]
pub struct InMemoryProjectRepository {
    project: Arc<RwLock<Option<Project>>>,
}

impl InMemoryProjectRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(project: Project) -> Self {
        Self {
            project: Arc::new(RwLock::new(Some(project))),
        }
    }
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn read(&self) -> ControllerResult<Project> {
        let project = self.project.read().unwrap_or_else(|e| e.into_inner());
        project
            .clone()
            .ok_or_else(|| ControllerError::not_found("Project spec", "in-memory"))
    }

    async fn write(&self, project: &Project) -> ControllerResult<()> {
        validate_for_write(project)?;
        let mut slot = self.project.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(project.clone());
        Ok(())
    }

    fn location(&self) -> String {
        "agentcore.json".to_string()
    }
}

#[derive(Clone, Default)]
pub struct InMemoryTargetRepository {
    targets: Arc<RwLock<Vec<AwsDeploymentTarget>>>,
}

impl InMemoryTargetRepository {
    pub fn new(targets: Vec<AwsDeploymentTarget>) -> Self {
        Self {
            targets: Arc::new(RwLock::new(targets)),
        }
    }
}

#[async_trait]
impl TargetRepository for InMemoryTargetRepository {
    async fn read(&self) -> ControllerResult<Vec<AwsDeploymentTarget>> {
        Ok(self.targets.read().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn write(&self, targets: &[AwsDeploymentTarget]) -> ControllerResult<()> {
        validate_targets(targets)?;
        *self.targets.write().unwrap_or_else(|e| e.into_inner()) = targets.to_vec();
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryDeployedStateRepository {
    state: Arc<RwLock<DeployedState>>,
}

impl InMemoryDeployedStateRepository {
    pub fn new(state: DeployedState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }
}

#[async_trait]
impl DeployedStateRepository for InMemoryDeployedStateRepository {
    async fn read(&self) -> ControllerResult<DeployedState> {
        Ok(self.state.read().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn merge_target(&self, target: &str, state: TargetState) -> ControllerResult<()> {
        self.state
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .merge_target(target, state);
        Ok(())
    }

    async fn clear_target(&self, target: &str) -> ControllerResult<()> {
        self.state
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear_target(target);
        Ok(())
    }
}
