// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent code packaging
//!
//! Checks each agent's code location and measures what the provisioning
//! engine will upload. Bundling itself happens inside the CDK app.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;
use walkdir::WalkDir;

use crate::domain::project::{Agent, BuildKind, CONTAINER_BUILD_DESCRIPTOR};
use crate::domain::provisioning::{PackagedArtifact, Packager};

/// Directories never shipped with agent code.
const EXCLUDED_DIRS: [&str; 5] = [".git", "__pycache__", ".venv", "node_modules", ".pytest_cache"];

pub struct DirectoryPackager {
    project_root: PathBuf,
}

impl DirectoryPackager {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }
}

#[async_trait]
impl Packager for DirectoryPackager {
    async fn package(&self, agent: &Agent) -> Result<PackagedArtifact> {
        let path = self.project_root.join(&agent.code_location);
        if !path.is_dir() {
            anyhow::bail!(
                "Code location for agent '{}' not found: {}",
                agent.name,
                path.display()
            );
        }

        match agent.build {
            BuildKind::Container => {
                if !path.join(CONTAINER_BUILD_DESCRIPTOR).is_file() {
                    anyhow::bail!("Agent '{}' has no {}", agent.name, CONTAINER_BUILD_DESCRIPTOR);
                }
            }
            BuildKind::CodeZip => {
                if !path.join(&agent.entrypoint).is_file() {
                    anyhow::bail!(
                        "Entrypoint {} not found for agent '{}'",
                        agent.entrypoint,
                        agent.name
                    );
                }
            }
        }

        let mut size_bytes = 0u64;
        let walker = WalkDir::new(&path).into_iter().filter_entry(|e| {
            !(e.file_type().is_dir()
                && EXCLUDED_DIRS.iter().any(|d| e.file_name() == *d))
        });
        for entry in walker {
            let entry = entry.with_context(|| format!("Failed to read {}", path.display()))?;
            if entry.file_type().is_file() {
                size_bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
            }
        }

        debug!(agent = %agent.name, size_bytes, "Packaged agent code");
        Ok(PackagedArtifact {
            agent: agent.name.clone(),
            path,
            size_bytes,
        })
    }
}
