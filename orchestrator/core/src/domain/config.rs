// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Controller configuration and project layout
//!
//! `ControllerConfig` is an optional YAML file telling the controller how to
//! reach its external collaborators. `ProjectLayout` resolves where the
//! project documents live under a project root.
//!
//! ```yaml
//! cdkCommand: npx cdk
//! awsCommand: aws
//! cdkProjectDir: agentcore/cdk
//! logDir: agentcore/.cli/logs
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "AGENTCORE_CONFIG_PATH";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerConfig {
    /// Command line used to invoke the CDK toolkit.
    #[serde(default = "default_cdk_command")]
    pub cdk_command: String,

    /// Command line used to invoke the AWS CLI.
    #[serde(default = "default_aws_command")]
    pub aws_command: String,

    /// CDK project, relative to the project root.
    #[serde(default = "default_cdk_project_dir")]
    pub cdk_project_dir: PathBuf,

    /// Deploy run logs, relative to the project root.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

fn default_cdk_command() -> String {
    "npx cdk".to_string()
}

fn default_aws_command() -> String {
    "aws".to_string()
}

fn default_cdk_project_dir() -> PathBuf {
    PathBuf::from("agentcore/cdk")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("agentcore/.cli/logs")
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            cdk_command: default_cdk_command(),
            aws_command: default_aws_command(),
            cdk_project_dir: default_cdk_project_dir(),
            log_dir: default_log_dir(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. AGENTCORE_CONFIG_PATH environment variable
    /// 2. ./agentcore/config.yaml (working directory)
    /// 3. ~/.agentcore/config.yaml (user home)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./agentcore/config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".agentcore").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        let mut config = match Self::discover_config() {
            Some(path) => {
                tracing::debug!("Loading configuration from discovered path: {:?}", path);
                Self::from_yaml_file(path)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Environment variables win over file values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("AGENTCORE_CDK_COMMAND") {
            tracing::info!("Environment override: AGENTCORE_CDK_COMMAND={}", val);
            self.cdk_command = val;
        }
        if let Ok(val) = std::env::var("AGENTCORE_AWS_COMMAND") {
            tracing::info!("Environment override: AGENTCORE_AWS_COMMAND={}", val);
            self.aws_command = val;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.cdk_command.trim().is_empty() {
            anyhow::bail!("cdkCommand cannot be empty");
        }
        if self.aws_command.trim().is_empty() {
            anyhow::bail!("awsCommand cannot be empty");
        }
        Ok(())
    }
}

/// Paths of every project document, resolved from the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join("agentcore")
    }

    pub fn spec_path(&self) -> PathBuf {
        self.config_dir().join("agentcore.json")
    }

    pub fn targets_path(&self) -> PathBuf {
        self.config_dir().join("aws-targets.json")
    }

    pub fn deployed_state_path(&self) -> PathBuf {
        self.config_dir().join(".cli").join("deployed-state.json")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.config_dir().join(".env.local")
    }

    /// Resolve a path that may be relative to the project root.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}
