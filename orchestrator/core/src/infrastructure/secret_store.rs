// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Local credential secrets
//!
//! API keys never enter `agentcore.json`. They live in `agentcore/.env.local`,
//! keyed by each credential's `AGENTCORE_CREDENTIAL_*` variable name, and are
//! only read back locally: by the credential resolver when comparing a new
//! key, and by identity provisioning during deploy.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::domain::error::{ControllerError, ControllerResult};
use crate::domain::repository::SecretStore;
use crate::infrastructure::repositories::{read_optional, write_atomic};

/// `.env.local`-backed secret store.
#[derive(Debug, Clone)]
pub struct DotenvSecretStore {
    path: PathBuf,
}

impl DotenvSecretStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn quote(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$")
        .replace('\n', "\\n");
    format!("\"{}\"", escaped)
}

fn render(secrets: &BTreeMap<String, String>) -> String {
    let mut out = String::from("# Local credentials for agentcore. Do not commit.\n");
    for (key, value) in secrets {
        out.push_str(key);
        out.push('=');
        out.push_str(&quote(value));
        out.push('\n');
    }
    out
}

#[async_trait]
impl SecretStore for DotenvSecretStore {
    async fn load(&self) -> ControllerResult<BTreeMap<String, String>> {
        let Some(content) = read_optional(&self.path).await? else {
            return Ok(BTreeMap::new());
        };
        let read_err = |e: dotenvy::Error| ControllerError::Read {
            path: self.path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()),
        };

        let mut secrets = BTreeMap::new();
        for item in dotenvy::from_read_iter(content.as_bytes()) {
            let (key, value) = item.map_err(read_err)?;
            secrets.insert(key, value);
        }
        Ok(secrets)
    }

    async fn save(&self, secrets: &BTreeMap<String, String>) -> ControllerResult<()> {
        write_atomic(&self.path, &render(secrets)).await
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Clone, Default)]
pub struct InMemorySecretStore {
    secrets: Arc<RwLock<BTreeMap<String, String>>>,
}

impl InMemorySecretStore {
    pub fn new(secrets: BTreeMap<String, String>) -> Self {
        Self {
            secrets: Arc::new(RwLock::new(secrets)),
        }
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn load(&self) -> ControllerResult<BTreeMap<String, String>> {
        Ok(self.secrets.read().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn save(&self, secrets: &BTreeMap<String, String>) -> ControllerResult<()> {
        *self.secrets.write().unwrap_or_else(|e| e.into_inner()) = secrets.clone();
        Ok(())
    }

    fn location(&self) -> String {
        ".env.local".to_string()
    }
}
