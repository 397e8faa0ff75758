// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Controller Error Kinds
//!
//! One error enum shared by the resource graph and the deployment lifecycle.
//! Every variant is recoverable by the caller; nothing in the controller
//! retries on its own.
//!
//! | Variant | Raised by |
//! |---------|-----------|
//! | `NotFound` | repositories, mutation service (unknown agent/resource/target) |
//! | `Parse` / `Read` / `Write` | JSON document repositories |
//! | `Validation` | schema check, `Project::validate`, integrity check |
//! | `ReferentialIntegrity` | removal policy engine (restrict) |
//! | `NamingLimit` | deployment preflight |
//! | `Prerequisite` | deployment preflight (container build descriptors) |
//! | `Environment` | credentials, bootstrap and stack-status gates |
//! | `Provisioning` | build / synth / deploy failures from the engine |

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("{what} not found: {name}")]
    NotFound { what: String, name: String },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value at '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Cannot remove {resource}: still referenced by {}", referrers.join(", "))]
    ReferentialIntegrity {
        resource: String,
        referrers: Vec<String>,
    },

    #[error("Runtime name '{name}' is {length} characters; the limit is {limit}")]
    NamingLimit {
        name: String,
        length: usize,
        limit: usize,
    },

    #[error("Missing build prerequisites:\n  - {}", violations.join("\n  - "))]
    Prerequisite { violations: Vec<String> },

    #[error("Environment error: {0}")]
    Environment(String),

    #[error("{step} failed: {source:#}")]
    Provisioning {
        step: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ControllerError {
    pub fn not_found(what: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            what: what.into(),
            name: name.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn provisioning(step: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Provisioning {
            step: step.into(),
            source,
        }
    }
}

pub type ControllerResult<T> = Result<T, ControllerError>;
