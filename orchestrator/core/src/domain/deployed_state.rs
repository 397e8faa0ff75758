// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Deployed state (`.cli/deployed-state.json`)
//!
//! Last-known remote identifiers per target. Writing target `T` replaces only
//! `targets[T]`; every other target's entry is carried through untouched.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedState {
    #[serde(default)]
    pub targets: BTreeMap<String, TargetState>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetState {
    pub resources: TargetResources,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetResources {
    pub stack_name: String,
    #[serde(default)]
    pub agents: BTreeMap<String, AgentDeployedState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDeployedState {
    pub runtime_id: String,
    pub runtime_arn: String,
    pub role_arn: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub memory_ids: Vec<String>,
}

impl DeployedState {
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn target(&self, name: &str) -> Option<&TargetState> {
        self.targets.get(name)
    }

    /// Replace the entry for `target`, leaving every other entry as it was.
    pub fn merge_target(&mut self, target: impl Into<String>, state: TargetState) {
        self.targets.insert(target.into(), state);
    }

    /// Drop the entry for `target` after a teardown. Returns whether one existed.
    pub fn clear_target(&mut self, target: &str) -> bool {
        self.targets.remove(target).is_some()
    }
}

impl TargetState {
    pub fn new(
        stack_name: impl Into<String>,
        agents: BTreeMap<String, AgentDeployedState>,
    ) -> Self {
        Self {
            resources: TargetResources {
                stack_name: stack_name.into(),
                agents,
            },
        }
    }
}
