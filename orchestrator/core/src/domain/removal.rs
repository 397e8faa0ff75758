// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Removal Policy Engine
//!
//! Computes the blast radius of deleting a resource and applies it to an
//! in-memory project in one closed pass.
//!
//! ## Policies
//!
//! - **Restrict** (default): fail with every blocking referrer when anything
//!   outside the owner still refers to the resource. For an agent, blockers are
//!   agents with an edge to it plus agents using anything it owns.
//! - **Cascade**: remove the resource, everything it owns (agents only), and
//!   prune every `use` entry and remote-tool edge that would dangle.
//!
//! Each resource kind has its own handler implementing [`ResourceRemoval`];
//! [`RemovalTarget`] is the closed set of them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::domain::credential::credential_env_var;
use crate::domain::error::{ControllerError, ControllerResult};
use crate::domain::graph::{ResourceGraph, ResourceKind, ResourceRef};
use crate::domain::project::{McpProviderKind, Project, Relation, RemoteTool};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalPolicy {
    #[default]
    Restrict,
    Cascade,
}

impl fmt::Display for RemovalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemovalPolicy::Restrict => f.write_str("restrict"),
            RemovalPolicy::Cascade => f.write_str("cascade"),
        }
    }
}

impl FromStr for RemovalPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "restrict" => Ok(RemovalPolicy::Restrict),
            "cascade" => Ok(RemovalPolicy::Cascade),
            other => Err(format!("unknown policy '{}', expected restrict or cascade", other)),
        }
    }
}

/// A reference on a surviving agent that the removal deletes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrunedReference {
    pub agent: String,
    pub reference: String,
}

/// What a removal will do, computed before anything is mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalPlan {
    pub target: ResourceRef,
    pub policy: RemovalPolicy,
    /// The target plus, for agents, every resource it owns.
    pub removed: Vec<ResourceRef>,
    pub pruned: Vec<PrunedReference>,
    /// Environment-variable names of credential secrets that go away.
    pub secrets_removed: Vec<String>,
}

impl RemovalPlan {
    pub fn summary(&self) -> Vec<String> {
        let mut lines = vec![format!("Remove {} ({} policy)", self.target, self.policy)];
        for resource in self.removed.iter().filter(|r| **r != self.target) {
            lines.push(format!("  also removes owned {}", resource));
        }
        for pruned in &self.pruned {
            lines.push(format!("  prunes {} from agent '{}'", pruned.reference, pruned.agent));
        }
        for secret in &self.secrets_removed {
            lines.push(format!("  deletes local secret {}", secret));
        }
        lines
    }
}

/// One document a removal rewrites, as JSON before and after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub before: serde_json::Value,
    pub after: serde_json::Value,
}

/// Human-readable summary plus the structural diff of every file touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovalPreview {
    pub summary: Vec<String>,
    pub changes: Vec<FileChange>,
}

pub trait ResourceRemoval {
    fn resource(&self) -> ResourceRef;

    /// Compute the plan, or the restrict-policy block.
    fn preview(&self, project: &Project, policy: RemovalPolicy) -> ControllerResult<RemovalPlan>;

    /// Apply a plan previously computed by [`ResourceRemoval::preview`].
    fn apply(&self, project: &mut Project, plan: &RemovalPlan) {
        prune(project, &plan.removed);
    }
}

/// Handler for a shared (non-agent) resource. Removing one directly never
/// deletes anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedResourceRemoval {
    resource: ResourceRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRemoval {
    name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalTarget {
    Agent(AgentRemoval),
    Memory(SharedResourceRemoval),
    Identity(SharedResourceRemoval),
    Gateway(SharedResourceRemoval),
    McpTool(SharedResourceRemoval),
}

impl RemovalTarget {
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        let name = name.into();
        let shared = |kind| SharedResourceRemoval {
            resource: ResourceRef::new(kind, name.clone()),
        };
        match kind {
            ResourceKind::Agent => RemovalTarget::Agent(AgentRemoval { name: name.clone() }),
            ResourceKind::Memory => RemovalTarget::Memory(shared(kind)),
            ResourceKind::Identity => RemovalTarget::Identity(shared(kind)),
            ResourceKind::Gateway => RemovalTarget::Gateway(shared(kind)),
            ResourceKind::McpTool => RemovalTarget::McpTool(shared(kind)),
        }
    }

    fn handler(&self) -> &dyn ResourceRemoval {
        match self {
            RemovalTarget::Agent(h) => h,
            RemovalTarget::Memory(h)
            | RemovalTarget::Identity(h)
            | RemovalTarget::Gateway(h)
            | RemovalTarget::McpTool(h) => h,
        }
    }
}

impl ResourceRemoval for RemovalTarget {
    fn resource(&self) -> ResourceRef {
        self.handler().resource()
    }

    fn preview(&self, project: &Project, policy: RemovalPolicy) -> ControllerResult<RemovalPlan> {
        self.handler().preview(project, policy)
    }

    fn apply(&self, project: &mut Project, plan: &RemovalPlan) {
        self.handler().apply(project, plan)
    }
}

impl ResourceRemoval for SharedResourceRemoval {
    fn resource(&self) -> ResourceRef {
        self.resource.clone()
    }

    fn preview(&self, project: &Project, policy: RemovalPolicy) -> ControllerResult<RemovalPlan> {
        let graph = ResourceGraph::build(project);
        if !graph.contains(&self.resource) {
            return Err(ControllerError::not_found(
                capitalize(self.resource.kind.as_str()),
                &self.resource.name,
            ));
        }

        let referrers = graph.referrers(&self.resource);
        if policy == RemovalPolicy::Restrict && !referrers.is_empty() {
            return Err(ControllerError::ReferentialIntegrity {
                resource: self.resource.to_string(),
                referrers,
            });
        }

        let removed = vec![self.resource.clone()];
        Ok(RemovalPlan {
            target: self.resource.clone(),
            policy,
            pruned: pruned_references(project, &removed),
            secrets_removed: removed_secrets(&removed),
            removed,
        })
    }
}

impl ResourceRemoval for AgentRemoval {
    fn resource(&self) -> ResourceRef {
        ResourceRef::new(ResourceKind::Agent, &self.name)
    }

    fn preview(&self, project: &Project, policy: RemovalPolicy) -> ControllerResult<RemovalPlan> {
        let graph = ResourceGraph::build(project);
        let me = self.resource();
        if !graph.contains(&me) {
            return Err(ControllerError::not_found("Agent", &self.name));
        }

        let owned = graph.owned_by(&self.name);

        if policy == RemovalPolicy::Restrict {
            let mut blockers: BTreeSet<String> = graph.referrers(&me).into_iter().collect();
            for resource in &owned {
                blockers.extend(graph.referrers(resource));
            }
            blockers.remove(&self.name);
            if !blockers.is_empty() {
                return Err(ControllerError::ReferentialIntegrity {
                    resource: me.to_string(),
                    referrers: order_by_project(project, blockers),
                });
            }
        }

        let mut removed = vec![me.clone()];
        removed.extend(owned);
        Ok(RemovalPlan {
            target: me,
            policy,
            pruned: pruned_references(project, &removed),
            secrets_removed: removed_secrets(&removed),
            removed,
        })
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn order_by_project(project: &Project, names: BTreeSet<String>) -> Vec<String> {
    project
        .agents
        .iter()
        .filter(|a| names.contains(&a.name))
        .map(|a| a.name.clone())
        .collect()
}

fn removed_secrets(removed: &[ResourceRef]) -> Vec<String> {
    removed
        .iter()
        .filter(|r| r.kind == ResourceKind::Identity)
        .map(|r| credential_env_var(&r.name))
        .collect()
}

fn is_removed(removed: &[ResourceRef], kind: ResourceKind, name: &str) -> bool {
    removed.iter().any(|r| r.kind == kind && r.name == name)
}

fn mcp_resource_kind(kind: McpProviderKind) -> ResourceKind {
    match kind {
        McpProviderKind::Gateway => ResourceKind::Gateway,
        McpProviderKind::McpTool => ResourceKind::McpTool,
    }
}

fn dangling_edge(removed: &[ResourceRef], tool: &RemoteTool) -> bool {
    match tool {
        RemoteTool::Agent { target_agent, .. } => {
            is_removed(removed, ResourceKind::Agent, target_agent)
        }
        RemoteTool::McpTool { target_tool, .. } => {
            is_removed(removed, ResourceKind::McpTool, target_tool)
        }
    }
}

/// References on surviving agents that would dangle once `removed` is gone.
fn pruned_references(project: &Project, removed: &[ResourceRef]) -> Vec<PrunedReference> {
    let mut pruned = Vec::new();
    for agent in &project.agents {
        if is_removed(removed, ResourceKind::Agent, &agent.name) {
            continue;
        }
        let mut note = |reference: String| {
            pruned.push(PrunedReference {
                agent: agent.name.clone(),
                reference,
            })
        };
        for m in &agent.memory_providers {
            if m.relation == Relation::Use && is_removed(removed, ResourceKind::Memory, &m.name) {
                note(format!("memory '{}'", m.name));
            }
        }
        for p in &agent.identity_providers {
            if p.relation == Relation::Use && is_removed(removed, ResourceKind::Identity, &p.name) {
                note(format!("identity '{}'", p.name));
            }
        }
        for p in &agent.mcp_providers {
            let kind = mcp_resource_kind(p.kind);
            if p.relation == Relation::Use && is_removed(removed, kind, &p.name) {
                note(format!("{} '{}'", kind, p.name));
            }
        }
        for tool in &agent.remote_tools {
            if dangling_edge(removed, tool) {
                note(format!("remote tool '{}'", tool.name()));
            }
        }
    }
    pruned
}

/// Remove every resource in `removed` and every reference to one of them.
pub fn prune(project: &mut Project, removed: &[ResourceRef]) {
    project
        .agents
        .retain(|a| !is_removed(removed, ResourceKind::Agent, &a.name));

    for agent in &mut project.agents {
        agent
            .memory_providers
            .retain(|m| !is_removed(removed, ResourceKind::Memory, &m.name));
        agent
            .identity_providers
            .retain(|p| !is_removed(removed, ResourceKind::Identity, &p.name));
        agent
            .mcp_providers
            .retain(|p| !is_removed(removed, mcp_resource_kind(p.kind), &p.name));
        agent.remote_tools.retain(|t| !dangling_edge(removed, t));
    }
}
