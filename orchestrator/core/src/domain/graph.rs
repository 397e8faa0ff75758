// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Resource Graph
//!
//! Adjacency derived from the canonical agent lists on demand: who owns each
//! shared resource and who refers to it. Nothing here is persisted; the graph
//! is rebuilt for every operation so back-references cannot drift from the
//! document.
//!
//! | Resource kind | Owner entry | Referrers |
//! |---------------|-------------|-----------|
//! | Agent | (self) | agents with a `remoteTools` agent edge targeting it |
//! | Memory | `memoryProviders` `own` | `memoryProviders` `use` |
//! | Identity | `identityProviders` `own` | `identityProviders` `use` |
//! | Gateway | `mcpProviders` `own` (kind gateway) | `mcpProviders` `use` |
//! | McpTool | `mcpProviders` `own` (kind mcpTool) | `remoteTools` tool edges |

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::domain::project::{McpProviderKind, Project, Relation, RemoteTool};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Agent,
    Memory,
    Identity,
    Gateway,
    McpTool,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Agent => "agent",
            ResourceKind::Memory => "memory",
            ResourceKind::Identity => "identity",
            ResourceKind::Gateway => "gateway",
            ResourceKind::McpTool => "mcp-tool",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "agent" => Ok(ResourceKind::Agent),
            "memory" => Ok(ResourceKind::Memory),
            "identity" => Ok(ResourceKind::Identity),
            "gateway" => Ok(ResourceKind::Gateway),
            "mcp-tool" => Ok(ResourceKind::McpTool),
            other => Err(format!(
                "unknown resource kind '{}', expected agent, memory, identity, gateway or mcp-tool",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub name: String,
}

impl ResourceRef {
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.name)
    }
}

fn mcp_kind(kind: McpProviderKind) -> ResourceKind {
    match kind {
        McpProviderKind::Gateway => ResourceKind::Gateway,
        McpProviderKind::McpTool => ResourceKind::McpTool,
    }
}

/// Derived ownership and reference adjacency for one project snapshot.
#[derive(Debug, Default)]
pub struct ResourceGraph {
    owners: BTreeMap<ResourceRef, Vec<String>>,
    referrers: BTreeMap<ResourceRef, Vec<String>>,
}

impl ResourceGraph {
    pub fn build(project: &Project) -> Self {
        let mut graph = ResourceGraph::default();

        for agent in &project.agents {
            graph
                .owners
                .entry(ResourceRef::new(ResourceKind::Agent, &agent.name))
                .or_default()
                .push(agent.name.clone());

            let entries = agent
                .memory_providers
                .iter()
                .map(|m| (ResourceKind::Memory, m.name.as_str(), m.relation))
                .chain(
                    agent
                        .identity_providers
                        .iter()
                        .map(|p| (ResourceKind::Identity, p.name.as_str(), p.relation)),
                )
                .chain(
                    agent
                        .mcp_providers
                        .iter()
                        .map(|p| (mcp_kind(p.kind), p.name.as_str(), p.relation)),
                );

            for (kind, name, relation) in entries {
                let map = match relation {
                    Relation::Own => &mut graph.owners,
                    Relation::Use => &mut graph.referrers,
                };
                map.entry(ResourceRef::new(kind, name))
                    .or_default()
                    .push(agent.name.clone());
            }

            for tool in &agent.remote_tools {
                let target = match tool {
                    RemoteTool::Agent { target_agent, .. } => {
                        ResourceRef::new(ResourceKind::Agent, target_agent)
                    }
                    RemoteTool::McpTool { target_tool, .. } => {
                        ResourceRef::new(ResourceKind::McpTool, target_tool)
                    }
                };
                let list = graph.referrers.entry(target).or_default();
                if !list.contains(&agent.name) {
                    list.push(agent.name.clone());
                }
            }
        }

        graph
    }

    pub fn contains(&self, resource: &ResourceRef) -> bool {
        self.owners.contains_key(resource)
    }

    /// The single owning agent, if the resource exists.
    pub fn owner(&self, resource: &ResourceRef) -> Option<&str> {
        self.owners
            .get(resource)
            .and_then(|owners| owners.first())
            .map(String::as_str)
    }

    /// Agents other than the owner that hold a `use` entry or an edge to the resource.
    pub fn referrers(&self, resource: &ResourceRef) -> Vec<String> {
        let owner = self.owner(resource);
        self.referrers
            .get(resource)
            .map(|list| {
                list.iter()
                    .filter(|agent| {
                        Some(agent.as_str()) != owner || resource.kind == ResourceKind::Agent
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every non-agent resource owned by `agent`.
    pub fn owned_by(&self, agent: &str) -> Vec<ResourceRef> {
        self.owners
            .iter()
            .filter(|(r, owners)| {
                r.kind != ResourceKind::Agent && owners.first().map(String::as_str) == Some(agent)
            })
            .map(|(r, _)| r.clone())
            .collect()
    }

    /// Resources of `kind`, by name.
    pub fn resources_of(&self, kind: ResourceKind) -> BTreeSet<String> {
        self.owners
            .keys()
            .filter(|r| r.kind == kind)
            .map(|r| r.name.clone())
            .collect()
    }

    /// Every cross-entity rule the project currently breaks. An empty result
    /// means no reference anywhere names a resource that does not exist.
    pub fn integrity_violations(project: &Project) -> Vec<String> {
        let graph = Self::build(project);
        let mut violations = Vec::new();

        for (resource, owners) in &graph.owners {
            if owners.len() > 1 {
                violations.push(format!(
                    "{} has {} owners: {}",
                    resource,
                    owners.len(),
                    owners.join(", ")
                ));
            }
        }

        for (resource, referrers) in &graph.referrers {
            match graph.owner(resource) {
                None => {
                    for agent in referrers {
                        violations
                            .push(format!("agent '{}' refers to missing {}", agent, resource));
                    }
                }
                // an owner may call its own tool; only `use` entries conflict with `own`
                Some(owner)
                    if !matches!(resource.kind, ResourceKind::Agent | ResourceKind::McpTool) =>
                {
                    if referrers.iter().any(|a| a == owner) {
                        violations.push(format!(
                            "agent '{}' both owns and uses {}",
                            owner, resource
                        ));
                    }
                }
                Some(_) => {}
            }
        }

        for agent in &project.agents {
            if agent.remote_tools.iter().any(|t| t.targets_agent(&agent.name)) {
                violations.push(format!("agent '{}' invokes itself", agent.name));
            }
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::project::{Agent, BuildKind, MemoryProvider};

    fn project() -> Project {
        let mut project = Project::new("P");
        let mut owner = Agent::new("Owner", BuildKind::CodeZip, "app/Owner");
        owner.memory_providers.push(MemoryProvider {
            name: "M".into(),
            relation: Relation::Own,
            description: None,
            event_expiry_days: Some(30),
            strategies: vec![],
        });
        let mut user = Agent::new("User", BuildKind::CodeZip, "app/User");
        user.memory_providers.push(MemoryProvider::reference("M"));
        user.remote_tools.push(RemoteTool::Agent {
            name: "AskOwner".into(),
            target_agent: "Owner".into(),
        });
        project.agents.push(owner);
        project.agents.push(user);
        project
    }

    #[test]
    fn test_owner_and_referrers() {
        let graph = ResourceGraph::build(&project());
        let memory = ResourceRef::new(ResourceKind::Memory, "M");
        assert_eq!(graph.owner(&memory), Some("Owner"));
        assert_eq!(graph.referrers(&memory), vec!["User".to_string()]);

        let owner = ResourceRef::new(ResourceKind::Agent, "Owner");
        assert_eq!(graph.referrers(&owner), vec!["User".to_string()]);
        assert_eq!(graph.owned_by("Owner"), vec![memory]);
    }

    #[test]
    fn test_integrity_clean() {
        assert!(ResourceGraph::integrity_violations(&project()).is_empty());
    }

    #[test]
    fn test_dangling_use_reported() {
        let mut p = project();
        p.agents.remove(0);
        let violations = ResourceGraph::integrity_violations(&p);
        assert!(violations.iter().any(|v| v.contains("missing memory 'M'")));
        assert!(violations.iter().any(|v| v.contains("missing agent 'Owner'")));
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("mcp-tool".parse::<ResourceKind>().unwrap(), ResourceKind::McpTool);
        assert!("bucket".parse::<ResourceKind>().is_err());
    }
}
