// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Project Aggregate
//!
//! The declarative spec document (`agentcore.json`): a project owns an ordered
//! list of agents, and every shared resource (memory, credential, gateway,
//! MCP tool) hangs off the agents through attachment lists.
//!
//! ```json
//! {
//!   "name": "Support",
//!   "version": "1",
//!   "agents": [{
//!     "name": "Triage",
//!     "build": "CodeZip",
//!     "entrypoint": "main.py",
//!     "codeLocation": "app/Triage",
//!     "runtimeVersion": "PYTHON_3_12",
//!     "networkMode": "PUBLIC",
//!     "modelProvider": "Bedrock",
//!     "memoryProviders": [{ "name": "Notes", "relation": "own" }]
//!   }]
//! }
//! ```
//!
//! Each shared resource has exactly one owning entry (`relation: own`, which
//! carries the definition) and any number of `use` entries on other agents.
//! This module only enforces per-entity shape; ownership and reference
//! integrity live in [`crate::domain::graph`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::domain::error::{ControllerError, ControllerResult};

/// Platform ceiling on the remote runtime name `{project}_{agent}`.
pub const RUNTIME_NAME_LIMIT: usize = 48;

/// File every container agent needs at its code location.
pub const CONTAINER_BUILD_DESCRIPTOR: &str = "Dockerfile";

fn project_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]{0,22}$").expect("static regex"))
}

fn resource_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]{0,47}$").expect("static regex"))
}

/// Check a project name: letter first, alphanumeric, at most 23 characters.
pub fn validate_project_name(field: &str, name: &str) -> ControllerResult<()> {
    if project_name_pattern().is_match(name) {
        Ok(())
    } else {
        Err(ControllerError::validation(
            field,
            format!(
                "'{}' must start with a letter and contain only letters and digits (max 23)",
                name
            ),
        ))
    }
}

/// Check an agent or resource name: letter first, then letters, digits or `_`.
pub fn validate_resource_name(field: &str, name: &str) -> ControllerResult<()> {
    if resource_name_pattern().is_match(name) {
        Ok(())
    } else {
        Err(ControllerError::validation(
            field,
            format!(
                "'{}' must start with a letter and contain only letters, digits and '_' (max 48)",
                name
            ),
        ))
    }
}

/// Remote runtime name as the provisioning backend will see it.
pub fn runtime_name(project: &str, agent: &str) -> String {
    format!("{}_{}", project, agent)
}

/// Implemented by every closed string enum in the document so the schema
/// check can list accepted values.
pub trait DocumentEnum: Sized + 'static {
    const VARIANTS: &'static [&'static str];
}

macro_rules! document_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl DocumentEnum for $name {
            const VARIANTS: &'static [&'static str] = &[$($text),+];
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(format!(
                        "unknown value '{}', expected one of: {}",
                        other,
                        Self::VARIANTS.join(", ")
                    )),
                }
            }
        }
    };
}

document_enum! {
    /// How the agent's code reaches the runtime.
    BuildKind {
        CodeZip => "CodeZip",
        Container => "Container",
    }
}

document_enum! {
    NetworkMode {
        Public => "PUBLIC",
        Vpc => "VPC",
    }
}

document_enum! {
    /// Model provider used by the agent. Everything except Bedrock needs an
    /// API-key credential.
    ModelProvider {
        Bedrock => "Bedrock",
        Anthropic => "Anthropic",
        OpenAi => "OpenAI",
        Gemini => "Gemini",
    }
}

document_enum! {
    Relation {
        Own => "own",
        Use => "use",
    }
}

document_enum! {
    /// Fixed at creation; changing scope means delete and recreate.
    CredentialScope {
        Project => "project",
        Agent => "agent",
    }
}

document_enum! {
    McpProviderKind {
        Gateway => "gateway",
        McpTool => "mcpTool",
    }
}

impl ModelProvider {
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ModelProvider::Bedrock)
    }
}

impl Default for NetworkMode {
    fn default() -> Self {
        NetworkMode::Public
    }
}

impl Default for ModelProvider {
    fn default() -> Self {
        ModelProvider::Bedrock
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub agents: Vec<Agent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub name: String,
    pub build: BuildKind,
    pub entrypoint: String,
    pub code_location: String,
    pub runtime_version: String,
    #[serde(default)]
    pub network_mode: NetworkMode,
    #[serde(default)]
    pub model_provider: ModelProvider,
    #[serde(default)]
    pub memory_providers: Vec<MemoryProvider>,
    #[serde(default)]
    pub identity_providers: Vec<IdentityProvider>,
    #[serde(default)]
    pub mcp_providers: Vec<McpProvider>,
    #[serde(default)]
    pub remote_tools: Vec<RemoteTool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryProvider {
    pub name: String,
    pub relation: Relation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_expiry_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strategies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProvider {
    pub name: String,
    pub relation: Relation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ModelProvider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<CredentialScope>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpProvider {
    pub name: String,
    pub relation: Relation,
    pub kind: McpProviderKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Outbound edge from an agent: invoke another agent, or call an MCP tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RemoteTool {
    #[serde(rename_all = "camelCase")]
    Agent { name: String, target_agent: String },
    #[serde(rename_all = "camelCase")]
    McpTool { name: String, target_tool: String },
}

impl RemoteTool {
    pub fn name(&self) -> &str {
        match self {
            RemoteTool::Agent { name, .. } | RemoteTool::McpTool { name, .. } => name,
        }
    }

    pub fn targets_agent(&self, agent: &str) -> bool {
        matches!(self, RemoteTool::Agent { target_agent, .. } if target_agent == agent)
    }

    pub fn targets_tool(&self, tool: &str) -> bool {
        matches!(self, RemoteTool::McpTool { target_tool, .. } if target_tool == tool)
    }
}

impl MemoryProvider {
    pub fn reference(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relation: Relation::Use,
            description: None,
            event_expiry_days: None,
            strategies: Vec::new(),
        }
    }
}

impl IdentityProvider {
    pub fn owned(name: impl Into<String>, provider: ModelProvider, scope: CredentialScope) -> Self {
        Self {
            name: name.into(),
            relation: Relation::Own,
            provider: Some(provider),
            scope: Some(scope),
        }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relation: Relation::Use,
            provider: None,
            scope: None,
        }
    }
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        build: BuildKind,
        code_location: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            build,
            entrypoint: "main.py".to_string(),
            code_location: code_location.into(),
            runtime_version: "PYTHON_3_12".to_string(),
            network_mode: NetworkMode::Public,
            model_provider: ModelProvider::Bedrock,
            memory_providers: Vec::new(),
            identity_providers: Vec::new(),
            mcp_providers: Vec::new(),
            remote_tools: Vec::new(),
        }
    }

    /// Identity entries this agent owns, i.e. credentials it is responsible for.
    pub fn owned_identities(&self) -> impl Iterator<Item = &IdentityProvider> {
        self.identity_providers
            .iter()
            .filter(|p| p.relation == Relation::Own)
    }

    fn validate(&self, field: &str) -> ControllerResult<()> {
        validate_resource_name(&format!("{}.name", field), &self.name)?;

        if self.entrypoint.trim().is_empty() {
            return Err(ControllerError::validation(
                format!("{}.entrypoint", field),
                "entrypoint cannot be empty",
            ));
        }
        if self.code_location.trim().is_empty() {
            return Err(ControllerError::validation(
                format!("{}.codeLocation", field),
                "code location cannot be empty",
            ));
        }
        if self.runtime_version.trim().is_empty() {
            return Err(ControllerError::validation(
                format!("{}.runtimeVersion", field),
                "runtime version cannot be empty",
            ));
        }

        for (i, memory) in self.memory_providers.iter().enumerate() {
            let name_field = format!("{}.memoryProviders[{}].name", field, i);
            validate_resource_name(&name_field, &memory.name)?;
            if memory.relation == Relation::Use
                && (memory.description.is_some() || memory.event_expiry_days.is_some())
            {
                return Err(ControllerError::validation(
                    format!("{}.memoryProviders[{}]", field, i),
                    "a 'use' entry cannot carry a memory definition",
                ));
            }
            if let Some(days) = memory.event_expiry_days {
                if !(7..=365).contains(&days) {
                    return Err(ControllerError::validation(
                        format!("{}.memoryProviders[{}].eventExpiryDays", field, i),
                        format!("{} is outside 7..=365", days),
                    ));
                }
            }
        }

        for (i, identity) in self.identity_providers.iter().enumerate() {
            validate_resource_name(
                &format!("{}.identityProviders[{}].name", field, i),
                &identity.name,
            )?;
            if identity.relation == Relation::Own && identity.provider.is_none() {
                return Err(ControllerError::validation(
                    format!("{}.identityProviders[{}].provider", field, i),
                    "an owned credential must name its provider",
                ));
            }
        }

        for (i, mcp) in self.mcp_providers.iter().enumerate() {
            validate_resource_name(&format!("{}.mcpProviders[{}].name", field, i), &mcp.name)?;
            if mcp.kind == McpProviderKind::McpTool && mcp.relation == Relation::Use {
                return Err(ControllerError::validation(
                    format!("{}.mcpProviders[{}].relation", field, i),
                    "MCP tools are consumed through remoteTools, not 'use' entries",
                ));
            }
        }

        let mut edge_names = HashSet::new();
        for (i, tool) in self.remote_tools.iter().enumerate() {
            validate_resource_name(&format!("{}.remoteTools[{}].name", field, i), tool.name())?;
            if !edge_names.insert(tool.name()) {
                return Err(ControllerError::validation(
                    format!("{}.remoteTools[{}].name", field, i),
                    format!("duplicate remote tool name '{}'", tool.name()),
                ));
            }
            if tool.targets_agent(&self.name) {
                return Err(ControllerError::validation(
                    format!("{}.remoteTools[{}].targetAgent", field, i),
                    "an agent cannot invoke itself",
                ));
            }
        }

        Ok(())
    }
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: "1".to_string(),
            agents: Vec::new(),
        }
    }

    pub fn agent(&self, name: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.name == name)
    }

    pub fn agent_mut(&mut self, name: &str) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|a| a.name == name)
    }

    pub fn require_agent_mut(&mut self, name: &str) -> ControllerResult<&mut Agent> {
        self.agent_mut(name)
            .ok_or_else(|| ControllerError::not_found("Agent", name))
    }

    /// Per-entity shape validation. Cross-entity ownership rules are checked
    /// by [`crate::domain::graph::ResourceGraph::integrity_violations`].
    pub fn validate(&self) -> ControllerResult<()> {
        validate_project_name("name", &self.name)?;

        if self.version.trim().is_empty() {
            return Err(ControllerError::validation("version", "version cannot be empty"));
        }

        let mut names = HashSet::new();
        for (i, agent) in self.agents.iter().enumerate() {
            let field = format!("agents[{}]", i);
            agent.validate(&field)?;
            if !names.insert(agent.name.as_str()) {
                return Err(ControllerError::validation(
                    format!("{}.name", field),
                    format!("duplicate agent name '{}'", agent.name),
                ));
            }
        }

        Ok(())
    }
}
