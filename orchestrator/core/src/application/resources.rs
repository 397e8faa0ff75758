// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Resource Mutation Service
//!
//! Application service behind `add`, `attach` and `remove`.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Responsibility:** Apply one graph mutation per call without ever
//!   leaving the documents half-written
//! - **Collaborators:**
//!   - Domain: Project aggregate, ResourceGraph, credential resolver, removal engine
//!   - Infrastructure: ProjectRepository, TargetRepository, SecretStore
//!
//! # Flow
//!
//! 1. Read the spec and clone it
//! 2. Mutate the clone
//! 3. Write it back (the repository shape-checks and integrity-checks first)
//! 4. Write secrets; if that fails, the previous spec is written back

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::credential::{
    credential_env_conflict, credential_env_var, resolve_credential_strategy, CredentialStrategy,
};
use crate::domain::error::{ControllerError, ControllerResult};
use crate::domain::graph::{ResourceGraph, ResourceKind, ResourceRef};
use crate::domain::project::{
    Agent, BuildKind, CredentialScope, IdentityProvider, McpProvider, McpProviderKind,
    MemoryProvider, ModelProvider, NetworkMode, Project, Relation, RemoteTool,
};
use crate::domain::removal::{
    FileChange, RemovalPlan, RemovalPolicy, RemovalPreview, RemovalTarget, ResourceRemoval,
};
use crate::domain::repository::{ProjectRepository, SecretStore, TargetRepository};
use crate::domain::target::AwsDeploymentTarget;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddAgentRequest {
    pub name: String,
    pub build: BuildKind,
    pub code_location: String,
    pub entrypoint: Option<String>,
    pub runtime_version: Option<String>,
    pub network_mode: NetworkMode,
    pub model_provider: ModelProvider,
    /// API key for providers that need one. Stored locally, never in the spec.
    pub api_key: Option<String>,
}

impl AddAgentRequest {
    pub fn new(
        name: impl Into<String>,
        build: BuildKind,
        code_location: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            build,
            code_location: code_location.into(),
            entrypoint: None,
            runtime_version: None,
            network_mode: NetworkMode::default(),
            model_provider: ModelProvider::default(),
            api_key: None,
        }
    }

    pub fn with_provider(mut self, provider: ModelProvider, api_key: Option<&str>) -> Self {
        self.model_provider = provider;
        self.api_key = api_key.map(str::to_string);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedAgent {
    pub name: String,
    /// How the agent's model credential was wired, when its provider needs one.
    pub credential: Option<CredentialStrategy>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddMemoryRequest {
    pub owner: String,
    pub name: String,
    pub description: Option<String>,
    pub event_expiry_days: Option<u32>,
    pub strategies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddIdentityRequest {
    pub owner: String,
    pub name: String,
    pub provider: ModelProvider,
    pub scope: CredentialScope,
    pub api_key: Option<String>,
}

pub struct ResourceService {
    projects: Arc<dyn ProjectRepository>,
    targets: Arc<dyn TargetRepository>,
    secrets: Arc<dyn SecretStore>,
}

impl ResourceService {
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        targets: Arc<dyn TargetRepository>,
        secrets: Arc<dyn SecretStore>,
    ) -> Self {
        Self {
            projects,
            targets,
            secrets,
        }
    }

    pub async fn project(&self) -> ControllerResult<Project> {
        self.projects.read().await
    }

    pub async fn deployment_targets(&self) -> ControllerResult<Vec<AwsDeploymentTarget>> {
        self.targets.read().await
    }

    /// Read both documents and return every integrity problem found.
    ///
    /// Shape errors fail the read itself; an empty list means the project is
    /// consistent.
    pub async fn check(&self) -> ControllerResult<Vec<String>> {
        let project = self.projects.read().await?;
        self.targets.read().await?;
        Ok(ResourceGraph::integrity_violations(&project))
    }

    async fn mutate<F>(&self, operation: &str, change: F) -> ControllerResult<Project>
    where
        F: FnOnce(&mut Project) -> ControllerResult<()>,
    {
        self.mutate_with_secrets(operation, None, change).await
    }

    async fn mutate_with_secrets<F>(
        &self,
        operation: &str,
        secrets: Option<&BTreeMap<String, String>>,
        change: F,
    ) -> ControllerResult<Project>
    where
        F: FnOnce(&mut Project) -> ControllerResult<()>,
    {
        let before = self.projects.read().await?;
        let mut project = before.clone();
        change(&mut project)?;
        self.commit(operation, &before, &project, secrets).await?;
        Ok(project)
    }

    /// Write `after`, then `secrets`. A failed secret write puts `before`
    /// back so the two documents never disagree.
    async fn commit(
        &self,
        operation: &str,
        before: &Project,
        after: &Project,
        secrets: Option<&BTreeMap<String, String>>,
    ) -> ControllerResult<()> {
        self.projects.write(after).await?;
        if let Some(secrets) = secrets {
            if let Err(err) = self.secrets.save(secrets).await {
                warn!(operation, error = %err, "Failed to save secrets, restoring project spec");
                self.projects.write(before).await?;
                return Err(err);
            }
        }
        info!(operation, location = %self.projects.location(), "Updated project spec");
        Ok(())
    }

    pub async fn add_agent(&self, request: AddAgentRequest) -> ControllerResult<AddedAgent> {
        let project = self.projects.read().await?;
        if project.agent(&request.name).is_some() {
            return Err(ControllerError::validation(
                "name",
                format!("agent '{}' already exists", request.name),
            ));
        }

        let mut secrets = self.secrets.load().await?;
        let strategy = resolve_credential_strategy(
            &project,
            request.model_provider,
            &request.name,
            request.api_key.as_deref(),
            &|key| secrets.get(key).cloned(),
        );

        let mut agent = Agent::new(&request.name, request.build, &request.code_location);
        if let Some(entrypoint) = &request.entrypoint {
            agent.entrypoint = entrypoint.clone();
        }
        if let Some(runtime_version) = &request.runtime_version {
            agent.runtime_version = runtime_version.clone();
        }
        agent.network_mode = request.network_mode;
        agent.model_provider = request.model_provider;

        let mut secrets_changed = false;
        if let Some(strategy) = &strategy {
            if strategy.reuse {
                agent
                    .identity_providers
                    .push(IdentityProvider::reference(&strategy.credential_name));
            } else {
                ensure_distinct_env_var(&project, &strategy.credential_name)?;
                let scope = if strategy.is_agent_scoped {
                    CredentialScope::Agent
                } else {
                    CredentialScope::Project
                };
                agent.identity_providers.push(IdentityProvider::owned(
                    &strategy.credential_name,
                    request.model_provider,
                    scope,
                ));
                match &request.api_key {
                    Some(key) => {
                        secrets.insert(strategy.env_var_name.clone(), key.clone());
                        secrets_changed = true;
                    }
                    None => warn!(
                        credential = %strategy.credential_name,
                        "No API key supplied; set {} in {} before deploying",
                        strategy.env_var_name,
                        self.secrets.location()
                    ),
                }
            }
        }

        let changed = secrets_changed.then_some(&secrets);
        self.mutate_with_secrets("add agent", changed, |project| {
            project.agents.push(agent);
            Ok(())
        })
        .await?;

        info!(
            agent = %request.name,
            credential = ?strategy.as_ref().map(|s| &s.credential_name),
            "Added agent"
        );
        Ok(AddedAgent {
            name: request.name,
            credential: strategy,
        })
    }

    pub async fn add_memory(&self, request: AddMemoryRequest) -> ControllerResult<()> {
        self.mutate("add memory", |project| {
            ensure_new(project, ResourceKind::Memory, &request.name)?;
            project
                .require_agent_mut(&request.owner)?
                .memory_providers
                .push(MemoryProvider {
                    name: request.name.clone(),
                    relation: Relation::Own,
                    description: request.description.clone(),
                    event_expiry_days: request.event_expiry_days,
                    strategies: request.strategies.clone(),
                });
            Ok(())
        })
        .await?;
        info!(memory = %request.name, owner = %request.owner, "Added memory");
        Ok(())
    }

    pub async fn add_identity(&self, request: AddIdentityRequest) -> ControllerResult<()> {
        let secrets = match &request.api_key {
            Some(key) => {
                let mut secrets = self.secrets.load().await?;
                secrets.insert(credential_env_var(&request.name), key.clone());
                Some(secrets)
            }
            None => None,
        };

        self.mutate_with_secrets("add identity", secrets.as_ref(), |project| {
            ensure_new(project, ResourceKind::Identity, &request.name)?;
            ensure_distinct_env_var(project, &request.name)?;
            project
                .require_agent_mut(&request.owner)?
                .identity_providers
                .push(IdentityProvider::owned(&request.name, request.provider, request.scope));
            Ok(())
        })
        .await?;
        info!(identity = %request.name, owner = %request.owner, "Added identity");
        Ok(())
    }

    async fn add_mcp_provider(
        &self,
        owner: &str,
        name: &str,
        kind: McpProviderKind,
        description: Option<String>,
    ) -> ControllerResult<()> {
        let resource_kind = match kind {
            McpProviderKind::Gateway => ResourceKind::Gateway,
            McpProviderKind::McpTool => ResourceKind::McpTool,
        };
        self.mutate("add mcp provider", |project| {
            ensure_new(project, resource_kind, name)?;
            project.require_agent_mut(owner)?.mcp_providers.push(McpProvider {
                name: name.to_string(),
                relation: Relation::Own,
                kind,
                description,
            });
            Ok(())
        })
        .await?;
        info!(kind = %resource_kind, resource = name, owner, "Added resource");
        Ok(())
    }

    pub async fn add_gateway(
        &self,
        owner: &str,
        name: &str,
        description: Option<String>,
    ) -> ControllerResult<()> {
        self.add_mcp_provider(owner, name, McpProviderKind::Gateway, description)
            .await
    }

    pub async fn add_mcp_tool(
        &self,
        owner: &str,
        name: &str,
        description: Option<String>,
    ) -> ControllerResult<()> {
        self.add_mcp_provider(owner, name, McpProviderKind::McpTool, description)
            .await
    }

    pub async fn add_target(&self, target: AwsDeploymentTarget) -> ControllerResult<()> {
        let mut targets = self.targets.read().await?;
        if targets.iter().any(|t| t.name == target.name) {
            return Err(ControllerError::validation(
                "name",
                format!("target '{}' already exists", target.name),
            ));
        }
        info!(
            target = %target.name,
            account = %target.account,
            region = %target.region,
            "Added deployment target"
        );
        targets.push(target);
        self.targets.write(&targets).await
    }

    pub async fn attach_memory(&self, agent: &str, memory: &str) -> ControllerResult<()> {
        self.mutate("attach memory", |project| {
            ensure_attachable(project, agent, &ResourceRef::new(ResourceKind::Memory, memory))?;
            project
                .require_agent_mut(agent)?
                .memory_providers
                .push(MemoryProvider::reference(memory));
            Ok(())
        })
        .await?;
        info!(memory, agent, "Attached memory");
        Ok(())
    }

    pub async fn attach_identity(&self, agent: &str, identity: &str) -> ControllerResult<()> {
        self.mutate("attach identity", |project| {
            ensure_attachable(project, agent, &ResourceRef::new(ResourceKind::Identity, identity))?;
            project
                .require_agent_mut(agent)?
                .identity_providers
                .push(IdentityProvider::reference(identity));
            Ok(())
        })
        .await?;
        info!(identity, agent, "Attached identity");
        Ok(())
    }

    pub async fn attach_gateway(&self, agent: &str, gateway: &str) -> ControllerResult<()> {
        self.mutate("attach gateway", |project| {
            ensure_attachable(project, agent, &ResourceRef::new(ResourceKind::Gateway, gateway))?;
            project.require_agent_mut(agent)?.mcp_providers.push(McpProvider {
                name: gateway.to_string(),
                relation: Relation::Use,
                kind: McpProviderKind::Gateway,
                description: None,
            });
            Ok(())
        })
        .await?;
        info!(gateway, agent, "Attached gateway");
        Ok(())
    }

    /// Add a named invocation edge `source -> target`.
    pub async fn attach_agent(
        &self,
        source: &str,
        target: &str,
        edge: &str,
    ) -> ControllerResult<()> {
        self.mutate("attach agent", |project| {
            if source == target {
                return Err(ControllerError::validation(
                    "targetAgent",
                    format!("agent '{}' cannot invoke itself", source),
                ));
            }
            if project.agent(target).is_none() {
                return Err(ControllerError::not_found("Agent", target));
            }
            project
                .require_agent_mut(source)?
                .remote_tools
                .push(RemoteTool::Agent {
                    name: edge.to_string(),
                    target_agent: target.to_string(),
                });
            Ok(())
        })
        .await?;
        info!(source, target, edge, "Attached agent");
        Ok(())
    }

    /// Add a named edge from `source` to an MCP tool.
    pub async fn attach_mcp_tool(
        &self,
        source: &str,
        tool: &str,
        edge: &str,
    ) -> ControllerResult<()> {
        self.mutate("attach mcp tool", |project| {
            let graph = ResourceGraph::build(project);
            if !graph.contains(&ResourceRef::new(ResourceKind::McpTool, tool)) {
                return Err(ControllerError::not_found("MCP tool", tool));
            }
            project
                .require_agent_mut(source)?
                .remote_tools
                .push(RemoteTool::McpTool {
                    name: edge.to_string(),
                    target_tool: tool.to_string(),
                });
            Ok(())
        })
        .await?;
        info!(source, tool, edge, "Attached mcp tool");
        Ok(())
    }

    async fn plan_removal(
        &self,
        kind: ResourceKind,
        name: &str,
        policy: RemovalPolicy,
    ) -> ControllerResult<(Project, Project, RemovalPlan)> {
        let before = self.projects.read().await?;
        let target = RemovalTarget::new(kind, name);
        let plan = target.preview(&before, policy)?;
        let mut after = before.clone();
        target.apply(&mut after, &plan);
        Ok((before, after, plan))
    }

    /// Everything a removal would change, without writing anything.
    pub async fn preview_removal(
        &self,
        kind: ResourceKind,
        name: &str,
        policy: RemovalPolicy,
    ) -> ControllerResult<RemovalPreview> {
        let (before, after, plan) = self.plan_removal(kind, name, policy).await?;
        let spec_location = self.projects.location();
        let mut changes = vec![FileChange {
            path: spec_location.clone(),
            before: to_json(&before, &spec_location)?,
            after: to_json(&after, &spec_location)?,
        }];

        let secrets = self.secrets.load().await?;
        // keys only; values never leave the secret store
        let keys_before: Vec<&String> = secrets.keys().collect();
        let keys_after: Vec<&String> = secrets
            .keys()
            .filter(|k| !plan.secrets_removed.contains(*k) || env_var_in_use(&after, k))
            .collect();
        if keys_after.len() != keys_before.len() {
            let location = self.secrets.location();
            changes.push(FileChange {
                before: to_json(&keys_before, &location)?,
                after: to_json(&keys_after, &location)?,
                path: location,
            });
        }

        Ok(RemovalPreview {
            summary: plan.summary(),
            changes,
        })
    }

    pub async fn remove(
        &self,
        kind: ResourceKind,
        name: &str,
        policy: RemovalPolicy,
    ) -> ControllerResult<RemovalPlan> {
        let (before, after, plan) = self.plan_removal(kind, name, policy).await?;

        let mut secrets = self.secrets.load().await?;
        let before_len = secrets.len();
        secrets.retain(|key, _| !plan.secrets_removed.contains(key) || env_var_in_use(&after, key));
        let changed = (secrets.len() != before_len).then_some(&secrets);
        self.commit("remove", &before, &after, changed).await?;

        info!(
            resource = %plan.target,
            policy = %policy,
            removed = plan.removed.len(),
            pruned = plan.pruned.len(),
            "Removed resource"
        );
        Ok(plan)
    }
}

fn to_json<T: serde::Serialize>(value: &T, location: &str) -> ControllerResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|source| ControllerError::Parse {
        path: PathBuf::from(location),
        source,
    })
}

fn ensure_new(project: &Project, kind: ResourceKind, name: &str) -> ControllerResult<()> {
    if ResourceGraph::build(project).contains(&ResourceRef::new(kind, name)) {
        return Err(ControllerError::validation(
            "name",
            format!("{} '{}' already exists", kind, name),
        ));
    }
    Ok(())
}

/// Credential secrets are keyed by upper-cased name, so two credentials whose
/// names differ only in case would share one secret.
fn ensure_distinct_env_var(project: &Project, credential_name: &str) -> ControllerResult<()> {
    if let Some(existing) = credential_env_conflict(project, credential_name) {
        return Err(ControllerError::validation(
            "name",
            format!(
                "credential '{}' would share {} with existing credential '{}'",
                credential_name,
                credential_env_var(credential_name),
                existing
            ),
        ));
    }
    Ok(())
}

fn env_var_in_use(project: &Project, env_var: &str) -> bool {
    project
        .agents
        .iter()
        .flat_map(|a| a.owned_identities())
        .any(|p| credential_env_var(&p.name) == env_var)
}

fn ensure_attachable(
    project: &Project,
    agent: &str,
    resource: &ResourceRef,
) -> ControllerResult<()> {
    let graph = ResourceGraph::build(project);
    let Some(owner) = graph.owner(resource) else {
        let mut what = resource.kind.to_string();
        what[..1].make_ascii_uppercase();
        return Err(ControllerError::not_found(what, &resource.name));
    };
    if owner == agent {
        return Err(ControllerError::validation(
            "source",
            format!("agent '{}' already owns {}", agent, resource),
        ));
    }
    if graph.referrers(resource).iter().any(|a| a == agent) {
        return Err(ControllerError::validation(
            "source",
            format!("agent '{}' already uses {}", agent, resource),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::{InMemoryProjectRepository, InMemoryTargetRepository};
    use crate::infrastructure::secret_store::InMemorySecretStore;
    use async_trait::async_trait;

    struct ReadOnlySecretStore;

    #[async_trait]
    impl SecretStore for ReadOnlySecretStore {
        async fn load(&self) -> ControllerResult<BTreeMap<String, String>> {
            Ok(BTreeMap::new())
        }

        async fn save(&self, _secrets: &BTreeMap<String, String>) -> ControllerResult<()> {
            Err(ControllerError::Write {
                path: PathBuf::from(".env.local"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }

        fn location(&self) -> String {
            ".env.local".to_string()
        }
    }

    fn identity(owner: &str, name: &str, key: &str) -> AddIdentityRequest {
        AddIdentityRequest {
            owner: owner.into(),
            name: name.into(),
            provider: ModelProvider::OpenAi,
            scope: CredentialScope::Agent,
            api_key: Some(key.into()),
        }
    }

    fn service_with(project: Project) -> (ResourceService, InMemorySecretStore) {
        let secrets = InMemorySecretStore::default();
        let service = ResourceService::new(
            Arc::new(InMemoryProjectRepository::with_project(project)),
            Arc::new(InMemoryTargetRepository::default()),
            Arc::new(secrets.clone()),
        );
        (service, secrets)
    }

    async fn two_agents() -> ResourceService {
        let (service, _) = service_with(Project::new("P"));
        service
            .add_agent(AddAgentRequest::new("Owner", BuildKind::CodeZip, "app/Owner"))
            .await
            .unwrap();
        service
            .add_agent(AddAgentRequest::new("User", BuildKind::CodeZip, "app/User"))
            .await
            .unwrap();
        service
    }

    #[tokio::test]
    async fn test_duplicate_agent_rejected() {
        let service = two_agents().await;
        let err = service
            .add_agent(AddAgentRequest::new("Owner", BuildKind::CodeZip, "app/Owner"))
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_attach_requires_existing_resource() {
        let service = two_agents().await;
        let err = service.attach_memory("User", "Nope").await.unwrap_err();
        assert!(matches!(err, ControllerError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_attach_twice_rejected() {
        let service = two_agents().await;
        service
            .add_memory(AddMemoryRequest {
                owner: "Owner".into(),
                name: "M".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        service.attach_memory("User", "M").await.unwrap();
        assert!(service.attach_memory("User", "M").await.is_err());
        assert!(service.attach_memory("Owner", "M").await.is_err());
    }

    #[tokio::test]
    async fn test_self_invocation_rejected() {
        let service = two_agents().await;
        assert!(service.attach_agent("User", "User", "Loop").await.is_err());
        service.attach_agent("User", "Owner", "AskOwner").await.unwrap();
        let project = service.project().await.unwrap();
        assert!(project.agent("User").unwrap().remote_tools[0].targets_agent("Owner"));
    }

    #[tokio::test]
    async fn test_owner_may_call_own_tool() {
        let service = two_agents().await;
        service.add_mcp_tool("Owner", "Search", None).await.unwrap();
        service.attach_mcp_tool("Owner", "Search", "CallSearch").await.unwrap();
        service.attach_mcp_tool("User", "Search", "CallSearch").await.unwrap();
        assert!(service.check().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_preview_does_not_write() {
        let service = two_agents().await;
        service.add_gateway("Owner", "Gw", None).await.unwrap();
        service.attach_gateway("User", "Gw").await.unwrap();

        let preview = service
            .preview_removal(ResourceKind::Agent, "Owner", RemovalPolicy::Cascade)
            .await
            .unwrap();
        assert_eq!(preview.changes.len(), 1);
        assert!(preview.summary[0].contains("cascade"));
        assert_eq!(service.project().await.unwrap().agents.len(), 2);
    }

    #[tokio::test]
    async fn test_remove_agent_deletes_owned_secret_only() {
        let (service, secrets) = service_with(Project::new("Shop"));
        service
            .add_agent(
                AddAgentRequest::new("A", BuildKind::CodeZip, "app/A")
                    .with_provider(ModelProvider::OpenAi, Some("k1")),
            )
            .await
            .unwrap();
        service
            .add_agent(
                AddAgentRequest::new("B", BuildKind::CodeZip, "app/B")
                    .with_provider(ModelProvider::OpenAi, Some("k2")),
            )
            .await
            .unwrap();
        assert_eq!(secrets.load().await.unwrap().len(), 2);

        let preview = service
            .preview_removal(ResourceKind::Agent, "B", RemovalPolicy::Restrict)
            .await
            .unwrap();
        let secret_change = &preview.changes[1];
        assert_eq!(secret_change.after, serde_json::json!(["AGENTCORE_CREDENTIAL_SHOPOPENAI"]));

        service
            .remove(ResourceKind::Agent, "B", RemovalPolicy::Restrict)
            .await
            .unwrap();
        let remaining = secrets.load().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining["AGENTCORE_CREDENTIAL_SHOPOPENAI"], "k1");
    }

    #[tokio::test]
    async fn test_identity_names_differing_in_case_rejected() {
        let (service, secrets) = service_with(Project::new("Shop"));
        service
            .add_agent(AddAgentRequest::new("A", BuildKind::CodeZip, "app/A"))
            .await
            .unwrap();
        service.add_identity(identity("A", "Keys", "k-lower")).await.unwrap();

        let err = service
            .add_identity(identity("A", "KEYS", "k-upper"))
            .await
            .unwrap_err();
        match err {
            ControllerError::Validation { field, message } => {
                assert_eq!(field, "name");
                assert!(message.contains("Keys"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(secrets.load().await.unwrap()["AGENTCORE_CREDENTIAL_KEYS"], "k-lower");
        let project = service.project().await.unwrap();
        assert_eq!(project.agent("A").unwrap().identity_providers.len(), 1);
    }

    #[tokio::test]
    async fn test_agent_credential_colliding_by_case_rejected() {
        let (service, _) = service_with(Project::new("Shop"));
        service
            .add_agent(AddAgentRequest::new("A", BuildKind::CodeZip, "app/A"))
            .await
            .unwrap();
        service
            .add_identity(identity("A", "SHOPOPENAI", "k1"))
            .await
            .unwrap();

        let err = service
            .add_agent(
                AddAgentRequest::new("B", BuildKind::CodeZip, "app/B")
                    .with_provider(ModelProvider::OpenAi, Some("k2")),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::Validation { .. }));
        assert!(service.project().await.unwrap().agent("B").is_none());
    }

    #[tokio::test]
    async fn test_failed_secret_write_restores_spec() {
        let projects = Arc::new(InMemoryProjectRepository::with_project(Project::new("Shop")));
        let service = ResourceService::new(
            projects.clone(),
            Arc::new(InMemoryTargetRepository::default()),
            Arc::new(ReadOnlySecretStore),
        );
        service
            .add_agent(AddAgentRequest::new("A", BuildKind::CodeZip, "app/A"))
            .await
            .unwrap();

        let err = service
            .add_agent(
                AddAgentRequest::new("B", BuildKind::CodeZip, "app/B")
                    .with_provider(ModelProvider::OpenAi, Some("k1")),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::Write { .. }));

        let err = service
            .add_identity(identity("A", "Keys", "k2"))
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::Write { .. }));

        let project = projects.read().await.unwrap();
        assert_eq!(project.agents.len(), 1);
        assert!(project.agents[0].identity_providers.is_empty());
    }
}
