// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Credential Strategy Resolver
//!
//! Decides, when an agent is created with a provider that needs an API key,
//! whether it reuses the project-scoped credential or gets its own.
//!
//! | Project credential exists | Candidate secret | Outcome |
//! |---------------------------|------------------|---------|
//! | no | any | create `{project}{provider}`, owned, project scope |
//! | yes | none | reuse (`use` entry) |
//! | yes | byte-identical to local value | reuse (`use` entry) |
//! | yes | different | create `{project}{agent}{provider}`, owned, agent scope |
//!
//! The resolver is a pure function: the local secret store is handed in as a
//! lookup, never read from ambient process state.

use crate::domain::project::{ModelProvider, Project};

/// Prefix of every credential's environment-variable name.
pub const CREDENTIAL_ENV_PREFIX: &str = "AGENTCORE_CREDENTIAL_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialStrategy {
    /// Attach to an existing credential instead of creating one.
    pub reuse: bool,
    pub credential_name: String,
    pub env_var_name: String,
    pub is_agent_scoped: bool,
}

pub fn project_credential_name(project: &str, provider: ModelProvider) -> String {
    format!("{}{}", project, provider)
}

pub fn agent_credential_name(project: &str, agent: &str, provider: ModelProvider) -> String {
    format!("{}{}{}", project, agent, provider)
}

/// `AGENTCORE_CREDENTIAL_{NAME_UPPERCASE}`
pub fn credential_env_var(credential_name: &str) -> String {
    format!("{}{}", CREDENTIAL_ENV_PREFIX, credential_name.to_uppercase())
}

/// Name of an owned credential whose environment variable collides with
/// `credential_name`'s. Names differing only in case share a variable.
pub fn credential_env_conflict<'a>(project: &'a Project, credential_name: &str) -> Option<&'a str> {
    let env_var = credential_env_var(credential_name);
    project
        .agents
        .iter()
        .flat_map(|a| a.owned_identities())
        .find(|p| credential_env_var(&p.name) == env_var)
        .map(|p| p.name.as_str())
}

fn credential_exists(project: &Project, name: &str) -> bool {
    project
        .agents
        .iter()
        .flat_map(|a| a.owned_identities())
        .any(|p| p.name == name)
}

/// Resolve the credential strategy for a new agent.
///
/// Returns `None` when `provider` needs no secret. `existing_secret` looks up
/// the locally stored value by environment-variable name. Secrets are compared
/// byte for byte; no trimming or case folding.
pub fn resolve_credential_strategy(
    project: &Project,
    provider: ModelProvider,
    agent: &str,
    candidate_secret: Option<&str>,
    existing_secret: &dyn Fn(&str) -> Option<String>,
) -> Option<CredentialStrategy> {
    if !provider.requires_api_key() {
        return None;
    }

    let project_name = project_credential_name(&project.name, provider);
    let project_env = credential_env_var(&project_name);

    if !credential_exists(project, &project_name) {
        return Some(CredentialStrategy {
            reuse: false,
            credential_name: project_name,
            env_var_name: project_env,
            is_agent_scoped: false,
        });
    }

    let identical = match candidate_secret {
        None => true,
        Some(candidate) => existing_secret(&project_env).as_deref() == Some(candidate),
    };

    if identical {
        Some(CredentialStrategy {
            reuse: true,
            credential_name: project_name,
            env_var_name: project_env,
            is_agent_scoped: false,
        })
    } else {
        let agent_name = agent_credential_name(&project.name, agent, provider);
        Some(CredentialStrategy {
            reuse: false,
            env_var_name: credential_env_var(&agent_name),
            credential_name: agent_name,
            is_agent_scoped: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::project::{Agent, BuildKind, CredentialScope, IdentityProvider};
    use std::collections::HashMap;

    fn project_with_credential() -> Project {
        let mut project = Project::new("Shop");
        let mut first = Agent::new("First", BuildKind::CodeZip, "app/First");
        first.model_provider = ModelProvider::OpenAi;
        first.identity_providers.push(IdentityProvider::owned(
            "ShopOpenAI",
            ModelProvider::OpenAi,
            CredentialScope::Project,
        ));
        project.agents.push(first);
        project
    }

    fn store() -> HashMap<String, String> {
        let mut secrets = HashMap::new();
        secrets.insert("AGENTCORE_CREDENTIAL_SHOPOPENAI".to_string(), "sk-one".to_string());
        secrets
    }

    #[test]
    fn test_bedrock_needs_no_credential() {
        let project = Project::new("Shop");
        let strategy =
            resolve_credential_strategy(&project, ModelProvider::Bedrock, "A", None, &|_| None);
        assert!(strategy.is_none());
    }

    #[test]
    fn test_first_agent_creates_project_credential() {
        let project = Project::new("Shop");
        let strategy = resolve_credential_strategy(
            &project,
            ModelProvider::Anthropic,
            "A",
            Some("k"),
            &|_| None,
        )
        .unwrap();
        assert!(!strategy.reuse);
        assert!(!strategy.is_agent_scoped);
        assert_eq!(strategy.credential_name, "ShopAnthropic");
        assert_eq!(strategy.env_var_name, "AGENTCORE_CREDENTIAL_SHOPANTHROPIC");
    }

    #[test]
    fn test_identical_secret_reuses() {
        let project = project_with_credential();
        let secrets = store();
        let lookup = |k: &str| secrets.get(k).cloned();
        let strategy = resolve_credential_strategy(
            &project,
            ModelProvider::OpenAi,
            "Second",
            Some("sk-one"),
            &lookup,
        )
        .unwrap();
        assert!(strategy.reuse);
        assert_eq!(strategy.credential_name, "ShopOpenAI");
    }

    #[test]
    fn test_no_secret_reuses() {
        let project = project_with_credential();
        let strategy = resolve_credential_strategy(
            &project,
            ModelProvider::OpenAi,
            "Second",
            None,
            &|_| None,
        )
        .unwrap();
        assert!(strategy.reuse);
    }

    #[test]
    fn test_different_secret_is_agent_scoped() {
        let project = project_with_credential();
        let secrets = store();
        let lookup = |k: &str| secrets.get(k).cloned();
        let strategy = resolve_credential_strategy(
            &project,
            ModelProvider::OpenAi,
            "Third",
            Some("sk-two"),
            &lookup,
        )
        .unwrap();
        assert!(!strategy.reuse);
        assert!(strategy.is_agent_scoped);
        assert_eq!(strategy.credential_name, "ShopThirdOpenAI");
        assert_eq!(strategy.env_var_name, "AGENTCORE_CREDENTIAL_SHOPTHIRDOPENAI");
    }

    #[test]
    fn test_comparison_is_byte_exact() {
        let project = project_with_credential();
        let secrets = store();
        let lookup = |k: &str| secrets.get(k).cloned();
        let strategy = resolve_credential_strategy(
            &project,
            ModelProvider::OpenAi,
            "Fourth",
            Some("sk-one "),
            &lookup,
        )
        .unwrap();
        assert!(strategy.is_agent_scoped);
    }

    #[test]
    fn test_env_var_conflict_ignores_case() {
        let project = project_with_credential();
        assert_eq!(credential_env_conflict(&project, "SHOPOPENAI"), Some("ShopOpenAI"));
        assert_eq!(credential_env_conflict(&project, "ShopOpenAI"), Some("ShopOpenAI"));
        assert_eq!(credential_env_conflict(&project, "ShopGemini"), None);
    }
}
