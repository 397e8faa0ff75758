// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Resource creation commands
//!
//! Commands: agent, memory, identity, gateway, mcp-tool, target

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::io::IsTerminal;

use agentcore_core::application::resources::{AddAgentRequest, AddIdentityRequest, AddMemoryRequest};
use agentcore_core::domain::project::{BuildKind, CredentialScope, ModelProvider, NetworkMode};
use agentcore_core::domain::target::AwsDeploymentTarget;

use crate::context::ProjectContext;

#[derive(Subcommand)]
pub enum AddCommand {
    /// Declare a new agent
    Agent {
        #[arg(long)]
        name: String,

        /// CodeZip or Container
        #[arg(long, default_value = "CodeZip")]
        build: BuildKind,

        /// Agent code directory, relative to the project root (default: app/<name>)
        #[arg(long)]
        code_location: Option<String>,

        #[arg(long)]
        entrypoint: Option<String>,

        #[arg(long)]
        runtime_version: Option<String>,

        /// PUBLIC or VPC
        #[arg(long, default_value = "PUBLIC")]
        network_mode: NetworkMode,

        /// Bedrock, Anthropic, OpenAI or Gemini
        #[arg(long, default_value = "Bedrock")]
        model_provider: ModelProvider,

        /// API key for non-Bedrock providers (prompted when omitted)
        #[arg(long, env = "AGENTCORE_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },

    /// Add a memory owned by an agent
    Memory {
        #[arg(long)]
        owner: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        event_expiry_days: Option<u32>,

        /// Extraction strategy, repeatable
        #[arg(long = "strategy")]
        strategies: Vec<String>,
    },

    /// Add an API-key credential owned by an agent
    Identity {
        #[arg(long)]
        owner: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        provider: ModelProvider,

        /// project or agent
        #[arg(long, default_value = "project")]
        scope: CredentialScope,

        #[arg(long, env = "AGENTCORE_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },

    /// Add a gateway owned by an agent
    Gateway {
        #[arg(long)]
        owner: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// Add an MCP tool owned by an agent
    #[command(name = "mcp-tool")]
    McpTool {
        #[arg(long)]
        owner: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// Add a deployment target
    Target {
        #[arg(long)]
        name: String,

        #[arg(long)]
        account: String,

        #[arg(long)]
        region: String,
    },
}

pub async fn handle_command(command: AddCommand, ctx: &ProjectContext) -> Result<()> {
    let service = ctx.resource_service();

    match command {
        AddCommand::Agent {
            name,
            build,
            code_location,
            entrypoint,
            runtime_version,
            network_mode,
            model_provider,
            api_key,
        } => {
            let api_key = match api_key {
                Some(key) => Some(key),
                None if model_provider.requires_api_key() => prompt_api_key(model_provider)?,
                None => None,
            };
            let code_location = code_location.unwrap_or_else(|| format!("app/{}", name));
            let mut request = AddAgentRequest::new(&name, build, code_location)
                .with_provider(model_provider, api_key.as_deref());
            request.entrypoint = entrypoint;
            request.runtime_version = runtime_version;
            request.network_mode = network_mode;

            let added = service.add_agent(request).await.context("Failed to add agent")?;
            println!("{}", format!("✓ Agent '{}' added", added.name).green());
            if let Some(credential) = added.credential {
                if credential.reuse {
                    println!("  Reusing credential {}", credential.credential_name.bold());
                } else {
                    println!(
                        "  Credential {} stored as {}",
                        credential.credential_name.bold(),
                        credential.env_var_name
                    );
                }
            }
        }

        AddCommand::Memory {
            owner,
            name,
            description,
            event_expiry_days,
            strategies,
        } => {
            service
                .add_memory(AddMemoryRequest {
                    owner: owner.clone(),
                    name: name.clone(),
                    description,
                    event_expiry_days,
                    strategies,
                })
                .await
                .context("Failed to add memory")?;
            println!("{}", format!("✓ Memory '{}' added to {}", name, owner).green());
        }

        AddCommand::Identity {
            owner,
            name,
            provider,
            scope,
            api_key,
        } => {
            let api_key = match api_key {
                Some(key) => Some(key),
                None => prompt_api_key(provider)?,
            };
            service
                .add_identity(AddIdentityRequest {
                    owner: owner.clone(),
                    name: name.clone(),
                    provider,
                    scope,
                    api_key,
                })
                .await
                .context("Failed to add identity")?;
            println!("{}", format!("✓ Identity '{}' added to {}", name, owner).green());
        }

        AddCommand::Gateway {
            owner,
            name,
            description,
        } => {
            service
                .add_gateway(&owner, &name, description)
                .await
                .context("Failed to add gateway")?;
            println!("{}", format!("✓ Gateway '{}' added to {}", name, owner).green());
        }

        AddCommand::McpTool {
            owner,
            name,
            description,
        } => {
            service
                .add_mcp_tool(&owner, &name, description)
                .await
                .context("Failed to add MCP tool")?;
            println!("{}", format!("✓ MCP tool '{}' added to {}", name, owner).green());
        }

        AddCommand::Target {
            name,
            account,
            region,
        } => {
            service
                .add_target(AwsDeploymentTarget::new(&name, account, region))
                .await
                .context("Failed to add target")?;
            println!("{}", format!("✓ Target '{}' added", name).green());
        }
    }

    Ok(())
}

/// Ask for a key on an interactive terminal; `None` elsewhere.
fn prompt_api_key(provider: ModelProvider) -> Result<Option<String>> {
    if !std::io::stdin().is_terminal() {
        return Ok(None);
    }
    let key = dialoguer::Password::new()
        .with_prompt(format!("{} API key (leave empty to set later)", provider))
        .allow_empty_password(true)
        .interact()
        .context("Failed to read API key")?;
    Ok(Some(key).filter(|k| !k.is_empty()))
}
