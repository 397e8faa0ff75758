// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! AWS CLI adapters
//!
//! Cloud queries and credential-provider registration, performed through the
//! `aws` command line with JSON output.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::process::CommandLine;
use crate::domain::provisioning::{CloudInspector, CredentialRegistration, IdentityProvisioner};
use crate::domain::stack::StackStatus;
use crate::domain::target::AwsDeploymentTarget;

/// Stack created by `cdk bootstrap` in every bootstrapped environment.
pub const BOOTSTRAP_STACK_NAME: &str = "CDKToolkit";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CallerIdentity {
    account: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeStacks {
    #[serde(default)]
    stacks: Vec<StackDescription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StackDescription {
    stack_status: String,
    #[serde(default)]
    outputs: Vec<StackOutput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StackOutput {
    output_key: String,
    output_value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenVault {
    kms_configuration: Option<KmsConfiguration>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KmsConfiguration {
    kms_key_arn: Option<String>,
}

fn is_missing_stack(error: &anyhow::Error) -> bool {
    format!("{:#}", error).contains("does not exist")
}

fn parse_stack(json: &str) -> Result<Option<StackDescription>> {
    let described: DescribeStacks =
        serde_json::from_str(json).context("Unexpected describe-stacks output")?;
    Ok(described.stacks.into_iter().next())
}

pub struct AwsCliInspector {
    aws: CommandLine,
}

impl AwsCliInspector {
    pub fn new(aws_command: &str) -> Result<Self> {
        Ok(Self {
            aws: CommandLine::parse(aws_command)?,
        })
    }

    async fn describe_stack(
        &self,
        region: &str,
        stack_name: &str,
    ) -> Result<Option<StackDescription>> {
        let result = self
            .aws
            .run(
                &[
                    "cloudformation",
                    "describe-stacks",
                    "--stack-name",
                    stack_name,
                    "--region",
                    region,
                    "--output",
                    "json",
                ],
                None,
                &[],
            )
            .await;
        match result {
            Ok(json) => parse_stack(&json),
            Err(e) if is_missing_stack(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl CloudInspector for AwsCliInspector {
    async fn validate_credentials(&self, target: &AwsDeploymentTarget) -> Result<()> {
        let json = self
            .aws
            .run(
                &["sts", "get-caller-identity", "--region", &target.region, "--output", "json"],
                None,
                &[],
            )
            .await
            .context("No usable AWS credentials; configure a profile or export credentials")?;
        let identity: CallerIdentity =
            serde_json::from_str(&json).context("Unexpected get-caller-identity output")?;
        if identity.account != target.account {
            anyhow::bail!(
                "AWS credentials belong to account {}, but target '{}' is account {}",
                identity.account,
                target.name,
                target.account
            );
        }
        debug!(account = %identity.account, "AWS credentials validated");
        Ok(())
    }

    async fn query_bootstrap_status(&self, target: &AwsDeploymentTarget) -> Result<bool> {
        let stack = self.describe_stack(&target.region, BOOTSTRAP_STACK_NAME).await?;
        Ok(stack.is_some_and(|s| !s.stack_status.starts_with("DELETE_")))
    }

    async fn query_stack_status(
        &self,
        region: &str,
        stack_name: &str,
    ) -> Result<Option<StackStatus>> {
        Ok(self
            .describe_stack(region, stack_name)
            .await?
            .map(|s| StackStatus::new(s.stack_status)))
    }

    async fn fetch_stack_outputs(
        &self,
        region: &str,
        stack_name: &str,
    ) -> Result<BTreeMap<String, String>> {
        let stack = self
            .describe_stack(region, stack_name)
            .await?
            .with_context(|| format!("Stack {} not found in {}", stack_name, region))?;
        Ok(stack
            .outputs
            .into_iter()
            .map(|o| (o.output_key, o.output_value))
            .collect())
    }
}

/// Registers API-key credential providers with the AgentCore identity service.
pub struct AwsCliIdentityProvisioner {
    aws: CommandLine,
}

impl AwsCliIdentityProvisioner {
    pub fn new(aws_command: &str) -> Result<Self> {
        Ok(Self {
            aws: CommandLine::parse(aws_command)?,
        })
    }

    async fn upsert(&self, region: &str, credential: &CredentialRegistration) -> Result<()> {
        let create = self
            .aws
            .run(
                &[
                    "bedrock-agentcore-control",
                    "create-api-key-credential-provider",
                    "--name",
                    &credential.name,
                    "--api-key",
                    &credential.api_key,
                    "--region",
                    region,
                ],
                None,
                &[],
            )
            .await;
        match create {
            Ok(_) => {
                info!(
                    name = %credential.name,
                    provider = %credential.provider,
                    "Created credential provider"
                );
                Ok(())
            }
            Err(e) if format!("{:#}", e).contains("already exists") => {
                self.aws
                    .run(
                        &[
                            "bedrock-agentcore-control",
                            "update-api-key-credential-provider",
                            "--name",
                            &credential.name,
                            "--api-key",
                            &credential.api_key,
                            "--region",
                            region,
                        ],
                        None,
                        &[],
                    )
                    .await
                    .with_context(|| {
                        format!("Failed to update credential provider {}", credential.name)
                    })?;
                info!(name = %credential.name, "Updated credential provider");
                Ok(())
            }
            Err(e) => Err(e.context(format!(
                "Failed to create credential provider {}",
                credential.name
            ))),
        }
    }
}

#[async_trait]
impl IdentityProvisioner for AwsCliIdentityProvisioner {
    async fn register(
        &self,
        target: &AwsDeploymentTarget,
        credentials: &[CredentialRegistration],
    ) -> Result<Option<String>> {
        if credentials.is_empty() {
            return Ok(None);
        }
        for credential in credentials {
            self.upsert(&target.region, credential).await?;
        }

        let json = self
            .aws
            .run(
                &[
                    "bedrock-agentcore-control",
                    "get-token-vault",
                    "--region",
                    &target.region,
                    "--output",
                    "json",
                ],
                None,
                &[],
            )
            .await
            .context("Failed to read token vault")?;
        let vault: TokenVault =
            serde_json::from_str(&json).context("Unexpected get-token-vault output")?;
        Ok(vault.kms_configuration.and_then(|k| k.kms_key_arn))
    }
}
