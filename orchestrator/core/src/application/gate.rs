// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Bootstrap & Stack-Status Gate
//!
//! Two independent checks run after synthesis and before the deploy call.

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::error::{ControllerError, ControllerResult};
use crate::domain::provisioning::{CloudInspector, ProvisioningEngine};
use crate::domain::stack::BlockingStack;
use crate::domain::target::AwsDeploymentTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    AlreadyBootstrapped,
    /// The environment was missing scaffolding and has now been bootstrapped.
    Bootstrapped,
    /// The status query failed; the deploy call will report a real problem.
    Unknown,
}

pub struct DeploymentGate {
    engine: Arc<dyn ProvisioningEngine>,
    inspector: Arc<dyn CloudInspector>,
}

impl DeploymentGate {
    pub fn new(engine: Arc<dyn ProvisioningEngine>, inspector: Arc<dyn CloudInspector>) -> Self {
        Self { engine, inspector }
    }

    pub async fn ensure_bootstrapped(
        &self,
        target: &AwsDeploymentTarget,
        auto_confirm: bool,
    ) -> ControllerResult<BootstrapOutcome> {
        let bootstrapped = match self.inspector.query_bootstrap_status(target).await {
            Ok(status) => status,
            Err(e) => {
                warn!(target = %target.name, "Bootstrap status unavailable, continuing: {:#}", e);
                return Ok(BootstrapOutcome::Unknown);
            }
        };
        if bootstrapped {
            return Ok(BootstrapOutcome::AlreadyBootstrapped);
        }

        if !auto_confirm {
            return Err(ControllerError::Environment(format!(
                "environment aws://{}/{} is not bootstrapped; re-run with --yes to auto-bootstrap",
                target.account, target.region
            )));
        }

        info!(target = %target.name, region = %target.region, "Bootstrapping environment");
        self.engine
            .bootstrap(target)
            .await
            .map_err(|e| ControllerError::provisioning("Bootstrap", e))?;
        Ok(BootstrapOutcome::Bootstrapped)
    }

    /// The first stack that cannot accept a deploy, if any.
    pub async fn check_stack_status(
        &self,
        region: &str,
        stack_names: &[String],
    ) -> ControllerResult<Option<BlockingStack>> {
        for stack_name in stack_names {
            let status = self
                .inspector
                .query_stack_status(region, stack_name)
                .await
                .map_err(|e| {
                    ControllerError::Environment(format!(
                        "unable to read status of stack {}: {:#}",
                        stack_name, e
                    ))
                })?;
            let Some(status) = status else {
                continue;
            };
            if let Some(reason) = status.blocking_reason() {
                return Ok(Some(BlockingStack {
                    stack_name: stack_name.clone(),
                    status,
                    reason,
                }));
            }
        }
        Ok(None)
    }
}
