// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Destroy
//!
//! Tears down a target's stack regardless of what the spec declares, then
//! clears that target's deployed-state entry. Runs through the same step
//! machinery as deploy, over [`DeployStep::DESTROY_PIPELINE`].

use tracing::info;

use crate::application::deploy::{DeploymentOrchestrator, RunState, StepResult};
use crate::domain::deployment::{DeployOptions, DeployOutcome, DeployProgress, DeployStep};
use crate::domain::error::{ControllerError, ControllerResult};
use crate::domain::provisioning::DeployRequest;
use crate::infrastructure::run_log::DeployRunLog;

impl DeploymentOrchestrator {
    /// Destroy the stack of `target` (the first configured target when absent).
    /// `confirmed` must be set; the caller is responsible for asking.
    pub async fn destroy(
        &self,
        target: Option<String>,
        confirmed: bool,
        progress: &dyn DeployProgress,
    ) -> DeployOutcome {
        info!(target = ?target, "Starting destroy");
        let mut run = RunState::new(DeployOptions {
            target,
            auto_confirm: confirmed,
            teardown_confirmed: confirmed,
        });
        run.destroying = true;
        let log = DeployRunLog::create(&self.log_dir, "destroy");

        let result = self
            .run_steps(&DeployStep::DESTROY_PIPELINE, &mut run, progress, &log)
            .await;
        self.finish(result, run, log).await
    }

    pub(crate) async fn destroy_stack(&self, run: &mut RunState) -> ControllerResult<StepResult> {
        let target = run.target()?.clone();
        let recorded = self
            .deployed_state
            .read()
            .await?
            .target(&target.name)
            .map(|t| t.resources.stack_name.clone());
        let stack_name = match recorded {
            Some(name) => name,
            None => target.stack_name(&self.projects.read().await?.name),
        };

        info!(target = %target.name, stack = %stack_name, "Destroying stack");
        let request = DeployRequest {
            target,
            stack_names: vec![stack_name.clone()],
            kms_key_arn: None,
        };
        self.engine
            .destroy(&request)
            .await
            .map_err(|e| ControllerError::provisioning(DeployStep::Destroy.label(), e))?;
        run.stack_name = Some(stack_name);
        Ok(StepResult::Done)
    }
}
