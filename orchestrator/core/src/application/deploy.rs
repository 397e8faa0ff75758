// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Deployment Orchestrator
//!
//! Application service that reconciles the declared graph with one target.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Responsibility:** Drive the deploy pipeline step by step
//! - **Collaborators:**
//!   - Application: DeploymentPreflight, DeploymentGate, output parsing
//!   - Infrastructure: ProvisioningEngine, CloudInspector, IdentityProvisioner,
//!     Packager, repositories, SecretStore, DeployRunLog
//!
//! # Flow
//!
//! The orchestrator walks [`DeployStep::PIPELINE`] in order, reporting
//! `start` and then `success`, `skipped` or `error` for each step to the
//! progress sink and the run log. The first failing step ends the run with a
//! [`DeployOutcome::Failed`] carrying that step and the log path; errors never
//! escape as `Err`. The engine is disposed at the end of every run.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::application::gate::{BootstrapOutcome, DeploymentGate};
use crate::application::outputs::parse_agent_outputs;
use crate::application::preflight::{resolve_target, DeploymentPreflight};
use crate::domain::credential::credential_env_var;
use crate::domain::deployed_state::{AgentDeployedState, TargetState};
use crate::domain::deployment::{
    DeployFailure, DeployOptions, DeployOutcome, DeployProgress, DeployStep, DeploySuccess,
    PreflightContext, StepStatus, NEXT_STEPS,
};
use crate::domain::error::{ControllerError, ControllerResult};
use crate::domain::project::BuildKind;
use crate::domain::provisioning::{
    CloudInspector, CredentialRegistration, DeployRequest, IdentityProvisioner, Packager,
    ProvisioningEngine,
};
use crate::domain::repository::{
    DeployedStateRepository, ProjectRepository, SecretStore, TargetRepository,
};
use crate::domain::target::AwsDeploymentTarget;
use crate::infrastructure::run_log::DeployRunLog;

/// Collaborators the orchestrator is assembled from.
pub struct DeploymentDependencies {
    pub projects: Arc<dyn ProjectRepository>,
    pub targets: Arc<dyn TargetRepository>,
    pub deployed_state: Arc<dyn DeployedStateRepository>,
    pub secrets: Arc<dyn SecretStore>,
    pub engine: Arc<dyn ProvisioningEngine>,
    pub inspector: Arc<dyn CloudInspector>,
    pub identity: Arc<dyn IdentityProvisioner>,
    pub packager: Arc<dyn Packager>,
}

pub struct DeploymentOrchestrator {
    pub(crate) projects: Arc<dyn ProjectRepository>,
    pub(crate) targets: Arc<dyn TargetRepository>,
    pub(crate) deployed_state: Arc<dyn DeployedStateRepository>,
    pub(crate) secrets: Arc<dyn SecretStore>,
    pub(crate) engine: Arc<dyn ProvisioningEngine>,
    pub(crate) identity: Arc<dyn IdentityProvisioner>,
    pub(crate) packager: Arc<dyn Packager>,
    pub(crate) inspector: Arc<dyn CloudInspector>,
    pub(crate) preflight: DeploymentPreflight,
    pub(crate) gate: DeploymentGate,
    pub(crate) log_dir: PathBuf,
}

pub(crate) enum StepResult {
    Done,
    Skipped(String),
}

/// Values carried from one step to the next.
#[derive(Default)]
pub(crate) struct RunState {
    pub(crate) options: DeployOptions,
    /// Running `destroy` rather than `deploy`.
    pub(crate) destroying: bool,
    pub(crate) target: Option<AwsDeploymentTarget>,
    pub(crate) context: Option<PreflightContext>,
    pub(crate) stack_names: Vec<String>,
    pub(crate) stack_name: Option<String>,
    pub(crate) kms_key_arn: Option<String>,
    pub(crate) outputs: BTreeMap<String, String>,
    pub(crate) agents: BTreeMap<String, AgentDeployedState>,
}

impl RunState {
    pub(crate) fn new(options: DeployOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub(crate) fn target(&self) -> ControllerResult<&AwsDeploymentTarget> {
        self.target
            .as_ref()
            .ok_or_else(|| ControllerError::Environment("deployment target not resolved".into()))
    }

    fn context(&self) -> ControllerResult<&PreflightContext> {
        self.context
            .as_ref()
            .ok_or_else(|| ControllerError::Environment("preflight has not run".into()))
    }

    fn is_teardown(&self) -> bool {
        self.destroying || self.context.as_ref().is_some_and(|c| c.is_teardown)
    }
}

impl DeploymentOrchestrator {
    pub fn new(
        deps: DeploymentDependencies,
        project_root: impl Into<PathBuf>,
        log_dir: impl Into<PathBuf>,
    ) -> Self {
        let preflight = DeploymentPreflight::new(
            deps.projects.clone(),
            deps.targets.clone(),
            deps.deployed_state.clone(),
            deps.inspector.clone(),
            project_root,
        );
        let gate = DeploymentGate::new(deps.engine.clone(), deps.inspector.clone());
        Self {
            projects: deps.projects,
            targets: deps.targets,
            deployed_state: deps.deployed_state,
            secrets: deps.secrets,
            engine: deps.engine,
            identity: deps.identity,
            packager: deps.packager,
            inspector: deps.inspector,
            preflight,
            gate,
            log_dir: log_dir.into(),
        }
    }

    /// Preflight stages 1-3 on their own, so callers can detect a teardown
    /// and ask for confirmation before deploying.
    pub async fn preflight(&self) -> ControllerResult<PreflightContext> {
        self.preflight.run().await
    }

    pub async fn deploy(
        &self,
        options: DeployOptions,
        progress: &dyn DeployProgress,
    ) -> DeployOutcome {
        info!(target = ?options.target, auto_confirm = options.auto_confirm, "Starting deploy");
        let mut run = RunState::new(options);
        let log = DeployRunLog::create(&self.log_dir, "deploy");

        let result = self.run_steps(&DeployStep::PIPELINE, &mut run, progress, &log).await;
        self.finish(result, run, log).await
    }

    pub(crate) async fn run_steps(
        &self,
        steps: &[DeployStep],
        run: &mut RunState,
        progress: &dyn DeployProgress,
        log: &DeployRunLog,
    ) -> Result<(), (DeployStep, ControllerError)> {
        for &step in steps {
            progress.on_step(step, &StepStatus::Start);
            log.step(step, &StepStatus::Start);
            debug!(step = %step, "Running step");

            let status = match self.execute(step, run).await {
                Ok(StepResult::Done) => StepStatus::Success,
                Ok(StepResult::Skipped(reason)) => StepStatus::Skipped { reason },
                Err(e) => {
                    let status = StepStatus::Error {
                        message: e.to_string(),
                    };
                    progress.on_step(step, &status);
                    log.step(step, &status);
                    warn!(step = %step, "Step failed: {}", e);
                    return Err((step, e));
                }
            };
            progress.on_step(step, &status);
            log.step(step, &status);
        }
        Ok(())
    }

    pub(crate) async fn finish(
        &self,
        result: Result<(), (DeployStep, ControllerError)>,
        run: RunState,
        log: DeployRunLog,
    ) -> DeployOutcome {
        if let Err(e) = self.engine.dispose().await {
            warn!("Failed to dispose provisioning engine: {:#}", e);
        }

        match result {
            Ok(()) => {
                log.finish(true, None);
                let teardown = run.is_teardown();
                let target = run.target.map(|t| t.name).unwrap_or_default();
                info!(target = %target, teardown, "Run succeeded");
                DeployOutcome::Succeeded(DeploySuccess {
                    target,
                    stack_name: run.stack_name.unwrap_or_default(),
                    outputs: run.outputs,
                    log_path: log.path().to_path_buf(),
                    next_steps: if teardown {
                        Vec::new()
                    } else {
                        NEXT_STEPS.iter().map(|s| s.to_string()).collect()
                    },
                    teardown,
                })
            }
            Err((step, error)) => {
                let message = error.to_string();
                log.finish(false, Some(&message));
                DeployOutcome::Failed(DeployFailure {
                    step,
                    message,
                    log_path: Some(log.path().to_path_buf()),
                })
            }
        }
    }

    async fn execute(&self, step: DeployStep, run: &mut RunState) -> ControllerResult<StepResult> {
        match step {
            DeployStep::ResolveTarget => {
                let targets = self.targets.read().await?;
                let target = resolve_target(&targets, run.options.target.as_deref())?;
                info!(
                    target = %target.name,
                    account = %target.account,
                    region = %target.region,
                    "Resolved target"
                );
                if run.destroying && !run.options.teardown_confirmed {
                    return Err(ControllerError::validation(
                        "teardown",
                        format!(
                            "destroying target '{}' deletes every deployed resource; \
                             confirm with --yes",
                            target.name
                        ),
                    ));
                }
                run.target = Some(target);
                Ok(StepResult::Done)
            }

            DeployStep::Preflight => {
                let context = self.preflight.run().await?;
                if context.is_teardown && !run.options.teardown_confirmed {
                    return Err(ControllerError::validation(
                        "teardown",
                        "all agents were removed; this deploy tears down the deployed stack. \
                         Confirm the teardown (--yes) to continue",
                    ));
                }
                let target = run.target()?;
                run.stack_name = Some(target.stack_name(&context.project.name));
                run.context = Some(context);
                Ok(StepResult::Done)
            }

            DeployStep::ValidateCredentials => {
                self.preflight.validate_credentials(run.target()?).await?;
                Ok(StepResult::Done)
            }

            DeployStep::Package => {
                let context = run.context()?;
                let zip_agents: Vec<_> = context
                    .project
                    .agents
                    .iter()
                    .filter(|a| a.build == BuildKind::CodeZip)
                    .collect();
                if zip_agents.is_empty() {
                    return Ok(StepResult::Skipped("no code-archive agents".into()));
                }
                for agent in zip_agents {
                    let artifact = self
                        .packager
                        .package(agent)
                        .await
                        .map_err(|e| ControllerError::provisioning(step.label(), e))?;
                    info!(
                        agent = %artifact.agent,
                        size_bytes = artifact.size_bytes,
                        "Packaged agent"
                    );
                }
                Ok(StepResult::Done)
            }

            DeployStep::Build => {
                self.engine
                    .build()
                    .await
                    .map_err(|e| ControllerError::provisioning(step.label(), e))?;
                Ok(StepResult::Done)
            }

            DeployStep::Synthesize => {
                let stacks = self
                    .engine
                    .synth(run.target()?)
                    .await
                    .map_err(|e| ControllerError::provisioning(step.label(), e))?;
                info!(stacks = ?stacks, "Synthesized templates");
                run.stack_names = stacks;
                Ok(StepResult::Done)
            }

            DeployStep::Bootstrap => {
                let outcome = self
                    .gate
                    .ensure_bootstrapped(run.target()?, run.options.auto_confirm)
                    .await?;
                Ok(match outcome {
                    BootstrapOutcome::AlreadyBootstrapped => {
                        StepResult::Skipped("environment already bootstrapped".into())
                    }
                    BootstrapOutcome::Bootstrapped => StepResult::Done,
                    BootstrapOutcome::Unknown => {
                        StepResult::Skipped("bootstrap status unavailable".into())
                    }
                })
            }

            DeployStep::StackStatus => {
                let region = run.target()?.region.clone();
                let blocking = self.gate.check_stack_status(&region, &run.stack_names).await?;
                if let Some(blocking) = blocking {
                    return Err(ControllerError::Environment(format!(
                        "stack {} cannot be deployed: {}",
                        blocking.stack_name, blocking.reason
                    )));
                }
                Ok(StepResult::Done)
            }

            DeployStep::ProvisionIdentity => {
                let registrations = self.credential_registrations(run.context()?).await?;
                if registrations.is_empty() {
                    return Ok(StepResult::Skipped("no owned API-key credentials".into()));
                }
                let kms_key_arn = self
                    .identity
                    .register(run.target()?, &registrations)
                    .await
                    .map_err(|e| ControllerError::provisioning(step.label(), e))?;
                info!(
                    credentials = registrations.len(),
                    kms = ?kms_key_arn,
                    "Provisioned credential providers"
                );
                run.kms_key_arn = kms_key_arn;
                Ok(StepResult::Done)
            }

            DeployStep::Deploy => {
                let request = DeployRequest {
                    target: run.target()?.clone(),
                    stack_names: run.stack_names.clone(),
                    kms_key_arn: run.kms_key_arn.clone(),
                };
                self.engine
                    .deploy(&request)
                    .await
                    .map_err(|e| ControllerError::provisioning(step.label(), e))?;
                Ok(StepResult::Done)
            }

            DeployStep::ParseOutputs => {
                if run.is_teardown() {
                    return Ok(StepResult::Skipped("teardown deploy has no outputs".into()));
                }
                let region = run.target()?.region.clone();
                let stack_name = run.stack_name.clone().unwrap_or_default();
                let outputs = self
                    .inspector
                    .fetch_stack_outputs(&region, &stack_name)
                    .await
                    .map_err(|e| ControllerError::provisioning(step.label(), e))?;
                let project = &run.context()?.project;
                run.agents = parse_agent_outputs(&project.name, &project.agents, &outputs);
                debug!(outputs = outputs.len(), agents = run.agents.len(), "Parsed stack outputs");
                run.outputs = outputs;
                Ok(StepResult::Done)
            }

            DeployStep::PersistState => {
                let target = run.target()?.name.clone();
                if run.is_teardown() {
                    self.deployed_state.clear_target(&target).await?;
                    info!(target = %target, "Cleared deployed state");
                } else {
                    let stack_name = run.stack_name.clone().unwrap_or_default();
                    self.deployed_state
                        .merge_target(&target, TargetState::new(stack_name, run.agents.clone()))
                        .await?;
                    info!(target = %target, agents = run.agents.len(), "Saved deployed state");
                }
                Ok(StepResult::Done)
            }

            DeployStep::Destroy => self.destroy_stack(run).await,
        }
    }

    /// API-key credentials this project owns, with their local secret values.
    async fn credential_registrations(
        &self,
        context: &PreflightContext,
    ) -> ControllerResult<Vec<CredentialRegistration>> {
        let owned: Vec<_> = context
            .project
            .agents
            .iter()
            .flat_map(|a| a.owned_identities())
            .filter_map(|p| p.provider.filter(|prov| prov.requires_api_key()).map(|prov| (p, prov)))
            .collect();
        if owned.is_empty() {
            return Ok(Vec::new());
        }

        let secrets = self.secrets.load().await?;
        let mut registrations = Vec::new();
        let mut missing = Vec::new();
        for (identity, provider) in owned {
            let env_var = credential_env_var(&identity.name);
            match secrets.get(&env_var) {
                Some(api_key) => registrations.push(CredentialRegistration {
                    name: identity.name.clone(),
                    provider,
                    api_key: api_key.clone(),
                }),
                None => missing.push(env_var),
            }
        }
        if !missing.is_empty() {
            return Err(ControllerError::Environment(format!(
                "missing credential secrets in {}: {}",
                self.secrets.location(),
                missing.join(", ")
            )));
        }
        Ok(registrations)
    }
}
