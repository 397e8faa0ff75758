// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Integration tests for the deploy and destroy pipelines.
//!
//! The provisioning engine, cloud inspector, identity provisioner and
//! packager are replaced with recording mocks; the documents are real JSON
//! files in a temp directory.

use agentcore_core::application::deploy::{DeploymentDependencies, DeploymentOrchestrator};
use agentcore_core::domain::config::ProjectLayout;
use agentcore_core::domain::deployed_state::{DeployedState, TargetState};
use agentcore_core::domain::deployment::{
    DeployOptions, DeployOutcome, DeployProgress, DeployStep, NoopProgress, StepStatus,
};
use agentcore_core::domain::project::{
    Agent, BuildKind, CredentialScope, IdentityProvider, ModelProvider, Project,
};
use agentcore_core::domain::provisioning::{
    CloudInspector, CredentialRegistration, DeployRequest, IdentityProvisioner, PackagedArtifact,
    Packager, ProvisioningEngine,
};
use agentcore_core::domain::repository::{
    DeployedStateRepository, ProjectRepository, TargetRepository,
};
use agentcore_core::domain::stack::StackStatus;
use agentcore_core::domain::target::AwsDeploymentTarget;
use agentcore_core::infrastructure::repositories::{
    JsonDeployedStateRepository, JsonProjectRepository, JsonTargetRepository,
};
use agentcore_core::infrastructure::secret_store::InMemorySecretStore;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Default)]
struct CallLog(Mutex<Vec<String>>);

impl CallLog {
    fn push(&self, call: impl Into<String>) {
        self.0.lock().unwrap().push(call.into());
    }

    fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

struct MockEngine {
    calls: Arc<CallLog>,
    deploy_requests: Mutex<Vec<DeployRequest>>,
}

#[async_trait]
impl ProvisioningEngine for MockEngine {
    async fn build(&self) -> anyhow::Result<()> {
        self.calls.push("build");
        Ok(())
    }

    async fn synth(&self, target: &AwsDeploymentTarget) -> anyhow::Result<Vec<String>> {
        self.calls.push("synth");
        Ok(vec![format!("AgentCore-Support-{}", target.name)])
    }

    async fn bootstrap(&self, _target: &AwsDeploymentTarget) -> anyhow::Result<()> {
        self.calls.push("bootstrap");
        Ok(())
    }

    async fn deploy(&self, request: &DeployRequest) -> anyhow::Result<()> {
        self.calls.push("deploy");
        self.deploy_requests.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn destroy(&self, request: &DeployRequest) -> anyhow::Result<()> {
        self.calls.push(format!("destroy {}", request.stack_names.join(",")));
        Ok(())
    }

    async fn dispose(&self) -> anyhow::Result<()> {
        self.calls.push("dispose");
        Ok(())
    }
}

struct MockInspector {
    calls: Arc<CallLog>,
    bootstrapped: Option<bool>,
    stack_status: Option<&'static str>,
    outputs: BTreeMap<String, String>,
}

#[async_trait]
impl CloudInspector for MockInspector {
    async fn validate_credentials(&self, _target: &AwsDeploymentTarget) -> anyhow::Result<()> {
        self.calls.push("validate_credentials");
        Ok(())
    }

    async fn query_bootstrap_status(&self, _target: &AwsDeploymentTarget) -> anyhow::Result<bool> {
        self.bootstrapped
            .ok_or_else(|| anyhow::anyhow!("connection reset"))
    }

    async fn query_stack_status(
        &self,
        _region: &str,
        _stack: &str,
    ) -> anyhow::Result<Option<StackStatus>> {
        Ok(self.stack_status.map(StackStatus::new))
    }

    async fn fetch_stack_outputs(
        &self,
        _region: &str,
        _stack: &str,
    ) -> anyhow::Result<BTreeMap<String, String>> {
        Ok(self.outputs.clone())
    }
}

struct MockIdentity {
    registered: Mutex<Vec<CredentialRegistration>>,
}

#[async_trait]
impl IdentityProvisioner for MockIdentity {
    async fn register(
        &self,
        _target: &AwsDeploymentTarget,
        credentials: &[CredentialRegistration],
    ) -> anyhow::Result<Option<String>> {
        self.registered.lock().unwrap().extend_from_slice(credentials);
        Ok(Some("arn:aws:kms:us-east-1:123456789012:key/vault".into()))
    }
}

struct MockPackager;

#[async_trait]
impl Packager for MockPackager {
    async fn package(&self, agent: &Agent) -> anyhow::Result<PackagedArtifact> {
        Ok(PackagedArtifact {
            agent: agent.name.clone(),
            path: agent.code_location.clone().into(),
            size_bytes: 42,
        })
    }
}

#[derive(Default)]
struct RecordingProgress(Mutex<Vec<(DeployStep, StepStatus)>>);

impl DeployProgress for RecordingProgress {
    fn on_step(&self, step: DeployStep, status: &StepStatus) {
        self.0.lock().unwrap().push((step, status.clone()));
    }
}

struct Harness {
    dir: TempDir,
    layout: ProjectLayout,
    calls: Arc<CallLog>,
    engine: Arc<MockEngine>,
    identity: Arc<MockIdentity>,
    orchestrator: DeploymentOrchestrator,
}

struct Setup {
    project: Project,
    state: DeployedState,
    bootstrapped: Option<bool>,
    stack_status: Option<&'static str>,
    secrets: BTreeMap<String, String>,
}

impl Setup {
    fn new(project: Project) -> Self {
        Self {
            project,
            state: DeployedState::default(),
            bootstrapped: Some(true),
            stack_status: None,
            secrets: BTreeMap::new(),
        }
    }
}

fn support_project() -> Project {
    let mut project = Project::new("Support");
    project
        .agents
        .push(Agent::new("Triage", BuildKind::CodeZip, "app/Triage"));
    project
}

fn triage_outputs() -> BTreeMap<String, String> {
    [
        ("SupportTriageRuntimeId", "rt-123"),
        (
            "SupportTriageRuntimeArn",
            "arn:aws:bedrock-agentcore:us-east-1:123456789012:runtime/rt-123",
        ),
        ("SupportTriageRoleArn", "arn:aws:iam::123456789012:role/triage"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

async fn harness(setup: Setup) -> Harness {
    let dir = TempDir::new().unwrap();
    let layout = ProjectLayout::new(dir.path());

    let projects = Arc::new(JsonProjectRepository::new(layout.spec_path()));
    projects.write(&setup.project).await.unwrap();
    let targets = Arc::new(JsonTargetRepository::new(layout.targets_path()));
    targets
        .write(&[
            AwsDeploymentTarget::new("dev", "123456789012", "us-east-1"),
            AwsDeploymentTarget::new("prod", "123456789012", "eu-west-1"),
        ])
        .await
        .unwrap();
    let deployed_state = Arc::new(JsonDeployedStateRepository::new(layout.deployed_state_path()));
    for (name, state) in setup.state.targets {
        deployed_state.merge_target(&name, state).await.unwrap();
    }

    let calls = Arc::new(CallLog::default());
    let engine = Arc::new(MockEngine {
        calls: calls.clone(),
        deploy_requests: Mutex::new(Vec::new()),
    });
    let identity = Arc::new(MockIdentity {
        registered: Mutex::new(Vec::new()),
    });
    let inspector = Arc::new(MockInspector {
        calls: calls.clone(),
        bootstrapped: setup.bootstrapped,
        stack_status: setup.stack_status,
        outputs: triage_outputs(),
    });

    let orchestrator = DeploymentOrchestrator::new(
        DeploymentDependencies {
            projects,
            targets,
            deployed_state,
            secrets: Arc::new(InMemorySecretStore::new(setup.secrets)),
            engine: engine.clone(),
            inspector,
            identity: identity.clone(),
            packager: Arc::new(MockPackager),
        },
        dir.path(),
        dir.path().join("logs"),
    );

    Harness {
        dir,
        layout,
        calls,
        engine,
        identity,
        orchestrator,
    }
}

impl Harness {
    async fn deploy_default(&self) -> DeployOutcome {
        self.orchestrator
            .deploy(DeployOptions::default(), &NoopProgress)
            .await
    }

    async fn state(&self) -> DeployedState {
        JsonDeployedStateRepository::new(self.layout.deployed_state_path())
            .read()
            .await
            .unwrap()
    }
}

fn expect_failure(outcome: DeployOutcome) -> (DeployStep, String) {
    match outcome {
        DeployOutcome::Failed(failure) => {
            assert!(failure.log_path.as_ref().is_some_and(|p| p.exists()));
            (failure.step, failure.message)
        }
        DeployOutcome::Succeeded(s) => panic!("expected failure, got success for {}", s.target),
    }
}

#[tokio::test]
async fn test_successful_deploy_persists_agent_identifiers() {
    let h = harness(Setup::new(support_project())).await;
    let progress = RecordingProgress::default();

    let outcome = h.orchestrator.deploy(DeployOptions::default(), &progress).await;

    let success = match outcome {
        DeployOutcome::Succeeded(s) => s,
        DeployOutcome::Failed(f) => panic!("deploy failed at {}: {}", f.step, f.message),
    };
    assert_eq!(success.target, "dev");
    assert_eq!(success.stack_name, "AgentCore-Support-dev");
    assert_eq!(success.next_steps.len(), 3);
    assert!(success.log_path.starts_with(h.dir.path().join("logs")));

    let state = h.state().await;
    let triage = &state.target("dev").unwrap().resources.agents["Triage"];
    assert_eq!(triage.runtime_id, "rt-123");

    let calls = h.calls.calls();
    assert_eq!(
        calls,
        vec!["validate_credentials", "build", "synth", "deploy", "dispose"]
    );

    let recorded = progress.0.lock().unwrap();
    let finished: Vec<DeployStep> = recorded
        .iter()
        .filter(|(_, s)| !matches!(s, StepStatus::Start))
        .map(|(step, _)| *step)
        .collect();
    assert_eq!(finished, DeployStep::PIPELINE.to_vec());
}

#[tokio::test]
async fn test_zero_agents_without_state_fails_with_no_agents() {
    let h = harness(Setup::new(Project::new("Support"))).await;

    let outcome = h.orchestrator.deploy(DeployOptions::default(), &NoopProgress).await;

    let (step, message) = expect_failure(outcome);
    assert_eq!(step, DeployStep::Preflight);
    assert!(message.contains("no agents"));
    assert_eq!(h.calls.calls(), vec!["dispose"]);
}

#[tokio::test]
async fn test_zero_agents_with_state_is_teardown() {
    let mut setup = Setup::new(Project::new("Support"));
    setup
        .state
        .merge_target("dev", TargetState::new("AgentCore-Support-dev", BTreeMap::new()));
    setup
        .state
        .merge_target("prod", TargetState::new("AgentCore-Support-prod", BTreeMap::new()));
    let h = harness(setup).await;

    let context = h.orchestrator.preflight().await.unwrap();
    assert!(context.is_teardown);

    let (step, message) = expect_failure(h.deploy_default().await);
    assert_eq!(step, DeployStep::Preflight);
    assert!(!message.contains("no agents"));
    assert!(h.state().await.target("dev").is_some());

    let outcome = h
        .orchestrator
        .deploy(
            DeployOptions {
                teardown_confirmed: true,
                ..Default::default()
            },
            &NoopProgress,
        )
        .await;
    match outcome {
        DeployOutcome::Succeeded(s) => {
            assert!(s.teardown);
            assert!(s.next_steps.is_empty());
        }
        DeployOutcome::Failed(f) => panic!("teardown failed at {}: {}", f.step, f.message),
    }

    assert!(h.calls.calls().contains(&"deploy".to_string()));
    let state = h.state().await;
    assert!(state.target("dev").is_none());
    assert!(state.target("prod").is_some());
}

#[tokio::test]
async fn test_deploy_to_second_target_preserves_first() {
    let mut setup = Setup::new(support_project());
    let mut t1 = TargetState::new("AgentCore-Support-dev", BTreeMap::new());
    t1.resources.agents.insert(
        "Triage".into(),
        agentcore_core::domain::deployed_state::AgentDeployedState {
            runtime_id: "rt-dev".into(),
            runtime_arn: "arn:dev".into(),
            role_arn: "arn:role-dev".into(),
            memory_ids: vec![],
        },
    );
    setup.state.merge_target("dev", t1.clone());
    let h = harness(setup).await;

    let outcome = h
        .orchestrator
        .deploy(
            DeployOptions {
                target: Some("prod".into()),
                ..Default::default()
            },
            &NoopProgress,
        )
        .await;
    assert!(outcome.is_success());

    let state = h.state().await;
    assert_eq!(state.target("dev"), Some(&t1));
    assert_eq!(
        state.target("prod").unwrap().resources.stack_name,
        "AgentCore-Support-prod"
    );
}

#[tokio::test]
async fn test_long_runtime_name_fails_before_build() {
    let mut project = Project::new("SupportDeskProject");
    project.agents.push(Agent::new(
        "VeryLongAgentNameExceedingTheLimitXYZ",
        BuildKind::CodeZip,
        "app/Long",
    ));
    let h = harness(Setup::new(project)).await;

    let (step, message) = expect_failure(h.deploy_default().await);

    assert_eq!(step, DeployStep::Preflight);
    assert!(message.contains("SupportDeskProject_VeryLongAgentNameExceedingTheLimitXYZ"));
    let calls = h.calls.calls();
    assert!(!calls.contains(&"build".to_string()));
    assert!(!calls.contains(&"synth".to_string()));
}

#[tokio::test]
async fn test_blocking_stack_stops_before_deploy() {
    let mut setup = Setup::new(support_project());
    setup.stack_status = Some("UPDATE_ROLLBACK_IN_PROGRESS");
    let h = harness(setup).await;

    let (step, message) = expect_failure(h.deploy_default().await);

    assert_eq!(step, DeployStep::StackStatus);
    assert!(message.contains("AgentCore-Support-dev"));
    assert!(!h.calls.calls().contains(&"deploy".to_string()));
    assert!(h.state().await.is_empty());
}

#[tokio::test]
async fn test_missing_bootstrap_requires_confirmation() {
    let mut setup = Setup::new(support_project());
    setup.bootstrapped = Some(false);
    let h = harness(setup).await;

    let (step, message) = expect_failure(h.deploy_default().await);
    assert_eq!(step, DeployStep::Bootstrap);
    assert!(message.contains("--yes"));

    let outcome = h
        .orchestrator
        .deploy(
            DeployOptions {
                auto_confirm: true,
                ..Default::default()
            },
            &NoopProgress,
        )
        .await;
    assert!(outcome.is_success());
    assert!(h.calls.calls().contains(&"bootstrap".to_string()));
}

#[tokio::test]
async fn test_bootstrap_query_failure_is_not_blocking() {
    let mut setup = Setup::new(support_project());
    setup.bootstrapped = None;
    let h = harness(setup).await;

    let outcome = h.orchestrator.deploy(DeployOptions::default(), &NoopProgress).await;
    assert!(outcome.is_success());
    assert!(!h.calls.calls().contains(&"bootstrap".to_string()));
}

#[tokio::test]
async fn test_only_owned_credentials_are_provisioned() {
    let mut project = support_project();
    project.agents[0].model_provider = ModelProvider::OpenAi;
    project.agents[0].identity_providers.push(IdentityProvider::owned(
        "SupportOpenAI",
        ModelProvider::OpenAi,
        CredentialScope::Project,
    ));
    let mut second = Agent::new("Billing", BuildKind::CodeZip, "app/Billing");
    second.model_provider = ModelProvider::OpenAi;
    second
        .identity_providers
        .push(IdentityProvider::reference("SupportOpenAI"));
    project.agents.push(second);

    let mut setup = Setup::new(project);
    setup
        .secrets
        .insert("AGENTCORE_CREDENTIAL_SUPPORTOPENAI".into(), "sk-live".into());
    let h = harness(setup).await;

    let outcome = h.orchestrator.deploy(DeployOptions::default(), &NoopProgress).await;
    assert!(outcome.is_success());

    let registered = h.identity.registered.lock().unwrap();
    assert_eq!(registered.len(), 1);
    assert_eq!(registered[0].name, "SupportOpenAI");
    assert_eq!(registered[0].api_key, "sk-live");

    let requests = h.engine.deploy_requests.lock().unwrap();
    assert_eq!(
        requests[0].kms_key_arn.as_deref(),
        Some("arn:aws:kms:us-east-1:123456789012:key/vault")
    );
}

#[tokio::test]
async fn test_missing_secret_fails_identity_step() {
    let mut project = support_project();
    project.agents[0].identity_providers.push(IdentityProvider::owned(
        "SupportGemini",
        ModelProvider::Gemini,
        CredentialScope::Project,
    ));
    let h = harness(Setup::new(project)).await;

    let (step, message) = expect_failure(h.deploy_default().await);
    assert_eq!(step, DeployStep::ProvisionIdentity);
    assert!(message.contains("AGENTCORE_CREDENTIAL_SUPPORTGEMINI"));
}

#[tokio::test]
async fn test_destroy_requires_confirmation_and_clears_target() {
    let mut setup = Setup::new(support_project());
    setup
        .state
        .merge_target("dev", TargetState::new("AgentCore-Support-dev", BTreeMap::new()));
    let h = harness(setup).await;

    let (step, _) = expect_failure(
        h.orchestrator
            .destroy(Some("dev".into()), false, &NoopProgress)
            .await,
    );
    assert_eq!(step, DeployStep::ResolveTarget);

    let outcome = h
        .orchestrator
        .destroy(Some("dev".into()), true, &NoopProgress)
        .await;
    assert!(outcome.is_success());
    assert!(h
        .calls
        .calls()
        .contains(&"destroy AgentCore-Support-dev".to_string()));
    assert!(h.state().await.target("dev").is_none());
}

#[tokio::test]
async fn test_run_log_records_outcome() {
    let h = harness(Setup::new(Project::new("Support"))).await;
    let outcome = h.orchestrator.deploy(DeployOptions::default(), &NoopProgress).await;
    let log = std::fs::read_to_string(outcome.log_path().unwrap()).unwrap();
    let last: serde_json::Value = serde_json::from_str(log.lines().last().unwrap()).unwrap();
    assert_eq!(last["outcome"], "failed");
}
