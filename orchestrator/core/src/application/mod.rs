// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Use cases: graph mutation, deployment preflight and gating, the deploy
//! pipeline and destroy.

pub mod deploy;
pub mod destroy;
pub mod gate;
pub mod outputs;
pub mod preflight;
pub mod resources;

pub use deploy::{DeploymentDependencies, DeploymentOrchestrator};
pub use gate::{BootstrapOutcome, DeploymentGate};
pub use preflight::DeploymentPreflight;
pub use resources::{
    AddAgentRequest, AddIdentityRequest, AddMemoryRequest, AddedAgent, ResourceService,
};
