// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Infrastructure adapters: document repositories, local secrets, run logs
//! and the CLI-backed provisioning collaborators.

pub mod aws_cli;
pub mod cdk;
pub mod packager;
pub mod process;
pub mod repositories;
pub mod run_log;
pub mod secret_store;

pub use aws_cli::{AwsCliIdentityProvisioner, AwsCliInspector};
pub use cdk::CdkProvisioningEngine;
pub use packager::DirectoryPackager;
pub use run_log::DeployRunLog;
pub use secret_store::{DotenvSecretStore, InMemorySecretStore};
