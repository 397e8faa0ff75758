// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for AgentCore CLI

pub mod add;
pub mod attach;
pub mod deploy;
pub mod remove;
pub mod status;

pub use self::add::AddCommand;
pub use self::attach::AttachCommand;
pub use self::deploy::{DeployCommand, DestroyCommand};
pub use self::remove::RemoveCommand;
