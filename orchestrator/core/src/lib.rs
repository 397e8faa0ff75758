// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Lib
//!
//! Resource graph and deployment lifecycle controller for AgentCore projects.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Declarative project model, safe mutation and the deploy pipeline

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use domain::*;
