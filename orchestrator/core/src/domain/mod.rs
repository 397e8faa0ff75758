// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Mod
//!
//! Domain types and rules for the resource graph and deployment lifecycle.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure entities, invariants and collaborator contracts

pub mod config;
pub mod credential;
pub mod deployed_state;
pub mod deployment;
pub mod error;
pub mod graph;
pub mod project;
pub mod provisioning;
pub mod removal;
pub mod repository;
pub mod schema;
pub mod stack;
pub mod target;
