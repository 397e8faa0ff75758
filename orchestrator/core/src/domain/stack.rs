// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use std::fmt;

/// CloudFormation stack lifecycle status, as reported by `DescribeStacks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackStatus(pub String);

impl StackStatus {
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Why a new deploy cannot start against a stack in this state, if it can't.
    pub fn blocking_reason(&self) -> Option<String> {
        let status = self.0.as_str();
        if status.ends_with("_IN_PROGRESS") {
            return Some(format!(
                "stack is busy ({}); wait for the current operation to finish",
                status
            ));
        }
        if status.ends_with("_FAILED") {
            return Some(format!(
                "stack is in a failed state ({}); resolve it in the CloudFormation console first",
                status
            ));
        }
        if status == "ROLLBACK_COMPLETE" {
            return Some(
                "stack creation rolled back (ROLLBACK_COMPLETE); \
                 delete the stack before redeploying"
                    .to_string(),
            );
        }
        None
    }
}

impl fmt::Display for StackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stack the gate refused to deploy over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockingStack {
    pub stack_name: String,
    pub status: StackStatus,
    pub reason: String,
}
