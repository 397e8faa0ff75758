// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::error::{ControllerError, ControllerResult};

/// A named AWS account/region pair that deploy and destroy are run against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsDeploymentTarget {
    pub name: String,
    pub account: String,
    pub region: String,
}

impl AwsDeploymentTarget {
    pub fn new(
        name: impl Into<String>,
        account: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            account: account.into(),
            region: region.into(),
        }
    }

    pub fn validate(&self, field: &str) -> ControllerResult<()> {
        if self.name.is_empty()
            || !self
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ControllerError::validation(
                format!("{}.name", field),
                format!("'{}' must be non-empty and use letters, digits, '-' or '_'", self.name),
            ));
        }
        if self.account.len() != 12 || !self.account.chars().all(|c| c.is_ascii_digit()) {
            return Err(ControllerError::validation(
                format!("{}.account", field),
                format!("'{}' is not a 12-digit AWS account id", self.account),
            ));
        }
        let region_ok = self.region.split('-').count() >= 3
            && self
                .region
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !region_ok {
            return Err(ControllerError::validation(
                format!("{}.region", field),
                format!("'{}' is not an AWS region", self.region),
            ));
        }
        Ok(())
    }

    /// CloudFormation stack name for a project deployed to this target.
    pub fn stack_name(&self, project: &str) -> String {
        format!("AgentCore-{}-{}", project, self.name)
    }
}

/// Validate every target and the uniqueness of their names.
pub fn validate_targets(targets: &[AwsDeploymentTarget]) -> ControllerResult<()> {
    let mut seen = HashSet::new();
    for (i, target) in targets.iter().enumerate() {
        let field = format!("[{}]", i);
        target.validate(&field)?;
        if !seen.insert(target.name.as_str()) {
            return Err(ControllerError::validation(
                format!("{}.name", field),
                format!("duplicate target name '{}'", target.name),
            ));
        }
    }
    Ok(())
}
