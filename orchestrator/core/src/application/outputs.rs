// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Stack output parsing
//!
//! Maps the raw stack outputs onto per-agent identifiers. Keys are compared
//! case-insensitively with separators ignored. The field suffix
//! (`...RuntimeId`, `...RuntimeArn`, `...RoleArn`, `...MemoryId`) is removed
//! first, then the optional project-name prefix, and what remains must equal
//! an agent name exactly (or agent name plus memory name for memory ids).

use std::collections::BTreeMap;

use crate::domain::deployed_state::AgentDeployedState;
use crate::domain::project::Agent;

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[derive(Clone, Copy)]
enum OutputField {
    RuntimeId,
    RuntimeArn,
    RoleArn,
    MemoryId,
}

const SUFFIXES: &[(&str, OutputField)] = &[
    ("runtimeid", OutputField::RuntimeId),
    ("runtimearn", OutputField::RuntimeArn),
    ("rolearn", OutputField::RoleArn),
    ("memoryid", OutputField::MemoryId),
];

#[derive(Default)]
struct Partial {
    runtime_id: Option<String>,
    runtime_arn: Option<String>,
    role_arn: Option<String>,
    memory_ids: Vec<String>,
}

struct AgentKeys<'a> {
    name: &'a str,
    normalized: String,
    memories: Vec<String>,
}

impl AgentKeys<'_> {
    fn matches(&self, body: &str, field: OutputField) -> bool {
        match field {
            OutputField::MemoryId => body
                .strip_prefix(self.normalized.as_str())
                .is_some_and(|rest| rest.is_empty() || self.memories.iter().any(|m| m == rest)),
            _ => body == self.normalized,
        }
    }
}

/// Agents missing a runtime id, runtime ARN or role ARN are omitted.
pub fn parse_agent_outputs(
    project: &str,
    agents: &[Agent],
    outputs: &BTreeMap<String, String>,
) -> BTreeMap<String, AgentDeployedState> {
    let project = normalize(project);
    let keys: Vec<AgentKeys<'_>> = agents
        .iter()
        .map(|a| AgentKeys {
            name: a.name.as_str(),
            normalized: normalize(&a.name),
            memories: a.memory_providers.iter().map(|m| normalize(&m.name)).collect(),
        })
        .collect();

    let mut partials: BTreeMap<&str, Partial> = BTreeMap::new();
    for (key, value) in outputs {
        let key = normalize(key);
        let Some((body, field)) = SUFFIXES
            .iter()
            .find_map(|(suffix, field)| key.strip_suffix(suffix).map(|body| (body, *field)))
        else {
            continue;
        };

        let mut candidates = Vec::with_capacity(2);
        if let Some(rest) = body.strip_prefix(project.as_str()) {
            candidates.push(rest);
        }
        candidates.push(body);

        let Some(agent) = candidates
            .iter()
            .find_map(|body| keys.iter().find(|k| k.matches(body, field)))
        else {
            continue;
        };

        let entry = partials.entry(agent.name).or_default();
        match field {
            OutputField::RuntimeId => entry.runtime_id = Some(value.clone()),
            OutputField::RuntimeArn => entry.runtime_arn = Some(value.clone()),
            OutputField::RoleArn => entry.role_arn = Some(value.clone()),
            OutputField::MemoryId => entry.memory_ids.push(value.clone()),
        }
    }

    partials
        .into_iter()
        .filter_map(|(agent, p)| {
            Some((
                agent.to_string(),
                AgentDeployedState {
                    runtime_id: p.runtime_id?,
                    runtime_arn: p.runtime_arn?,
                    role_arn: p.role_arn?,
                    memory_ids: p.memory_ids,
                },
            ))
        })
        .collect()
}
