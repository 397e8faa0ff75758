// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Document shape check
//!
//! Runs on raw JSON before typed decoding so a structurally valid but
//! semantically wrong document (unknown enum value, wrong type, missing
//! required field) is reported with the path of the offending field rather
//! than a line/column from the decoder.
//!
//! The JSON Schemas are built from the closed enums in
//! [`crate::domain::project`] and checked with `jsonschema`. The first
//! violation is reported, with its instance pointer rewritten into the
//! `agents[1].memoryProviders[0].relation` field format.

use jsonschema::error::ValidationErrorKind;
use jsonschema::{ValidationError, Validator};
use serde_json::{json, Value};

use crate::domain::error::{ControllerError, ControllerResult};
use crate::domain::project::{
    BuildKind, CredentialScope, DocumentEnum, McpProviderKind, ModelProvider, NetworkMode,
    Relation,
};

const REMOTE_TOOL_TYPES: &[&str] = &["agent", "mcpTool"];

/// Validate the shape of an `agentcore.json` document.
pub fn validate_project_document(doc: &Value) -> ControllerResult<()> {
    check(&project_schema(), doc)
}

/// Validate the shape of an `aws-targets.json` document.
pub fn validate_targets_document(doc: &Value) -> ControllerResult<()> {
    check(&targets_schema(), doc)
}

fn check(schema: &Value, doc: &Value) -> ControllerResult<()> {
    let validator = Validator::new(schema)
        .map_err(|e| ControllerError::validation("$", format!("invalid document schema: {e}")))?;
    let result = match validator.iter_errors(doc).next() {
        None => Ok(()),
        Some(error) => Err(to_validation_error(doc, &error)),
    };
    result
}

fn to_validation_error(doc: &Value, error: &ValidationError<'_>) -> ControllerError {
    let pointer = error.instance_path().to_string();
    let path = field_path(&pointer);
    match error.kind() {
        ValidationErrorKind::Required { property } => {
            let property = property.as_str().unwrap_or_default();
            let field = if path == "$" {
                property.to_string()
            } else {
                format!("{}.{}", path, property)
            };
            ControllerError::validation(field, "required field is missing")
        }
        ValidationErrorKind::Enum { options } => {
            let accepted: Vec<&str> = options
                .as_array()
                .map(|values| values.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            let found = doc.pointer(&pointer).map(Value::to_string).unwrap_or_default();
            ControllerError::validation(
                path,
                format!(
                    "unknown value {}, expected one of: {}",
                    found,
                    accepted.join(", ")
                ),
            )
        }
        _ => ControllerError::validation(path, error.to_string()),
    }
}

/// `/agents/1/memoryProviders/0/relation` → `agents[1].memoryProviders[0].relation`
fn field_path(pointer: &str) -> String {
    let mut out = String::new();
    for segment in pointer.split('/').skip(1) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        if segment.chars().all(|c| c.is_ascii_digit()) && !segment.is_empty() {
            out.push_str(&format!("[{}]", segment));
        } else {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(&segment);
        }
    }
    if out.is_empty() {
        "$".to_string()
    } else {
        out
    }
}

fn enum_of<E: DocumentEnum>() -> Value {
    json!({ "type": "string", "enum": E::VARIANTS })
}

fn entries(required: &[&str], properties: Value) -> Value {
    json!({
        "type": "array",
        "items": { "type": "object", "required": required, "properties": properties }
    })
}

fn project_schema() -> Value {
    let agent = json!({
        "type": "object",
        "required": ["name", "build", "entrypoint", "codeLocation", "runtimeVersion"],
        "properties": {
            "name": { "type": "string" },
            "build": enum_of::<BuildKind>(),
            "entrypoint": { "type": "string" },
            "codeLocation": { "type": "string" },
            "runtimeVersion": { "type": "string" },
            "networkMode": enum_of::<NetworkMode>(),
            "modelProvider": enum_of::<ModelProvider>(),
            "memoryProviders": entries(&["name", "relation"], json!({
                "name": { "type": "string" },
                "relation": enum_of::<Relation>(),
                "eventExpiryDays": { "type": "integer", "minimum": 0 }
            })),
            "identityProviders": entries(&["name", "relation"], json!({
                "name": { "type": "string" },
                "relation": enum_of::<Relation>(),
                "provider": enum_of::<ModelProvider>(),
                "scope": enum_of::<CredentialScope>()
            })),
            "mcpProviders": entries(&["name", "relation", "kind"], json!({
                "name": { "type": "string" },
                "relation": enum_of::<Relation>(),
                "kind": enum_of::<McpProviderKind>()
            })),
            "remoteTools": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["name", "type"],
                    "properties": {
                        "name": { "type": "string" },
                        "type": { "type": "string", "enum": REMOTE_TOOL_TYPES },
                        "targetAgent": { "type": "string" },
                        "targetTool": { "type": "string" }
                    },
                    "allOf": [
                        {
                            "if": { "properties": { "type": { "const": "agent" } } },
                            "then": { "required": ["targetAgent"] }
                        },
                        {
                            "if": { "properties": { "type": { "const": "mcpTool" } } },
                            "then": { "required": ["targetTool"] }
                        }
                    ]
                }
            }
        }
    });

    json!({
        "type": "object",
        "required": ["name", "version"],
        "properties": {
            "name": { "type": "string" },
            "version": { "type": "string" },
            "agents": { "type": "array", "items": agent }
        }
    })
}

fn targets_schema() -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "required": ["name", "account", "region"],
            "properties": {
                "name": { "type": "string" },
                "account": { "type": "string" },
                "region": { "type": "string" }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(result: ControllerResult<()>) -> String {
        match result {
            Err(ControllerError::Validation { field, .. }) => field,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    fn agent() -> Value {
        json!({
            "name": "Triage",
            "build": "CodeZip",
            "entrypoint": "main.py",
            "codeLocation": "app/Triage",
            "runtimeVersion": "PYTHON_3_12"
        })
    }

    #[test]
    fn test_minimal_document_is_valid() {
        let doc = json!({ "name": "Support", "version": "1", "agents": [agent()] });
        assert!(validate_project_document(&doc).is_ok());
    }

    #[test]
    fn test_unknown_enum_value_names_field() {
        let mut a = agent();
        a["memoryProviders"] = json!([{ "name": "Notes", "relation": "owner" }]);
        let doc = json!({ "name": "Support", "version": "1", "agents": [agent(), a] });

        let err = validate_project_document(&doc).unwrap_err();
        assert!(err.to_string().contains("own, use"));
        assert!(err.to_string().contains("owner"));
        assert_eq!(field_of(Err(err)), "agents[1].memoryProviders[0].relation");
    }

    #[test]
    fn test_missing_required_field() {
        let mut a = agent();
        a.as_object_mut().unwrap().remove("entrypoint");
        let doc = json!({ "name": "Support", "version": "1", "agents": [a] });
        assert_eq!(field_of(validate_project_document(&doc)), "agents[0].entrypoint");
    }

    #[test]
    fn test_missing_top_level_field() {
        let doc = json!({ "name": "Support" });
        assert_eq!(field_of(validate_project_document(&doc)), "version");
    }

    #[test]
    fn test_remote_tool_type_checked() {
        let mut a = agent();
        a["remoteTools"] = json!([{ "type": "lambda", "name": "x" }]);
        let doc = json!({ "name": "Support", "version": "1", "agents": [a] });
        assert_eq!(
            field_of(validate_project_document(&doc)),
            "agents[0].remoteTools[0].type"
        );
    }

    #[test]
    fn test_remote_agent_requires_target() {
        let mut a = agent();
        a["remoteTools"] = json!([{ "type": "agent", "name": "x" }]);
        let doc = json!({ "name": "Support", "version": "1", "agents": [a] });
        assert_eq!(
            field_of(validate_project_document(&doc)),
            "agents[0].remoteTools[0].targetAgent"
        );
    }

    #[test]
    fn test_targets_document() {
        assert!(validate_targets_document(&json!([
            { "name": "dev", "account": "123456789012", "region": "us-east-1" }
        ]))
        .is_ok());
        assert_eq!(
            field_of(validate_targets_document(
                &json!([{ "name": "dev", "account": 1, "region": "x" }])
            )),
            "[0].account"
        );
    }

    #[test]
    fn test_field_path_rewrites_pointer() {
        assert_eq!(field_path(""), "$");
        assert_eq!(field_path("/0/account"), "[0].account");
        assert_eq!(
            field_path("/agents/1/memoryProviders/0/relation"),
            "agents[1].memoryProviders[0].relation"
        );
    }
}
