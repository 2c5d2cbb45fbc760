//! Patch documents: parsing, the replace-only gate, and grouping by policy key
//!
//! Callers address policy fields as `/<policyKey>/<index>/<field>`. Grouping strips
//! the key and the index placeholder so each group carries paths relative to a
//! single record.

use pwgate_core::PolicyError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Leading path segments dropped when rewriting: the policy key and the index placeholder
pub const DEFAULT_PREFIX_SEGMENTS: usize = 2;

/// The only supported operation
pub const REPLACE: &str = "replace";

/// One JSON Patch operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: String,
    pub path: String,
    #[serde(default)]
    pub value: Value,
}

impl PatchOperation {
    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: REPLACE.to_string(),
            path: path.into(),
            value,
        }
    }

    pub fn is_replace(&self) -> bool {
        self.op == REPLACE
    }
}

/// Sub-patches keyed by policy key, each in submission order
pub type PatchGroups = BTreeMap<String, Vec<PatchOperation>>;

/// Parse a JSON Patch document (an array of operation objects)
pub fn parse_patch(document: &Value) -> Result<Vec<PatchOperation>, PolicyError> {
    let items = document.as_array().ok_or_else(|| {
        PolicyError::InvalidPatchOperation("patch document must be a JSON array".to_string())
    })?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let obj = item.as_object().ok_or_else(|| {
                PolicyError::InvalidPatchOperation(format!("operation {} is not an object", i))
            })?;

            let field = |name: &str| {
                obj.get(name).and_then(Value::as_str).ok_or_else(|| {
                    PolicyError::InvalidPatchOperation(format!(
                        "operation {} is missing string member {:?}",
                        i, name
                    ))
                })
            };
            let op = field("op")?;
            let path = field("path")?;

            if op == REPLACE && !obj.contains_key("value") {
                return Err(PolicyError::InvalidPatchOperation(format!(
                    "operation {} ({}) has no value",
                    i, path
                )));
            }

            Ok(PatchOperation {
                op: op.to_string(),
                path: path.to_string(),
                value: obj.get("value").cloned().unwrap_or(Value::Null),
            })
        })
        .collect()
}

/// Refuse the batch if any operation is not `replace`
pub fn ensure_replace_only(operations: &[PatchOperation]) -> Result<(), PolicyError> {
    match operations.iter().find(|op| !op.is_replace()) {
        Some(op) => Err(PolicyError::InvalidPatchOperation(format!(
            "unsupported op {:?} at {}; only \"replace\" is allowed",
            op.op, op.path
        ))),
        None => Ok(()),
    }
}

/// Split `/<key>/<…>` into the grouping key and the path relative to that record
pub fn split_path(path: &str, prefix_segments: usize) -> Result<(String, String), PolicyError> {
    let rest = path.strip_prefix('/').ok_or_else(|| {
        PolicyError::InvalidPatchOperation(format!("path {:?} must start with '/'", path))
    })?;

    let segments: Vec<&str> = rest.split('/').collect();
    let key = segments[0];
    if key.is_empty() {
        return Err(PolicyError::InvalidPatchOperation(format!(
            "path {:?} does not name a policy",
            path
        )));
    }
    if segments.len() <= prefix_segments {
        return Err(PolicyError::InvalidPatchOperation(format!(
            "path {:?} does not name a policy field",
            path
        )));
    }

    Ok((key.to_string(), format!("/{}", segments[prefix_segments..].join("/"))))
}

/// Group operations by policy key, rewriting each path relative to its record
pub fn group_operations(
    operations: &[PatchOperation],
    prefix_segments: usize,
) -> Result<PatchGroups, PolicyError> {
    let mut groups = PatchGroups::new();

    for operation in operations {
        let (key, path) = split_path(&operation.path, prefix_segments)?;
        groups.entry(key).or_default().push(PatchOperation {
            op: operation.op.clone(),
            path,
            value: operation.value.clone(),
        });
    }

    Ok(groups)
}
