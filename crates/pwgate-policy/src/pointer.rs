//! Replace-only JSON Pointer application over the JSON view of a policy record
use crate::patch::PatchOperation;
use pwgate_core::{PolicyError, PolicyRecord};
use serde_json::Value;

/// Record attributes a patch may address directly
const RECORD_FIELDS: &[&str] = &["name", "description", "priority", "required", "validationRules"];

/// Record attributes no patch may touch
const IMMUTABLE_FIELDS: &[&str] = &["key", "createdBy", "createDate", "updatedBy", "updateDate"];

const RULES_FIELD: &str = "validationRules";

/// Decode an RFC 6901 pointer into reference tokens
pub fn decode_pointer(path: &str) -> Result<Vec<String>, PolicyError> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let rest = path.strip_prefix('/').ok_or_else(|| {
        PolicyError::InvalidPatchOperation(format!("pointer {:?} must start with '/'", path))
    })?;

    Ok(rest
        .split('/')
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
        .collect())
}

/// Map a record-relative path onto the record view.
///
/// A first token that is not a record attribute names a validation rule, so
/// `/minLength` resolves to `/validationRules/minLength`.
fn resolve(path: &str) -> Result<Vec<String>, PolicyError> {
    let mut tokens = decode_pointer(path)?;

    let Some(first) = tokens.first() else {
        return Err(PolicyError::InvalidPatchOperation(
            "replacing the whole policy record is not supported".to_string(),
        ));
    };

    if IMMUTABLE_FIELDS.contains(&first.as_str()) {
        return Err(PolicyError::InvalidPatchOperation(format!(
            "{} is immutable",
            first
        )));
    }
    if !RECORD_FIELDS.contains(&first.as_str()) {
        tokens.insert(0, RULES_FIELD.to_string());
    }
    Ok(tokens)
}

/// Replace the value at `path`; the target must already exist
fn replace_at(doc: &mut Value, tokens: &[String], value: Value, path: &str) -> Result<(), PolicyError> {
    let not_found = || PolicyError::InvalidPatchOperation(format!("path {} does not exist", path));

    let (last, parents) = tokens.split_last().ok_or_else(not_found)?;
    let mut target = doc;
    for token in parents {
        target = match target {
            Value::Object(map) => map.get_mut(token.as_str()).ok_or_else(not_found)?,
            Value::Array(items) => {
                let index: usize = token.parse().map_err(|_| not_found())?;
                items.get_mut(index).ok_or_else(not_found)?
            }
            _ => return Err(not_found()),
        };
    }

    let slot = match target {
        Value::Object(map) => map.get_mut(last.as_str()).ok_or_else(not_found)?,
        Value::Array(items) => {
            let index: usize = last.parse().map_err(|_| not_found())?;
            items.get_mut(index).ok_or_else(not_found)?
        }
        _ => return Err(not_found()),
    };
    *slot = value;
    Ok(())
}

/// Apply a record-relative sub-patch to a copy of `record`
pub fn apply_to_record(
    record: &PolicyRecord,
    operations: &[PatchOperation],
) -> Result<PolicyRecord, PolicyError> {
    let mut view = serde_json::to_value(record).map_err(|e| PolicyError::Serialize(e.to_string()))?;

    for operation in operations {
        if !operation.is_replace() {
            return Err(PolicyError::InvalidPatchOperation(format!(
                "unsupported op {:?} at {}",
                operation.op, operation.path
            )));
        }
        let tokens = resolve(&operation.path)?;
        replace_at(&mut view, &tokens, operation.value.clone(), &operation.path)?;
    }

    serde_json::from_value(view).map_err(|e| {
        PolicyError::InvalidPatchOperation(format!(
            "patched policy {:?} is not a valid record: {}",
            record.key, e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pwgate_core::{keys, ValidationRules};
    use serde_json::json;

    fn size_record() -> PolicyRecord {
        PolicyRecord::new(keys::SIZE, "Password Size")
            .with_rules(ValidationRules::new().with("minLength", 8).with("maxLength", 64))
    }

    #[test]
    fn test_decode_pointer_escapes() {
        assert_eq!(decode_pointer("/a~1b/c~0d").unwrap(), vec!["a/b", "c~d"]);
        assert_eq!(decode_pointer("/~01").unwrap(), vec!["~1"]);
        assert!(decode_pointer("").unwrap().is_empty());
        assert!(decode_pointer("minLength").is_err());
    }

    #[test]
    fn test_bare_rule_path_targets_validation_rules() {
        let updated = apply_to_record(
            &size_record(),
            &[PatchOperation::replace("/minLength", json!(12))],
        )
        .unwrap();
        assert_eq!(updated.rules().get_int("minLength"), Some(12));
        assert_eq!(updated.rules().get_int("maxLength"), Some(64));
    }

    #[test]
    fn test_explicit_rules_path() {
        let updated = apply_to_record(
            &size_record(),
            &[PatchOperation::replace("/validationRules/maxLength", json!(32))],
        )
        .unwrap();
        assert_eq!(updated.rules().get_int("maxLength"), Some(32));
    }

    #[test]
    fn test_record_attributes() {
        let updated = apply_to_record(
            &size_record(),
            &[
                PatchOperation::replace("/name", json!("Length")),
                PatchOperation::replace("/required", json!(false)),
                PatchOperation::replace("/priority", json!(7)),
            ],
        )
        .unwrap();
        assert_eq!(updated.name, "Length");
        assert!(!updated.required);
        assert_eq!(updated.priority, 7);
    }

    #[test]
    fn test_whole_rules_document() {
        let updated = apply_to_record(
            &size_record(),
            &[PatchOperation::replace(
                "/validationRules",
                json!({ "minLength": 10, "maxLength": 20 }),
            )],
        )
        .unwrap();
        assert_eq!(updated.rules().get_int("minLength"), Some(10));

        let nulled = apply_to_record(
            &size_record(),
            &[PatchOperation::replace("/validationRules", Value::Null)],
        )
        .unwrap();
        assert!(nulled.validation_rules.is_none());
    }

    #[test]
    fn test_missing_target_rejected() {
        let err = apply_to_record(
            &size_record(),
            &[PatchOperation::replace("/entropyBits", json!(40))],
        )
        .unwrap_err();
        assert_eq!(err.code(), "INVALID_PATCH_OPERATION");

        let err = apply_to_record(
            &size_record(),
            &[PatchOperation::replace("/minLength/deeper", json!(1))],
        )
        .unwrap_err();
        assert_eq!(err.code(), "INVALID_PATCH_OPERATION");
    }

    #[test]
    fn test_immutable_fields_rejected() {
        for path in ["/key", "/createdBy", "/updateDate"] {
            let err = apply_to_record(&size_record(), &[PatchOperation::replace(path, json!("x"))])
                .unwrap_err();
            assert!(err.to_string().contains("immutable"), "{}", path);
        }
    }

    #[test]
    fn test_ill_typed_values_rejected() {
        for (path, value) in [
            ("/minLength", json!(8.5)),
            ("/minLength", json!([8])),
            ("/minLength", Value::Null),
            ("/priority", json!("high")),
            ("/required", json!("yes")),
        ] {
            let err = apply_to_record(&size_record(), &[PatchOperation::replace(path, value)])
                .unwrap_err();
            assert_eq!(err.code(), "INVALID_PATCH_OPERATION", "{}", path);
        }
    }

    #[test]
    fn test_original_untouched() {
        let original = size_record();
        let _ = apply_to_record(&original, &[PatchOperation::replace("/minLength", json!(12))]).unwrap();
        assert_eq!(original.rules().get_int("minLength"), Some(8));
    }
}
