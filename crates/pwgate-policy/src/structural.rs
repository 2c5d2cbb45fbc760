//! Structural invariants checked on a patched record before it is committed
use pwgate_core::{keys, PolicyRecord, StructuralViolation, ValidationRules};

/// Smallest `minLength` a size policy may carry
pub const MIN_ALLOWED_LENGTH: i64 = 8;

/// Check an (original, updated) pair. Generic checks run for every key,
/// key-specific ones only for the keys that define them.
pub fn validate_update(
    original: &PolicyRecord,
    updated: &PolicyRecord,
) -> Result<(), StructuralViolation> {
    let key = updated.key.as_str();

    if original.key != updated.key {
        return Err(StructuralViolation::new(
            &original.key,
            "key.immutable",
            format!("policy key cannot change from {:?} to {:?}", original.key, updated.key),
        ));
    }

    if !original.required && !updated.required {
        return Err(StructuralViolation::new(
            key,
            "policy.disabled",
            "Cannot update a disabled password policy",
        ));
    }

    let Some(rules) = updated.validation_rules.as_ref() else {
        return Err(StructuralViolation::new(
            key,
            "validation_rules.null",
            "validation rules must not be null",
        ));
    };

    match key {
        keys::SIZE => validate_size(key, rules),
        keys::SPECIAL_CHARS => validate_special_chars(key, rules),
        _ => Ok(()),
    }
}

fn validate_size(key: &str, rules: &ValidationRules) -> Result<(), StructuralViolation> {
    let (Some(min), Some(max)) = (rules.get_int("minLength"), rules.get_int("maxLength")) else {
        return Err(StructuralViolation::new(
            key,
            "size.bounds",
            format!("policy '{}' requires integer minLength and maxLength", key),
        ));
    };

    if min < MIN_ALLOWED_LENGTH {
        return Err(StructuralViolation::new(
            key,
            "size.min_length",
            format!(
                "policy '{}' minLength must be at least {} (got {})",
                key, MIN_ALLOWED_LENGTH, min
            ),
        ));
    }
    if max <= min {
        return Err(StructuralViolation::new(
            key,
            "size.max_length",
            format!(
                "policy '{}' maxLength ({}) must be greater than minLength ({})",
                key, max, min
            ),
        ));
    }
    Ok(())
}

fn validate_special_chars(key: &str, rules: &ValidationRules) -> Result<(), StructuralViolation> {
    let (Some(allowed), Some(excluded)) = (
        rules.get_str("allowedSpecialChars"),
        rules.get_str("excludedSpecialChars"),
    ) else {
        return Ok(());
    };

    let mut overlap: Vec<char> = excluded.chars().filter(|c| allowed.contains(*c)).collect();
    if overlap.is_empty() {
        return Ok(());
    }
    overlap.sort_unstable();
    overlap.dedup();

    Err(StructuralViolation::new(
        key,
        "special_chars.overlap",
        format!(
            "policy '{}' excludes characters that are also allowed: {}",
            key,
            overlap.into_iter().collect::<String>()
        ),
    ))
}
