//! Data Model: PolicyRecord, ValidationRules, RuleValue
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Well-known policy keys
pub mod keys {
    pub const SIZE: &str = "size";
    pub const SPECIAL_CHARS: &str = "specialChars";
    pub const COMPLEXITY: &str = "complexity";
    pub const USERNAME_SEQUENCE_EXCLUSION: &str = "usernameSequenceExclusion";
}

/// Scalar value of a single validation rule parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl RuleValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            RuleValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RuleValue::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RuleValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert a JSON value, refusing anything that is not an integer, string or bool
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(RuleValue::Bool(*b)),
            serde_json::Value::Number(n) => n.as_i64().map(RuleValue::Int),
            serde_json::Value::String(s) => Some(RuleValue::Str(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for RuleValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RuleValue::Bool(v) => write!(f, "{}", v),
            RuleValue::Int(v) => write!(f, "{}", v),
            RuleValue::Str(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for RuleValue {
    fn from(v: i64) -> Self {
        RuleValue::Int(v)
    }
}

impl From<bool> for RuleValue {
    fn from(v: bool) -> Self {
        RuleValue::Bool(v)
    }
}

impl From<&str> for RuleValue {
    fn from(v: &str) -> Self {
        RuleValue::Str(v.to_string())
    }
}

impl From<String> for RuleValue {
    fn from(v: String) -> Self {
        RuleValue::Str(v)
    }
}

/// Schema-less parameter document attached to a policy record.
///
/// Keys are kept in sorted order so serialized output is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationRules(BTreeMap<String, RuleValue>);

impl ValidationRules {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<RuleValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<RuleValue>) -> Option<RuleValue> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&RuleValue> {
        self.0.get(name)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(RuleValue::as_int)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(RuleValue::as_str)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(RuleValue::as_bool)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RuleValue)> {
        self.0.iter()
    }

    /// Encode for the persistence boundary
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }

    /// Decode from the persistence boundary
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw).map(Self)
    }
}

impl FromIterator<(String, RuleValue)> for ValidationRules {
    fn from_iter<I: IntoIterator<Item = (String, RuleValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One named password rule as persisted by the policy store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRecord {
    /// Stable unique identifier (e.g. "size")
    pub key: String,

    /// Display name
    pub name: String,

    /// Display description
    #[serde(default)]
    pub description: String,

    /// Rule parameters; `None` only ever comes from a broken row or a bad patch
    pub validation_rules: Option<ValidationRules>,

    /// Ordering hint, not consulted by the chain
    #[serde(default)]
    pub priority: i32,

    /// When false the rule is disabled
    pub required: bool,

    pub created_by: String,
    pub create_date: DateTime<Utc>,

    #[serde(default)]
    pub updated_by: Option<String>,
    #[serde(default)]
    pub update_date: Option<DateTime<Utc>>,
}

impl PolicyRecord {
    /// Create an enabled record with empty rules
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: String::new(),
            validation_rules: Some(ValidationRules::new()),
            priority: 0,
            required: true,
            created_by: "system".to_string(),
            create_date: Utc::now(),
            updated_by: None,
            update_date: None,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn with_rules(mut self, rules: ValidationRules) -> Self {
        self.validation_rules = Some(rules);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn created_by(mut self, actor: impl Into<String>) -> Self {
        self.created_by = actor.into();
        self
    }

    /// Mark the record disabled
    pub fn disabled(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.required
    }

    /// Rules if present, empty otherwise
    pub fn rules(&self) -> ValidationRules {
        self.validation_rules.clone().unwrap_or_default()
    }

    /// Stamp the audit fields of an update
    pub fn touch(&mut self, actor: &str, at: DateTime<Utc>) {
        self.updated_by = Some(actor.to_string());
        self.update_date = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_value_from_json() {
        assert_eq!(RuleValue::from_json(&serde_json::json!(10)), Some(RuleValue::Int(10)));
        assert_eq!(RuleValue::from_json(&serde_json::json!(true)), Some(RuleValue::Bool(true)));
        assert_eq!(
            RuleValue::from_json(&serde_json::json!("!@#")),
            Some(RuleValue::Str("!@#".to_string()))
        );
        assert_eq!(RuleValue::from_json(&serde_json::json!(1.5)), None);
        assert_eq!(RuleValue::from_json(&serde_json::json!([1])), None);
        assert_eq!(RuleValue::from_json(&serde_json::Value::Null), None);
    }

    #[test]
    fn test_rules_codec() {
        let rules = ValidationRules::new()
            .with("minLength", 8)
            .with("maxLength", 64)
            .with("enforced", true)
            .with("allowedSpecialChars", "!@#");

        let raw = rules.to_json_string().unwrap();
        assert_eq!(
            raw,
            r##"{"allowedSpecialChars":"!@#","enforced":true,"maxLength":64,"minLength":8}"##
        );

        let decoded = ValidationRules::from_json_str(&raw).unwrap();
        assert_eq!(decoded, rules);
        assert_eq!(decoded.get_int("minLength"), Some(8));
        assert_eq!(decoded.get_str("allowedSpecialChars"), Some("!@#"));
        assert_eq!(decoded.get_bool("enforced"), Some(true));
        assert_eq!(decoded.get_int("allowedSpecialChars"), None);
    }

    #[test]
    fn test_rules_codec_rejects_nested_values() {
        assert!(ValidationRules::from_json_str(r#"{"minLength":{"value":8}}"#).is_err());
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = PolicyRecord::new(keys::SIZE, "Password size")
            .with_rules(ValidationRules::new().with("minLength", 8));
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["key"], "size");
        assert_eq!(json["validationRules"]["minLength"], 8);
        assert_eq!(json["required"], true);
        assert!(json.get("createdBy").is_some());
        assert!(json["updateDate"].is_null());
    }

    #[test]
    fn test_touch_sets_audit_fields() {
        let mut record = PolicyRecord::new(keys::SIZE, "Password size");
        let at = Utc::now();
        record.touch("admin", at);
        assert_eq!(record.updated_by.as_deref(), Some("admin"));
        assert_eq!(record.update_date, Some(at));
    }
}
