//! Required-field validation of JSON documents.
//!
//! A document passes when every required name is a top-level key of the object and its
//! value satisfies the [`Presence`] policy. All missing names are reported at once, in the
//! order they were first declared. Input that is not a JSON object is a [`MalformedInputError`],
//! never an "everything is missing" result.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Input could not be checked at all: not JSON, or not an object at the top level.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedInputError {
    #[error("expected a JSON object at the top level, found {0}")]
    NotAnObject(&'static str),
    #[error("body is not valid JSON: {0}")]
    Syntax(String),
}

/// When a declared key counts as present.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    /// The key exists, whatever its value.
    KeyOnly,
    /// The key exists and is not `null`.
    #[default]
    NonNull,
    /// The key exists and is not `null`, `""`, `[]` or `{}`.
    NonEmpty,
}

impl Presence {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Presence::KeyOnly => true,
            Presence::NonNull => !value.is_null(),
            Presence::NonEmpty => match value {
                Value::Null => false,
                Value::String(s) => !s.is_empty(),
                Value::Array(a) => !a.is_empty(),
                Value::Object(o) => !o.is_empty(),
                Value::Bool(_) | Value::Number(_) => true,
            },
        }
    }
}

/// Outcome of checking a well-formed object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationResult {
    Valid,
    Invalid { missing_fields: Vec<String> },
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    /// Missing names in declaration order; empty when valid.
    pub fn missing_fields(&self) -> &[String] {
        match self {
            ValidationResult::Valid => &[],
            ValidationResult::Invalid { missing_fields } => missing_fields,
        }
    }
}

/// Ordered list of required top-level keys plus the presence policy applied to them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub fields: Vec<String>,
    #[serde(default)]
    pub presence: Presence,
}

impl FieldSpec {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            presence: Presence::default(),
        }
    }

    pub fn with_presence(mut self, presence: Presence) -> Self {
        self.presence = presence;
        self
    }

    /// Spec from a JSON Schema's top-level `"required"` array. Non-string entries are skipped.
    pub fn from_schema(schema: &Value) -> Self {
        let fields = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).map(String::from).collect())
            .unwrap_or_default();
        Self {
            fields,
            presence: Presence::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn validate(&self, document: &Value) -> Result<ValidationResult, MalformedInputError> {
        validate_with(document, &self.fields, self.presence)
    }

    /// JSON Schema fragment describing this spec (used in the OpenAPI document).
    pub fn to_schema(&self) -> Value {
        serde_json::json!({ "type": "object", "required": self.unique_fields() })
    }

    fn unique_fields(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.fields
            .iter()
            .map(String::as_str)
            .filter(|f| seen.insert(*f))
            .collect()
    }
}

/// Check `document` against `required` with the default policy (`null` counts as missing).
pub fn validate<S: AsRef<str>>(
    document: &Value,
    required: &[S],
) -> Result<ValidationResult, MalformedInputError> {
    validate_with(document, required, Presence::default())
}

pub fn validate_with<S: AsRef<str>>(
    document: &Value,
    required: &[S],
    presence: Presence,
) -> Result<ValidationResult, MalformedInputError> {
    let obj = document
        .as_object()
        .ok_or_else(|| MalformedInputError::NotAnObject(json_kind(document)))?;
    let mut seen = HashSet::new();
    let missing_fields: Vec<String> = required
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| seen.insert(*name))
        .filter(|name| !obj.get(*name).is_some_and(|v| presence.accepts(v)))
        .map(String::from)
        .collect();
    if missing_fields.is_empty() {
        Ok(ValidationResult::Valid)
    } else {
        Ok(ValidationResult::Invalid { missing_fields })
    }
}

/// Parse `body` and check it against `spec`. Returns the parsed document with the result.
pub fn validate_body(
    body: &[u8],
    spec: &FieldSpec,
) -> Result<(Value, ValidationResult), MalformedInputError> {
    let document: Value =
        serde_json::from_slice(body).map_err(|e| MalformedInputError::Syntax(e.to_string()))?;
    let result = spec.validate(&document)?;
    Ok((document, result))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn invalid(fields: &[&str]) -> ValidationResult {
        ValidationResult::Invalid {
            missing_fields: fields.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn present_field_is_valid() {
        let doc = json!({"email": "test@example.com"});
        assert_eq!(validate(&doc, &["email"]).unwrap(), ValidationResult::Valid);
    }

    #[test]
    fn other_key_does_not_satisfy() {
        let doc = json!({"aneh": "test@example.com"});
        assert_eq!(validate(&doc, &["email"]).unwrap(), invalid(&["email"]));
    }

    #[test]
    fn null_counts_as_missing() {
        let doc = json!({"email": null, "name": "x"});
        assert_eq!(validate(&doc, &["email", "name"]).unwrap(), invalid(&["email"]));
    }

    #[test]
    fn array_is_malformed() {
        let doc = json!(["not", "an", "object"]);
        let err = validate(&doc, &["email"]).unwrap_err();
        assert_eq!(err, MalformedInputError::NotAnObject("array"));
    }

    #[test]
    fn scalars_are_malformed() {
        for doc in [json!(null), json!(1), json!("email"), json!(true)] {
            assert!(validate(&doc, &["email"]).is_err(), "{doc}");
        }
    }

    #[test]
    fn reports_only_missing_fields() {
        let doc = json!({"email": "a", "phone": "b"});
        assert_eq!(
            validate(&doc, &["email", "phone", "fax"]).unwrap(),
            invalid(&["fax"])
        );
    }

    #[test]
    fn empty_requirements_are_valid() {
        let empty: [&str; 0] = [];
        assert!(validate(&json!({}), &empty).unwrap().is_valid());
        assert!(validate(&json!({"a": null}), &empty).unwrap().is_valid());
    }

    #[test]
    fn missing_order_follows_declaration_not_document() {
        let doc = json!({"z": 1, "a": 2});
        let result = validate(&doc, &["c", "z", "b", "a", "d"]).unwrap();
        assert_eq!(result.missing_fields(), ["c", "b", "d"]);
    }

    #[test]
    fn duplicates_reported_once() {
        let doc = json!({"email": "a"});
        let result = validate(&doc, &["fax", "email", "fax", "email"]).unwrap();
        assert_eq!(result, invalid(&["fax"]));
    }

    #[test]
    fn key_only_accepts_null() {
        let doc = json!({"email": null});
        let result = validate_with(&doc, &["email"], Presence::KeyOnly).unwrap();
        assert!(result.is_valid());
    }

    #[test]
    fn non_empty_rejects_blank_values() {
        let doc = json!({"s": "", "a": [], "o": {}, "n": 0, "b": false, "ok": "x"});
        let result =
            validate_with(&doc, &["s", "a", "o", "n", "b", "ok"], Presence::NonEmpty).unwrap();
        assert_eq!(result, invalid(&["s", "a", "o"]));
    }

    #[test]
    fn default_policy_keeps_empty_string() {
        let doc = json!({"email": ""});
        assert!(validate(&doc, &["email"]).unwrap().is_valid());
    }

    #[test]
    fn nested_keys_are_not_searched() {
        let doc = json!({"user": {"email": "a"}});
        assert_eq!(validate(&doc, &["email"]).unwrap(), invalid(&["email"]));
    }

    #[test]
    fn repeated_calls_agree() {
        let doc = json!({"a": 1, "b": null});
        let fields = ["a", "b", "c"];
        assert_eq!(validate(&doc, &fields).unwrap(), validate(&doc, &fields).unwrap());
    }

    #[test]
    fn spec_from_schema_reads_required() {
        let schema = json!({"type": "object", "required": ["a", 3, "b"]});
        assert_eq!(FieldSpec::from_schema(&schema).fields, ["a", "b"]);
        assert!(FieldSpec::from_schema(&json!({"type": "object"})).is_empty());
    }

    #[test]
    fn spec_schema_deduplicates() {
        let spec = FieldSpec::new(["a", "b", "a"]);
        assert_eq!(spec.to_schema(), json!({"type": "object", "required": ["a", "b"]}));
    }

    #[test]
    fn body_syntax_error_is_malformed() {
        let spec = FieldSpec::new(["email"]);
        let err = validate_body(b"{\"email\":", &spec).unwrap_err();
        assert!(matches!(err, MalformedInputError::Syntax(_)));
    }

    #[test]
    fn body_returns_document_and_result() {
        let spec = FieldSpec::new(["email", "name"]);
        let (doc, result) = validate_body(br#"{"email":"x"}"#, &spec).unwrap();
        assert_eq!(doc, json!({"email": "x"}));
        assert_eq!(result, invalid(&["name"]));
    }

    #[test]
    fn result_serializes_with_status_tag() {
        let v = serde_json::to_value(invalid(&["fax"])).unwrap();
        assert_eq!(v, json!({"status": "invalid", "missing_fields": ["fax"]}));
        let v = serde_json::to_value(ValidationResult::Valid).unwrap();
        assert_eq!(v, json!({"status": "valid"}));
    }

    #[test]
    fn presence_deserializes_snake_case() {
        let spec: FieldSpec =
            serde_json::from_value(json!({"fields": ["a"], "presence": "non_empty"})).unwrap();
        assert_eq!(spec.presence, Presence::NonEmpty);
        let spec: FieldSpec = serde_json::from_value(json!({"fields": ["a"]})).unwrap();
        assert_eq!(spec.presence, Presence::NonNull);
    }
}
