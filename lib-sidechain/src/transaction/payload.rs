//! Transaction payloads and per-action payload schemas.
//!
//! The raw payload text is part of the transaction hash and is kept verbatim.
//! Contracts never see the raw text: it is parsed into a JSON object at the
//! boundary and, when the action declares one, checked against a
//! [`PayloadSchema`] before dispatch.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Parsed payload handed to contracts.
pub type PayloadObject = Map<String, Value>;

/// Payload parsing and validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("malformed JSON")]
    Malformed,

    #[error("payload must be a JSON object")]
    NotAnObject,

    #[error("missing field `{0}`")]
    MissingField(String),

    #[error("field `{field}` must be {expected}")]
    WrongType { field: String, expected: FieldKind },
}

/// Raw transaction payload, stored exactly as received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(String);

impl Payload {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Serialize a JSON value into a payload.
    pub fn from_value(value: &Value) -> Self {
        Self(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse into a JSON object. An empty payload parses to an empty object.
    pub fn parse(&self) -> Result<PayloadObject, PayloadError> {
        if self.0.trim().is_empty() {
            return Ok(PayloadObject::new());
        }
        match serde_json::from_str::<Value>(&self.0) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(PayloadError::NotAnObject),
            Err(e) => {
                debug!(error = %e, "payload is not valid JSON");
                Err(PayloadError::Malformed)
            }
        }
    }
}

impl From<&str> for Payload {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Payload {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::from_value(&value)
    }
}

/// JSON type expected for a payload field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Object,
    Array,
    Any,
}

impl FieldKind {
    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Object => value.is_object(),
            FieldKind::Array => value.is_array(),
            FieldKind::Any => true,
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldKind::String => "a string",
            FieldKind::Number => "a number",
            FieldKind::Boolean => "a boolean",
            FieldKind::Object => "an object",
            FieldKind::Array => "an array",
            FieldKind::Any => "any value",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
}

/// Declared shape of an action's payload. Unlisted fields pass through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayloadSchema {
    fields: Vec<FieldSpec>,
}

impl PayloadSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: &str, kind: FieldKind) -> Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            kind,
            required: true,
        });
        self
    }

    pub fn optional(mut self, name: &str, kind: FieldKind) -> Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            kind,
            required: false,
        });
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Check `payload` against the schema, reporting the first violation in declaration order.
    pub fn validate(&self, payload: &PayloadObject) -> Result<(), PayloadError> {
        for field in &self.fields {
            match payload.get(&field.name) {
                None | Some(Value::Null) if field.required => {
                    return Err(PayloadError::MissingField(field.name.clone()));
                }
                None | Some(Value::Null) => {}
                Some(value) if !field.kind.accepts(value) => {
                    return Err(PayloadError::WrongType {
                        field: field.name.clone(),
                        expected: field.kind,
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_payload_parses_to_empty_object() {
        assert!(Payload::default().parse().unwrap().is_empty());
        assert!(Payload::new("  ").parse().unwrap().is_empty());
    }

    #[test]
    fn test_non_object_payload_rejected() {
        assert_eq!(Payload::new("[1,2]").parse(), Err(PayloadError::NotAnObject));
        assert!(matches!(
            Payload::new("{not json").parse(),
            Err(PayloadError::Malformed)
        ));
    }

    #[test]
    fn test_malformed_message_has_no_parser_detail() {
        for raw in ["{oops", "not json", r#"{"a":1,}"#] {
            let err = Payload::new(raw).parse().unwrap_err();
            assert_eq!(err.to_string(), "malformed JSON");
        }
    }

    #[test]
    fn test_raw_text_preserved() {
        let raw = r#"{ "isSignedWithActiveKey": true }"#;
        let payload = Payload::new(raw);
        assert_eq!(payload.as_str(), raw);
        assert_eq!(payload.parse().unwrap()["isSignedWithActiveKey"], json!(true));
    }

    #[test]
    fn test_schema_validation() {
        let schema = PayloadSchema::new()
            .required("to", FieldKind::String)
            .optional("memo", FieldKind::String);

        let ok = Payload::from(json!({ "to": "bob", "extra": 1 })).parse().unwrap();
        assert!(schema.validate(&ok).is_ok());

        let missing = Payload::from(json!({ "memo": "hi" })).parse().unwrap();
        assert_eq!(
            schema.validate(&missing),
            Err(PayloadError::MissingField("to".into()))
        );

        let wrong = Payload::from(json!({ "to": 5 })).parse().unwrap();
        let err = schema.validate(&wrong).unwrap_err();
        assert_eq!(err.to_string(), "field `to` must be a string");
    }
}
