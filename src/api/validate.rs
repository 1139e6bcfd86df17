use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of a 400 response. `field` names the offending input, dotted for
/// nested paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
        }
    }

    pub fn at(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

/// Inputs accepted at the service boundary. Request bodies are decoded
/// through this and never through `Deserialize`, so field messages and
/// content checks such as the polyline shape live in one place.
pub trait Validate: Sized {
    fn validate(value: &Value) -> Result<Self, ValidationError>;
}

pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn mismatch(field: &str, expected: &str, value: &Value) -> ValidationError {
    ValidationError::at(field, format!("Expected {expected}, received {}", kind(value)))
}

/// Typed access to the fields of a JSON object body.
pub(crate) struct Fields<'a> {
    object: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    pub fn new(value: &'a Value) -> Result<Self, ValidationError> {
        match value {
            Value::Object(object) => Ok(Self { object }),
            other => Err(ValidationError::new(format!(
                "Expected object, received {}",
                kind(other)
            ))),
        }
    }

    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.object.get(name)
    }

    fn required(&self, name: &str) -> Result<&'a Value, ValidationError> {
        self.get(name)
            .ok_or_else(|| ValidationError::at(name, "Required"))
    }

    pub fn string(&self, name: &str) -> Result<String, ValidationError> {
        match self.required(name)? {
            Value::String(s) => Ok(s.clone()),
            other => Err(mismatch(name, "string", other)),
        }
    }

    pub fn number(&self, name: &str) -> Result<f64, ValidationError> {
        match self.required(name)? {
            Value::Number(n) => n
                .as_f64()
                .filter(|n| n.is_finite())
                .ok_or_else(|| ValidationError::at(name, "Expected finite number")),
            other => Err(mismatch(name, "number", other)),
        }
    }

    /// Whole-valued floats such as `10.0` count as integers.
    pub fn integer(&self, name: &str) -> Result<i32, ValidationError> {
        let n = self.number(name)?;
        if n.fract() != 0.0 {
            return Err(ValidationError::at(name, "Expected integer, received float"));
        }
        if n < f64::from(i32::MIN) || n > f64::from(i32::MAX) {
            return Err(ValidationError::at(name, "Number must fit in 32 bits"));
        }
        Ok(n as i32)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn missing_field_is_required() {
        let body = json!({});
        let fields = Fields::new(&body).unwrap();
        assert_eq!(
            fields.string("ambulanceId").unwrap_err(),
            ValidationError::at("ambulanceId", "Required")
        );
    }

    #[test]
    fn kind_mismatch_names_both_kinds() {
        let body = json!({ "lat": "12.9" });
        let fields = Fields::new(&body).unwrap();
        let err = fields.number("lat").unwrap_err();
        assert_eq!(err.message, "Expected number, received string");
        assert_eq!(err.field.as_deref(), Some("lat"));
    }

    #[test]
    fn integer_rejects_fractions() {
        let body = json!({ "eta": 10.5, "ok": 10 });
        let fields = Fields::new(&body).unwrap();
        assert_eq!(
            fields.integer("eta").unwrap_err().message,
            "Expected integer, received float"
        );
        assert_eq!(fields.integer("ok").unwrap(), 10);
    }

    #[test]
    fn integer_accepts_whole_floats_and_checks_range() {
        let body = json!({ "eta": 10.0, "big": 3_000_000_000u64, "huge": u64::MAX });
        let fields = Fields::new(&body).unwrap();
        assert_eq!(fields.integer("eta").unwrap(), 10);
        assert_eq!(
            fields.integer("big").unwrap_err().message,
            "Number must fit in 32 bits"
        );
        assert_eq!(
            fields.integer("huge").unwrap_err().message,
            "Number must fit in 32 bits"
        );
    }

    #[test]
    fn non_object_body_has_no_field() {
        let err = Fields::new(&json!([1, 2])).err().unwrap();
        assert_eq!(err.message, "Expected object, received array");
        assert_eq!(err.field, None);
    }

    #[test]
    fn field_is_omitted_from_json_when_absent() {
        let body = serde_json::to_value(ValidationError::new("bad")).unwrap();
        assert_eq!(body, json!({ "message": "bad" }));
    }
}
