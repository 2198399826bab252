//! Response value and the mapping from validation outcomes and errors to HTTP statuses.

use serde_json::{json, Value};

use crate::CoreError;

/// Body of a successful check when no handler produced its own.
pub const SUCCESS_MESSAGE: &str = "Validation Success";

const ERROR_PREFIX: &str = "Validation Error";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status_code: u16,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

impl Response {
    pub fn json(status_code: u16, value: &Value) -> Self {
        Self {
            status_code,
            body: value.to_string().into_bytes(),
            content_type: Some("application/json".into()),
        }
    }

    pub fn ok(value: &Value) -> Self {
        Self::json(200, value)
    }

    /// 200 with `{"message": "Validation Success"}`.
    pub fn success() -> Self {
        Self::ok(&json!({ "message": SUCCESS_MESSAGE }))
    }

    /// 400 listing every missing field.
    pub fn invalid(missing_fields: &[String]) -> Self {
        let error = format!(
            "{}: missing required fields: {}",
            ERROR_PREFIX,
            missing_fields.join(", ")
        );
        Self::json(400, &json!({ "error": error, "missing_fields": missing_fields }))
    }

    pub fn from_error(err: &CoreError) -> Self {
        let status = err.status_code();
        let error = match err {
            CoreError::Malformed(_) | CoreError::Validation(_) => {
                format!("{}: {}", ERROR_PREFIX, err)
            }
            _ => err.to_string(),
        };
        Self::json(status, &json!({ "error": error }))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn json_body(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

impl From<&CoreError> for Response {
    fn from(err: &CoreError) -> Self {
        Response::from_error(err)
    }
}
