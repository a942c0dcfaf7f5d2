//! Request body validation for `POST /chat/message`.
//!
//! Checks run in field order (`message`, then `sessionId`) and the first
//! violated constraint becomes the 400 error message.

use serde_json::Value;
use uuid::Uuid;

/// A validated send-message request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageRequest {
    pub message: String,
    pub session_id: Option<String>,
}

impl SendMessageRequest {
    /// Parse and validate a raw request body.
    ///
    /// An empty body is treated as `{}`.
    pub fn from_body(body: &[u8]) -> Result<Self, String> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Self::from_value(&Value::Object(Default::default()));
        }
        let value: Value =
            serde_json::from_slice(body).map_err(|_| "Invalid JSON body".to_string())?;
        Self::from_value(&value)
    }

    /// Validate an already parsed JSON value.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        let Value::Object(fields) = value else {
            return Err(format!("Expected object, received {}", type_name(value)));
        };

        let message = match fields.get("message") {
            None => return Err("Required".to_string()),
            Some(Value::String(s)) if s.is_empty() => {
                return Err("Message cannot be empty".to_string())
            }
            Some(Value::String(s)) => s.clone(),
            Some(other) => return Err(format!("Expected string, received {}", type_name(other))),
        };

        let session_id = match fields.get("sessionId") {
            None => None,
            Some(Value::String(s)) if is_uuid(s) => Some(s.clone()),
            Some(Value::String(_)) => return Err("Invalid uuid".to_string()),
            Some(other) => return Err(format!("Expected string, received {}", type_name(other))),
        };

        Ok(Self {
            message,
            session_id,
        })
    }
}

/// Hyphenated 8-4-4-4-12 hex form only.
fn is_uuid(s: &str) -> bool {
    s.len() == 36 && Uuid::try_parse(s).is_ok()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
