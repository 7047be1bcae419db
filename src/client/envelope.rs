//! Backend response envelopes.
//! The API answers in one of two accepted shapes, `{ success, data: {...} }`
//! or `{ success, ...fieldsInlined }`; both normalize to one `Envelope`
//! before any caller sees them.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ClientError;
use crate::validation::ValidationError;

#[derive(Debug, Clone)]
pub struct Envelope {
    pub success: bool,
    pub message: Option<String>,
    pub data: Value,
}

impl Envelope {
    pub fn normalize(body: Value) -> Result<Self, ClientError> {
        let mut map = match body {
            Value::Object(map) => map,
            other => {
                return Err(ClientError::InvalidResponse(format!(
                    "response body is not a JSON object: {}",
                    other
                )))
            }
        };

        let success = match map.remove("success") {
            Some(Value::Bool(flag)) => flag,
            // absent flag means the body does not declare failure
            None => true,
            Some(other) => {
                return Err(ClientError::InvalidResponse(format!(
                    "non-boolean success flag: {}",
                    other
                )))
            }
        };

        // `message` is envelope metadata when the body nests `data` or
        // declares failure; in a successful inlined shape it stays in the
        // payload, where it may be an ordinary data field
        let message = match map.get("message") {
            Some(Value::String(message)) => Some(message.clone()),
            _ => None,
        };
        if !success || map.contains_key("data") {
            map.remove("message");
        }

        let data = match map.remove("data") {
            Some(Value::Null) | None => Value::Object(map),
            Some(data) => data,
        };

        Ok(Envelope {
            success,
            message,
            data,
        })
    }

    /// Converts a declared-failure envelope into the matching error. Field
    /// errors become `ValidationFailure`; anything else keeps the backend's
    /// message.
    pub fn into_result(self) -> Result<Value, ClientError> {
        if self.success {
            return Ok(self.data);
        }

        if let Some(errors) = field_errors(&self.data) {
            return Err(ClientError::ValidationFailure(errors));
        }

        Err(ClientError::Backend(
            self.message
                .unwrap_or_else(|| "request failed without a message".to_string()),
        ))
    }

    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        let data = self.into_result()?;
        serde_json::from_value(data).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    /// Error for a non-2xx transport status, preferring body detail over the
    /// bare status code.
    pub fn failure_error(self, status: StatusCode) -> ClientError {
        match self.into_result() {
            Err(err) => err,
            Ok(_) => ClientError::Backend(format!("backend returned status {}", status)),
        }
    }
}

fn field_errors(data: &Value) -> Option<Vec<ValidationError>> {
    let fields = data.get("errors")?.as_object()?;
    let mut errors = Vec::new();

    for (field, messages) in fields {
        match messages {
            Value::String(message) => errors.push(ValidationError::new(field, message)),
            Value::Array(items) => {
                for item in items {
                    if let Some(message) = item.as_str() {
                        errors.push(ValidationError::new(field, message));
                    }
                }
            }
            _ => {}
        }
    }

    if errors.is_empty() {
        None
    } else {
        Some(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_and_inlined_shapes_normalize_identically() {
        let nested = Envelope::normalize(json!({
            "success": true,
            "data": {"balance": 500, "value": {"valuePerMyPt": 0.024}}
        }))
        .unwrap();

        let inlined = Envelope::normalize(json!({
            "success": true,
            "balance": 500,
            "value": {"valuePerMyPt": 0.024}
        }))
        .unwrap();

        assert!(nested.success && inlined.success);
        assert_eq!(nested.data, inlined.data);
    }

    #[test]
    fn inlined_success_keeps_a_message_data_field() {
        let envelope = Envelope::normalize(json!({
            "success": true,
            "message": "welcome back",
            "balance": 500
        }))
        .unwrap();

        assert_eq!(envelope.message.as_deref(), Some("welcome back"));
        assert_eq!(
            envelope.data,
            json!({"message": "welcome back", "balance": 500})
        );

        // nested shape: the top-level message is envelope metadata only
        let envelope = Envelope::normalize(json!({
            "success": true,
            "message": "ok",
            "data": {"balance": 500}
        }))
        .unwrap();
        assert_eq!(envelope.message.as_deref(), Some("ok"));
        assert_eq!(envelope.data, json!({"balance": 500}));
    }

    #[test]
    fn missing_success_flag_means_no_declared_failure() {
        let envelope = Envelope::normalize(json!({"balance": 500})).unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.data, json!({"balance": 500}));
    }

    #[test]
    fn non_object_body_is_invalid() {
        assert!(matches!(
            Envelope::normalize(json!("oops")),
            Err(ClientError::InvalidResponse(_))
        ));
        assert!(matches!(
            Envelope::normalize(json!({"success": "yes"})),
            Err(ClientError::InvalidResponse(_))
        ));
    }

    #[test]
    fn declared_failure_carries_the_message() {
        let envelope = Envelope::normalize(json!({
            "success": false,
            "message": "balance lookup failed"
        }))
        .unwrap();

        let err = envelope.into_result().unwrap_err();
        assert!(matches!(err, ClientError::Backend(msg) if msg == "balance lookup failed"));
    }

    #[test]
    fn field_errors_become_validation_failures() {
        let envelope = Envelope::normalize(json!({
            "success": false,
            "message": "validation failed",
            "errors": {
                "accountNumber": ["is required"],
                "bankName": "must not be empty"
            }
        }))
        .unwrap();

        let err = envelope.into_result().unwrap_err();
        let ClientError::ValidationFailure(errors) = err else {
            panic!("expected ValidationFailure, got {:?}", err);
        };
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.field == "accountNumber"));
        assert!(errors.iter().any(|e| e.field == "bankName"));
    }
}
