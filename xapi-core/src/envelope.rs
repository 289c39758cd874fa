//! Response envelope interpretation
//!
//! Every RPC round trip returns a structured envelope: a `Status`
//! discriminator plus either a success `Value` or a failure
//! `ErrorDescription` (ordered list of strings, error code first).
//! [`interpret`] turns a raw envelope into either the success value or a
//! typed error.
//!
//! # Contract
//!
//! - missing `Status` is a fatal protocol violation;
//! - `Success` without `Value` is a fatal protocol violation;
//! - `Failure` without `ErrorDescription` is a fatal protocol violation;
//! - a descriptor starting with `SESSION_INVALID` raises the session-invalid
//!   signal (consumed by the client's relogin path, not shown to callers);
//! - any other descriptor becomes an [`ApiError`](crate::ApiError) with the
//!   code split off and the remaining fields carried as payload.

use crate::error::{Error, Result};
use crate::failure::ApiError;
use serde_json::Value;

/// Wire error code that triggers the relogin-and-retry path
pub const SESSION_INVALID: &str = "SESSION_INVALID";

const STATUS: &str = "Status";
const VALUE: &str = "Value";
const ERROR_DESCRIPTION: &str = "ErrorDescription";

/// Interpret a raw response envelope
///
/// Returns the success value, or the error the envelope describes. See the
/// module docs for the exact contract.
pub fn interpret(envelope: Value) -> Result<Value> {
    let Value::Object(mut fields) = envelope else {
        return Err(Error::ProtocolViolation(
            "response envelope is not an object".to_string(),
        ));
    };

    let status = fields
        .get(STATUS)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::ProtocolViolation("missing Status field".to_string()))?;

    match status {
        "Success" => fields
            .remove(VALUE)
            .ok_or_else(|| Error::ProtocolViolation("Success response missing Value".to_string())),
        "Failure" => {
            let description = fields.remove(ERROR_DESCRIPTION).ok_or_else(|| {
                Error::ProtocolViolation("Failure response missing ErrorDescription".to_string())
            })?;
            Err(failure_error(description))
        }
        other => Err(Error::ProtocolViolation(format!(
            "unknown Status value: {other}"
        ))),
    }
}

fn failure_error(description: Value) -> Error {
    let description: Vec<String> = match description {
        Value::Array(items) => items.into_iter().map(stringify).collect(),
        // Tolerate a bare string descriptor; some endpoints flatten it
        Value::String(code) => vec![code],
        _ => {
            return Error::ProtocolViolation("ErrorDescription is not a list".to_string());
        }
    };

    if description.first().map(String::as_str) == Some(SESSION_INVALID) {
        return Error::SessionInvalid;
    }

    Error::Api(ApiError::from_description(description))
}

fn stringify(item: Value) -> String {
    match item {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
