//! Strict parsing of a model reply into a [`ToolCall`].
//!
//! The reply must be one JSON object after trimming. There is no fence
//! stripping, no substring search and no fallback tool: anything else is
//! rejected with the verbatim output attached.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{FactoryError, FactoryResult};

/// A tool call as proposed by the model, before registry validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCall {
    pub tool: String,
    pub args: Value,
    pub reason: String,
}

fn invalid(reason: impl Into<String>, output: &str) -> FactoryError {
    FactoryError::InvalidToolCall {
        reason: reason.into(),
        output: output.to_string(),
    }
}

/// Parse a model reply. `args` defaults to `{}` and `reason` to empty.
pub fn parse_tool_call(reply: &str) -> FactoryResult<ToolCall> {
    let value: Value = serde_json::from_str(reply.trim())
        .map_err(|e| invalid(format!("reply is not valid JSON ({e})"), reply))?;

    let Value::Object(mut obj) = value else {
        return Err(invalid("reply is not a JSON object", reply));
    };

    let tool = match obj.remove("tool") {
        Some(Value::String(name)) if !name.trim().is_empty() => name,
        Some(Value::String(_)) | None | Some(Value::Null) => {
            return Err(invalid("missing \"tool\" field", reply))
        }
        Some(_) => return Err(invalid("\"tool\" must be a string", reply)),
    };

    let args = match obj.remove("args") {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(args) => args,
    };

    let reason = match obj.remove("reason") {
        Some(Value::String(reason)) => reason,
        _ => String::new(),
    };

    Ok(ToolCall { tool, args, reason })
}
