//! Loading operator-authored specification and template files.
//!
//! Files are read once per invocation. JSON by default, YAML when the
//! extension says so; both come back as a `serde_json::Value`. Contents are
//! not checked beyond shape, the control plane validates semantics.

use std::path::Path;

use serde_json::Value;

use crate::error::{FactoryError, FactoryResult};

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref(),
        Some("yaml") | Some("yml")
    )
}

/// Read and parse a specification or template file.
pub async fn load_document(path: &Path) -> FactoryResult<Value> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| FactoryError::Input(format!("cannot read {}: {e}", path.display())))?;

    if is_yaml(path) {
        serde_yaml::from_str(&text)
            .map_err(|e| FactoryError::Input(format!("invalid YAML in {}: {e}", path.display())))
    } else {
        serde_json::from_str(&text)
            .map_err(|e| FactoryError::Input(format!("invalid JSON in {}: {e}", path.display())))
    }
}

/// Load a cell specification; it is merged into request bodies, so it must
/// be an object.
pub async fn load_cell_spec(path: &Path) -> FactoryResult<serde_json::Map<String, Value>> {
    match load_document(path).await? {
        Value::Object(map) => Ok(map),
        other => Err(FactoryError::Input(format!(
            "cell specification {} must be an object, got {}",
            path.display(),
            type_name(&other)
        ))),
    }
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
