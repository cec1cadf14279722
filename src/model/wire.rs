//! Shape checks shared by the per-entity decoders.

use serde_json::{Map, Value};

use crate::error::ModelError;

pub(crate) fn object<'a>(
    value: &'a Value,
    entity: &'static str,
) -> Result<&'a Map<String, Value>, ModelError> {
    value.as_object().ok_or_else(|| ModelError::decode(entity, "expected a JSON object"))
}

pub(crate) fn required_str(
    obj: &Map<String, Value>,
    key: &str,
    entity: &'static str,
) -> Result<String, ModelError> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ModelError::decode(entity, format!("`{key}` must be a string"))),
        None => Err(ModelError::decode(entity, format!("missing `{key}`"))),
    }
}

/// Missing or `null` reads as the empty string.
pub(crate) fn optional_str(
    obj: &Map<String, Value>,
    key: &str,
    entity: &'static str,
) -> Result<String, ModelError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ModelError::decode(entity, format!("`{key}` must be a string"))),
    }
}

pub(crate) fn optional_bool(
    obj: &Map<String, Value>,
    key: &str,
    default: bool,
    entity: &'static str,
) -> Result<bool, ModelError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(ModelError::decode(entity, format!("`{key}` must be a boolean"))),
    }
}

/// Missing or `null` reads as an empty list.
pub(crate) fn optional_array<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    entity: &'static str,
) -> Result<&'a [Value], ModelError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(ModelError::decode(entity, format!("`{key}` must be an array"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_members_use_defaults() {
        let value = json!({ "name": "x" });
        let obj = object(&value, "test").unwrap();
        assert_eq!(optional_str(obj, "doc", "test").unwrap(), "");
        assert!(optional_bool(obj, "exported", true, "test").unwrap());
        assert!(optional_array(obj, "fields", "test").unwrap().is_empty());
    }

    #[test]
    fn wrong_shapes_are_rejected() {
        let value = json!({ "name": 3, "fields": {} });
        let obj = object(&value, "test").unwrap();
        assert!(required_str(obj, "name", "test").is_err());
        assert!(required_str(obj, "missing", "test").is_err());
        assert!(optional_array(obj, "fields", "test").is_err());
        assert!(object(&json!([]), "test").is_err());
    }
}
