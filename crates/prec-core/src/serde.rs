//! JSON and YAML encoding with errors mapped to [`PrecError::Serde`].
//!
//! Canonical JSON sorts object keys at every depth, so equal values always
//! hash to the same cache key.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::errors::{ErrorInfo, PrecError};

fn serde_error(code: &str, err: impl ToString) -> PrecError {
    PrecError::Serde(ErrorInfo::new(code, err.to_string()))
}

// serde_json already orders keys unless `preserve_order` is enabled somewhere
// in the dependency graph; sorting here keeps cache keys stable either way.
fn sort_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = std::mem::take(map).into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            for (_, nested) in entries.iter_mut() {
                sort_keys(nested);
            }
            *map = entries.into_iter().collect::<Map<String, Value>>();
        }
        Value::Array(items) => items.iter_mut().for_each(sort_keys),
        _ => {}
    }
}

/// Compact JSON with sorted keys.
pub fn to_canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, PrecError> {
    let mut value = serde_json::to_value(value).map_err(|err| serde_error("json-encode", err))?;
    sort_keys(&mut value);
    serde_json::to_vec(&value).map_err(|err| serde_error("json-write", err))
}

/// Parses JSON bytes.
pub fn from_json_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, PrecError> {
    serde_json::from_slice(data).map_err(|err| serde_error("json-parse", err))
}

/// Renders YAML.
pub fn to_yaml_string<T: Serialize>(value: &T) -> Result<String, PrecError> {
    serde_yaml::to_string(value).map_err(|err| serde_error("yaml-encode", err))
}

/// Parses YAML bytes.
pub fn from_yaml_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, PrecError> {
    serde_yaml::from_slice(data).map_err(|err| serde_error("yaml-parse", err))
}
