use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::DocumentError;

/// Deserialize with JSON-path context in error messages. `origin` names the
/// source (usually a file path) in the error.
pub fn from_str_with_path<T: DeserializeOwned>(origin: &str, src: &str) -> Result<T, DocumentError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| decode_error(origin, err))
}

pub fn from_value_with_path<T: DeserializeOwned>(origin: &str, value: Value) -> Result<T, DocumentError> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(|err| decode_error(origin, err))
}

fn decode_error<E: std::fmt::Display>(origin: &str, err: serde_path_to_error::Error<E>) -> DocumentError {
    let path = err.path().to_string();
    DocumentError::Decode {
        path: origin.to_string(),
        message: format!("at JSON path {path} → {}", err.into_inner()),
    }
}

// ------------------------------- Tests ------------------------------------ //
