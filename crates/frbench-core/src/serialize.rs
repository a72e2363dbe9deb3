use crate::error::CoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Write `value` as pretty JSON, creating parent directories as needed.
pub fn write_json_file(path: impl AsRef<Path>, value: &impl Serialize) -> Result<(), CoreError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    fs::write(path, json)?;
    Ok(())
}

/// Read and deserialize a JSON file.
pub fn read_json_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, CoreError> {
    let bytes = fs::read(path.as_ref())?;
    Ok(serde_json::from_slice(&bytes)?)
}
