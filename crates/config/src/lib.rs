//! Loading of host-supplied connector documents
//!
//! The host pipeline hands the connector three JSON documents by path:
//! the connection config, the configured catalog and the persisted state.
//! This crate reads and parses them.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Load and parse a JSON file from an arbitrary path
pub fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_json(&content).with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Load a JSON file if a path was given
///
/// State files are optional: the first sync has none. An empty file is
/// treated the same as a missing one.
pub fn load_optional_json_file<T: DeserializeOwned>(path: Option<&Path>) -> Result<Option<T>> {
    let Some(path) = path else {
        return Ok(None);
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read state file: {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(None);
    }

    parse_json(&content)
        .map(Some)
        .with_context(|| format!("Failed to parse state file: {}", path.display()))
}

/// Parse a JSON document from a string
pub fn parse_json<T: DeserializeOwned>(content: &str) -> Result<T> {
    Ok(serde_json::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        #[serde(default)]
        enabled: bool,
    }

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_json_file() {
        let file = write_temp(r#"{"name": "gmail", "enabled": true}"#);
        let sample: Sample = load_json_file(file.path()).unwrap();
        assert_eq!(
            sample,
            Sample {
                name: "gmail".to_string(),
                enabled: true
            }
        );
    }

    #[test]
    fn test_load_json_file_missing() {
        let err = load_json_file::<Sample>(Path::new("/nonexistent/config.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_json_file_invalid() {
        let file = write_temp("{ not json");
        let err = load_json_file::<Sample>(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_load_optional_json_file() {
        assert_eq!(load_optional_json_file::<Sample>(None).unwrap(), None);

        let empty = write_temp("  \n");
        assert_eq!(
            load_optional_json_file::<Sample>(Some(empty.path())).unwrap(),
            None
        );

        let file = write_temp(r#"{"name": "state"}"#);
        let sample = load_optional_json_file::<Sample>(Some(file.path()))
            .unwrap()
            .unwrap();
        assert_eq!(sample.name, "state");
        assert!(!sample.enabled);
    }
}
