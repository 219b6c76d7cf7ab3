//! Connector configuration supplied by the host pipeline
//!
//! The host validates the document against [`connection_specification`]
//! before handing it over; [`SourceConfig::validate`] repeats the checks
//! that matter to this crate so a bad document fails early with a
//! configuration error instead of an opaque API rejection.

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use serde_json::{Value, json};
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::SourceError;

/// Documentation link reported by `spec`
pub const DOCUMENTATION_URL: &str = "https://docs.airbyte.com/integrations/sources/gmail";

/// `YYYY-MM-DDTHH:MM:SS.ffffffZ`, fractional seconds optional
static START_DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}(\.[0-9]+)?Z$")
        .expect("start date pattern is valid")
});

/// Gmail source configuration
#[derive(Clone, Deserialize)]
pub struct SourceConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    /// Include messages from SPAM and TRASH
    #[serde(default)]
    pub include_spam_trash: bool,
    /// Only fetch messages received after this instant
    #[serde(default)]
    pub start_date: Option<String>,
    /// Base Gmail search expression
    #[serde(default)]
    pub query: Option<String>,
    /// Restrict listing to these label IDs
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    /// Attach the raw encoded message to each record
    #[serde(default)]
    pub include_raw: bool,
}

impl SourceConfig {
    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).context("Failed to parse connector configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from an already-decoded JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        let config: Self =
            serde_json::from_value(value).context("Failed to parse connector configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let config: Self = source_config::load_json_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Check required secrets and the start date format
    pub fn validate(&self) -> Result<(), SourceError> {
        for (field, value) in [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("refresh_token", &self.refresh_token),
        ] {
            if value.trim().is_empty() {
                return Err(SourceError::config(
                    format!("Configuration field '{}' must not be empty.", field),
                    format!("empty required field: {}", field),
                ));
            }
        }

        if let Some(start_date) = &self.start_date
            && !START_DATE_PATTERN.is_match(start_date)
        {
            return Err(SourceError::config(
                "Start date must look like YYYY-MM-DDTHH:MM:SS.ffffffZ.",
                format!("invalid start_date: {}", start_date),
            ));
        }

        Ok(())
    }

    /// Base search expression, empty when unset
    pub fn base_query(&self) -> &str {
        self.query.as_deref().unwrap_or_default()
    }

    /// Label filter, empty when unset
    pub fn label_ids(&self) -> &[String] {
        self.labels.as_deref().unwrap_or_default()
    }
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("client_id", &"<redacted>")
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("include_spam_trash", &self.include_spam_trash)
            .field("start_date", &self.start_date)
            .field("query", &self.query)
            .field("labels", &self.labels)
            .field("include_raw", &self.include_raw)
            .finish()
    }
}

/// JSON schema of the connector configuration
pub fn connection_specification() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "Gmail Source Spec",
        "type": "object",
        "required": ["client_id", "client_secret", "refresh_token"],
        "properties": {
            "client_id": {
                "type": "string",
                "title": "Client ID",
                "description": "The Client ID of your Google Cloud application",
                "airbyte_secret": true,
                "order": 0
            },
            "client_secret": {
                "type": "string",
                "title": "Client Secret",
                "description": "The Client Secret of your Google Cloud application",
                "airbyte_secret": true,
                "order": 1
            },
            "refresh_token": {
                "type": "string",
                "title": "Refresh Token",
                "description": "Refresh token obtained from Google OAuth flow",
                "airbyte_secret": true,
                "order": 2
            },
            "include_spam_trash": {
                "type": "boolean",
                "title": "Include Spam and Trash",
                "description": "Include messages from SPAM and TRASH folders",
                "default": false,
                "order": 3
            },
            "start_date": {
                "type": "string",
                "title": "Start Date",
                "description": "Only messages received after this date are replicated",
                "pattern": "^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}(\\.[0-9]+)?Z$",
                "examples": ["2024-01-01T00:00:00.000000Z"],
                "format": "date-time",
                "order": 4
            },
            "query": {
                "type": "string",
                "title": "Search Query",
                "description": "Gmail search expression applied to the message list",
                "order": 5
            },
            "labels": {
                "type": "array",
                "items": {"type": "string"},
                "title": "Label IDs",
                "description": "Only replicate messages carrying all of these label IDs",
                "order": 6
            },
            "include_raw": {
                "type": "boolean",
                "title": "Include Raw Message",
                "default": false,
                "order": 7
            }
        }
    })
}
