//! Host pipeline protocol messages
//!
//! Every message is one JSON object per line with a `type` tag. The
//! configured catalog and persisted state are the inbound documents.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{FailureType, SourceError};
use crate::models::SyncCursorState;

/// Outbound protocol message
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProtocolMessage {
    Spec {
        spec: ConnectorSpecification,
    },
    ConnectionStatus {
        #[serde(rename = "connectionStatus")]
        connection_status: ConnectionStatus,
    },
    Catalog {
        catalog: Catalog,
    },
    Record {
        record: RecordMessage,
    },
    State {
        state: StateMessage,
    },
    Trace {
        trace: TraceMessage,
    },
}

impl ProtocolMessage {
    pub fn record(stream: &str, data: Value) -> Self {
        Self::Record {
            record: RecordMessage {
                stream: stream.to_string(),
                data,
                emitted_at: Utc::now().timestamp_millis(),
            },
        }
    }

    pub fn stream_state(stream: &str, state: SyncCursorState) -> Self {
        Self::State {
            state: StateMessage {
                state_type: "STREAM".to_string(),
                stream: StreamState {
                    stream_descriptor: StreamDescriptor {
                        name: stream.to_string(),
                    },
                    stream_state: state.to_value(),
                },
            },
        }
    }

    pub fn error_trace(error: &SourceError) -> Self {
        Self::Trace {
            trace: TraceMessage {
                trace_type: "ERROR".to_string(),
                emitted_at: Utc::now().timestamp_millis(),
                error: TraceError {
                    message: error.message().to_string(),
                    internal_message: Some(error.internal_message().to_string()),
                    failure_type: error.failure_type(),
                },
            },
        }
    }

    /// Serialize as a single JSON line (no trailing newline)
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorSpecification {
    pub documentation_url: String,
    pub connection_specification: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub status: Status,
    pub message: String,
}

impl ConnectionStatus {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            status: Status::Succeeded,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Status::Failed,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    FullRefresh,
    Incremental,
}

/// Stream declared by `discover`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamDefinition {
    pub name: String,
    pub json_schema: Value,
    pub supported_sync_modes: Vec<SyncMode>,
    #[serde(default)]
    pub source_defined_cursor: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_cursor_field: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_defined_primary_key: Option<Vec<Vec<String>>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub streams: Vec<StreamDefinition>,
}

/// One stream selected by the host for a read
#[derive(Debug, Clone, Deserialize)]
pub struct ConfiguredStream {
    pub stream: ConfiguredStreamName,
    pub sync_mode: SyncMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfiguredStreamName {
    pub name: String,
}

/// Streams the host asked to read, in order
#[derive(Debug, Clone, Deserialize)]
pub struct ConfiguredCatalog {
    pub streams: Vec<ConfiguredStream>,
}

impl ConfiguredCatalog {
    /// Catalog selecting the given streams
    pub fn with_streams(streams: &[(&str, SyncMode)]) -> Self {
        Self {
            streams: streams
                .iter()
                .map(|(name, sync_mode)| ConfiguredStream {
                    stream: ConfiguredStreamName {
                        name: name.to_string(),
                    },
                    sync_mode: *sync_mode,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordMessage {
    pub stream: String,
    pub data: Value,
    pub emitted_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateMessage {
    #[serde(rename = "type")]
    pub state_type: String,
    pub stream: StreamState,
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamState {
    pub stream_descriptor: StreamDescriptor,
    pub stream_state: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamDescriptor {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceMessage {
    #[serde(rename = "type")]
    pub trace_type: String,
    pub emitted_at: i64,
    pub error: TraceError,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceError {
    pub message: String,
    pub internal_message: Option<String>,
    pub failure_type: FailureType,
}

/// Persisted state handed back by the host, keyed by stream name
///
/// Accepts the per-stream list form
/// (`[{"type": "STREAM", "stream": {"stream_descriptor": ..., "stream_state": ...}}]`)
/// and the legacy mapping form (`{"messages": {...}}`).
#[derive(Debug, Clone, Default)]
pub struct ReadState {
    streams: HashMap<String, Value>,
}

impl ReadState {
    pub fn from_value(value: Value) -> Self {
        let mut streams = HashMap::new();

        match value {
            Value::Array(entries) => {
                for entry in entries {
                    let stream = &entry["stream"];
                    if let Some(name) = stream["stream_descriptor"]["name"].as_str() {
                        streams.insert(name.to_string(), stream["stream_state"].clone());
                    }
                }
            }
            Value::Object(map) => {
                for (name, state) in map {
                    streams.insert(name, state);
                }
            }
            _ => {}
        }

        Self { streams }
    }

    /// Cursor state of a stream, empty if none was persisted
    pub fn cursor(&self, stream: &str) -> SyncCursorState {
        self.streams
            .get(stream)
            .map(SyncCursorState::from_value)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_message_shape() {
        let message = ProtocolMessage::record("labels", json!({"id": "INBOX"}));
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "RECORD");
        assert_eq!(value["record"]["stream"], "labels");
        assert_eq!(value["record"]["data"]["id"], "INBOX");
        assert!(value["record"]["emitted_at"].as_i64().unwrap() > 0);
    }

    #[test]
    fn test_state_message_shape() {
        let message = ProtocolMessage::stream_state("messages", SyncCursorState::at(1700000000000));
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "STATE");
        assert_eq!(value["state"]["type"], "STREAM");
        assert_eq!(value["state"]["stream"]["stream_descriptor"]["name"], "messages");
        assert_eq!(
            value["state"]["stream"]["stream_state"]["internal_date"],
            1700000000000i64
        );
    }

    #[test]
    fn test_connection_status_shape() {
        let message = ProtocolMessage::ConnectionStatus {
            connection_status: ConnectionStatus::failed("nope"),
        };
        let line = message.to_json_line().unwrap();
        assert_eq!(
            line,
            r#"{"type":"CONNECTION_STATUS","connectionStatus":{"status":"FAILED","message":"nope"}}"#
        );
    }

    #[test]
    fn test_trace_message_shape() {
        let err = SourceError::config("Check permissions", "HTTP 403");
        let value = serde_json::to_value(ProtocolMessage::error_trace(&err)).unwrap();
        assert_eq!(value["type"], "TRACE");
        assert_eq!(value["trace"]["type"], "ERROR");
        assert_eq!(value["trace"]["error"]["failure_type"], "config_error");
        assert_eq!(value["trace"]["error"]["internal_message"], "HTTP 403");
    }

    #[test]
    fn test_configured_catalog() {
        let catalog: ConfiguredCatalog = serde_json::from_value(json!({
            "streams": [
                {"stream": {"name": "messages", "json_schema": {}}, "sync_mode": "incremental",
                 "destination_sync_mode": "append"},
                {"stream": {"name": "labels"}, "sync_mode": "full_refresh"}
            ]
        }))
        .unwrap();

        assert_eq!(catalog.streams.len(), 2);
        assert_eq!(catalog.streams[0].stream.name, "messages");
        assert_eq!(catalog.streams[0].sync_mode, SyncMode::Incremental);
        assert_eq!(catalog.streams[1].sync_mode, SyncMode::FullRefresh);
    }

    #[test]
    fn test_read_state_per_stream_form() {
        let state = ReadState::from_value(json!([
            {"type": "STREAM", "stream": {
                "stream_descriptor": {"name": "messages"},
                "stream_state": {"internal_date": 1700000000000i64}
            }}
        ]));
        assert_eq!(state.cursor("messages"), SyncCursorState::at(1700000000000));
        assert!(state.cursor("labels").is_empty());
    }

    #[test]
    fn test_read_state_legacy_form() {
        let state = ReadState::from_value(json!({"messages": {"internal_date": "1700000000000"}}));
        assert_eq!(state.cursor("messages"), SyncCursorState::at(1700000000000));
        assert!(ReadState::from_value(Value::Null).cursor("messages").is_empty());
    }
}
