//! Connector operations: spec, check, discover and read

use anyhow::Result;
use serde_json::{Value, json};

use crate::config::{DOCUMENTATION_URL, SourceConfig, connection_specification};
use crate::gmail::{GmailClient, MailGateway};
use crate::models::CURSOR_FIELD;
use crate::protocol::{
    Catalog, ConfiguredCatalog, ConnectionStatus, ConnectorSpecification, ProtocolMessage,
    ReadState, StreamDefinition, SyncMode,
};
use crate::sync::{MessageReadOptions, StreamEvent, read_labels, read_messages};

/// Name of the message stream
pub const MESSAGES_STREAM: &str = "messages";
/// Name of the label stream
pub const LABELS_STREAM: &str = "labels";

/// Gmail source connector
pub struct GmailSource;

impl GmailSource {
    /// Connection specification for the host UI and validator
    pub fn spec() -> ConnectorSpecification {
        ConnectorSpecification {
            documentation_url: DOCUMENTATION_URL.to_string(),
            connection_specification: connection_specification(),
        }
    }

    /// Validate the config and probe the mailbox; never fails
    pub fn check(config: Value) -> ConnectionStatus {
        match SourceConfig::from_value(config) {
            Ok(config) => Self::check_gateway(&GmailClient::from_config(&config)),
            Err(e) => ConnectionStatus::failed(format!("Failed to connect: {:#}", e)),
        }
    }

    /// Probe an already-built gateway
    pub fn check_gateway<G: MailGateway + ?Sized>(gateway: &G) -> ConnectionStatus {
        if gateway.check_connection() {
            let email = gateway.account_email();
            log::info!("Connected to Gmail account {}", email);
            ConnectionStatus::succeeded(format!(
                "Successfully connected to Gmail account: {}",
                email
            ))
        } else {
            ConnectionStatus::failed("Failed to connect to Gmail API")
        }
    }

    /// Streams this source can produce
    pub fn discover() -> Catalog {
        Catalog {
            streams: vec![
                StreamDefinition {
                    name: MESSAGES_STREAM.to_string(),
                    json_schema: messages_schema(),
                    supported_sync_modes: vec![SyncMode::FullRefresh, SyncMode::Incremental],
                    source_defined_cursor: true,
                    default_cursor_field: Some(vec![CURSOR_FIELD.to_string()]),
                    source_defined_primary_key: Some(vec![vec!["id".to_string()]]),
                },
                StreamDefinition {
                    name: LABELS_STREAM.to_string(),
                    json_schema: labels_schema(),
                    supported_sync_modes: vec![SyncMode::FullRefresh],
                    source_defined_cursor: false,
                    default_cursor_field: None,
                    source_defined_primary_key: Some(vec![vec!["id".to_string()]]),
                },
            ],
        }
    }

    /// Read the configured streams in catalog order
    ///
    /// Errors are fatal to the run and carry a `SourceError` when the
    /// failure came from the Gmail API.
    pub fn read<G, F>(
        gateway: &G,
        config: &SourceConfig,
        catalog: &ConfiguredCatalog,
        state: &ReadState,
        mut emit: F,
    ) -> Result<()>
    where
        G: MailGateway + ?Sized,
        F: FnMut(ProtocolMessage) -> Result<()>,
    {
        for configured in &catalog.streams {
            let name = configured.stream.name.as_str();
            match name {
                MESSAGES_STREAM => {
                    let options = MessageReadOptions {
                        base_query: config.base_query().to_string(),
                        label_ids: config.label_ids().to_vec(),
                        include_raw: config.include_raw,
                        incremental: configured.sync_mode == SyncMode::Incremental,
                    };
                    let prior = if options.incremental {
                        state.cursor(MESSAGES_STREAM)
                    } else {
                        Default::default()
                    };

                    let (final_state, stats) =
                        read_messages(gateway, &options, prior, |event| {
                            emit(stream_message(MESSAGES_STREAM, event))
                        })?;
                    log::info!(
                        "Finished {}: {} records from {} pages, {} skipped, {}ms, cursor {:?}",
                        MESSAGES_STREAM,
                        stats.records_emitted,
                        stats.pages,
                        stats.errors,
                        stats.duration_ms,
                        final_state.internal_date
                    );
                }
                LABELS_STREAM => {
                    let stats =
                        read_labels(gateway, |event| emit(stream_message(LABELS_STREAM, event)))?;
                    log::info!(
                        "Finished {}: {} records, {}ms",
                        LABELS_STREAM,
                        stats.records_emitted,
                        stats.duration_ms
                    );
                }
                other => log::warn!("Skipping unknown stream {:?}", other),
            }
        }
        Ok(())
    }
}

fn stream_message(stream: &str, event: StreamEvent) -> ProtocolMessage {
    match event {
        StreamEvent::Record(data) => ProtocolMessage::record(stream, data),
        StreamEvent::State(state) => ProtocolMessage::stream_state(stream, state),
    }
}

/// JSON schema of `messages` records
pub fn messages_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "properties": {
            "id": {"type": "string"},
            "thread_id": {"type": ["null", "string"]},
            "label_ids": {"type": ["null", "array"], "items": {"type": "string"}},
            "from": {"type": ["null", "string"]},
            "to": {"type": ["null", "string"]},
            "cc": {"type": ["null", "string"]},
            "bcc": {"type": ["null", "string"]},
            "subject": {"type": ["null", "string"]},
            "date": {"type": ["null", "string"]},
            "internal_date": {"type": ["null", "string"], "format": "date-time"},
            "snippet": {"type": ["null", "string"]},
            "body_plain": {"type": ["null", "string"]},
            "attachments": {
                "type": ["null", "array"],
                "items": {
                    "type": "object",
                    "properties": {
                        "filename": {"type": ["null", "string"]},
                        "mime_type": {"type": ["null", "string"]},
                        "size": {"type": ["null", "integer"]},
                        "attachment_id": {"type": ["null", "string"]}
                    }
                }
            },
            "size_estimate": {"type": ["null", "integer"]},
            "history_id": {"type": ["null", "string"]},
            "raw": {"type": ["null", "string"]}
        },
        "additionalProperties": true
    })
}

/// JSON schema of `labels` records
pub fn labels_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "properties": {
            "id": {"type": "string"},
            "name": {"type": "string"},
            "type": {"type": ["null", "string"]},
            "messages_total": {"type": ["null", "integer"]},
            "messages_unread": {"type": ["null", "integer"]},
            "threads_total": {"type": ["null", "integer"]},
            "threads_unread": {"type": ["null", "integer"]},
            "color": {
                "type": ["null", "object"],
                "properties": {
                    "text_color": {"type": ["null", "string"]},
                    "background_color": {"type": ["null", "string"]}
                }
            }
        },
        "additionalProperties": true
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_streams() {
        let catalog = GmailSource::discover();
        let names: Vec<&str> = catalog.streams.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec![MESSAGES_STREAM, LABELS_STREAM]);

        let messages = &catalog.streams[0];
        assert_eq!(
            messages.default_cursor_field,
            Some(vec!["internal_date".to_string()])
        );
        assert!(messages.supported_sync_modes.contains(&SyncMode::Incremental));
        assert!(!catalog.streams[1].supported_sync_modes.contains(&SyncMode::Incremental));
    }

    #[test]
    fn test_spec() {
        let spec = GmailSource::spec();
        assert_eq!(spec.documentation_url, DOCUMENTATION_URL);
        assert!(spec.connection_specification["properties"]["refresh_token"].is_object());
    }

    #[test]
    fn test_check_rejects_invalid_config() {
        let status = GmailSource::check(json!({"client_id": "id"}));
        assert_eq!(status.status, crate::protocol::Status::Failed);
        assert!(status.message.starts_with("Failed to connect:"));
    }

    #[test]
    fn test_schemas_cover_record_fields() {
        let schema = messages_schema();
        for field in ["id", "internal_date", "body_plain", "attachments", "raw"] {
            assert!(schema["properties"][field].is_object(), "missing {}", field);
        }
        assert!(labels_schema()["properties"]["color"].is_object());
    }
}
