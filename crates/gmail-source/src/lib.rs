//! Gmail source connector
//!
//! Extracts messages and labels from a Gmail mailbox for a data pipeline:
//! - Gmail API gateway with lazy, cached OAuth2 refresh-token auth
//! - MIME part-tree decoding into flat message records
//! - Plain-text body sanitization
//! - Incremental sync driven by a monotonic `internal_date` cursor
//! - spec / check / discover / read operations for the host pipeline
//!
//! Everything is synchronous and single-threaded; messages are fetched
//! one at a time and emitted before the next fetch starts.

pub mod config;
pub mod connector;
pub mod error;
pub mod gmail;
pub mod models;
pub mod protocol;
pub mod sanitize;
pub mod sync;

pub use config::SourceConfig;
pub use connector::{GmailSource, LABELS_STREAM, MESSAGES_STREAM};
pub use error::{FailureType, SourceError};
pub use gmail::{GmailAuth, GmailClient, ListFilter, MailGateway};
pub use models::{
    AttachmentMeta, CURSOR_FIELD, LabelColor, LabelId, MailMessage, MailboxLabel, MessageId,
    SyncCursorState,
};
pub use protocol::{ConfiguredCatalog, ConnectionStatus, ProtocolMessage, ReadState, SyncMode};
pub use sanitize::sanitize_text;
pub use sync::{
    MessageReadOptions, StreamEvent, SyncStats, advance, compute_filter_for_state, read_labels,
    read_messages,
};
