//! Gmail API integration
//!
//! This module provides:
//! - OAuth2 refresh-token authentication
//! - The `MailGateway` contract and its HTTP implementation
//! - Search query composition
//! - MIME decoding of full-format messages into records

mod auth;
mod client;
mod normalize;
mod query;
mod traits;

pub use auth::GmailAuth;
pub use client::GmailClient;
pub use normalize::{
    DecodedParts, HeaderFields, decode_base64_body, decode_parts, extract_headers,
    normalize_label, normalize_message,
};
pub use query::{ListFilter, after_clause, compose_list_query, start_date_clause};
pub use traits::MailGateway;

/// Number of message references requested per list page
pub const MESSAGE_PAGE_SIZE: usize = 100;

/// Upper bound on any single Gmail or OAuth request
pub const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);

/// HTTP agent with the request timeout applied
pub(crate) fn http_agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(REQUEST_TIMEOUT))
        .build()
        .into()
}

/// Gmail API response types
pub mod api {
    use serde::{Deserialize, Serialize};

    /// Response from listing messages
    #[derive(Debug, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ListMessagesResponse {
        pub messages: Option<Vec<MessageRef>>,
        pub next_page_token: Option<String>,
        pub result_size_estimate: Option<u32>,
    }

    /// Reference to a message (just ID and thread ID)
    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessageRef {
        pub id: String,
        pub thread_id: Option<String>,
    }

    /// Full message from Gmail API
    #[derive(Debug, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GmailMessage {
        pub id: String,
        pub thread_id: Option<String>,
        pub label_ids: Option<Vec<String>>,
        pub snippet: Option<String>,
        pub history_id: Option<String>,
        /// Milliseconds since epoch, as a decimal string
        pub internal_date: Option<String>,
        pub size_estimate: Option<u64>,
        pub payload: Option<MessagePart>,
        pub raw: Option<String>,
    }

    /// Node of the MIME part tree; the message payload is the root
    #[derive(Debug, Default, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessagePart {
        pub part_id: Option<String>,
        pub mime_type: Option<String>,
        pub filename: Option<String>,
        pub headers: Option<Vec<Header>>,
        pub body: Option<MessageBody>,
        pub parts: Option<Vec<MessagePart>>,
    }

    /// Email header (name-value pair)
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct Header {
        pub name: String,
        pub value: String,
    }

    /// Part body: inline base64url data, or a reference to an attachment
    #[derive(Debug, Default, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessageBody {
        pub attachment_id: Option<String>,
        pub size: Option<u64>,
        pub data: Option<String>,
    }

    /// Response from listing labels
    #[derive(Debug, Default, Deserialize)]
    pub struct ListLabelsResponse {
        pub labels: Option<Vec<GmailLabel>>,
    }

    /// Label as returned by the API
    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GmailLabel {
        pub id: String,
        pub name: String,
        #[serde(rename = "type")]
        pub label_type: Option<String>,
        pub messages_total: Option<u64>,
        pub messages_unread: Option<u64>,
        pub threads_total: Option<u64>,
        pub threads_unread: Option<u64>,
        pub color: Option<GmailLabelColor>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GmailLabelColor {
        pub text_color: Option<String>,
        pub background_color: Option<String>,
    }

    /// Response from the profile endpoint
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProfileResponse {
        pub email_address: Option<String>,
        pub messages_total: Option<u64>,
        pub threads_total: Option<u64>,
        pub history_id: Option<String>,
    }

    /// Attachment body fetched by attachment ID
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AttachmentResponse {
        pub attachment_id: Option<String>,
        pub size: Option<u64>,
        /// base64url-encoded bytes
        pub data: Option<String>,
    }
}
