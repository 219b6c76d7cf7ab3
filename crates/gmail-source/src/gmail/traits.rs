//! Mail API gateway contract

use anyhow::Result;

use super::api::{AttachmentResponse, GmailLabel, GmailMessage, ListMessagesResponse};
use crate::models::MessageId;

/// Authenticated access to one mailbox
///
/// Fallible methods return [`crate::SourceError`] inside `anyhow::Error`
/// so callers can tell configuration problems from system failures.
pub trait MailGateway {
    /// List one page of message references matching `query`
    ///
    /// Implementations add their own spam/trash and start-date terms to
    /// the query.
    fn list_message_refs(
        &self,
        query: &str,
        label_ids: &[String],
        page_token: Option<&str>,
    ) -> Result<ListMessagesResponse>;

    /// Fetch a full-format message
    fn get_message(&self, id: &MessageId) -> Result<GmailMessage>;

    /// List all labels in the mailbox
    fn list_labels(&self) -> Result<Vec<GmailLabel>>;

    /// Fetch an attachment body by its reference ID
    fn get_attachment(&self, message_id: &MessageId, attachment_id: &str)
    -> Result<AttachmentResponse>;

    /// Whether the mailbox is reachable with the configured credentials
    fn check_connection(&self) -> bool;

    /// Email address of the authenticated account, or `"unknown"`
    fn account_email(&self) -> String;
}
