//! Message record emitted on the `messages` stream

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a message (Gmail message ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Metadata for a part carrying a filename
///
/// Attachment bytes are never inlined; use `attachment_id` with
/// `MailGateway::get_attachment` to fetch them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentMeta {
    pub filename: String,
    pub mime_type: String,
    pub size: u64,
    pub attachment_id: Option<String>,
}

/// A normalized Gmail message
///
/// Header-derived fields keep the raw header text; nothing is parsed
/// into addresses because downstream consumers own that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailMessage {
    pub id: MessageId,
    pub thread_id: Option<String>,
    pub label_ids: Vec<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub subject: Option<String>,
    /// `Date` header as sent
    pub date: Option<String>,
    /// Gmail's `internalDate`; this is the sync cursor
    pub internal_date: Option<DateTime<Utc>>,
    pub snippet: Option<String>,
    /// Sanitized plain-text body
    pub body_plain: Option<String>,
    pub attachments: Vec<AttachmentMeta>,
    pub size_estimate: Option<u64>,
    pub history_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl MailMessage {
    /// Create a new message builder
    pub fn builder(id: MessageId) -> MailMessageBuilder {
        MailMessageBuilder::new(id)
    }

    /// Cursor value in milliseconds since epoch
    pub fn internal_date_millis(&self) -> Option<i64> {
        self.internal_date.map(|d| d.timestamp_millis())
    }
}

/// Builder for creating MailMessage instances
pub struct MailMessageBuilder {
    message: MailMessage,
}

impl MailMessageBuilder {
    fn new(id: MessageId) -> Self {
        Self {
            message: MailMessage {
                id,
                thread_id: None,
                label_ids: Vec::new(),
                from: None,
                to: None,
                cc: None,
                bcc: None,
                subject: None,
                date: None,
                internal_date: None,
                snippet: None,
                body_plain: None,
                attachments: Vec::new(),
                size_estimate: None,
                history_id: None,
                raw: None,
            },
        }
    }

    pub fn thread_id(mut self, thread_id: Option<String>) -> Self {
        self.message.thread_id = thread_id;
        self
    }

    pub fn label_ids(mut self, label_ids: Vec<String>) -> Self {
        self.message.label_ids = label_ids;
        self
    }

    pub fn from(mut self, from: Option<String>) -> Self {
        self.message.from = from;
        self
    }

    pub fn to(mut self, to: Option<String>) -> Self {
        self.message.to = to;
        self
    }

    pub fn cc(mut self, cc: Option<String>) -> Self {
        self.message.cc = cc;
        self
    }

    pub fn bcc(mut self, bcc: Option<String>) -> Self {
        self.message.bcc = bcc;
        self
    }

    pub fn subject(mut self, subject: Option<String>) -> Self {
        self.message.subject = subject;
        self
    }

    pub fn date(mut self, date: Option<String>) -> Self {
        self.message.date = date;
        self
    }

    pub fn internal_date(mut self, internal_date: Option<DateTime<Utc>>) -> Self {
        self.message.internal_date = internal_date;
        self
    }

    pub fn snippet(mut self, snippet: Option<String>) -> Self {
        self.message.snippet = snippet;
        self
    }

    pub fn body_plain(mut self, body_plain: Option<String>) -> Self {
        self.message.body_plain = body_plain;
        self
    }

    pub fn attachments(mut self, attachments: Vec<AttachmentMeta>) -> Self {
        self.message.attachments = attachments;
        self
    }

    pub fn size_estimate(mut self, size_estimate: Option<u64>) -> Self {
        self.message.size_estimate = size_estimate;
        self
    }

    pub fn history_id(mut self, history_id: Option<String>) -> Self {
        self.message.history_id = history_id;
        self
    }

    pub fn raw(mut self, raw: Option<String>) -> Self {
        self.message.raw = raw;
        self
    }

    pub fn build(self) -> MailMessage {
        self.message
    }
}
