//! Gmail API response normalization
//!
//! Converts full-format Gmail API messages and labels into stream records.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::prelude::*;
use chrono::{TimeZone, Utc};
use std::collections::BTreeMap;

use super::api::{GmailLabel, GmailMessage, Header, MessagePart};
use crate::models::{AttachmentMeta, LabelColor, MailMessage, MailboxLabel, MessageId};
use crate::sanitize::sanitize_text;

/// Headers copied onto records
const HEADER_ALLOW_LIST: &[&str] = &[
    "from",
    "to",
    "cc",
    "bcc",
    "subject",
    "date",
    "message-id",
    "reply-to",
];

/// Allow-listed headers keyed by normalized name (`message-id` -> `message_id`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFields(BTreeMap<String, String>);

impl HeaderFields {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn owned(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}

/// Extract allow-listed headers; a later duplicate overwrites an earlier one
pub fn extract_headers(headers: &[Header]) -> HeaderFields {
    let mut fields = BTreeMap::new();
    for header in headers {
        let name = header.name.to_ascii_lowercase();
        if HEADER_ALLOW_LIST.contains(&name.as_str()) {
            fields.insert(name.replace('-', "_"), header.value.clone());
        }
    }
    HeaderFields(fields)
}

/// Bodies and attachments found in a part tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedParts {
    pub plain_text: Option<String>,
    pub html_text: Option<String>,
    pub attachments: Vec<AttachmentMeta>,
}

impl DecodedParts {
    /// Classify one node, then descend into its children in order
    fn visit(&mut self, part: &MessagePart) {
        let mime_type = part.mime_type.as_deref().unwrap_or_default();
        let body = part.body.as_ref();

        if let Some(filename) = part.filename.as_deref().filter(|f| !f.is_empty()) {
            self.attachments.push(AttachmentMeta {
                filename: filename.to_string(),
                mime_type: mime_type.to_string(),
                size: body.and_then(|b| b.size).unwrap_or(0),
                attachment_id: body.and_then(|b| b.attachment_id.clone()),
            });
        } else if mime_type == "text/plain" && self.plain_text.is_none() {
            self.plain_text = body_text(part);
        } else if mime_type == "text/html" && self.html_text.is_none() {
            self.html_text = body_text(part);
        }

        for child in part.parts.iter().flatten() {
            self.visit(child);
        }
    }
}

/// Walk the part tree depth-first in document order
///
/// The first `text/plain` and first `text/html` leaf win. A part with a
/// filename is always an attachment, whatever its MIME type.
pub fn decode_parts(payload: &MessagePart) -> DecodedParts {
    let mut decoded = DecodedParts::default();
    decoded.visit(payload);
    decoded
}

/// Decoded inline data of a part, if any
///
/// Any part with non-empty data yields text, even when the data was
/// damaged and only partly decodable.
fn body_text(part: &MessagePart) -> Option<String> {
    let data = part.body.as_ref()?.data.as_deref()?;
    if data.is_empty() {
        return None;
    }
    Some(decode_base64_body(data))
}

/// URL-safe alphabet, padding optional, non-zero trailing bits accepted
const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode base64-encoded body data; never fails
///
/// Accepts both the URL-safe and standard alphabets. Characters outside
/// the alphabet, padding included, are dropped, and a
/// dangling final character that cannot form a byte is ignored. Invalid
/// UTF-8 is replaced rather than rejected.
pub fn decode_base64_body(data: &str) -> String {
    let mut cleaned: String = data
        .chars()
        .filter_map(|c| match c {
            '+' => Some('-'),
            '/' => Some('_'),
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' => Some(c),
            _ => None,
        })
        .collect();

    if cleaned.len() % 4 == 1 {
        cleaned.pop();
    }

    match LENIENT_URL_SAFE.decode(&cleaned) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            log::warn!("Undecodable body data ({} chars): {}", data.len(), e);
            String::new()
        }
    }
}

/// Normalize a full-format Gmail message into a `messages` record
pub fn normalize_message(gmail_msg: GmailMessage, include_raw: bool) -> MailMessage {
    let (headers, decoded) = match &gmail_msg.payload {
        Some(payload) => (
            extract_headers(payload.headers.as_deref().unwrap_or_default()),
            decode_parts(payload),
        ),
        None => (HeaderFields::default(), DecodedParts::default()),
    };

    // internalDate is milliseconds since epoch as a string
    let internal_date = gmail_msg
        .internal_date
        .as_deref()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single());

    MailMessage::builder(MessageId::new(gmail_msg.id))
        .thread_id(gmail_msg.thread_id)
        .label_ids(gmail_msg.label_ids.unwrap_or_default())
        .from(headers.owned("from"))
        .to(headers.owned("to"))
        .cc(headers.owned("cc"))
        .bcc(headers.owned("bcc"))
        .subject(headers.owned("subject"))
        .date(headers.owned("date"))
        .internal_date(internal_date)
        .snippet(gmail_msg.snippet)
        .body_plain(decoded.plain_text.map(|text| sanitize_text(&text)))
        .attachments(decoded.attachments)
        .size_estimate(gmail_msg.size_estimate)
        .history_id(gmail_msg.history_id)
        .raw(if include_raw { gmail_msg.raw } else { None })
        .build()
}

/// Normalize an API label into a `labels` record
pub fn normalize_label(label: GmailLabel) -> MailboxLabel {
    MailboxLabel {
        id: label.id.into(),
        name: label.name,
        kind: label.label_type,
        messages_total: label.messages_total,
        messages_unread: label.messages_unread,
        threads_total: label.threads_total,
        threads_unread: label.threads_unread,
        color: label.color.map(|c| LabelColor {
            text_color: c.text_color,
            background_color: c.background_color,
        }),
    }
}
