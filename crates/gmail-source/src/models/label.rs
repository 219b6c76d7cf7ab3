//! Label record emitted on the `labels` stream

use serde::{Deserialize, Serialize};

/// Unique identifier for a label (Gmail label ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelId(pub String);

impl LabelId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for LabelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Text/background color pair of a user label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelColor {
    pub text_color: Option<String>,
    pub background_color: Option<String>,
}

/// A mailbox label snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailboxLabel {
    pub id: LabelId,
    pub name: String,
    /// `system` or `user`
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub messages_total: Option<u64>,
    pub messages_unread: Option<u64>,
    pub threads_total: Option<u64>,
    pub threads_unread: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<LabelColor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_label(id: &str, name: &str) -> MailboxLabel {
        MailboxLabel {
            id: LabelId(id.to_string()),
            name: name.to_string(),
            kind: None,
            messages_total: None,
            messages_unread: None,
            threads_total: None,
            threads_unread: None,
            color: None,
        }
    }

    #[test]
    fn test_label_serialization_renames_kind() {
        let mut label = sample_label("INBOX", "INBOX");
        label.kind = Some("system".to_string());
        label.messages_total = Some(42);

        let value = serde_json::to_value(&label).unwrap();
        assert_eq!(value["id"], "INBOX");
        assert_eq!(value["type"], "system");
        assert_eq!(value["messages_total"], 42);
        assert!(value.get("kind").is_none());
        assert!(value.get("color").is_none());
    }

    #[test]
    fn test_label_color_serialization() {
        let mut label = sample_label("Label_1", "Receipts");
        label.color = Some(LabelColor {
            text_color: Some("#000000".to_string()),
            background_color: Some("#16a765".to_string()),
        });

        let value = serde_json::to_value(&label).unwrap();
        assert_eq!(value["color"]["background_color"], "#16a765");
        assert_eq!(value["messages_unread"], serde_json::Value::Null);
    }
}
