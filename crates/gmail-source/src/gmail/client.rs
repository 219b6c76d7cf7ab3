//! Gmail API HTTP client
//!
//! Provides the HTTP implementation of [`MailGateway`].
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use anyhow::Result;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;

use super::api::{
    AttachmentResponse, GmailLabel, GmailMessage, ListLabelsResponse, ListMessagesResponse,
    ProfileResponse,
};
use super::query::{ListFilter, compose_list_query};
use super::{GmailAuth, MESSAGE_PAGE_SIZE, MailGateway, http_agent};
use crate::config::SourceConfig;
use crate::error::SourceError;
use crate::models::MessageId;

/// Gmail API client for one mailbox
pub struct GmailClient {
    auth: GmailAuth,
    filter: ListFilter,
    agent: OnceLock<ureq::Agent>,
}

impl GmailClient {
    /// Gmail API base URL
    const BASE_URL: &'static str = "https://gmail.googleapis.com/gmail/v1";

    /// Create a new Gmail client
    pub fn new(auth: GmailAuth, filter: ListFilter) -> Self {
        Self {
            auth,
            filter,
            agent: OnceLock::new(),
        }
    }

    /// Create a client from connector configuration
    pub fn from_config(config: &SourceConfig) -> Self {
        let auth = GmailAuth::new(
            &config.client_id,
            &config.client_secret,
            &config.refresh_token,
        );
        let filter = ListFilter {
            include_spam_trash: config.include_spam_trash,
            start_date: config.start_date.clone(),
        };
        Self::new(auth, filter)
    }

    /// Filters added to every list call
    pub fn filter(&self) -> &ListFilter {
        &self.filter
    }

    /// HTTP agent, built on first use
    fn agent(&self) -> &ureq::Agent {
        self.agent.get_or_init(http_agent)
    }

    /// GET a JSON resource under `users/me`
    ///
    /// Authentication failures come back as `SourceError`; HTTP failures as
    /// `ureq::Error`, for the caller to classify.
    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let access_token = self.auth.get_access_token()?;
        let url = format!("{}/users/me/{}", Self::BASE_URL, path);

        let response = self
            .agent()
            .get(&url)
            .header("Authorization", &format!("Bearer {}", access_token))
            .query_pairs(query.iter().map(|(k, v)| (*k, v.as_str())))
            .call();

        let mut response = match response {
            Ok(response) => response,
            Err(e) => {
                if matches!(e, ureq::Error::StatusCode(401)) {
                    self.auth.invalidate();
                }
                return Err(e.into());
            }
        };

        Ok(response.body_mut().read_json::<T>()?)
    }

    /// Profile of the authenticated account
    pub fn get_profile(&self) -> Result<ProfileResponse> {
        self.get_json("profile", &[])
    }
}

/// Wrap a transport failure in the given taxonomy, keeping errors that are
/// already classified (token refresh) as they are
fn classify(err: anyhow::Error, wrap: impl FnOnce(String) -> SourceError) -> anyhow::Error {
    if err.downcast_ref::<SourceError>().is_some() {
        return err;
    }
    wrap(format!("{:#}", err)).into()
}

/// Query parameters of one `messages.list` call
///
/// `q` is omitted when empty; each label becomes its own `labelIds` pair.
pub(crate) fn list_message_params(
    q: &str,
    label_ids: &[String],
    page_token: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut params = vec![("maxResults", MESSAGE_PAGE_SIZE.to_string())];
    if !q.is_empty() {
        params.push(("q", q.to_string()));
    }
    for label_id in label_ids {
        params.push(("labelIds", label_id.clone()));
    }
    if let Some(token) = page_token {
        params.push(("pageToken", token.to_string()));
    }
    params
}

impl MailGateway for GmailClient {
    fn list_message_refs(
        &self,
        query: &str,
        label_ids: &[String],
        page_token: Option<&str>,
    ) -> Result<ListMessagesResponse> {
        let q = compose_list_query(query, &self.filter);
        let params = list_message_params(&q, label_ids, page_token);

        log::debug!("Listing messages with query {:?}", q);
        self.get_json("messages", &params).map_err(|e| {
            classify(e, |internal| {
                SourceError::system(
                    "Failed to list Gmail messages. Please check your query and permissions.",
                    format!("Failed to list messages: {}", internal),
                )
            })
        })
    }

    fn get_message(&self, id: &MessageId) -> Result<GmailMessage> {
        let path = format!("messages/{}", urlencoding::encode(id.as_str()));
        self.get_json(&path, &[("format", "full".to_string())])
            .map_err(|e| {
                classify(e, |internal| {
                    SourceError::system(
                        "Failed to retrieve message. It may have been deleted.",
                        format!("Failed to get message {}: {}", id.as_str(), internal),
                    )
                })
            })
    }

    fn list_labels(&self) -> Result<Vec<GmailLabel>> {
        let response: ListLabelsResponse = self.get_json("labels", &[]).map_err(|e| {
            classify(e, |internal| {
                SourceError::config(
                    "Failed to retrieve Gmail labels. Please check your permissions.",
                    format!("Failed to get labels: {}", internal),
                )
            })
        })?;
        Ok(response.labels.unwrap_or_default())
    }

    fn get_attachment(
        &self,
        message_id: &MessageId,
        attachment_id: &str,
    ) -> Result<AttachmentResponse> {
        let path = format!(
            "messages/{}/attachments/{}",
            urlencoding::encode(message_id.as_str()),
            urlencoding::encode(attachment_id)
        );
        self.get_json(&path, &[]).map_err(|e| {
            classify(e, |internal| {
                SourceError::system(
                    "Failed to retrieve attachment.",
                    format!("Failed to get attachment {}: {}", attachment_id, internal),
                )
            })
        })
    }

    fn check_connection(&self) -> bool {
        match self.get_profile() {
            Ok(_) => true,
            Err(e) => {
                log::warn!("Gmail connection check failed: {:#}", e);
                false
            }
        }
    }

    fn account_email(&self) -> String {
        self.get_profile()
            .ok()
            .and_then(|profile| profile.email_address)
            .unwrap_or_else(|| "unknown".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_carries_filter() {
        let config = SourceConfig::from_json(
            r#"{
                "client_id": "id",
                "client_secret": "secret",
                "refresh_token": "token",
                "start_date": "2024-02-01T00:00:00.000000Z"
            }"#,
        )
        .unwrap();

        let client = GmailClient::from_config(&config);
        assert!(!client.filter().include_spam_trash);
        assert_eq!(
            client.filter().start_date.as_deref(),
            Some("2024-02-01T00:00:00.000000Z")
        );
    }

    #[test]
    fn test_list_params_first_page() {
        let params = list_message_params("-in:spam -in:trash", &[], None);
        assert_eq!(
            params,
            vec![
                ("maxResults", "100".to_string()),
                ("q", "-in:spam -in:trash".to_string()),
            ]
        );
    }

    #[test]
    fn test_list_params_omit_empty_query() {
        let params = list_message_params("", &[], None);
        assert_eq!(params, vec![("maxResults", "100".to_string())]);
    }

    #[test]
    fn test_list_params_labels_and_page_token() {
        let labels = vec!["INBOX".to_string(), "Label_7".to_string()];
        let params = list_message_params("from:boss", &labels, Some("page-2"));
        assert_eq!(
            params,
            vec![
                ("maxResults", "100".to_string()),
                ("q", "from:boss".to_string()),
                ("labelIds", "INBOX".to_string()),
                ("labelIds", "Label_7".to_string()),
                ("pageToken", "page-2".to_string()),
            ]
        );
    }

    #[test]
    fn test_resumed_list_query_keeps_spam_trash_exclusion() {
        use crate::models::SyncCursorState;
        use crate::sync::compute_filter_for_state;

        // 2024-03-05T12:00:00Z
        let prior = SyncCursorState::at(1_709_640_000_000);
        let resumed = compute_filter_for_state(&prior, "from:boss");
        let q = compose_list_query(&resumed, &ListFilter::default());
        assert_eq!(q, "from:boss after:2024/3/5 -in:spam -in:trash");

        let params = list_message_params(&q, &[], Some("next"));
        assert!(params.contains(&("q", "from:boss after:2024/3/5 -in:spam -in:trash".to_string())));
        assert!(params.contains(&("pageToken", "next".to_string())));
    }

    #[test]
    fn test_classify_wraps_transport_errors() {
        let err = classify(anyhow::anyhow!("HTTP 500"), |internal| {
            SourceError::system("Failed to list", internal)
        });
        let source = err.downcast_ref::<SourceError>().unwrap();
        assert_eq!(source.failure_type(), crate::FailureType::SystemError);
        assert!(source.internal_message().contains("HTTP 500"));
    }

    #[test]
    fn test_classify_keeps_existing_taxonomy() {
        let original: anyhow::Error = SourceError::config("bad credentials", "400").into();
        let err = classify(original, |internal| SourceError::system("wrapped", internal));
        let source = err.downcast_ref::<SourceError>().unwrap();
        assert_eq!(source.failure_type(), crate::FailureType::ConfigError);
        assert_eq!(source.message(), "bad credentials");
    }
}
