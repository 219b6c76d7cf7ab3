//! `messages` stream reader

use anyhow::Result;
use serde_json::Value;

use crate::gmail::{MailGateway, normalize_message};
use crate::models::{MessageId, SyncCursorState};

use super::cursor::{advance, compute_filter_for_state};

/// Statistics from reading one stream
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncStats {
    /// Number of list pages requested
    pub pages: usize,
    /// Number of message references listed
    pub messages_listed: usize,
    /// Number of records emitted
    pub records_emitted: usize,
    /// Number of messages skipped after a fetch or decode failure
    pub errors: usize,
    /// Duration of the read
    pub duration_ms: u64,
}

/// Output of a stream reader, in emission order
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Record(Value),
    /// Checkpoint; safe to persist once every earlier record is consumed
    State(SyncCursorState),
}

/// Options for reading the `messages` stream
#[derive(Debug, Clone, Default)]
pub struct MessageReadOptions {
    /// Base Gmail search expression
    pub base_query: String,
    /// Restrict listing to these label IDs
    pub label_ids: Vec<String>,
    /// Attach the raw encoded message to records
    pub include_raw: bool,
    /// Resume from the prior cursor and emit checkpoints
    pub incremental: bool,
}

/// Read every message matching the options, page by page
///
/// Messages are fetched one at a time. A message that cannot be fetched is
/// logged and skipped; a failed list call ends the read with an error.
/// Returns the final cursor state.
pub fn read_messages<G, F>(
    gateway: &G,
    options: &MessageReadOptions,
    prior_state: SyncCursorState,
    mut emit: F,
) -> Result<(SyncCursorState, SyncStats)>
where
    G: MailGateway + ?Sized,
    F: FnMut(StreamEvent) -> Result<()>,
{
    let start = std::time::Instant::now();
    let mut stats = SyncStats::default();
    let mut state = prior_state;

    let query = if options.incremental {
        compute_filter_for_state(&prior_state, &options.base_query)
    } else {
        options.base_query.clone()
    };
    log::info!("Reading messages with base filter {:?}", query);

    let mut page_token: Option<String> = None;
    loop {
        let response =
            gateway.list_message_refs(&query, &options.label_ids, page_token.as_deref())?;
        stats.pages += 1;

        let refs = response.messages.unwrap_or_default();
        stats.messages_listed += refs.len();
        log::debug!("Page {}: {} message references", stats.pages, refs.len());

        for msg_ref in refs {
            let id = MessageId::new(msg_ref.id);
            let record = match fetch_record(gateway, &id, options.include_raw) {
                Ok(record) => record,
                Err(e) => {
                    log::error!("Error processing message {}: {:#}", id.as_str(), e);
                    stats.errors += 1;
                    continue;
                }
            };

            let next_state = advance(state, &record);
            emit(StreamEvent::Record(record))?;
            stats.records_emitted += 1;
            state = next_state;
        }

        if options.incremental {
            emit(StreamEvent::State(state))?;
        }

        match response.next_page_token.filter(|t| !t.is_empty()) {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    stats.duration_ms = start.elapsed().as_millis() as u64;
    Ok((state, stats))
}

/// Fetch and normalize one message into a JSON record
fn fetch_record<G>(gateway: &G, id: &MessageId, include_raw: bool) -> Result<Value>
where
    G: MailGateway + ?Sized,
{
    let gmail_msg = gateway.get_message(id)?;
    let message = normalize_message(gmail_msg, include_raw);
    Ok(serde_json::to_value(message)?)
}
