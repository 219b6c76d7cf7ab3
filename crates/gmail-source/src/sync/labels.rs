//! `labels` stream reader

use anyhow::Result;

use crate::gmail::{MailGateway, normalize_label};

use super::messages::{StreamEvent, SyncStats};

/// Emit a full snapshot of the mailbox labels
///
/// Labels have no cursor. Failing to list them is fatal.
pub fn read_labels<G, F>(gateway: &G, mut emit: F) -> Result<SyncStats>
where
    G: MailGateway + ?Sized,
    F: FnMut(StreamEvent) -> Result<()>,
{
    let start = std::time::Instant::now();
    let mut stats = SyncStats::default();

    let labels = gateway.list_labels()?;
    stats.pages = 1;

    for label in labels {
        let record = serde_json::to_value(normalize_label(label))?;
        emit(StreamEvent::Record(record))?;
        stats.records_emitted += 1;
    }

    stats.duration_ms = start.elapsed().as_millis() as u64;
    Ok(stats)
}
