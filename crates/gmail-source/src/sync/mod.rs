//! Stream readers and incremental cursor tracking

mod cursor;
mod labels;
mod messages;

pub use cursor::{advance, compute_filter_for_state, parse_cursor_value};
pub use labels::read_labels;
pub use messages::{MessageReadOptions, StreamEvent, SyncStats, read_messages};
