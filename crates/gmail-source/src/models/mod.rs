//! Record and state models

mod label;
mod message;
mod sync_state;

pub use label::{LabelColor, LabelId, MailboxLabel};
pub use message::{AttachmentMeta, MailMessage, MailMessageBuilder, MessageId};
pub use sync_state::{CURSOR_FIELD, SyncCursorState};
