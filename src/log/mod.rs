//! The hierarchical message/step log and its text journal.

pub mod event;
pub mod id;
pub mod journal;
pub mod message;
pub mod message_log;
pub mod property;
pub mod step;

pub use event::{EntryEvent, EntryKind, LogEvent};
pub use id::IdChain;
pub use journal::Journal;
pub use message::{Message, StepResult};
pub use message_log::*;
pub use property::PropertyBag;
pub use step::{Entry, Step};
