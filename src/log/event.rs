use super::id::IdChain;
use super::message::{Message, StepResult};
use super::step::{Entry, Step};
use std::fmt;

/// Whether an entry is a plain message or a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Message,
    Step,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Message => write!(f, "Message"),
            EntryKind::Step => write!(f, "Step"),
        }
    }
}

/// Notifications delivered to observers of a single message or step.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryEvent {
    /// A property was set on the entry.
    Modified { property: String },
    /// The entry was finalized.
    Hidden { result: StepResult },
    ChildAdded { id: IdChain },
    ChildModified { id: IdChain, property: String },
    ChildHidden { id: IdChain, result: StepResult },
    ChildDetached { id: IdChain },
    ChildDeleted { id: IdChain },
    /// The entry is being torn down with its log.
    Deleted,
}

/// Notifications delivered on the log's aggregate channel.
#[derive(Debug, Clone, PartialEq)]
pub enum LogEvent {
    Added { id: IdChain, kind: EntryKind },
    Modified { id: IdChain, property: String },
    Hidden { id: IdChain, result: StepResult },
    Detached { id: IdChain },
    Deleted { id: IdChain },
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NoticeKind {
    Added,
    Modified { property: String, count: usize },
    Hidden { result: StepResult, failure: String },
    Detached,
    Deleted,
}

/// A change to some entry, carried from the entry up through its ancestor steps
/// to the log.
#[derive(Debug, Clone)]
pub(crate) struct Notice {
    kind: NoticeKind,
    id: IdChain,
    entry: EntryKind,
    action: String,
}

impl Notice {
    fn of(kind: NoticeKind, entry: &Entry) -> Self {
        Self::from_message(kind, entry.message(), entry.kind())
    }

    fn from_message(kind: NoticeKind, message: &Message, entry: EntryKind) -> Self {
        Self {
            kind,
            id: message.id().clone(),
            entry,
            action: message.action().to_string(),
        }
    }

    pub(crate) fn added(entry: &Entry) -> Self {
        Self::of(NoticeKind::Added, entry)
    }

    pub(crate) fn modified(entry: &Entry, property: &str) -> Self {
        let count = entry.message().properties().len();
        Self::of(
            NoticeKind::Modified {
                property: property.to_string(),
                count,
            },
            entry,
        )
    }

    pub(crate) fn hidden(entry: &Entry) -> Self {
        let kind = NoticeKind::Hidden {
            result: entry.result(),
            failure: entry.failure_message().to_string(),
        };
        Self::of(kind, entry)
    }

    pub(crate) fn step_hidden(step: &Step) -> Self {
        let kind = NoticeKind::Hidden {
            result: step.result(),
            failure: step.failure_message().to_string(),
        };
        Self::from_message(kind, step.message(), EntryKind::Step)
    }

    pub(crate) fn detached(entry: &Entry) -> Self {
        Self::of(NoticeKind::Detached, entry)
    }

    pub(crate) fn deleted(entry: &Entry) -> Self {
        Self::of(NoticeKind::Deleted, entry)
    }

    /// How an ancestor step reports this change to its own observers.
    pub(crate) fn child_event(&self) -> EntryEvent {
        let id = self.id.clone();
        match &self.kind {
            NoticeKind::Added => EntryEvent::ChildAdded { id },
            NoticeKind::Modified { property, .. } => EntryEvent::ChildModified {
                id,
                property: property.clone(),
            },
            NoticeKind::Hidden { result, .. } => EntryEvent::ChildHidden {
                id,
                result: *result,
            },
            NoticeKind::Detached => EntryEvent::ChildDetached { id },
            NoticeKind::Deleted => EntryEvent::ChildDeleted { id },
        }
    }

    pub(crate) fn log_event(&self) -> LogEvent {
        let id = self.id.clone();
        match &self.kind {
            NoticeKind::Added => LogEvent::Added {
                id,
                kind: self.entry,
            },
            NoticeKind::Modified { property, .. } => LogEvent::Modified {
                id,
                property: property.clone(),
            },
            NoticeKind::Hidden { result, .. } => LogEvent::Hidden {
                id,
                result: *result,
            },
            NoticeKind::Detached => LogEvent::Detached { id },
            NoticeKind::Deleted => LogEvent::Deleted { id },
        }
    }

    /// The line mirrored to the text journal, if this change is journaled.
    pub(crate) fn journal_line(&self, log_name: &str) -> Option<String> {
        let line = match &self.kind {
            NoticeKind::Added => format!(
                "{log_name} - ADDED {}[{}] {}",
                self.entry, self.id, self.action
            ),
            NoticeKind::Modified { property, count } => format!(
                "{log_name} - PROPERTY ADDED {}[{}.{count}] {property}",
                self.entry, self.id
            ),
            NoticeKind::Hidden { result, failure } => {
                let mut line = format!("{log_name} - FINALIZED {}[{}]", self.entry, self.id);
                if self.entry == EntryKind::Step {
                    match result {
                        StepResult::Failure => line.push_str(&format!(" Failure[{failure}]")),
                        StepResult::Unresolved => {}
                        other => line.push_str(&format!(" {other}")),
                    }
                }
                line
            }
            NoticeKind::Detached | NoticeKind::Deleted => return None,
        };
        Some(line)
    }
}
