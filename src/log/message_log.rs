use super::event::{EntryEvent, LogEvent, Notice};
use super::id::IdChain;
use super::journal::Journal;
use super::message::{EntrySpec, Message, StepResult};
use super::step::{Entry, Spawn, ordinal_after, spawn_entry};
use crate::config::LogConfig;
use crate::error::LogError;
use crate::observer::{Subject, SubscriptionId};
use crate::value::{DataValue, DateTime};
use crate::xml::XmlTree;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

pub const LOG_OPENED_ACTION: &str = "Log Opened";
pub const LOG_OPENED_KEY: &str = "EC355E3E-03CA-4081-9006-5F45D6A488B3";
pub const LOG_CLOSED_ACTION: &str = "Log Closed";
pub const LOG_CLOSED_KEY: &str = "3620CAD7-3535-4716-9686-E024E201481F";

/// Component recorded on the log's own audit messages.
const LOG_COMPONENT: &str = "app";

/// Stem of a log's backing file names: separators in the name become `_`.
pub fn log_file_stem(log_name: &str) -> String {
    log_name
        .chars()
        .map(|c| if matches!(c, ':' | '\\' | '/') { '_' } else { c })
        .collect()
}

/// Creates a new `{stem}-XXXXXX.log` file in `directory` that outlives the log,
/// so every session writes its own document.
fn create_backing_file(directory: &Path, log_name: &str) -> io::Result<(File, PathBuf)> {
    let file = tempfile::Builder::new()
        .prefix(&format!("{}-", log_file_stem(log_name)))
        .suffix(".log")
        .tempfile_in(directory)?;
    file.keep().map_err(|e| e.error)
}

pub struct MessageLogBuilder {
    name: String,
    directory: Option<PathBuf>,
    journal: Journal,
    batch: bool,
}

impl MessageLogBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            directory: None,
            journal: Journal::disabled(),
            batch: false,
        }
    }

    /// Applies a `[log]` configuration table. A journal file that cannot be opened
    /// is reported and left out.
    pub fn from_config(config: &LogConfig) -> Self {
        let mut builder = Self::new(&config.name).with_batch(config.batch);
        if let Some(directory) = &config.directory {
            builder = builder.with_directory(directory);
        }
        if let Some(path) = &config.journal {
            match Journal::open(path) {
                Ok(journal) => builder = builder.with_journal(journal),
                Err(e) => warn!(path = %path.display(), error = %e, "cannot open journal file"),
            }
        }
        builder
    }

    /// Directory the backing `.log` file is created in. Each log gets a new
    /// file named after the log.
    pub fn with_directory(mut self, directory: impl AsRef<Path>) -> Self {
        self.directory = Some(directory.as_ref().to_path_buf());
        self
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    pub fn with_journal_writer(self, writer: impl Write + 'static) -> Self {
        self.with_journal(Journal::new(writer))
    }

    pub fn with_batch(mut self, batch: bool) -> Self {
        self.batch = batch;
        self
    }

    pub fn build(self) -> MessageLog {
        let backing = self.directory.as_ref().and_then(|directory| {
            match create_backing_file(directory, &self.name) {
                Ok(backing) => Some(backing),
                Err(e) => {
                    if self.batch {
                        eprintln!("Unable to open log file in {}: {e}", directory.display());
                    }
                    warn!(directory = %directory.display(), error = %e, "log continues in memory only");
                    None
                }
            }
        });
        let (file, path) = backing.unzip();

        let mut log = MessageLog {
            name: self.name,
            path,
            file,
            batch: self.batch,
            journal: self.journal,
            entries: Vec::new(),
            current: None,
            tree: XmlTree::new("messagelog"),
            subject: Subject::new(),
            closed: false,
        };

        let opened = DateTime::now();
        let line = format!(
            "{} - {} [{LOG_OPENED_KEY}] {} {}",
            log.name,
            LOG_OPENED_ACTION,
            opened.log_date(),
            opened.log_time()
        );
        log.journal.write_line(&line);
        debug!(log = %log.name, backing_file = log.path.is_some(), "message log opened");
        log
    }
}

/// The top-level execution journal of a session.
///
/// The log owns a flat list of top-level messages and steps (steps own their
/// children) and tracks a current step so that new entries nest implicitly. Every
/// change to any entry is mirrored as a line in the text [`Journal`] and re-emitted
/// as a [`LogEvent`].
///
/// Dropping the log performs the same teardown as [`MessageLog::close`].
pub struct MessageLog {
    name: String,
    path: Option<PathBuf>,
    file: Option<File>,
    batch: bool,
    journal: Journal,
    entries: Vec<Entry>,
    current: Option<usize>,
    tree: XmlTree,
    subject: Subject<LogEvent>,
    closed: bool,
}

impl MessageLog {
    /// A memory-only log without a journal.
    pub fn new(name: &str) -> Self {
        MessageLogBuilder::new(name).build()
    }

    pub fn builder(name: &str) -> MessageLogBuilder {
        MessageLogBuilder::new(name)
    }

    /// A fresh upper-case UUID for use as an entry key.
    pub fn new_key() -> String {
        Uuid::new_v4().to_string().to_uppercase()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The backing file, if it was opened successfully.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_batch(&self) -> bool {
        self.batch
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, id: &IdChain) -> Option<&Entry> {
        let (&first, rest) = id.segments().split_first()?;
        let entry = self.entries.get((first as usize).checked_sub(1)?)?;
        if rest.is_empty() {
            return Some(entry);
        }
        entry.as_step()?.entry_at(rest)
    }

    /// The deepest open step that new entries would currently nest under.
    pub fn current_step(&self) -> Option<IdChain> {
        match self.current.and_then(|index| self.entries.get(index)) {
            Some(Entry::Step(step)) => step.current_step(),
            _ => None,
        }
    }

    pub fn attach(&mut self, callback: impl FnMut(&LogEvent) + 'static) -> SubscriptionId {
        self.subject.attach(callback)
    }

    pub fn detach(&mut self, id: SubscriptionId) -> bool {
        self.subject.detach(id)
    }

    /// Creates a message, nested under the current step when `recurse` is set.
    ///
    /// If the current step no longer accepts entries the message is added at the
    /// top level instead.
    pub fn create_message(
        &mut self,
        action: &str,
        component: &str,
        key: &str,
        finalize_on_create: bool,
        recurse: bool,
    ) -> IdChain {
        let spec = EntrySpec {
            action,
            component,
            key,
        };
        self.create_entry(&spec, Spawn::Message { finalize_on_create }, recurse)
    }

    /// Creates a step, nested under the current step when `recurse` is set. The new
    /// step becomes current for its parent.
    pub fn create_step(&mut self, action: &str, component: &str, key: &str, recurse: bool) -> IdChain {
        let spec = EntrySpec {
            action,
            component,
            key,
        };
        self.create_entry(&spec, Spawn::Step, recurse)
    }

    /// Adds a message under an explicit step, e.g. one returned by
    /// [`current_step`](Self::current_step). `None` if `step` is not an open step.
    pub fn add_message_to(
        &mut self,
        step: &IdChain,
        action: &str,
        component: &str,
        key: &str,
        finalize_on_create: bool,
        recurse: bool,
    ) -> Option<IdChain> {
        let spec = EntrySpec {
            action,
            component,
            key,
        };
        let spawn = Spawn::Message { finalize_on_create };
        self.route(step, |entry, out| match entry {
            Entry::Step(step) => step.add_entry_here(&spec, spawn, recurse, out),
            Entry::Message(_) => None,
        })
    }

    pub fn add_step_to(
        &mut self,
        step: &IdChain,
        action: &str,
        component: &str,
        key: &str,
        recurse: bool,
    ) -> Option<IdChain> {
        let spec = EntrySpec {
            action,
            component,
            key,
        };
        self.route(step, |entry, out| match entry {
            Entry::Step(step) => step.add_entry_here(&spec, Spawn::Step, recurse, out),
            Entry::Message(_) => None,
        })
    }

    /// Sets a property on the entry at `id`. Fails for unknown or finalized entries.
    pub fn add_property(&mut self, id: &IdChain, name: &str, value: impl Into<DataValue>) -> bool {
        let value = value.into();
        self.route(id, |entry, out| entry.add_property(name, value, out).then_some(()))
            .is_some()
    }

    /// Finalizes the entry at `id`. Steps cascade `result` and `failure_reason` to
    /// their open descendants; messages ignore both and read `Success`.
    pub fn finalize(&mut self, id: &IdChain, result: StepResult, failure_reason: &str) -> bool {
        self.route(id, |entry, out| {
            entry.finalize(result, failure_reason, out).then_some(())
        })
        .is_some()
    }

    pub fn observe_entry(
        &mut self,
        id: &IdChain,
        callback: impl FnMut(&EntryEvent) + 'static,
    ) -> Option<SubscriptionId> {
        let (&first, rest) = id.segments().split_first()?;
        let entry = self.entries.get_mut((first as usize).checked_sub(1)?)?;
        let entry = match (entry, rest.is_empty()) {
            (entry, true) => entry,
            (Entry::Step(step), false) => step.entry_at_mut(rest)?,
            (Entry::Message(_), false) => return None,
        };
        Some(entry.message_mut().attach(callback))
    }

    /// Detaches an entry observer and reports the detachment to the entry's
    /// ancestors and to the log's observers.
    pub fn unobserve_entry(&mut self, id: &IdChain, subscription: SubscriptionId) -> bool {
        self.route(id, |entry, out| entry.detach(subscription, out).then_some(()))
            .is_some()
    }

    /// Renders the whole log as a `<messagelog>` document.
    ///
    /// Each entry keeps the element it was first written to, so calling this again
    /// updates the same document instead of duplicating entries.
    pub fn serialize(&mut self) -> Result<String, LogError> {
        let root = self.tree.root();
        for entry in &mut self.entries {
            entry.write_cached(&mut self.tree, root);
        }
        self.tree.write_to_string().map_err(LogError::Xml)
    }

    /// Appends the "Log Closed" message, writes the final document to the backing
    /// file and tears every entry down. Returns the final document.
    pub fn close(mut self) -> Result<String, LogError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<String, LogError> {
        self.closed = true;

        let spec = EntrySpec {
            action: LOG_CLOSED_ACTION,
            component: LOG_COMPONENT,
            key: LOG_CLOSED_KEY,
        };
        let mut closing = Message::create(&spec, IdChain::root(ordinal_after(self.entries.len())), None);
        closing.finalize();
        self.entries.push(Entry::Message(closing));

        let written = self.serialize().and_then(|document| {
            if let Some(mut file) = self.file.take() {
                file.write_all(document.as_bytes())?;
                file.flush()?;
            }
            Ok(document)
        });

        let mut notices = Vec::new();
        for entry in &mut self.entries {
            entry.teardown(&mut notices);
        }
        self.dispatch(notices);
        self.subject.notify(&LogEvent::Closed);
        debug!(log = %self.name, entries = self.entries.len(), "message log closed");
        written
    }

    fn create_entry(&mut self, spec: &EntrySpec<'_>, spawn: Spawn, recurse: bool) -> IdChain {
        if recurse {
            if let Some(index) = self.current {
                let mut notices = Vec::new();
                let delegated = match self.entries.get_mut(index) {
                    Some(Entry::Step(step)) => step.add_entry_here(spec, spawn, true, &mut notices),
                    _ => None,
                };
                self.dispatch(notices);
                if let Some(id) = delegated {
                    return id;
                }
                // The current step stopped accepting entries; add at the top level.
                self.current = None;
            }
        }

        let id = IdChain::root(ordinal_after(self.entries.len()));
        let mut notices = Vec::new();
        spawn_entry(&mut self.entries, spec, spawn, id.clone(), None, &mut notices);
        if spawn == Spawn::Step {
            self.current = Some(self.entries.len() - 1);
        }
        self.dispatch(notices);
        id
    }

    /// Runs `op` on the entry at `id`, relaying its notices through every ancestor
    /// step to the log.
    fn route<R>(
        &mut self,
        id: &IdChain,
        op: impl FnOnce(&mut Entry, &mut Vec<Notice>) -> Option<R>,
    ) -> Option<R> {
        let (&first, rest) = id.segments().split_first()?;
        let index = (first as usize).checked_sub(1)?;
        let mut notices = Vec::new();
        let result = match (self.entries.get_mut(index)?, rest.is_empty()) {
            (entry, true) => op(entry, &mut notices),
            (Entry::Step(step), false) => step.route(rest, &mut notices, op),
            (Entry::Message(_), false) => None,
        };
        self.dispatch(notices);
        result
    }

    fn dispatch(&mut self, notices: Vec<Notice>) {
        for notice in notices {
            if let Some(line) = notice.journal_line(&self.name) {
                self.journal.write_line(&line);
            }
            let event = notice.log_event();
            debug!(log = %self.name, ?event, "log event");
            self.subject.notify(&event);
        }
    }
}

impl Drop for MessageLog {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.shutdown() {
            warn!(log = %self.name, error = %e, "failed to write the final log document");
        }
    }
}

impl std::fmt::Debug for MessageLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageLog")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("batch", &self.batch)
            .field("entries", &self.entries.len())
            .field("current", &self.current)
            .finish()
    }
}
