use super::event::{EntryEvent, EntryKind, Notice};
use super::id::IdChain;
use super::message::{EntrySpec, Message, StepResult};
use crate::error::LogError;
use crate::observer::SubscriptionId;
use crate::value::DataValue;
use crate::xml::{ElementId, XmlTree};

/// What kind of entry to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Spawn {
    Message { finalize_on_create: bool },
    Step,
}

/// An entry in a log or step: a message, or a step with children of its own.
#[derive(Debug)]
pub enum Entry {
    Message(Message),
    Step(Step),
}

impl Entry {
    pub fn message(&self) -> &Message {
        match self {
            Entry::Message(message) => message,
            Entry::Step(step) => &step.message,
        }
    }

    pub(crate) fn message_mut(&mut self) -> &mut Message {
        match self {
            Entry::Message(message) => message,
            Entry::Step(step) => &mut step.message,
        }
    }

    pub fn as_step(&self) -> Option<&Step> {
        match self {
            Entry::Step(step) => Some(step),
            Entry::Message(_) => None,
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::Message(_) => EntryKind::Message,
            Entry::Step(_) => EntryKind::Step,
        }
    }

    pub fn id(&self) -> &IdChain {
        self.message().id()
    }

    pub fn action(&self) -> &str {
        self.message().action()
    }

    pub fn is_finalized(&self) -> bool {
        self.message().is_finalized()
    }

    pub fn result(&self) -> StepResult {
        match self {
            Entry::Message(message) => message.result(),
            Entry::Step(step) => step.result(),
        }
    }

    /// Empty for messages and for steps that did not fail with a reason.
    pub fn failure_message(&self) -> &str {
        match self {
            Entry::Message(_) => "",
            Entry::Step(step) => step.failure_message(),
        }
    }

    pub(crate) fn add_property(&mut self, name: &str, value: DataValue, out: &mut Vec<Notice>) -> bool {
        if !self.message_mut().set_property(name, value) {
            return false;
        }
        out.push(Notice::modified(self, name));
        true
    }

    pub(crate) fn finalize(&mut self, result: StepResult, failure_reason: &str, out: &mut Vec<Notice>) -> bool {
        match self {
            Entry::Step(step) => step.finalize_into(result, failure_reason, out),
            Entry::Message(message) => {
                if !message.mark_finalized(StepResult::Success) {
                    return false;
                }
                out.push(Notice::hidden(self));
                true
            }
        }
    }

    pub(crate) fn detach(&mut self, subscription: SubscriptionId, out: &mut Vec<Notice>) -> bool {
        if !self.message_mut().detach(subscription) {
            return false;
        }
        out.push(Notice::detached(self));
        true
    }

    /// Reports deletion for this entry and everything below it, children first.
    pub(crate) fn teardown(&mut self, out: &mut Vec<Notice>) {
        if let Entry::Step(step) = self {
            step.teardown_children(out);
        }
        self.message_mut().notify(&EntryEvent::Deleted);
        out.push(Notice::deleted(self));
    }

    pub(crate) fn write_cached(&mut self, tree: &mut XmlTree, parent: ElementId) {
        match self {
            Entry::Message(message) => message.write_cached(tree, parent),
            Entry::Step(step) => step.write_cached(tree, parent),
        }
    }

    fn write_fresh(&self, tree: &mut XmlTree, parent: ElementId) {
        match self {
            Entry::Message(message) => {
                let element = tree.add_element(parent, "message");
                message.write_fields(tree, element, None);
            }
            Entry::Step(step) => {
                let element = tree.add_element(parent, "step");
                step.write_fresh(tree, element);
            }
        }
    }
}

/// Pushes a new entry and reports it. A message created with
/// `finalize_on_create` is reported as added, then as finalized.
pub(crate) fn spawn_entry(
    entries: &mut Vec<Entry>,
    spec: &EntrySpec<'_>,
    spawn: Spawn,
    id: IdChain,
    parent: Option<IdChain>,
    out: &mut Vec<Notice>,
) {
    let message = Message::create(spec, id, parent);
    let entry = match spawn {
        Spawn::Step => Entry::Step(Step::from_message(message)),
        Spawn::Message { .. } => Entry::Message(message),
    };
    entries.push(entry);

    let Some(entry) = entries.last_mut() else {
        return;
    };
    out.push(Notice::added(entry));
    if spawn == (Spawn::Message { finalize_on_create: true }) {
        entry.finalize(StepResult::Success, "", out);
    }
}

/// A log entry that owns an ordered list of child messages and steps and carries
/// a terminal result.
///
/// Children are addressed by [`IdChain`]s that extend this step's own id. Nested
/// entries are only mutated through the `*_at` methods, which keep every
/// ancestor's observers informed.
#[derive(Debug)]
pub struct Step {
    message: Message,
    result: StepResult,
    failure_message: String,
    children: Vec<Entry>,
    current: Option<usize>,
}

impl Step {
    /// Creates a free-standing step with id `1`.
    pub fn new(action: &str, component: &str, key: &str) -> Self {
        Self::from_message(Message::new(action, component, key))
    }

    pub(crate) fn from_message(message: Message) -> Self {
        Self {
            message,
            result: StepResult::Unresolved,
            failure_message: String::new(),
            children: Vec::new(),
            current: None,
        }
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn id(&self) -> &IdChain {
        self.message.id()
    }

    pub fn action(&self) -> &str {
        self.message.action()
    }

    pub fn is_finalized(&self) -> bool {
        self.message.is_finalized()
    }

    /// `Unresolved` until finalized, then exactly the result passed to `finalize`.
    pub fn result(&self) -> StepResult {
        self.result
    }

    pub fn failure_message(&self) -> &str {
        &self.failure_message
    }

    pub fn children(&self) -> &[Entry] {
        &self.children
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.children.get(index)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Looks up a descendant by its full id.
    pub fn find(&self, id: &IdChain) -> Option<&Entry> {
        self.entry_at(id.relative_to(self.id())?)
    }

    /// The deepest open step reachable through the chain of current steps,
    /// starting with this one. `None` once this step is finalized.
    pub fn current_step(&self) -> Option<IdChain> {
        if self.is_finalized() {
            return None;
        }
        let deeper = match self.current.and_then(|index| self.children.get(index)) {
            Some(Entry::Step(step)) => step.current_step(),
            _ => None,
        };
        deeper.or_else(|| Some(self.id().clone()))
    }

    pub fn add_property(&mut self, name: &str, value: impl Into<DataValue>) -> bool {
        self.message.set_property(name, value.into())
    }

    /// Adds a message to this step, or to its current child step when `recurse`
    /// is set. Returns `None` once this step is finalized.
    pub fn add_message(
        &mut self,
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
        self.add_entry_here(&spec, spawn, recurse, &mut Vec::new())
    }

    /// Adds a child step, which becomes this step's current step.
    pub fn add_step(&mut self, action: &str, component: &str, key: &str, recurse: bool) -> Option<IdChain> {
        let spec = EntrySpec {
            action,
            component,
            key,
        };
        self.add_entry_here(&spec, Spawn::Step, recurse, &mut Vec::new())
    }

    /// Finalizes every open child with the same result and reason, then this step.
    /// Fails if the step was already finalized.
    pub fn finalize(&mut self, result: StepResult, failure_reason: &str) -> bool {
        self.finalize_into(result, failure_reason, &mut Vec::new())
    }

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
        let path = step.relative_to(self.id())?;
        let spawn = Spawn::Message { finalize_on_create };
        self.add_entry_at(path, &spec, spawn, recurse, &mut Vec::new())
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
        let path = step.relative_to(self.id())?;
        self.add_entry_at(path, &spec, Spawn::Step, recurse, &mut Vec::new())
    }

    pub fn add_property_at(&mut self, id: &IdChain, name: &str, value: impl Into<DataValue>) -> bool {
        let value = value.into();
        match id.relative_to(self.id()) {
            Some([]) => self.message.set_property(name, value),
            Some(path) => self
                .route(path, &mut Vec::new(), |entry, out| {
                    entry.add_property(name, value, out).then_some(())
                })
                .is_some(),
            None => false,
        }
    }

    pub fn finalize_at(&mut self, id: &IdChain, result: StepResult, failure_reason: &str) -> bool {
        match id.relative_to(self.id()) {
            Some([]) => self.finalize(result, failure_reason),
            Some(path) => self
                .route(path, &mut Vec::new(), |entry, out| {
                    entry.finalize(result, failure_reason, out).then_some(())
                })
                .is_some(),
            None => false,
        }
    }

    pub fn attach(&mut self, callback: impl FnMut(&EntryEvent) + 'static) -> SubscriptionId {
        self.message.attach(callback)
    }

    pub fn detach(&mut self, id: SubscriptionId) -> bool {
        self.message.detach(id)
    }

    /// Renders this step and its children as a `<step>` document.
    pub fn to_xml(&self) -> Result<String, LogError> {
        let mut tree = XmlTree::new("step");
        let root = tree.root();
        self.write_fresh(&mut tree, root);
        tree.write_to_string().map_err(LogError::Xml)
    }

    pub(crate) fn add_entry_here(
        &mut self,
        spec: &EntrySpec<'_>,
        spawn: Spawn,
        recurse: bool,
        out: &mut Vec<Notice>,
    ) -> Option<IdChain> {
        if self.is_finalized() {
            return None;
        }

        if recurse {
            if let Some(index) = self.current {
                let mut notices = Vec::new();
                let delegated = match self.children.get_mut(index) {
                    Some(Entry::Step(step)) => step.add_entry_here(spec, spawn, true, &mut notices),
                    _ => None,
                };
                self.relay(notices, out);
                if delegated.is_some() {
                    return delegated;
                }
                // The current step stopped accepting entries; add here instead.
                self.current = None;
            }
        }

        let parent = self.id().clone();
        let id = parent.child(ordinal_after(self.children.len()));
        let mut notices = Vec::new();
        spawn_entry(&mut self.children, spec, spawn, id.clone(), Some(parent), &mut notices);
        if spawn == Spawn::Step {
            self.current = Some(self.children.len() - 1);
        }
        self.relay(notices, out);
        Some(id)
    }

    pub(crate) fn add_entry_at(
        &mut self,
        path: &[u32],
        spec: &EntrySpec<'_>,
        spawn: Spawn,
        recurse: bool,
        out: &mut Vec<Notice>,
    ) -> Option<IdChain> {
        if path.is_empty() {
            return self.add_entry_here(spec, spawn, recurse, out);
        }
        self.route(path, out, |entry, out| match entry {
            Entry::Step(step) => step.add_entry_here(spec, spawn, recurse, out),
            Entry::Message(_) => None,
        })
    }

    pub(crate) fn finalize_into(&mut self, result: StepResult, failure_reason: &str, out: &mut Vec<Notice>) -> bool {
        if self.is_finalized() {
            return false;
        }
        self.result = result;
        self.failure_message = failure_reason.to_string();

        let mut notices = Vec::new();
        for child in &mut self.children {
            if !child.is_finalized() {
                child.finalize(result, failure_reason, &mut notices);
            }
        }
        self.relay(notices, out);

        self.message.mark_finalized(result);
        out.push(Notice::step_hidden(self));
        true
    }

    /// Runs `op` on the descendant at `path` (relative to this step) and relays
    /// whatever it reports through this step.
    pub(crate) fn route<R>(
        &mut self,
        path: &[u32],
        out: &mut Vec<Notice>,
        op: impl FnOnce(&mut Entry, &mut Vec<Notice>) -> Option<R>,
    ) -> Option<R> {
        let (&first, rest) = path.split_first()?;
        let index = (first as usize).checked_sub(1)?;
        let mut notices = Vec::new();
        let result = match (self.children.get_mut(index)?, rest.is_empty()) {
            (entry, true) => op(entry, &mut notices),
            (Entry::Step(step), false) => step.route(rest, &mut notices, op),
            (Entry::Message(_), false) => None,
        };
        self.relay(notices, out);
        result
    }

    pub(crate) fn entry_at(&self, path: &[u32]) -> Option<&Entry> {
        let (&first, rest) = path.split_first()?;
        let entry = self.children.get((first as usize).checked_sub(1)?)?;
        match (entry, rest.is_empty()) {
            (entry, true) => Some(entry),
            (Entry::Step(step), false) => step.entry_at(rest),
            (Entry::Message(_), false) => None,
        }
    }

    pub(crate) fn entry_at_mut(&mut self, path: &[u32]) -> Option<&mut Entry> {
        let (&first, rest) = path.split_first()?;
        let entry = self.children.get_mut((first as usize).checked_sub(1)?)?;
        match (entry, rest.is_empty()) {
            (entry, true) => Some(entry),
            (Entry::Step(step), false) => step.entry_at_mut(rest),
            (Entry::Message(_), false) => None,
        }
    }

    pub(crate) fn teardown_children(&mut self, out: &mut Vec<Notice>) {
        let mut notices = Vec::new();
        for child in &mut self.children {
            child.teardown(&mut notices);
        }
        self.relay(notices, out);
    }

    pub(crate) fn write_cached(&mut self, tree: &mut XmlTree, parent: ElementId) {
        let element = self.message.element_in(tree, parent, "step");
        self.write_result(tree, element);
        self.message.write_cached_fields(tree, element);
        for child in &mut self.children {
            child.write_cached(tree, element);
        }
    }

    fn write_fresh(&self, tree: &mut XmlTree, element: ElementId) {
        self.write_result(tree, element);
        self.message.write_fields(tree, element, None);
        for child in &self.children {
            child.write_fresh(tree, element);
        }
    }

    fn write_result(&self, tree: &mut XmlTree, element: ElementId) {
        tree.set_attr(element, "result", self.result.as_str());
        if !self.failure_message.is_empty() {
            tree.set_attr(element, "failureMessage", &self.failure_message);
        }
    }

    /// Forwards changes below this step to its observers while it is open, then
    /// passes them on towards the log.
    fn relay(&mut self, notices: Vec<Notice>, out: &mut Vec<Notice>) {
        if !self.is_finalized() {
            for notice in &notices {
                self.message.notify(&notice.child_event());
            }
        }
        out.extend(notices);
    }
}

pub(crate) fn ordinal_after(len: usize) -> u32 {
    u32::try_from(len + 1).unwrap_or(u32::MAX)
}
