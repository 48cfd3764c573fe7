use super::event::EntryEvent;
use super::id::IdChain;
use super::property::PropertyBag;
use crate::error::LogError;
use crate::observer::{Subject, SubscriptionId};
use crate::value::{DataValue, DateTime};
use crate::xml::{ElementId, XmlTree};
use ahash::AHashMap;
use std::fmt;

/// Terminal state of a finalized entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StepResult {
    #[default]
    Unresolved,
    Success,
    Failure,
    Abort,
}

impl StepResult {
    pub fn as_str(self) -> &'static str {
        match self {
            StepResult::Unresolved => "Unresolved",
            StepResult::Success => "Success",
            StepResult::Failure => "Failure",
            StepResult::Abort => "Abort",
        }
    }
}

impl fmt::Display for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action, component and key of an entry about to be created.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EntrySpec<'a> {
    pub action: &'a str,
    pub component: &'a str,
    pub key: &'a str,
}

/// A leaf log entry: an action with a property bag, writable until finalized.
#[derive(Debug)]
pub struct Message {
    action: String,
    component: String,
    key: String,
    timestamp: DateTime,
    id: IdChain,
    parent: Option<IdChain>,
    properties: PropertyBag,
    finalized: bool,
    element: Option<ElementId>,
    property_elements: AHashMap<String, ElementId>,
    subject: Subject<EntryEvent>,
}

impl Message {
    /// Creates a free-standing message with id `1`, stamped with the current time.
    pub fn new(action: &str, component: &str, key: &str) -> Self {
        let spec = EntrySpec {
            action,
            component,
            key,
        };
        Self::create(&spec, IdChain::root(1), None)
    }

    pub(crate) fn create(spec: &EntrySpec<'_>, id: IdChain, parent: Option<IdChain>) -> Self {
        Self {
            action: spec.action.to_string(),
            component: spec.component.to_string(),
            key: spec.key.to_string(),
            timestamp: DateTime::now(),
            id,
            parent,
            properties: PropertyBag::new(),
            finalized: false,
            element: None,
            property_elements: AHashMap::new(),
            subject: Subject::new(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn timestamp(&self) -> DateTime {
        self.timestamp
    }

    pub fn id(&self) -> &IdChain {
        &self.id
    }

    /// Id of the step this message was created in.
    pub fn parent(&self) -> Option<&IdChain> {
        self.parent.as_ref()
    }

    pub fn properties(&self) -> &PropertyBag {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&DataValue> {
        self.properties.get(name)
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// `Unresolved` until finalized, `Success` afterwards.
    pub fn result(&self) -> StepResult {
        if self.finalized {
            StepResult::Success
        } else {
            StepResult::Unresolved
        }
    }

    /// Stores a property, replacing any earlier value of the same name. Fails
    /// without touching the message once it is finalized.
    pub fn add_property(&mut self, name: &str, value: impl Into<DataValue>) -> bool {
        self.set_property(name, value.into())
    }

    /// Closes the message for writes. Fails if it was already finalized.
    pub fn finalize(&mut self) -> bool {
        self.mark_finalized(StepResult::Success)
    }

    pub fn attach(&mut self, callback: impl FnMut(&EntryEvent) + 'static) -> SubscriptionId {
        self.subject.attach(callback)
    }

    pub fn detach(&mut self, id: SubscriptionId) -> bool {
        self.subject.detach(id)
    }

    /// Renders this message alone as a `<message>` document.
    pub fn to_xml(&self) -> Result<String, LogError> {
        let mut tree = XmlTree::new("message");
        let root = tree.root();
        self.write_fields(&mut tree, root, None);
        tree.write_to_string().map_err(LogError::Xml)
    }

    pub(crate) fn set_property(&mut self, name: &str, value: DataValue) -> bool {
        if self.finalized {
            return false;
        }
        self.properties.set(name, value);
        self.subject.notify(&EntryEvent::Modified {
            property: name.to_string(),
        });
        true
    }

    /// Sets the finalized flag and reports `result` to this entry's observers.
    pub(crate) fn mark_finalized(&mut self, result: StepResult) -> bool {
        if self.finalized {
            return false;
        }
        self.finalized = true;
        self.subject.notify(&EntryEvent::Hidden { result });
        true
    }

    pub(crate) fn notify(&mut self, event: &EntryEvent) {
        self.subject.notify(event);
    }

    /// The element this entry owns in `tree`, created under `parent` on first use.
    pub(crate) fn element_in(&mut self, tree: &mut XmlTree, parent: ElementId, tag: &str) -> ElementId {
        match self.element {
            Some(element) => element,
            None => {
                let element = tree.add_element(parent, tag);
                self.element = Some(element);
                element
            }
        }
    }

    pub(crate) fn write_cached(&mut self, tree: &mut XmlTree, parent: ElementId) {
        let element = self.element_in(tree, parent, "message");
        self.write_cached_fields(tree, element);
    }

    /// Writes attributes and properties, reusing property elements from earlier
    /// passes. Properties stay in name order ahead of any child entries.
    pub(crate) fn write_cached_fields(&mut self, tree: &mut XmlTree, element: ElementId) {
        let mut handles = std::mem::take(&mut self.property_elements);
        self.write_fields(tree, element, Some(&mut handles));
        let ordered: Vec<ElementId> = self
            .properties
            .names()
            .filter_map(|name| handles.get(name).copied())
            .collect();
        tree.move_to_front(element, &ordered);
        self.property_elements = handles;
    }

    pub(crate) fn write_fields(
        &self,
        tree: &mut XmlTree,
        element: ElementId,
        mut handles: Option<&mut AHashMap<String, ElementId>>,
    ) {
        tree.set_attr(element, "id", &self.id.to_string());
        if !self.component.is_empty() {
            tree.set_attr(element, "component", &self.component);
        }
        if !self.key.is_empty() {
            tree.set_attr(element, "key", &self.key);
        }
        tree.set_attr(element, "date", &self.timestamp.log_date());
        tree.set_attr(element, "time", &self.timestamp.log_time());
        tree.set_attr(element, "name", &self.action);

        for (name, value) in self.properties.iter() {
            let property = match handles.as_deref_mut() {
                Some(handles) => *handles
                    .entry(name.to_string())
                    .or_insert_with(|| tree.add_element(element, "property")),
                None => tree.add_element(element, "property"),
            };
            tree.set_attr(property, "name", name);
            tree.set_attr(property, "type", &value.type_name());
            tree.set_attr(property, "value", &value.to_xml_string());
        }
    }
}
