use super::item::{Direction, ItemId};
use crate::error::WizardError;
use crate::observer::{Subject, SubscriptionId};
use crate::value::DataValue;
use crate::xml::XmlTree;
use ahash::AHashMap;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Schema version written on every serialized wizard node.
pub const NODE_VERSION: &str = "Wizard Node Version 3.0";

/// A type-erased value handed to [`WizardNode::set_value`].
pub type ValueRef = Arc<dyn Any + Send + Sync>;

/// Stable handle of a node inside a [`WizardGraph`](super::WizardGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The runtime value held by a node.
#[derive(Clone, Default)]
pub enum NodeValue {
    #[default]
    Empty,
    /// A typed copy owned by the node.
    Owned(DataValue),
    /// A value that could not be copied as the node's type. The node keeps the
    /// caller's handle as-is and does not interpret it.
    External(ValueRef),
}

impl NodeValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, NodeValue::Empty)
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, NodeValue::Owned(_))
    }

    pub fn is_external(&self) -> bool {
        matches!(self, NodeValue::External(_))
    }

    pub fn as_data(&self) -> Option<&DataValue> {
        match self {
            NodeValue::Owned(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_external(&self) -> Option<&ValueRef> {
        match self {
            NodeValue::External(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Debug for NodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeValue::Empty => f.write_str("Empty"),
            NodeValue::Owned(value) => f.debug_tuple("Owned").field(value).finish(),
            NodeValue::External(_) => f.write_str("External(..)"),
        }
    }
}

/// Notifications emitted on a node's own channel.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    NameChanged,
    TypeChanged { previous: String },
    DescriptionChanged,
    ValueChanged,
    ConnectionAdded(NodeId),
    ConnectionRemoved(NodeId),
    /// The node's state was replaced from a saved document.
    Restored,
    /// Sent once, before the node is removed from its graph.
    Deleted,
}

/// A typed, named port on a wizard item.
#[derive(Debug)]
pub struct WizardNode {
    owner: Option<(ItemId, Direction)>,
    name: String,
    description: String,
    node_type: String,
    original_type: String,
    valid_types: Vec<String>,
    value: NodeValue,
    subject: Subject<NodeEvent>,
}

impl WizardNode {
    /// Creates a detached node. Nodes created through
    /// [`WizardGraph::add_node`](super::WizardGraph::add_node) also record their owning item.
    pub fn new(name: &str, node_type: &str, description: &str) -> Self {
        let valid_types = if node_type.is_empty() {
            Vec::new()
        } else {
            vec![node_type.to_string()]
        };
        Self {
            owner: None,
            name: name.to_string(),
            description: description.to_string(),
            node_type: node_type.to_string(),
            original_type: node_type.to_string(),
            valid_types,
            value: NodeValue::Empty,
            subject: Subject::new(),
        }
    }

    /// Builds a detached node from a serialized `<wizardNode>` element.
    pub fn from_xml(xml: &str) -> Result<Self, WizardError> {
        let mut node = Self::new("", "", "");
        node.load_xml(xml)?;
        Ok(node)
    }

    pub(crate) fn set_owner(&mut self, item: ItemId, direction: Direction) {
        self.owner = Some((item, direction));
    }

    pub fn item(&self) -> Option<ItemId> {
        self.owner.map(|(item, _)| item)
    }

    pub fn direction(&self) -> Option<Direction> {
        self.owner.map(|(_, direction)| direction)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        if name != self.name {
            self.name = name.to_string();
            self.subject.notify(&NodeEvent::NameChanged);
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: &str) {
        if description != self.description {
            self.description = description.to_string();
            self.subject.notify(&NodeEvent::DescriptionChanged);
        }
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    /// Changes the current type. A held value is discarded since it no longer
    /// matches the type.
    pub fn set_type(&mut self, node_type: &str) {
        if node_type == self.node_type {
            return;
        }
        self.value = NodeValue::Empty;
        let previous = std::mem::replace(&mut self.node_type, node_type.to_string());
        self.subject.notify(&NodeEvent::TypeChanged { previous });
    }

    pub fn original_type(&self) -> &str {
        &self.original_type
    }

    pub fn set_original_type(&mut self, original_type: &str) {
        self.original_type = original_type.to_string();
    }

    pub fn valid_types(&self) -> &[String] {
        &self.valid_types
    }

    /// Replaces the acceptable types. An empty list falls back to the original type.
    pub fn set_valid_types<I, S>(&mut self, types: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.valid_types = types.into_iter().map(Into::into).collect();
        if self.valid_types.is_empty() {
            self.valid_types.push(self.original_type.clone());
        }
    }

    pub fn value(&self) -> &NodeValue {
        &self.value
    }

    pub fn data(&self) -> Option<&DataValue> {
        self.value.as_data()
    }

    /// Stores a value interpreted as the node's current type.
    ///
    /// A typed copy is kept when the value can be read as the node type (see
    /// [`DataValue::from_any`]). Otherwise the node keeps the handle itself as
    /// [`NodeValue::External`]. Passing the handle the node already holds, or `None`
    /// to an empty node, changes nothing and emits no notification.
    pub fn set_value(&mut self, value: Option<ValueRef>) {
        let unchanged = match (&self.value, &value) {
            (NodeValue::Empty, None) => true,
            (NodeValue::External(current), Some(incoming)) => Arc::ptr_eq(current, incoming),
            _ => false,
        };
        if unchanged {
            return;
        }

        self.value = match value {
            None => NodeValue::Empty,
            Some(incoming) => match DataValue::from_any(&self.node_type, &*incoming) {
                Some(copy) => NodeValue::Owned(copy),
                None => {
                    warn!(
                        node = %self.name,
                        node_type = %self.node_type,
                        "value is not readable as the node type; keeping an unowned reference"
                    );
                    NodeValue::External(incoming)
                }
            },
        };
        self.subject.notify(&NodeEvent::ValueChanged);
    }

    pub fn set_data(&mut self, value: DataValue) {
        let handle: ValueRef = Arc::new(value);
        self.set_value(Some(handle));
    }

    pub fn clear_value(&mut self) {
        self.set_value(None);
    }

    pub fn attach(&mut self, callback: impl FnMut(&NodeEvent) + 'static) -> SubscriptionId {
        self.subject.attach(callback)
    }

    pub fn detach(&mut self, id: SubscriptionId) -> bool {
        self.subject.detach(id)
    }

    pub(crate) fn notify(&mut self, event: NodeEvent) {
        self.subject.notify(&event);
    }

    /// Serializes the node as a `<wizardNode>` element. The description is not
    /// part of the format. Fails for external values, which have no text form.
    pub fn to_xml(&self) -> Result<String, WizardError> {
        let mut tree = XmlTree::new("wizardNode");
        let root = tree.root();
        tree.set_attr(root, "version", NODE_VERSION);
        tree.set_attr(root, "name", &self.name);
        tree.set_attr(root, "originalType", &self.original_type);
        tree.set_attr(root, "type", &self.node_type);

        for valid_type in &self.valid_types {
            let element = tree.add_element(root, "validType");
            tree.set_text(element, valid_type);
        }

        match &self.value {
            NodeValue::Empty => {}
            NodeValue::Owned(value) => {
                let element = tree.add_element(root, "value");
                tree.set_text(element, &value.to_xml_string());
            }
            NodeValue::External(_) => {
                return Err(WizardError::UnserializableValue {
                    node: self.name.clone(),
                    type_name: self.node_type.clone(),
                });
            }
        }

        tree.write_to_string().map_err(WizardError::Xml)
    }

    /// Replaces name, types, valid types and value from a `<wizardNode>` element.
    ///
    /// The document is fully parsed and validated before the node is touched, so a
    /// failed load leaves the node unchanged.
    pub fn load_xml(&mut self, xml: &str) -> Result<(), WizardError> {
        let parsed = ParsedNode::parse(xml)?;

        let value = match &parsed.value {
            Some(text) => Some(DataValue::from_xml_string(&parsed.node_type, text).map_err(
                |source| WizardError::InvalidValue {
                    node: parsed.name.clone(),
                    source,
                },
            )?),
            None => None,
        };

        self.name = parsed.name;
        self.original_type = parsed.original_type;
        self.node_type = parsed.node_type;
        self.set_valid_types(parsed.valid_types);
        self.value = value.map(NodeValue::Owned).unwrap_or_default();
        self.subject.notify(&NodeEvent::Restored);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Field {
    ValidType,
    Value,
}

#[derive(Debug, Default)]
struct ParsedNode {
    name: String,
    original_type: String,
    node_type: String,
    valid_types: Vec<String>,
    value: Option<String>,
}

impl ParsedNode {
    fn parse(xml: &str) -> Result<Self, WizardError> {
        let mut reader = Reader::from_str(xml);
        let mut parsed = ParsedNode::default();
        let mut root_seen = false;
        let mut field: Option<(Field, String)> = None;

        loop {
            match reader.read_event().map_err(|e| WizardError::Xml(e.to_string()))? {
                Event::Start(element) => {
                    if root_seen {
                        field = Self::field_of(&element).map(|kind| (kind, String::new()));
                    } else {
                        parsed.read_root(&element)?;
                        root_seen = true;
                    }
                }
                Event::Empty(element) => {
                    if !root_seen {
                        parsed.read_root(&element)?;
                        root_seen = true;
                    } else if let Some(kind) = Self::field_of(&element) {
                        parsed.store(kind, String::new());
                    }
                }
                Event::Text(text) => {
                    if let Some((_, buffer)) = field.as_mut() {
                        let unescaped = text.unescape().map_err(|e| WizardError::Xml(e.to_string()))?;
                        buffer.push_str(&unescaped);
                    }
                }
                Event::End(_) => {
                    if let Some((kind, buffer)) = field.take() {
                        parsed.store(kind, buffer);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !root_seen {
            return Err(WizardError::Xml("no wizardNode element found".to_string()));
        }
        Ok(parsed)
    }

    fn field_of(element: &BytesStart) -> Option<Field> {
        match element.name().as_ref() {
            b"validType" => Some(Field::ValidType),
            b"value" => Some(Field::Value),
            _ => None,
        }
    }

    fn store(&mut self, kind: Field, text: String) {
        match kind {
            Field::ValidType => self.valid_types.push(text),
            Field::Value => self.value = Some(text),
        }
    }

    fn read_root(&mut self, element: &BytesStart) -> Result<(), WizardError> {
        if element.name().as_ref() != b"wizardNode" {
            return Err(WizardError::Xml(format!(
                "expected a wizardNode element, found '{}'",
                String::from_utf8_lossy(element.name().as_ref())
            )));
        }

        let mut attributes: AHashMap<String, String> = AHashMap::new();
        for attribute in element.attributes() {
            let attribute = attribute.map_err(|e| WizardError::Xml(e.to_string()))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|e| WizardError::Xml(e.to_string()))?
                .into_owned();
            attributes.insert(key, value);
        }

        let version = attributes
            .remove("version")
            .ok_or(WizardError::MissingAttribute("version"))?;
        if !version.starts_with("Wizard Node Version") {
            return Err(WizardError::UnsupportedVersion(version));
        }
        self.name = attributes
            .remove("name")
            .ok_or(WizardError::MissingAttribute("name"))?;
        self.node_type = attributes
            .remove("type")
            .ok_or(WizardError::MissingAttribute("type"))?;
        self.original_type = attributes
            .remove("originalType")
            .unwrap_or_else(|| self.node_type.clone());
        Ok(())
    }
}
