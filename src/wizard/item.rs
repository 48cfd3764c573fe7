use super::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable handle of an item inside a [`WizardGraph`](super::WizardGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub(crate) usize);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which side of an item a node sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => write!(f, "input"),
            Direction::Output => write!(f, "output"),
        }
    }
}

/// One step of a wizard: a named plug-in instance with input and output nodes.
///
/// Node lists hold handles into the owning graph and keep insertion order.
#[derive(Debug, Clone)]
pub struct WizardItem {
    name: String,
    kind: String,
    batch: bool,
    inputs: Vec<NodeId>,
    outputs: Vec<NodeId>,
}

impl WizardItem {
    pub(crate) fn new(name: &str, kind: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            batch: false,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// The plug-in type this item instantiates.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Whether the item runs without user interaction.
    pub fn batch(&self) -> bool {
        self.batch
    }

    pub fn set_batch(&mut self, batch: bool) {
        self.batch = batch;
    }

    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    pub fn nodes(&self, direction: Direction) -> &[NodeId] {
        match direction {
            Direction::Input => &self.inputs,
            Direction::Output => &self.outputs,
        }
    }

    pub(crate) fn nodes_mut(&mut self, direction: Direction) -> &mut Vec<NodeId> {
        match direction {
            Direction::Input => &mut self.inputs,
            Direction::Output => &mut self.outputs,
        }
    }
}
