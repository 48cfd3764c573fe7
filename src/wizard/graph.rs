use super::item::{Direction, ItemId, WizardItem};
use super::node::{NodeEvent, NodeId, WizardNode};
use crate::error::WizardError;
use crate::observer::{Subject, SubscriptionId};
use std::collections::BTreeSet;
use tracing::debug;

/// An undirected connection between two nodes, stored with the lower id first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Connection {
    a: NodeId,
    b: NodeId,
}

impl Connection {
    pub fn new(first: NodeId, second: NodeId) -> Self {
        if first <= second {
            Self { a: first, b: second }
        } else {
            Self { a: second, b: first }
        }
    }

    pub fn nodes(&self) -> (NodeId, NodeId) {
        (self.a, self.b)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.a == node || self.b == node
    }

    /// The end of the connection opposite `node`.
    pub fn other(&self, node: NodeId) -> Option<NodeId> {
        if node == self.a {
            Some(self.b)
        } else if node == self.b {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Notifications emitted on the graph's aggregate channel.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    ItemAdded(ItemId),
    ItemRemoved(ItemId),
    NodeAdded(NodeId),
    NodeRemoved(NodeId),
    Connected(Connection),
    Disconnected(Connection),
}

/// Owns wizard items, their nodes and the connections between nodes.
///
/// Items and nodes live in arenas addressed by [`ItemId`] and [`NodeId`]. Ids are
/// never reused, so a stale handle simply stops resolving after removal.
#[derive(Debug)]
pub struct WizardGraph {
    name: String,
    items: Vec<Option<WizardItem>>,
    nodes: Vec<Option<WizardNode>>,
    connections: BTreeSet<Connection>,
    subject: Subject<GraphEvent>,
}

impl WizardGraph {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            items: Vec::new(),
            nodes: Vec::new(),
            connections: BTreeSet::new(),
            subject: Subject::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn attach(&mut self, callback: impl FnMut(&GraphEvent) + 'static) -> SubscriptionId {
        self.subject.attach(callback)
    }

    pub fn detach(&mut self, id: SubscriptionId) -> bool {
        self.subject.detach(id)
    }

    // Items

    pub fn add_item(&mut self, name: &str, kind: &str) -> ItemId {
        let id = ItemId(self.items.len());
        self.items.push(Some(WizardItem::new(name, kind)));
        debug!(item = name, kind, "added wizard item");
        self.subject.notify(&GraphEvent::ItemAdded(id));
        id
    }

    pub fn item(&self, id: ItemId) -> Option<&WizardItem> {
        self.items.get(id.0).and_then(Option::as_ref)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut WizardItem> {
        self.items.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Live items in insertion order.
    pub fn items(&self) -> impl Iterator<Item = (ItemId, &WizardItem)> {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|item| (ItemId(index), item)))
    }

    pub fn item_count(&self) -> usize {
        self.items().count()
    }

    /// The first live item with the given name.
    pub fn find_item(&self, name: &str) -> Option<ItemId> {
        self.items()
            .find(|(_, item)| item.name() == name)
            .map(|(id, _)| id)
    }

    /// Removes an item together with its nodes. Every node is disconnected before it
    /// goes away, so no remaining node keeps a connection to it.
    pub fn remove_item(&mut self, id: ItemId) -> bool {
        let Some(item) = self.item(id) else {
            return false;
        };
        let owned: Vec<NodeId> = item.inputs().iter().chain(item.outputs()).copied().collect();
        for node in owned {
            self.remove_node(node);
        }

        if let Some(slot) = self.items.get_mut(id.0) {
            *slot = None;
        }
        debug!(item = %id, "removed wizard item");
        self.subject.notify(&GraphEvent::ItemRemoved(id));
        true
    }

    // Nodes

    /// Declares a port on an item. Returns `None` if the item does not exist or
    /// already has a node with this name on the same side.
    pub fn add_node(
        &mut self,
        item: ItemId,
        direction: Direction,
        name: &str,
        node_type: &str,
        description: &str,
    ) -> Option<NodeId> {
        if self.item(item).is_none() || self.find_node(item, direction, name).is_some() {
            return None;
        }

        let id = NodeId(self.nodes.len());
        let mut node = WizardNode::new(name, node_type, description);
        node.set_owner(item, direction);
        self.nodes.push(Some(node));
        self.item_mut(item)?.nodes_mut(direction).push(id);

        debug!(node = name, node_type, %direction, "added wizard node");
        self.subject.notify(&GraphEvent::NodeAdded(id));
        Some(id)
    }

    /// Notifies the node's observers of the deletion, clears its connections and
    /// removes it from its item.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        if self.node(id).is_none() {
            return false;
        }
        // Observers still see the node's connections when told of the deletion.
        self.notify_node(id, NodeEvent::Deleted);
        self.clear_connected_nodes(id);

        let Some(node) = self.nodes.get_mut(id.0).and_then(Option::take) else {
            return false;
        };

        if let Some((item, direction)) = node.item().zip(node.direction()) {
            if let Some(owner) = self.item_mut(item) {
                owner.nodes_mut(direction).retain(|candidate| *candidate != id);
            }
        }
        self.subject.notify(&GraphEvent::NodeRemoved(id));
        true
    }

    pub fn node(&self, id: NodeId) -> Option<&WizardNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut WizardNode> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn find_node(&self, item: ItemId, direction: Direction, name: &str) -> Option<NodeId> {
        self.item(item)?
            .nodes(direction)
            .iter()
            .copied()
            .find(|id| self.node(*id).is_some_and(|node| node.name() == name))
    }

    // Connections

    /// Connects two nodes. Fails if either node is missing, if they are the same
    /// node, if their current types differ, or if they are already connected.
    pub fn add_connected_node(&mut self, node: NodeId, peer: NodeId) -> bool {
        if node == peer {
            return false;
        }
        let (Some(first), Some(second)) = (self.node(node), self.node(peer)) else {
            return false;
        };
        if first.node_type() != second.node_type() {
            debug!(
                from = first.name(),
                to = second.name(),
                from_type = first.node_type(),
                to_type = second.node_type(),
                "connection rejected: type mismatch"
            );
            return false;
        }

        let connection = Connection::new(node, peer);
        if !self.connections.insert(connection) {
            return false;
        }

        self.notify_node(node, NodeEvent::ConnectionAdded(peer));
        self.notify_node(peer, NodeEvent::ConnectionAdded(node));
        self.subject.notify(&GraphEvent::Connected(connection));
        true
    }

    /// Breaks an existing connection. Fails if the nodes are not connected.
    pub fn remove_connected_node(&mut self, node: NodeId, peer: NodeId) -> bool {
        let connection = Connection::new(node, peer);
        if !self.connections.remove(&connection) {
            return false;
        }

        self.notify_node(node, NodeEvent::ConnectionRemoved(peer));
        self.notify_node(peer, NodeEvent::ConnectionRemoved(node));
        self.subject.notify(&GraphEvent::Disconnected(connection));
        true
    }

    /// Removes the first connected peer until none remain.
    pub fn clear_connected_nodes(&mut self, node: NodeId) {
        while let Some(peer) = self.connected_nodes(node).first().copied() {
            self.remove_connected_node(node, peer);
        }
    }

    pub fn is_node_connected(&self, node: NodeId, peer: NodeId) -> bool {
        self.connections.contains(&Connection::new(node, peer))
    }

    pub fn connected_nodes(&self, node: NodeId) -> Vec<NodeId> {
        self.connections
            .iter()
            .filter_map(|connection| connection.other(node))
            .collect()
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter()
    }

    /// Connects an output node to an input node, both addressed by item and node name.
    pub fn connect(
        &mut self,
        output_item: &str,
        output_node: &str,
        input_item: &str,
        input_node: &str,
    ) -> Result<Connection, WizardError> {
        let from = self.resolve(output_item, Direction::Output, output_node)?;
        let to = self.resolve(input_item, Direction::Input, input_node)?;

        if self.add_connected_node(from, to) {
            return Ok(Connection::new(from, to));
        }

        let message = match (self.node(from), self.node(to)) {
            _ if self.is_node_connected(from, to) => "already connected".to_string(),
            (Some(a), Some(b)) if a.node_type() != b.node_type() => {
                format!("type '{}' does not match '{}'", a.node_type(), b.node_type())
            }
            _ => "a node cannot be connected to itself".to_string(),
        };
        Err(WizardError::ConnectionRejected {
            from: format!("{output_item}.{output_node}"),
            to: format!("{input_item}.{input_node}"),
            message,
        })
    }

    /// Disconnects an output node from an input node addressed by name.
    pub fn disconnect(
        &mut self,
        output_item: &str,
        output_node: &str,
        input_item: &str,
        input_node: &str,
    ) -> Result<bool, WizardError> {
        let from = self.resolve(output_item, Direction::Output, output_node)?;
        let to = self.resolve(input_item, Direction::Input, input_node)?;
        Ok(self.remove_connected_node(from, to))
    }

    pub(crate) fn resolve(
        &self,
        item_name: &str,
        direction: Direction,
        node_name: &str,
    ) -> Result<NodeId, WizardError> {
        let item = self
            .find_item(item_name)
            .ok_or_else(|| WizardError::ItemNotFound(item_name.to_string()))?;
        self.find_node(item, direction, node_name)
            .ok_or_else(|| WizardError::NodeNotFound {
                item: item_name.to_string(),
                direction: direction.to_string(),
                node: node_name.to_string(),
            })
    }

    fn notify_node(&mut self, id: NodeId, event: NodeEvent) {
        if let Some(node) = self.node_mut(id) {
            node.notify(event);
        }
    }
}
