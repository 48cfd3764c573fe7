use super::graph::WizardGraph;
use super::item::{Direction, ItemId};
use super::node::{NodeId, NodeValue};
use crate::error::WizardError;
use crate::value::DataValue;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// A saved wizard: items with their typed ports, and the connections between them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WizardDefinition {
    pub name: String,
    #[serde(default)]
    pub items: Vec<ItemDefinition>,
    #[serde(default)]
    pub connections: Vec<ConnectionDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub name: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub batch: bool,
    #[serde(default)]
    pub inputs: Vec<NodeDefinition>,
    #[serde(default)]
    pub outputs: Vec<NodeDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, rename = "validTypes", skip_serializing_if = "Vec::is_empty")]
    pub valid_types: Vec<String>,
    /// Initial value in its XML text form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDefinition {
    pub output_item: String,
    pub output_node: String,
    pub input_item: String,
    pub input_node: String,
}

impl WizardDefinition {
    pub fn from_json(json: &str) -> Result<Self, WizardError> {
        serde_json::from_str(json).map_err(|e| WizardError::JsonParseError(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, WizardError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            WizardError::JsonParseError(format!("cannot read '{}': {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, WizardError> {
        serde_json::to_string_pretty(self).map_err(|e| WizardError::JsonParseError(e.to_string()))
    }
}

impl WizardGraph {
    /// Builds a graph from a definition. Duplicate port names, unparseable initial
    /// values and rejected connections are errors.
    pub fn from_definition(definition: &WizardDefinition) -> Result<Self, WizardError> {
        let mut graph = WizardGraph::new(&definition.name);

        for item_def in &definition.items {
            let item = graph.add_item(&item_def.name, &item_def.kind);
            if let Some(item) = graph.item_mut(item) {
                item.set_batch(item_def.batch);
            }

            let sides = [
                (Direction::Input, &item_def.inputs),
                (Direction::Output, &item_def.outputs),
            ];
            for (direction, nodes) in sides {
                for node_def in nodes {
                    graph.add_node_from_definition(item, &item_def.name, direction, node_def)?;
                }
            }
        }

        for connection in &definition.connections {
            graph.connect(
                &connection.output_item,
                &connection.output_node,
                &connection.input_item,
                &connection.input_node,
            )?;
        }

        Ok(graph)
    }

    /// Captures the graph as a definition. External node values have no text form
    /// and are left out.
    pub fn to_definition(&self) -> WizardDefinition {
        let items = self
            .items()
            .map(|(_, item)| ItemDefinition {
                name: item.name().to_string(),
                kind: item.kind().to_string(),
                batch: item.batch(),
                inputs: self.node_definitions(item.inputs()),
                outputs: self.node_definitions(item.outputs()),
            })
            .collect();

        let connections = self
            .connections()
            .filter_map(|connection| {
                let (a, b) = connection.nodes();
                let (output, input) = match self.node(a)?.direction()? {
                    Direction::Output => (a, b),
                    Direction::Input => (b, a),
                };
                let output_node = self.node(output)?;
                let input_node = self.node(input)?;
                Some(ConnectionDefinition {
                    output_item: self.item(output_node.item()?)?.name().to_string(),
                    output_node: output_node.name().to_string(),
                    input_item: self.item(input_node.item()?)?.name().to_string(),
                    input_node: input_node.name().to_string(),
                })
            })
            .collect();

        WizardDefinition {
            name: self.name().to_string(),
            items,
            connections,
        }
    }

    fn add_node_from_definition(
        &mut self,
        item: ItemId,
        item_name: &str,
        direction: Direction,
        node_def: &NodeDefinition,
    ) -> Result<(), WizardError> {
        let id = self
            .add_node(
                item,
                direction,
                &node_def.name,
                &node_def.node_type,
                &node_def.description,
            )
            .ok_or_else(|| WizardError::DuplicateNode {
                item: item_name.to_string(),
                direction: direction.to_string(),
                node: node_def.name.clone(),
            })?;

        let value = match &node_def.value {
            Some(text) => Some(
                DataValue::from_xml_string(&node_def.node_type, text).map_err(|source| {
                    WizardError::InvalidValue {
                        node: node_def.name.clone(),
                        source,
                    }
                })?,
            ),
            None => None,
        };

        if let Some(node) = self.node_mut(id) {
            if !node_def.valid_types.is_empty() {
                node.set_valid_types(node_def.valid_types.iter().cloned());
            }
            if let Some(value) = value {
                node.set_data(value);
            }
        }
        Ok(())
    }

    fn node_definitions(&self, ids: &[NodeId]) -> Vec<NodeDefinition> {
        ids.iter()
            .filter_map(|id| self.node(*id))
            .map(|node| {
                let value = match node.value() {
                    NodeValue::Empty => None,
                    NodeValue::Owned(value) => Some(value.to_xml_string()),
                    NodeValue::External(_) => {
                        warn!(node = node.name(), "external value left out of the definition");
                        None
                    }
                };
                // A lone original type is the default and is not written out.
                let valid_types = match node.valid_types() {
                    [only] if only == node.original_type() => Vec::new(),
                    types => types.to_vec(),
                };
                NodeDefinition {
                    name: node.name().to_string(),
                    node_type: node.node_type().to_string(),
                    description: node.description().to_string(),
                    valid_types,
                    value,
                }
            })
            .collect()
    }
}
