//! Wizard graphs: items, their typed nodes and the connections between nodes.

pub mod definition;
pub mod graph;
pub mod item;
pub mod node;

pub use definition::*;
pub use graph::*;
pub use item::*;
pub use node::*;
