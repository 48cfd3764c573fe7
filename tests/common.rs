//! Common test utilities for building wizard graphs and capturing log output.
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use wizflow::prelude::*;

/// A `Write` sink whose contents stay readable after it is handed to a journal.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

#[allow(dead_code)]
impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        let bytes = self.0.lock().map(|b| b.clone()).unwrap_or_default();
        String::from_utf8(bytes).unwrap()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Collects every event delivered to the returned callback.
#[allow(dead_code)]
pub fn recorder<E: Clone + 'static>() -> (Rc<RefCell<Vec<E>>>, impl FnMut(&E) + 'static) {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    (events, move |event: &E| sink.borrow_mut().push(event.clone()))
}

/// Two items, `Reader` and `Filter`, with one output and one input node each.
///
/// `Reader.Image` (Filename) can connect to `Filter.Image` (Filename);
/// `Filter.Level` is a `double` input.
#[allow(dead_code)]
pub struct SimpleGraph {
    pub graph: WizardGraph,
    pub reader: ItemId,
    pub filter: ItemId,
    pub image_out: NodeId,
    pub image_in: NodeId,
    pub level_in: NodeId,
}

#[allow(dead_code)]
pub fn create_simple_graph() -> SimpleGraph {
    let mut graph = WizardGraph::new("Simple");
    let reader = graph.add_item("Reader", "Importer");
    let filter = graph.add_item("Filter", "Threshold");
    let image_out = graph
        .add_node(reader, Direction::Output, "Image", "Filename", "Imported scene")
        .unwrap();
    let image_in = graph
        .add_node(filter, Direction::Input, "Image", "Filename", "Scene to filter")
        .unwrap();
    let level_in = graph
        .add_node(filter, Direction::Input, "Level", "double", "Threshold level")
        .unwrap();
    SimpleGraph {
        graph,
        reader,
        filter,
        image_out,
        image_in,
        level_in,
    }
}

/// A wizard definition with a connection and preset values, as loaded by the CLI.
#[allow(dead_code)]
pub const SIMPLE_WIZARD_JSON: &str = r#"{
    "name": "Threshold Scene",
    "items": [
        {
            "name": "Reader",
            "kind": "Importer",
            "batch": true,
            "outputs": [
                { "name": "Image", "type": "Filename", "value": "/data/scene.tif" }
            ]
        },
        {
            "name": "Filter",
            "kind": "Threshold",
            "inputs": [
                { "name": "Image", "type": "Filename" },
                { "name": "Level", "type": "double", "validTypes": ["double", "float"], "value": "0.75" }
            ],
            "outputs": [
                { "name": "Mask", "type": "vector<int>" }
            ]
        }
    ],
    "connections": [
        { "outputItem": "Reader", "outputNode": "Image", "inputItem": "Filter", "inputNode": "Image" }
    ]
}"#;
