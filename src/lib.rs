//! # wizflow - Wizard Graphs and Execution Logs
//!
//! **wizflow** models the two cores of a wizard-driven processing pipeline:
//!
//! - a **wizard graph**: items (plug-in invocations) with typed input and output
//!   nodes, connected only when their types match, each node holding a typed value;
//! - a **message log**: a hierarchical, append-only execution journal of messages
//!   and steps with typed properties, cascading finalization, a live text journal
//!   and an XML document form.
//!
//! ## Core Workflow
//!
//! 1.  **Describe the wizard**: load a [`WizardDefinition`](wizard::WizardDefinition) from JSON, or
//!     build a [`WizardGraph`](wizard::WizardGraph) item by item.
//! 2.  **Open a log**: use [`MessageLog::builder`](log::MessageLog::builder) to choose a backing
//!     directory, a journal and batch mode.
//! 3.  **Execute**: create steps as items run. New entries nest under the current
//!     step, properties record inputs and results, and finalizing a step cascades
//!     its result to whatever is still open below it.
//! 4.  **Close**: [`MessageLog::close`](log::MessageLog::close) appends the "Log Closed" audit
//!     message and writes the final document.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wizflow::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut graph = WizardGraph::new("Threshold");
//!     let reader = graph.add_item("Read", "Importer");
//!     let filter = graph.add_item("Filter", "Threshold");
//!     let image = graph.add_node(reader, Direction::Output, "Image", "Filename", "").unwrap();
//!     let input = graph.add_node(filter, Direction::Input, "Image", "Filename", "").unwrap();
//!     assert!(graph.add_connected_node(image, input));
//!
//!     if let Some(node) = graph.node_mut(image) {
//!         node.set_data(DataValue::Filename(Filename::new("/data/scene.tif")));
//!     }
//!
//!     let mut log = MessageLog::builder("session").with_directory("/tmp").build();
//!     let run = log.create_step("Run Wizard", "app", &MessageLog::new_key(), true);
//!     let read = log.create_message("Read", "app", "", false, true);
//!     log.add_property(&read, "Image", Filename::new("/data/scene.tif"));
//!     log.finalize(&run, StepResult::Success, "");
//!
//!     let document = log.close()?;
//!     println!("{document}");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod log;
pub mod observer;
pub mod prelude;
pub mod value;
pub mod wizard;
pub mod xml;
