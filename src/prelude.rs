//! Prelude module for convenient imports
//!
//! Re-exports the types most programs need to build wizard graphs and keep an
//! execution log.
//!
//! # Example
//!
//! ```rust,no_run
//! use wizflow::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let definition = WizardDefinition::from_file("path/to/wizard.json")?;
//! let graph = WizardGraph::from_definition(&definition)?;
//!
//! let config = Config::from_file("path/to/wizflow.toml")?;
//! let mut log = MessageLogBuilder::from_config(&config.log).build();
//! let step = log.create_step(graph.name(), "app", &MessageLog::new_key(), true);
//! log.finalize(&step, StepResult::Success, "");
//! println!("{}", log.close()?);
//! # Ok(())
//! # }
//! ```

// Values
pub use crate::value::{DataValue, DateTime, Filename, Sequence, TypeName, ValueKind};

// Wizard graph
pub use crate::wizard::{
    Connection, Direction, GraphEvent, ItemId, NodeEvent, NodeId, NodeValue, ValueRef,
    WizardDefinition, WizardGraph, WizardItem, WizardNode,
};

// Message log
pub use crate::log::{
    Entry, EntryEvent, EntryKind, IdChain, Journal, LogEvent, Message, MessageLog,
    MessageLogBuilder, Step, StepResult,
};

// Observers and configuration
pub use crate::config::{Config, LogConfig};
pub use crate::observer::{Subject, SubscriptionId};

// Error types
pub use crate::error::{ConfigError, LogError, ValueError, WizardError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
