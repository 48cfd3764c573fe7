use thiserror::Error;

/// Errors raised while building, converting or parsing typed values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("Unknown value type '{0}'")]
    UnknownType(String),

    #[error("Cannot parse '{text}' as {type_name}: {message}")]
    Parse {
        type_name: String,
        text: String,
        message: String,
    },

    #[error("Sequence of {expected} cannot hold a value of type {found}")]
    MixedSequence { expected: String, found: String },

    #[error("Values of type {0} cannot be stored in a sequence")]
    NestedSequence(String),
}

/// Errors that can occur while loading, saving or assembling a wizard graph.
#[derive(Error, Debug, Clone)]
pub enum WizardError {
    #[error("Malformed wizard node document: {0}")]
    Xml(String),

    #[error("Wizard node element is missing the '{0}' attribute")]
    MissingAttribute(&'static str),

    #[error("Unsupported wizard node version '{0}'")]
    UnsupportedVersion(String),

    #[error("Node '{node}' holds an external value of type '{type_name}' that cannot be serialized")]
    UnserializableValue { node: String, type_name: String },

    #[error("Invalid value for node '{node}': {source}")]
    InvalidValue {
        node: String,
        #[source]
        source: ValueError,
    },

    #[error("Failed to parse wizard definition: {0}")]
    JsonParseError(String),

    #[error("Item '{0}' not found in the wizard")]
    ItemNotFound(String),

    #[error("Item '{item}' has no {direction} node named '{node}'")]
    NodeNotFound {
        item: String,
        direction: String,
        node: String,
    },

    #[error("Item '{item}' already has an {direction} node named '{node}'")]
    DuplicateNode {
        item: String,
        direction: String,
        node: String,
    },

    #[error("Cannot connect '{from}' to '{to}': {message}")]
    ConnectionRejected {
        from: String,
        to: String,
        message: String,
    },
}

/// Errors raised by the message log when serializing or writing its backing file.
#[derive(Error, Debug)]
pub enum LogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write log document: {0}")]
    Xml(String),
}

/// Errors raised while loading configuration files.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read configuration file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(String),
}
