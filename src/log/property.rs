use crate::value::DataValue;
use std::collections::BTreeMap;

/// Named, typed properties of a log entry, kept in name order.
///
/// Setting a name that already exists replaces its value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBag {
    values: BTreeMap<String, DataValue>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value previously stored under `name`, if any.
    pub fn set(&mut self, name: &str, value: DataValue) -> Option<DataValue> {
        self.values.insert(name.to_string(), value)
    }

    pub fn get(&self, name: &str) -> Option<&DataValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DataValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
