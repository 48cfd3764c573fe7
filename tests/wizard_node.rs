//! Tests for wizard node contracts: types, values and the saved node format.
mod common;
use common::*;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use wizflow::prelude::*;

#[test]
fn test_new_node_defaults() {
    let node = WizardNode::new("Level", "double", "Threshold level");
    assert_eq!(node.name(), "Level");
    assert_eq!(node.node_type(), "double");
    assert_eq!(node.original_type(), "double");
    assert_eq!(node.valid_types(), ["double".to_string()]);
    assert_eq!(node.description(), "Threshold level");
    assert!(node.value().is_empty());
    assert_eq!(node.item(), None);
}

#[test]
fn test_empty_valid_types_fall_back_to_original_type() {
    let mut node = WizardNode::new("Level", "double", "");
    node.set_valid_types(["double", "float"]);
    assert_eq!(node.valid_types().len(), 2);

    node.set_type("float");
    node.set_valid_types(Vec::<String>::new());
    assert_eq!(node.valid_types(), ["double".to_string()]);
}

#[test]
fn test_set_type_discards_value_and_notifies() {
    let mut node = WizardNode::new("Level", "double", "");
    node.set_data(DataValue::Double(0.5));
    let (events, callback) = recorder::<NodeEvent>();
    node.attach(callback);

    node.set_type("double");
    assert!(node.data().is_some());
    assert!(events.borrow().is_empty());

    node.set_type("float");
    assert!(node.value().is_empty());
    assert_eq!(
        *events.borrow(),
        vec![NodeEvent::TypeChanged {
            previous: "double".to_string()
        }]
    );
}

#[test]
fn test_set_value_makes_typed_copy() {
    let mut node = WizardNode::new("Count", "int", "");
    let handle: ValueRef = Arc::new(12i32);
    node.set_value(Some(Arc::clone(&handle)));

    assert!(node.value().is_owned());
    assert_eq!(node.data(), Some(&DataValue::Int(12)));
}

#[test]
fn test_unreadable_value_is_kept_as_external_reference() {
    struct RasterElement;

    let mut node = WizardNode::new("Raster", "RasterElement", "");
    let handle: ValueRef = Arc::new(RasterElement);
    node.set_value(Some(Arc::clone(&handle)));

    let external = node.value().as_external().unwrap();
    assert!(Arc::ptr_eq(external, &handle));
    assert!(node.data().is_none());
}

#[test]
fn test_value_notification_uses_identity() {
    struct RasterElement;

    let mut node = WizardNode::new("Raster", "RasterElement", "");
    let (events, callback) = recorder::<NodeEvent>();
    node.attach(callback);

    let handle: ValueRef = Arc::new(RasterElement);
    node.set_value(Some(Arc::clone(&handle)));
    node.set_value(Some(Arc::clone(&handle)));
    assert_eq!(events.borrow().len(), 1);

    node.clear_value();
    node.clear_value();
    assert_eq!(events.borrow().len(), 2);

    // An owned copy never matches an incoming handle, so equal values still notify.
    let mut typed = WizardNode::new("Count", "int", "");
    let (typed_events, callback) = recorder::<NodeEvent>();
    typed.attach(callback);
    typed.set_data(DataValue::Int(1));
    typed.set_data(DataValue::Int(1));
    assert_eq!(typed_events.borrow().len(), 2);
}

#[test]
fn test_xml_round_trip() {
    let mut node = WizardNode::new("Bands", "vector<unsigned int>", "Selected bands");
    node.set_valid_types(["vector<unsigned int>", "vector<int>"]);
    node.set_data(DataValue::from(vec![1u32, 4, 7]));

    let xml = node.to_xml().unwrap();
    assert!(xml.contains(r#"version="Wizard Node Version 3.0""#));
    assert!(xml.contains("<value>1 4 7</value>"));
    assert!(!xml.contains("Selected bands"));

    let restored = WizardNode::from_xml(&xml).unwrap();
    assert_eq!(restored.name(), node.name());
    assert_eq!(restored.node_type(), node.node_type());
    assert_eq!(restored.original_type(), node.original_type());
    assert_eq!(restored.valid_types(), node.valid_types());
    assert_eq!(restored.data(), node.data());
}

#[test]
fn test_xml_round_trip_of_string_with_markup_and_spaces() {
    let mut node = WizardNode::new("Note", "string", "");
    node.set_data(DataValue::from("  a <b> & \"c\"  "));

    let xml = node.to_xml().unwrap();
    let restored = WizardNode::from_xml(&xml).unwrap();
    assert_eq!(restored.data(), Some(&DataValue::from("  a <b> & \"c\"  ")));
}

#[test]
fn test_xml_without_value_omits_value_element() {
    let node = WizardNode::new("Level", "double", "");
    let xml = node.to_xml().unwrap();
    assert!(!xml.contains("<value"));

    let restored = WizardNode::from_xml(&xml).unwrap();
    assert!(restored.value().is_empty());
}

#[test]
fn test_external_value_cannot_be_serialized() {
    let mut node = WizardNode::new("Raster", "RasterElement", "");
    node.set_value(Some(Arc::new(3u8)));
    assert!(matches!(
        node.to_xml(),
        Err(WizardError::UnserializableValue { .. })
    ));
}

#[test]
fn test_load_xml_rejects_bad_documents_without_changes() {
    let mut node = WizardNode::new("Level", "double", "");
    node.set_data(DataValue::Double(0.5));

    let wrong_version = r#"<wizardNode version="Something Else" name="X" type="int"/>"#;
    assert!(matches!(
        node.load_xml(wrong_version),
        Err(WizardError::UnsupportedVersion(_))
    ));

    let missing_type = r#"<wizardNode version="Wizard Node Version 3.0" name="X"/>"#;
    assert!(matches!(
        node.load_xml(missing_type),
        Err(WizardError::MissingAttribute("type"))
    ));

    let bad_value = r#"<wizardNode version="Wizard Node Version 3.0" name="X" originalType="int" type="int">
  <validType>int</validType>
  <value>twelve</value>
</wizardNode>"#;
    assert!(matches!(
        node.load_xml(bad_value),
        Err(WizardError::InvalidValue { .. })
    ));

    assert_eq!(node.name(), "Level");
    assert_eq!(node.data(), Some(&DataValue::Double(0.5)));
}

#[test]
fn test_load_xml_notifies_restored() {
    let source = {
        let mut node = WizardNode::new("Level", "float", "");
        node.set_data(DataValue::Float(2.5));
        node.to_xml().unwrap()
    };

    let mut node = WizardNode::new("Other", "int", "");
    let (events, callback) = recorder::<NodeEvent>();
    node.attach(callback);
    node.load_xml(&source).unwrap();

    assert_eq!(node.name(), "Level");
    assert_eq!(node.data(), Some(&DataValue::Float(2.5)));
    assert_eq!(*events.borrow(), vec![NodeEvent::Restored]);
}
