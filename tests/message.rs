//! Tests for free-standing messages and steps.
mod common;
use common::*;
use pretty_assertions::assert_eq;
use wizflow::prelude::*;

fn id(text: &str) -> IdChain {
    IdChain::parse(text).unwrap()
}

#[test]
fn test_id_chain_forms() {
    let chain = id("2.1.3");
    assert_eq!(chain.segments(), [2, 1, 3]);
    assert_eq!(chain.depth(), 3);
    assert_eq!(chain.ordinal(), 3);
    assert_eq!(chain.parent(), Some(id("2.1")));
    assert_eq!(id("2").child(1).to_string(), "2.1");
    assert_eq!(chain.relative_to(&id("2")), Some([1u32, 3].as_slice()));
    assert_eq!(chain.relative_to(&id("3")), None);

    assert_eq!(IdChain::parse(""), None);
    assert_eq!(IdChain::parse("1..2"), None);
    assert_eq!(IdChain::parse("0.1"), None);
}

#[test]
fn test_finalized_message_rejects_properties() {
    let mut message = Message::new("Load", "app", "");
    assert!(message.add_property("Rows", 10i32));
    assert!(message.add_property("Rows", 12i32));
    assert_eq!(message.property("Rows"), Some(&DataValue::Int(12)));
    assert_eq!(message.result(), StepResult::Unresolved);

    assert!(message.finalize());
    assert!(!message.finalize());
    assert!(!message.add_property("Columns", 4i32));
    assert_eq!(message.properties().len(), 1);
    assert_eq!(message.result(), StepResult::Success);
}

#[test]
fn test_message_events() {
    let mut message = Message::new("Load", "app", "");
    let (events, callback) = recorder::<EntryEvent>();
    message.attach(callback);

    message.add_property("Rows", 10i32);
    message.finalize();
    message.add_property("Columns", 4i32);

    assert_eq!(
        *events.borrow(),
        vec![
            EntryEvent::Modified {
                property: "Rows".to_string()
            },
            EntryEvent::Hidden {
                result: StepResult::Success
            },
        ]
    );
}

#[test]
fn test_properties_are_ordered_by_name() {
    let mut message = Message::new("Load", "app", "");
    message.add_property("b", 2i32);
    message.add_property("a", 1i32);
    message.add_property("c", 3i32);
    let names: Vec<&str> = message.properties().names().collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn test_message_xml() {
    let stamp = DateTime::parse_rfc3339("2024-03-05T07:08:09Z").unwrap();
    let mut message = Message::new("Load", "app", "KEY-1").with_timestamp(stamp);
    message.add_property("Rows", 10i32);
    message.add_property("Source", "scene.tif");

    let xml = message.to_xml().unwrap();
    assert!(xml.contains(
        r#"<message id="1" component="app" key="KEY-1" date="05 Mar 2024" time="07:08:09 UTC" name="Load">"#
    ));
    assert!(xml.contains(r#"<property name="Rows" type="int" value="10"/>"#));
    assert!(xml.contains(r#"<property name="Source" type="string" value="scene.tif"/>"#));

    let anonymous = Message::new("Note", "", "").to_xml().unwrap();
    assert!(!anonymous.contains("component="));
    assert!(!anonymous.contains("key="));
}

#[test]
fn test_step_ids_extend_parent() {
    let mut step = Step::new("Run", "app", "");
    assert_eq!(step.add_message("First", "", "", false, true), Some(id("1.1")));
    assert_eq!(step.add_step("Inner", "", "", true), Some(id("1.2")));
    assert_eq!(step.add_message("Nested", "", "", false, true), Some(id("1.2.1")));
    assert_eq!(step.add_message("Beside", "", "", false, false), Some(id("1.3")));

    assert_eq!(step.len(), 3);
    assert_eq!(step.current_step(), Some(id("1.2")));
    let nested = step.find(&id("1.2.1")).unwrap();
    assert_eq!(nested.action(), "Nested");
    assert_eq!(nested.message().parent(), Some(&id("1.2")));
    assert_eq!(nested.kind(), EntryKind::Message);
}

#[test]
fn test_step_cascades_result_to_open_children() {
    let mut step = Step::new("Run", "app", "");
    let open = step.add_step("C1", "", "", false).unwrap();
    let done = step.add_step("C2", "", "", false).unwrap();
    let note = step.add_message("Note", "", "", false, false).unwrap();
    assert!(step.finalize_at(&done, StepResult::Success, ""));

    assert!(step.finalize(StepResult::Failure, "x"));

    let open = step.find(&open).unwrap();
    assert_eq!(open.result(), StepResult::Failure);
    assert_eq!(open.failure_message(), "x");
    let done = step.find(&done).unwrap();
    assert_eq!(done.result(), StepResult::Success);
    assert_eq!(done.failure_message(), "");
    let note = step.find(&note).unwrap();
    assert!(note.is_finalized());
    assert_eq!(note.result(), StepResult::Success);

    assert_eq!(step.result(), StepResult::Failure);
    assert_eq!(step.failure_message(), "x");
    assert!(!step.finalize(StepResult::Success, ""));
    assert_eq!(step.result(), StepResult::Failure);
}

#[test]
fn test_finalized_step_rejects_writes() {
    let mut step = Step::new("Run", "app", "");
    let child = step.add_message("Note", "", "", false, true).unwrap();
    step.finalize(StepResult::Abort, "");

    assert_eq!(step.add_message("Late", "", "", false, true), None);
    assert_eq!(step.add_step("Late", "", "", true), None);
    assert!(!step.add_property("Late", 1i32));
    assert!(!step.add_property_at(&child, "Late", 1i32));
    assert_eq!(step.current_step(), None);
}

#[test]
fn test_recursion_falls_back_when_current_step_is_finalized() {
    let mut step = Step::new("Run", "app", "");
    let inner = step.add_step("Inner", "", "", true).unwrap();
    step.finalize_at(&inner, StepResult::Success, "");

    assert_eq!(step.add_message("After", "", "", false, true), Some(id("1.2")));
    assert_eq!(step.current_step(), Some(id("1")));
}

#[test]
fn test_step_relays_child_events_while_open() {
    let mut step = Step::new("Run", "app", "");
    let (events, callback) = recorder::<EntryEvent>();
    step.attach(callback);

    let inner = step.add_step("Inner", "", "", true).unwrap();
    let note = step.add_message("Note", "", "", true, true).unwrap();
    step.add_property_at(&inner, "Count", 2i32);
    step.finalize(StepResult::Failure, "broken");
    step.add_property_at(&note, "Late", 1i32);

    assert_eq!(
        *events.borrow(),
        vec![
            EntryEvent::ChildAdded { id: inner.clone() },
            EntryEvent::ChildAdded { id: note.clone() },
            EntryEvent::ChildHidden {
                id: note.clone(),
                result: StepResult::Success
            },
            EntryEvent::ChildModified {
                id: inner.clone(),
                property: "Count".to_string()
            },
            EntryEvent::ChildHidden {
                id: inner.clone(),
                result: StepResult::Failure
            },
            EntryEvent::Hidden {
                result: StepResult::Failure
            },
        ]
    );
}

#[test]
fn test_step_xml() {
    let mut step = Step::new("Run", "app", "");
    let inner = step.add_step("Inner", "", "", true).unwrap();
    step.add_message("Note", "", "", true, true);
    step.add_property_at(&inner, "Count", 2i32);
    step.finalize(StepResult::Failure, "bad input");

    let xml = step.to_xml().unwrap();
    assert!(xml.contains(r#"<step result="Failure" failureMessage="bad input" id="1""#));
    assert!(xml.contains(r#"<step result="Failure" failureMessage="bad input" id="1.1""#));
    assert!(xml.contains(r#"<message id="1.1.1""#));
    assert!(xml.contains(r#"<property name="Count" type="int" value="2"/>"#));
}
