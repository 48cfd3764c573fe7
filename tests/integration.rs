//! End-to-end tests: a saved wizard is loaded, executed item by item and recorded
//! in a message log.
mod common;
use common::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;
use wizflow::prelude::*;

/// Records each item as a step and pushes output values along connections.
fn run_wizard(graph: &mut WizardGraph, log: &mut MessageLog) -> bool {
    let wizard = log.create_step(&format!("Wizard: {}", graph.name()), "test", "", true);
    let items: Vec<ItemId> = graph.items().map(|(id, _)| id).collect();

    for item in items {
        let (name, kind, inputs, outputs) = {
            let item = graph.item(item).unwrap();
            (
                item.name().to_string(),
                item.kind().to_string(),
                item.inputs().to_vec(),
                item.outputs().to_vec(),
            )
        };
        let step = log.create_step(&name, &kind, "", true);

        for input in inputs {
            let node = graph.node(input).unwrap();
            match node.data() {
                Some(value) => {
                    log.add_property(&step, node.name(), value.clone());
                }
                None => {
                    let reason = format!("input '{}' has no value", node.name());
                    log.finalize(&step, StepResult::Failure, &reason);
                    log.finalize(&wizard, StepResult::Abort, &reason);
                    return false;
                }
            }
        }
        for output in outputs {
            let Some(value) = graph.node(output).unwrap().data().cloned() else {
                continue;
            };
            for peer in graph.connected_nodes(output) {
                graph.node_mut(peer).unwrap().set_data(value.clone());
            }
        }
        log.finalize(&step, StepResult::Success, "");
    }

    log.finalize(&wizard, StepResult::Success, "");
    true
}

#[test]
fn test_simple_wizard_runs_to_completion() {
    let definition = WizardDefinition::from_json(SIMPLE_WIZARD_JSON).unwrap();
    let mut graph = WizardGraph::from_definition(&definition).unwrap();
    let journal = SharedBuffer::new();
    let mut log = MessageLog::builder("Run").with_journal_writer(journal.clone()).build();

    assert!(run_wizard(&mut graph, &mut log));

    let filter = graph.find_item("Filter").unwrap();
    let image_in = graph.find_node(filter, Direction::Input, "Image").unwrap();
    assert_eq!(
        graph.node(image_in).unwrap().data(),
        Some(&DataValue::Filename(Filename::new("/data/scene.tif")))
    );

    let filter_step = log.find(&IdChain::parse("1.2").unwrap()).unwrap();
    assert_eq!(filter_step.action(), "Filter");
    assert_eq!(filter_step.result(), StepResult::Success);
    assert_eq!(
        filter_step.message().property("Level"),
        Some(&DataValue::Double(0.75))
    );

    let document = log.close().unwrap();
    assert!(document.contains(r#"name="Wizard: Threshold Scene""#));
    assert!(document.contains(r#"<property name="Image" type="Filename" value="/data/scene.tif"/>"#));
    assert!(journal.lines().contains(&"Run - FINALIZED Step[1] Success".to_string()));
}

#[test]
fn test_missing_input_aborts_the_wizard() {
    let definition = WizardDefinition::from_json(SIMPLE_WIZARD_JSON).unwrap();
    let mut graph = WizardGraph::from_definition(&definition).unwrap();
    graph.disconnect("Reader", "Image", "Filter", "Image").unwrap();
    let journal = SharedBuffer::new();
    let mut log = MessageLog::builder("Run").with_journal_writer(journal.clone()).build();

    assert!(!run_wizard(&mut graph, &mut log));

    let wizard = log.find(&IdChain::parse("1").unwrap()).unwrap();
    assert_eq!(wizard.result(), StepResult::Abort);
    assert_eq!(wizard.failure_message(), "input 'Image' has no value");
    let filter_step = log.find(&IdChain::parse("1.2").unwrap()).unwrap();
    assert_eq!(filter_step.result(), StepResult::Failure);
    drop(log);

    assert!(journal
        .lines()
        .contains(&"Run - FINALIZED Step[1.2] Failure[input 'Image' has no value]".to_string()));
    assert!(journal.lines().contains(&"Run - FINALIZED Step[1] Abort".to_string()));
}

#[test]
fn test_definition_file_and_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let wizard_path = dir.path().join("wizard.json");
    fs::write(&wizard_path, SIMPLE_WIZARD_JSON).unwrap();
    let config_path = dir.path().join("wizflow.toml");
    fs::write(
        &config_path,
        format!(
            "[log]\nname = \"nightly\"\ndirectory = {:?}\nbatch = true\n",
            dir.path().display().to_string()
        ),
    )
    .unwrap();

    let definition = WizardDefinition::from_file(&wizard_path).unwrap();
    assert_eq!(definition.items.len(), 2);

    let config = Config::from_file(&config_path).unwrap();
    assert_eq!(config.log.name, "nightly");
    assert_eq!(config.log.directory, Some(PathBuf::from(dir.path())));
    assert_eq!(config.log.journal, None);
    assert!(config.log.batch);

    let mut graph = WizardGraph::from_definition(&definition).unwrap();
    let mut log = MessageLogBuilder::from_config(&config.log).build();
    let log_path = log.path().unwrap().to_path_buf();
    assert_eq!(log_path.parent(), Some(dir.path()));
    assert!(run_wizard(&mut graph, &mut log));
    let document = log.close().unwrap();
    assert_eq!(fs::read_to_string(&log_path).unwrap(), document);
}

#[test]
fn test_config_defaults_and_errors() {
    let config = Config::from_toml_str("").unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.log.name, "wizflow");
    assert!(!config.log.batch);

    let round_trip = Config::from_toml_str(&config.to_toml_string().unwrap()).unwrap();
    assert_eq!(round_trip, config);

    assert!(matches!(
        Config::from_toml_str("[log]\nbatch = \"yes\""),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        Config::from_file("/nonexistent/wizflow.toml"),
        Err(ConfigError::Read { .. })
    ));
}
