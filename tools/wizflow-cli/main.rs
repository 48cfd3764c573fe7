use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use wizflow::prelude::*;

/// Runs a saved wizard unattended and prints its execution log
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the wizard definition JSON file
    wizard_path: PathBuf,

    /// TOML configuration file with a [log] table
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for the backing .log file (overrides the configuration)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// File the live text journal is appended to (overrides the configuration)
    #[arg(long)]
    journal: Option<PathBuf>,

    /// Print every node as a wizardNode element after execution
    #[arg(long)]
    dump_nodes: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let total_start = Instant::now();

    // --- 1. Configuration ---
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load configuration: {}", e))),
        None => Config::default(),
    };
    if cli.log_dir.is_some() {
        config.log.directory = cli.log_dir.clone();
    }
    if cli.journal.is_some() {
        config.log.journal = cli.journal.clone();
    }
    config.log.batch = true;

    // --- 2. Wizard ---
    let definition = WizardDefinition::from_file(&cli.wizard_path)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    let mut graph = WizardGraph::from_definition(&definition)
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid wizard: {}", e)));
    tracing::info!(
        wizard = graph.name(),
        items = graph.item_count(),
        connections = graph.connections().count(),
        "wizard loaded"
    );

    // --- 3. Execution ---
    let mut log = MessageLogBuilder::from_config(&config.log).build();
    let succeeded = execute(&mut graph, &mut log);

    if cli.dump_nodes {
        dump_nodes(&graph);
    }

    // --- 4. Final document ---
    let document = log
        .close()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to write the log: {}", e)));
    println!("{}", document);
    tracing::info!(elapsed = ?total_start.elapsed(), succeeded, "wizard finished");

    if !succeeded {
        std::process::exit(1);
    }
}

/// Runs every item in order, one step per item under a step for the whole wizard.
/// Stops at the first failing item and aborts the wizard step.
fn execute(graph: &mut WizardGraph, log: &mut MessageLog) -> bool {
    let wizard_step = log.create_step(
        &format!("Wizard: {}", graph.name()),
        "wizflow",
        &MessageLog::new_key(),
        true,
    );

    let items: Vec<ItemId> = graph.items().map(|(id, _)| id).collect();
    for item in items {
        if let Err(reason) = run_item(graph, log, item) {
            let name = graph.item(item).map(|i| i.name().to_string()).unwrap_or_default();
            log.finalize(
                &wizard_step,
                StepResult::Abort,
                &format!("item '{}' failed: {}", name, reason),
            );
            return false;
        }
    }

    log.finalize(&wizard_step, StepResult::Success, "");
    true
}

fn run_item(graph: &mut WizardGraph, log: &mut MessageLog, item: ItemId) -> std::result::Result<(), String> {
    let Some(wizard_item) = graph.item(item) else {
        return Err("item no longer exists".to_string());
    };
    let inputs = wizard_item.inputs().to_vec();
    let outputs = wizard_item.outputs().to_vec();
    let step = log.create_step(wizard_item.name(), wizard_item.kind(), "", true);
    log.add_property(&step, "Batch", wizard_item.batch());

    // Every input must hold a value, either preset or pushed by an upstream item.
    for node_id in inputs {
        let Some(node) = graph.node(node_id) else {
            continue;
        };
        match node.value() {
            NodeValue::Owned(value) => {
                log.add_property(&step, node.name(), value.clone());
            }
            NodeValue::External(_) => {
                log.add_property(&step, node.name(), format!("<{}>", node.node_type()));
            }
            NodeValue::Empty => {
                let reason = format!("input '{}' has no value", node.name());
                log.finalize(&step, StepResult::Failure, &reason);
                return Err(reason);
            }
        }
    }

    for node_id in outputs {
        let Some(value) = graph.node(node_id).and_then(|node| node.data().cloned()) else {
            continue;
        };
        if let Some(node) = graph.node(node_id) {
            log.add_property(&step, node.name(), value.clone());
        }
        for peer in graph.connected_nodes(node_id) {
            if let Some(target) = graph.node_mut(peer) {
                target.set_data(value.clone());
            }
        }
    }

    log.finalize(&step, StepResult::Success, "");
    Ok(())
}

fn dump_nodes(graph: &WizardGraph) {
    for (_, item) in graph.items() {
        println!("--- {} ({}) ---", item.name(), item.kind());
        for node_id in item.inputs().iter().chain(item.outputs()) {
            let Some(node) = graph.node(*node_id) else {
                continue;
            };
            match node.to_xml() {
                Ok(xml) => println!("{}", xml),
                Err(e) => eprintln!("Warning: {}", e),
            }
        }
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
