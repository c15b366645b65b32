//! Mediation Simulator - Deterministic scenarios for the correlation engine
//!
//! Usage:
//!   mediation_sim --components 3 --scenario correlated
//!   mediation_sim --components 3 --scenario uncorrelated
//!   mediation_sim --components 3 --scenario steady
//!
//! Wires an in-memory host runtime to the correlation engine, runs scripted
//! sensor-failure scenarios, and writes machine-readable JSON reports to
//! ./artifacts/simulations/

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use serde::Serialize;
use serde_json::{json, Value};

use mediant_common::{
    AdmissionPredicate, Component, ComponentId, ComponentManager, ConnectorManager,
    CorrelationConfig, DistanceClass, DynamicConnector, KnowledgeMetadata, KnowledgeWrapper,
    LabelPair, MediatedKnowledge, MediationError, PortKind,
};
use mediant_engine::{CorrelationManager, MapeAdaptation};

// ============================================================================
// IN-MEMORY HOST RUNTIME (standalone; the sim owns its own implementations)
// ============================================================================

struct SimComponent {
    id: ComponentId,
    knowledge: RefCell<BTreeMap<String, KnowledgeWrapper>>,
    faulty: RefCell<BTreeSet<String>>,
    ports: RefCell<Vec<(Vec<String>, PortKind)>>,
}

impl SimComponent {
    fn new(id: String) -> Rc<Self> {
        Rc::new(Self {
            id: ComponentId::new(id),
            knowledge: RefCell::new(BTreeMap::new()),
            faulty: RefCell::new(BTreeSet::new()),
            ports: RefCell::new(Vec::new()),
        })
    }

    fn publish(&self, field: &str, value: Value, timestamp: u64) {
        let mut wrapper = KnowledgeWrapper::new(field, value, timestamp);
        if self.faulty.borrow().contains(field) {
            wrapper.fault();
        }
        self.knowledge.borrow_mut().insert(field.to_string(), wrapper);
    }

    fn break_sensor(&self, field: &str) {
        self.faulty.borrow_mut().insert(field.to_string());
        if let Some(wrapper) = self.knowledge.borrow_mut().get_mut(field) {
            wrapper.fault();
        }
    }
}

impl Component for SimComponent {
    fn id(&self) -> ComponentId {
        self.id.clone()
    }

    fn knowledge(&self) -> BTreeMap<String, KnowledgeWrapper> {
        self.knowledge.borrow().clone()
    }

    fn faulty_knowledge(&self) -> BTreeSet<String> {
        self.faulty.borrow().clone()
    }

    fn add_port(&self, fields: &[String], kind: PortKind) -> Result<(), MediationError> {
        self.ports.borrow_mut().push((fields.to_vec(), kind));
        Ok(())
    }
}

struct SimComponentManager {
    components: Vec<Rc<SimComponent>>,
}

impl ComponentManager for SimComponentManager {
    fn components(&self) -> Vec<Rc<dyn Component>> {
        self.components
            .iter()
            .map(|c| Rc::clone(c) as Rc<dyn Component>)
            .collect()
    }
}

struct SimConnector {
    mediated: MediatedKnowledge,
    _predicate: AdmissionPredicate,
    ports: RefCell<Vec<(Vec<String>, PortKind)>>,
}

impl DynamicConnector for SimConnector {
    fn name(&self) -> String {
        self.mediated.name()
    }

    fn add_port(&self, fields: &[String], kind: PortKind) -> Result<(), MediationError> {
        self.ports.borrow_mut().push((fields.to_vec(), kind));
        Ok(())
    }
}

#[derive(Default)]
struct SimConnectorManager {
    connectors: RefCell<BTreeMap<String, Rc<SimConnector>>>,
    deploys: Cell<usize>,
    removals: Cell<usize>,
}

impl ConnectorManager for SimConnectorManager {
    fn connectors(&self) -> Vec<Rc<dyn DynamicConnector>> {
        self.connectors
            .borrow()
            .values()
            .map(|c| Rc::clone(c) as Rc<dyn DynamicConnector>)
            .collect()
    }

    fn add_connector(
        &self,
        filter: AdmissionPredicate,
        mediated_knowledge: MediatedKnowledge,
    ) -> Result<Rc<dyn DynamicConnector>, MediationError> {
        let connector = Rc::new(SimConnector {
            mediated: mediated_knowledge,
            _predicate: filter,
            ports: RefCell::new(Vec::new()),
        });
        self.connectors
            .borrow_mut()
            .insert(connector.name(), Rc::clone(&connector));
        self.deploys.set(self.deploys.get() + 1);
        Ok(connector)
    }

    fn remove_connector(&self, name: &str) -> Result<bool, MediationError> {
        let removed = self.connectors.borrow_mut().remove(name).is_some();
        if removed {
            self.removals.set(self.removals.get() + 1);
        }
        Ok(removed)
    }
}

/// Scalar domain metric: distance is |a - b|; temperatures within 1.0 of
/// each other count as Close.
struct ScalarMetadata;

impl KnowledgeMetadata for ScalarMetadata {
    fn distance(&self, _label: &str, a: &Value, b: &Value) -> f64 {
        (a.as_f64().unwrap_or(f64::NAN) - b.as_f64().unwrap_or(f64::NAN)).abs()
    }

    fn classify_distance(&self, label: &str, a: &Value, b: &Value) -> DistanceClass {
        if self.distance(label, a, b) <= 1.0 {
            DistanceClass::Close
        } else {
            DistanceClass::Far
        }
    }

    fn confidence_level(&self, _label: &str) -> f64 {
        0.75
    }
}

// ============================================================================
// SIMULATOR LOGIC
// ============================================================================

#[derive(Debug, Serialize)]
struct SimulationReport {
    scenario: String,
    component_count: usize,
    rounds: usize,
    failure_round: usize,
    boundary: Option<f64>,
    connectors_deployed: usize,
    connectors_retracted: usize,
    active_connectors: Vec<String>,
    ports_granted: usize,
    success: bool,
    notes: String,
}

struct Simulation {
    components: Vec<Rc<SimComponent>>,
    connector_manager: Rc<SimConnectorManager>,
    engine: CorrelationManager,
}

fn build_simulation(component_count: usize) -> Simulation {
    let components: Vec<Rc<SimComponent>> = (0..component_count)
        .map(|i| SimComponent::new(format!("hub_{i:03}")))
        .collect();
    let connector_manager = Rc::new(SimConnectorManager::default());
    let component_manager = Rc::new(SimComponentManager {
        components: components.clone(),
    });

    let engine = CorrelationManager::new(
        CorrelationConfig {
            verbose: true,
            ..Default::default()
        },
        component_manager,
        Rc::clone(&connector_manager) as Rc<dyn ConnectorManager>,
        Rc::new(ScalarMetadata),
    )
    .expect("default configuration is valid");

    Simulation {
        components,
        connector_manager,
        engine,
    }
}

/// Publish one round of telemetry. Positions drift slowly along a line; in
/// the correlated case nearby hubs report similar temperatures, in the
/// uncorrelated case every hub reports its own unrelated temperature.
fn publish_round(components: &[Rc<SimComponent>], round: usize, correlated: bool) {
    let timestamp = round as u64 * 1000 + 100;
    for (i, component) in components.iter().enumerate() {
        let pos = i as f64 * 2.0 + round as f64 * 0.01;
        let temp = if correlated {
            20.0 + pos * 0.1
        } else {
            20.0 + i as f64 * 7.0 + round as f64 * 0.5
        };
        component.publish("pos", json!(pos), timestamp);
        component.publish("temp", json!(temp), timestamp);
    }
}

fn run_round(engine: &mut CorrelationManager) {
    engine.monitor();
    if engine.analyze() {
        engine.plan();
        engine.execute();
    }
}

fn run_scenario(scenario: &str, component_count: usize) -> SimulationReport {
    let correlated = scenario != "uncorrelated";
    let warmup_rounds = 5;
    let total_rounds = if scenario == "steady" { 12 } else { 7 };

    let mut sim = build_simulation(component_count);
    for round in 0..total_rounds {
        publish_round(&sim.components, round, correlated);
        if round == warmup_rounds {
            sim.components[0].break_sensor("temp");
        }
        // A second failure later on re-triggers planning; the re-planned
        // boundary is unchanged, so the steady scenario must show no churn.
        if scenario == "steady" && round == warmup_rounds + 3 {
            sim.components[1].break_sensor("temp");
        }
        run_round(&mut sim.engine);
    }

    let labels = LabelPair::new("pos", "temp");
    let boundary = sim
        .engine
        .boundaries()
        .get(&labels)
        .map(|holder| holder.value())
        .filter(|value| !value.is_nan());

    let active_connectors: Vec<String> = sim
        .connector_manager
        .connectors()
        .iter()
        .map(|c| c.name())
        .collect();
    let ports_granted: usize = sim
        .components
        .iter()
        .map(|c| c.ports.borrow().len())
        .sum();
    let deploys = sim.connector_manager.deploys.get();
    let removals = sim.connector_manager.removals.get();

    let (success, notes) = match scenario {
        "correlated" => (
            boundary.is_some() && active_connectors.contains(&"pos_temp".to_string()),
            "Correlated telemetry: the failed temp sensor is mediated through \
             a pos-bounded connector."
                .to_string(),
        ),
        "uncorrelated" => (
            boundary.is_none() && active_connectors.is_empty() && deploys == 0,
            "Uncorrelated telemetry: no distance radius meets the confidence \
             level, so no mediation is deployed."
                .to_string(),
        ),
        "steady" => (
            deploys == 1 && active_connectors.len() == 1,
            format!(
                "Steady state: {deploys} deployment(s) across {total_rounds} rounds; \
                 unchanged boundaries cause no connector churn."
            ),
        ),
        _ => unreachable!("scenario validated in main"),
    };

    SimulationReport {
        scenario: scenario.to_string(),
        component_count,
        rounds: total_rounds,
        failure_round: warmup_rounds,
        boundary,
        connectors_deployed: deploys,
        connectors_retracted: removals,
        active_connectors,
        ports_granted,
        success,
        notes,
    }
}

// ============================================================================
// MAIN
// ============================================================================

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut component_count = 3;
    let mut scenario = "correlated".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--components" => {
                if i + 1 < args.len() {
                    component_count = args[i + 1].parse().unwrap_or(3);
                    i += 2;
                } else {
                    eprintln!("Error: --components requires a value");
                    std::process::exit(1);
                }
            }
            "--scenario" => {
                if i + 1 < args.len() {
                    scenario = args[i + 1].clone();
                    i += 2;
                } else {
                    eprintln!("Error: --scenario requires a value");
                    std::process::exit(1);
                }
            }
            "--help" | "-h" => {
                println!("Mediation Simulator");
                println!();
                println!("Usage:");
                println!("  mediation_sim --components <N> --scenario <scenario>");
                println!();
                println!("Options:");
                println!("  --components <N>      Number of components (2-16, default: 3)");
                println!("  --scenario <scenario> Scenario: correlated, uncorrelated, steady");
                std::process::exit(0);
            }
            _ => {
                eprintln!("Error: Unknown argument: {}", args[i]);
                eprintln!("Run with --help for usage");
                std::process::exit(1);
            }
        }
    }

    if !(2..=16).contains(&component_count) {
        eprintln!("Error: components must be between 2 and 16");
        std::process::exit(1);
    }
    if !["correlated", "uncorrelated", "steady"].contains(&scenario.as_str()) {
        eprintln!("Error: Unknown scenario: {scenario}");
        eprintln!("Valid scenarios: correlated, uncorrelated, steady");
        std::process::exit(1);
    }

    let report = run_scenario(&scenario, component_count);

    let output_dir = PathBuf::from("./artifacts/simulations");
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;
    let output_file = output_dir.join(format!("{scenario}.json"));
    let json = serde_json::to_string_pretty(&report)?;
    fs::write(&output_file, json)
        .with_context(|| format!("writing {}", output_file.display()))?;

    println!("\n=== Mediation Simulation: {scenario} ===\n");
    println!("Components:           {}", report.component_count);
    println!("Rounds:               {}", report.rounds);
    println!("Failure at round:     {}", report.failure_round);
    match report.boundary {
        Some(b) => println!("Boundary:             {b:.2}"),
        None => println!("Boundary:             N/A (correlation too weak)"),
    }
    println!("Connectors deployed:  {}", report.connectors_deployed);
    println!("Connectors retracted: {}", report.connectors_retracted);
    println!("Active connectors:    {}", report.active_connectors.join(", "));
    println!("Ports granted:        {}", report.ports_granted);
    println!("\nNotes: {}", report.notes);
    println!("\nReport saved to: {}\n", output_file.display());

    if report.success {
        Ok(())
    } else {
        std::process::exit(1);
    }
}
