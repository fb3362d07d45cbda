use std::error::Error;
use std::fs;
use std::path::Path;

use traffic_sync::config::{ControlMode, DispatchEntry, SimulationConfig};
use traffic_sync::data::arrivals::ArrivalSchedule;
use traffic_sync::engine::simulation::SimulationEngine;
use traffic_sync::network::intersection::IntersectionId;
use traffic_sync::network::TrafficNetwork;
use traffic_sync::viz::charts;

const DATASET_PATH: &str = "data/traffic.csv";

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let network = TrafficNetwork::grid(2, 4, 4);
    let schedule = if Path::new(DATASET_PATH).exists() {
        println!("Loading traffic dataset from {}", DATASET_PATH);
        ArrivalSchedule::from_csv_path(DATASET_PATH, &network)?
    } else {
        println!("No dataset at {}; generating synthetic traffic", DATASET_PATH);
        ArrivalSchedule::synthetic(&network, 120, 42)
    };

    let dispatches = vec![DispatchEntry {
        tick: 20,
        origin: IntersectionId(0, 0),
        destination: IntersectionId(3, 3),
    }];

    // Baseline first: fixed signal cycling, vehicles without preemption.
    let baseline_config = SimulationConfig {
        num_ticks: 120,
        dispatches: dispatches.clone(),
        mode: ControlMode::FixedTiming,
        ..Default::default()
    };
    let mut baseline = SimulationEngine::new(network.clone(), baseline_config)?;
    let baseline_ledger = baseline.run(&schedule)?.clone();
    println!(
        "Baseline (fixed timing): avg wait {:.2}, avg fairness {:.3}",
        baseline_ledger.average_wait(),
        baseline_ledger.average_fairness()
    );

    let adaptive_config = SimulationConfig {
        num_ticks: 120,
        dispatches,
        mode: ControlMode::Adaptive,
        ..Default::default()
    };
    let mut engine = SimulationEngine::new(network, adaptive_config)?;
    let ledger = engine.run(&schedule)?.clone();
    for failure in engine.dispatch_failures() {
        eprintln!("dispatch failed during run: {}", failure);
    }

    let summary = ledger.summary(Some(&baseline_ledger));
    println!(
        "Adaptive: avg wait {:.2}, avg fairness {:.3}",
        summary.average_wait, summary.average_fairness
    );
    if let Some(transit) = summary.average_transit {
        println!("Emergency transit: {:.1} ticks average", transit);
    }
    if let Some(pct) = summary.transit_improvement_pct {
        println!("Transit improvement over baseline: {:.1}%", pct);
    }

    charts::wait_time_chart(
        "wait_times.png",
        &[("adaptive", &ledger), ("fixed timing", &baseline_ledger)],
    )?;
    charts::fairness_chart("fairness.png", &ledger)?;
    charts::congestion_heatmap("congestion_heatmap.png", &ledger)?;

    fs::write("run_summary.json", serde_json::to_string_pretty(&summary)?)?;
    println!("Run summary saved to run_summary.json");
    Ok(())
}
