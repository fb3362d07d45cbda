//! End-to-end scenarios driving the full engine pipeline.

use traffic_sync::config::{ControlMode, DispatchEntry, SimulationConfig};
use traffic_sync::data::arrivals::ArrivalSchedule;
use traffic_sync::engine::simulation::SimulationEngine;
use traffic_sync::error::SimulationError;
use traffic_sync::network::intersection::{Approach, IntersectionId};
use traffic_sync::network::TrafficNetwork;

/// Constant light load: one vehicle per lane per tick on a two-intersection
/// zone. With drain rate 2 the queues must stay bounded and both members must
/// be treated evenly.
#[test]
fn steady_light_load_stays_bounded_and_fair() {
    let network = TrafficNetwork::grid(1, 1, 2);
    let ids = [IntersectionId(0, 0), IntersectionId(0, 1)];
    let mut schedule = ArrivalSchedule::new();
    for tick in 0..10 {
        for id in ids {
            for approach in Approach::ALL {
                schedule.insert(tick, id, approach, 1);
            }
        }
    }

    let config = SimulationConfig {
        num_ticks: 10,
        min_green_ticks: 3,
        drain_rate: 2,
        ..Default::default()
    };
    let mut engine = SimulationEngine::new(network, config).unwrap();
    let ledger = engine.run(&schedule).unwrap().clone();

    assert_eq!(ledger.ticks_recorded(), 10);
    // 4 arrivals/tick vs 4 drained/tick on the green axis: total queue can
    // oscillate but never run away.
    for series in ledger.intersection_waits().values() {
        for &wait in series {
            assert!(wait <= 16, "queue ran away: {}", wait);
        }
    }
    // Identical load at both members: near-perfect fairness throughout.
    let zone = engine.network().zones()[0].id;
    for &f in ledger.fairness_series(zone).unwrap() {
        assert!(f >= 0.95, "fairness dipped to {}", f);
    }
}

/// An emergency vehicle on an empty three-intersection corridor crosses one
/// hop per tick and arrives after three ticks.
#[test]
fn emergency_vehicle_crosses_empty_corridor_in_three_ticks() {
    let network = TrafficNetwork::grid(1, 1, 3);
    let config = SimulationConfig {
        num_ticks: 10,
        dispatches: vec![DispatchEntry {
            tick: 0,
            origin: IntersectionId(0, 0),
            destination: IntersectionId(0, 2),
        }],
        ..Default::default()
    };
    let mut engine = SimulationEngine::new(network, config).unwrap();
    let ledger = engine.run(&ArrivalSchedule::new()).unwrap();

    assert_eq!(ledger.transit_times(), &[(0, 3)]);
    assert!(engine.dispatch_failures().is_empty());
}

/// A dispatch to an intersection outside the network fails with
/// `InvalidRoute` and leaves no trace: no vehicle, no transit record, and the
/// rest of the run proceeds normally.
#[test]
fn invalid_dispatch_leaves_run_untouched() {
    let network = TrafficNetwork::grid(1, 2, 2);
    let config = SimulationConfig {
        num_ticks: 8,
        dispatches: vec![DispatchEntry {
            tick: 2,
            origin: IntersectionId(0, 0),
            destination: IntersectionId(5, 5),
        }],
        ..Default::default()
    };
    let mut engine = SimulationEngine::new(network, config).unwrap();
    let ledger = engine.run(&ArrivalSchedule::new()).unwrap();

    assert_eq!(ledger.ticks_recorded(), 8);
    assert!(ledger.transit_times().is_empty());
    assert_eq!(engine.dispatch_failures().len(), 1);
    assert!(matches!(
        engine.dispatch_failures()[0],
        SimulationError::InvalidRoute(id) if id == IntersectionId(5, 5)
    ));
}

/// Every green phase holds for at least the configured minimum before
/// switching, even under demand that flips between axes.
#[test]
fn min_green_is_respected_under_alternating_demand() {
    let network = TrafficNetwork::grid(1, 1, 1);
    let id = IntersectionId(0, 0);
    let mut schedule = ArrivalSchedule::new();
    for tick in 0..20 {
        // Demand alternates axes every tick, trying to thrash the signal.
        let approach = if tick % 2 == 0 {
            Approach::North
        } else {
            Approach::East
        };
        schedule.insert(tick, id, approach, 6);
    }

    let config = SimulationConfig {
        num_ticks: 20,
        min_green_ticks: 4,
        ..Default::default()
    };
    let mut engine = SimulationEngine::new(network, config).unwrap();
    let ledger = engine.run(&schedule).unwrap();

    assert_eq!(ledger.ticks_recorded(), 20);
    // Thrashing would show as an unbounded total queue; holding each green
    // for its minimum drains whole bursts before switching.
    let series = &ledger.intersection_waits()[&id];
    assert!(series.iter().all(|&w| w <= 120));
    // The signal served both axes by the end: neither queue monopolized it.
    let final_wait = *series.last().unwrap();
    assert!(final_wait < 6 * 20);
}

/// The adaptive controller beats the fixed-timing baseline on emergency
/// transit when the corridor is congested.
#[test]
fn adaptive_run_improves_on_baseline_transit() {
    let network = TrafficNetwork::grid(1, 1, 4);
    let dispatches = vec![DispatchEntry {
        tick: 5,
        origin: IntersectionId(0, 0),
        destination: IntersectionId(0, 3),
    }];
    // A west-bound burst congests the corridor before the dispatch. The
    // adaptive controller sees the dominant EW demand and drains it every
    // tick; fixed timing spends half its cycle on the empty NS axis, so the
    // clearance threshold holds the vehicle much longer.
    let mut schedule = ArrivalSchedule::new();
    for tick in 0..30 {
        for col in 0..4 {
            if tick < 5 {
                schedule.insert(tick, IntersectionId(0, col), Approach::West, 4);
            }
            schedule.insert(tick, IntersectionId(0, col), Approach::North, 1);
        }
    }

    let run = |mode: ControlMode| {
        let config = SimulationConfig {
            num_ticks: 30,
            dispatches: dispatches.clone(),
            mode,
            ..Default::default()
        };
        let mut engine = SimulationEngine::new(network.clone(), config).unwrap();
        engine.run(&schedule).unwrap().clone()
    };

    let baseline = run(ControlMode::FixedTiming);
    let adaptive = run(ControlMode::Adaptive);

    let adaptive_transit = adaptive.average_transit().unwrap();
    let baseline_transit = baseline.average_transit().unwrap();
    assert!(
        adaptive_transit <= baseline_transit,
        "adaptive transit {} worse than baseline {}",
        adaptive_transit,
        baseline_transit
    );
    let summary = adaptive.summary(Some(&baseline));
    assert!(summary.transit_improvement_pct.unwrap() >= 0.0);
}
