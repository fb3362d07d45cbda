use std::collections::HashMap;

use crate::agents::emergency_response::EmergencyResponseAgent;
use crate::agents::signal_control::SignalControlAgent;
use crate::agents::zone_coordinator::ZoneCoordinator;
use crate::agents::{Decide, SignalDecision};
use crate::config::{ControlMode, SimulationConfig};
use crate::data::arrivals::ArrivalSchedule;
use crate::engine::metrics::MetricsLedger;
use crate::error::SimulationError;
use crate::network::intersection::{IntersectionId, SignalPhase};
use crate::network::zone::ZoneId;
use crate::network::TrafficNetwork;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Init,
    Running,
    Finished,
}

/// Discrete time-step driver.
///
/// Runs every tick in a fixed order: inject arrivals, local signal
/// decisions, zone reconciliation, emergency dispatch and overrides, apply
/// final phases, advance emergency vehicles, record metrics. The engine is
/// the single writer of intersection state and of the ledger; agents only
/// see read-only views and return decisions.
pub struct SimulationEngine {
    config: SimulationConfig,
    network: TrafficNetwork,
    signal_agents: HashMap<IntersectionId, SignalControlAgent>,
    coordinators: Vec<ZoneCoordinator>,
    emergency: EmergencyResponseAgent,
    ledger: MetricsLedger,
    state: EngineState,
    stop_requested: bool,
    dispatch_failures: Vec<SimulationError>,
}

impl SimulationEngine {
    /// Builds an engine for the given network. The configuration is
    /// validated here; a structurally invalid config never produces an
    /// engine.
    pub fn new(network: TrafficNetwork, config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let signal_agents = network
            .intersection_ids()
            .into_iter()
            .map(|id| (id, SignalControlAgent::new(config.min_green_ticks)))
            .collect();
        let coordinators = network
            .zones()
            .iter()
            .cloned()
            .map(|zone| ZoneCoordinator::new(zone, config.fairness_threshold))
            .collect();
        Ok(Self {
            config,
            network,
            signal_agents,
            coordinators,
            emergency: EmergencyResponseAgent::new(),
            ledger: MetricsLedger::new(),
            state: EngineState::Init,
            stop_requested: false,
            dispatch_failures: Vec::new(),
        })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn network(&self) -> &TrafficNetwork {
        &self.network
    }

    /// Dispatch attempts that failed with `InvalidRoute` during the run.
    pub fn dispatch_failures(&self) -> &[SimulationError] {
        &self.dispatch_failures
    }

    /// Asks the engine to stop before the next tick. A tick in progress is
    /// never interrupted.
    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    /// Runs the simulation to completion and returns the frozen ledger.
    ///
    /// The run ends at the configured tick count, or earlier when the
    /// dataset runs out of rows. A schedule with no rows at all means no
    /// dataset collaborator is attached; the run then covers the full tick
    /// count with zero arrivals everywhere.
    pub fn run(&mut self, schedule: &ArrivalSchedule) -> Result<&MetricsLedger, SimulationError> {
        if self.state != EngineState::Init {
            return Err(SimulationError::ConfigurationError(
                "engine has already run".into(),
            ));
        }
        self.state = EngineState::Running;

        let data_limit = schedule.last_tick().map(|t| t + 1);
        for tick in 0..self.config.num_ticks {
            if self.stop_requested {
                log::info!("stop requested; ending run before tick {}", tick);
                break;
            }
            if let Some(limit) = data_limit {
                if tick >= limit {
                    log::info!("dataset exhausted at tick {}; ending run", tick);
                    break;
                }
            }
            self.step(tick, schedule);
        }

        self.state = EngineState::Finished;
        self.ledger.freeze();
        Ok(&self.ledger)
    }

    /// The frozen ledger, once the run has finished.
    pub fn ledger(&self) -> Option<&MetricsLedger> {
        if self.state == EngineState::Finished {
            Some(&self.ledger)
        } else {
            None
        }
    }

    fn step(&mut self, tick: u64, schedule: &ArrivalSchedule) {
        let ids = self.network.intersection_ids();

        // 1. Inject this tick's arrivals.
        for id in &ids {
            if let Some(arrivals) = schedule.arrivals_for(tick, *id) {
                if let Some(intersection) = self.network.get_mut(id) {
                    intersection.advance(arrivals);
                }
            }
        }

        // 2. Local decisions, one per intersection.
        let mut decisions: HashMap<IntersectionId, SignalDecision> = ids
            .iter()
            .filter_map(|id| {
                let intersection = self.network.get(id)?;
                let decision = match self.config.mode {
                    ControlMode::Adaptive => self
                        .signal_agents
                        .get(id)
                        .map(|agent| agent.decide(intersection))?,
                    ControlMode::FixedTiming => SignalDecision::new(
                        *id,
                        fixed_cycle_phase(
                            intersection.phase(),
                            intersection.phase_elapsed(),
                            self.config.min_green_ticks,
                        ),
                    ),
                };
                Some((*id, decision))
            })
            .collect();

        // 3. Zone reconciliation. Fairness is observed in both modes so the
        // baseline run produces a comparable ledger.
        let fairness: Vec<(ZoneId, f64)> = self
            .coordinators
            .iter_mut()
            .map(|c| (c.zone().id, c.observe(&self.network)))
            .collect();
        if self.config.mode == ControlMode::Adaptive {
            for coordinator in &mut self.coordinators {
                coordinator.reconcile(&self.network, &mut decisions);
            }
        }

        // 4. Scheduled dispatches, then overrides. A failed dispatch is
        // reported and the run continues without that vehicle. The baseline
        // mode still moves vehicles but never preempts signals.
        for entry in &self.config.dispatches {
            if entry.tick == tick {
                if let Err(e) =
                    self.emergency
                        .dispatch(tick, entry.origin, entry.destination, &self.network)
                {
                    log::warn!("dispatch failed: {}", e);
                    self.dispatch_failures.push(e);
                }
            }
        }
        if self.config.mode == ControlMode::Adaptive {
            self.emergency.apply_overrides(&mut decisions);
        }

        // 5. Apply the final phases; the only place intersection state
        // changes hands.
        for id in &ids {
            let Some(decision) = decisions.get(id) else {
                continue;
            };
            let phase = decision.phase;
            if let Some(intersection) = self.network.get_mut(id) {
                intersection.apply_phase(phase, self.config.drain_rate);
            }
        }

        // 6. Advance emergency vehicles across the tick boundary.
        for vehicle in self.emergency.advance_vehicles(
            tick + 1,
            &self.network,
            self.config.clearance_threshold,
        ) {
            if let Some(transit) = vehicle.transit_ticks() {
                self.ledger.record_transit(vehicle.id, transit);
            }
        }

        // 7. Append tick metrics.
        let waits: Vec<(IntersectionId, u32)> = ids
            .iter()
            .map(|id| {
                (
                    *id,
                    self.network
                        .get(id)
                        .map(|i| i.wait_time_snapshot())
                        .unwrap_or(0),
                )
            })
            .collect();
        self.ledger.record_tick(&waits, &fairness);
    }
}

/// Baseline signal policy: alternate NS/EW on the minimum-green cycle,
/// ignoring demand.
fn fixed_cycle_phase(current: SignalPhase, elapsed: u64, cycle: u64) -> SignalPhase {
    match current {
        SignalPhase::AllRed => SignalPhase::NsGreen,
        SignalPhase::NsGreen if elapsed >= cycle => SignalPhase::EwGreen,
        SignalPhase::EwGreen if elapsed >= cycle => SignalPhase::NsGreen,
        other => other,
    }
}
