use std::collections::HashMap;

use crate::agents::SignalDecision;
use crate::error::SimulationError;
use crate::network::corridor::shortest_corridor;
use crate::network::intersection::{Approach, IntersectionId, SignalPhase};
use crate::network::TrafficNetwork;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleStatus {
    EnRoute,
    Arrived,
}

/// An emergency vehicle traversing its corridor, one intersection per tick
/// when the road ahead is clear.
#[derive(Debug, Clone)]
pub struct EmergencyVehicle {
    pub id: u64,
    /// Ordered intersections from origin to destination, both inclusive.
    pub corridor: Vec<IntersectionId>,
    /// Index into `corridor`; equal to its length once arrived.
    pub position: usize,
    pub status: VehicleStatus,
    pub dispatched_at: u64,
    pub arrived_at: Option<u64>,
}

impl EmergencyVehicle {
    /// The intersection the vehicle currently occupies, while en route.
    pub fn current_intersection(&self) -> Option<IntersectionId> {
        self.corridor.get(self.position).copied()
    }

    pub fn transit_ticks(&self) -> Option<u64> {
        self.arrived_at.map(|t| t - self.dispatched_at)
    }
}

/// Dispatches emergency vehicles and preempts signal decisions along their
/// corridors. Overrides run last in the tick pipeline, so they win over both
/// local and zone decisions.
#[derive(Debug, Default)]
pub struct EmergencyResponseAgent {
    next_vehicle_id: u64,
    active: Vec<EmergencyVehicle>,
    completed: Vec<EmergencyVehicle>,
}

impl EmergencyResponseAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_vehicles(&self) -> &[EmergencyVehicle] {
        &self.active
    }

    pub fn completed_vehicles(&self) -> &[EmergencyVehicle] {
        &self.completed
    }

    /// Creates a vehicle with the shortest-hop corridor from `origin` to
    /// `destination`.
    ///
    /// Both endpoints are validated before anything is mutated: an unknown
    /// intersection fails with `InvalidRoute` and leaves the agent, the
    /// network and the ledger untouched.
    pub fn dispatch(
        &mut self,
        tick: u64,
        origin: IntersectionId,
        destination: IntersectionId,
        network: &TrafficNetwork,
    ) -> Result<u64, SimulationError> {
        if !network.contains(&origin) {
            return Err(SimulationError::InvalidRoute(origin));
        }
        if !network.contains(&destination) {
            return Err(SimulationError::InvalidRoute(destination));
        }
        let corridor = shortest_corridor(network, origin, destination)
            .ok_or(SimulationError::InvalidRoute(destination))?;

        let id = self.next_vehicle_id;
        self.next_vehicle_id += 1;
        log::info!(
            "dispatched emergency vehicle {} at tick {}: corridor {:?}",
            id,
            tick,
            corridor
        );
        self.active.push(EmergencyVehicle {
            id,
            corridor,
            position: 0,
            status: VehicleStatus::EnRoute,
            dispatched_at: tick,
            arrived_at: None,
        });
        Ok(id)
    }

    /// Forces the phase serving each en-route vehicle's approach at its
    /// current corridor intersection, marking the decision as priority.
    pub fn apply_overrides(&self, decisions: &mut HashMap<IntersectionId, SignalDecision>) {
        for vehicle in &self.active {
            let Some(at) = vehicle.current_intersection() else {
                continue;
            };
            let phase = required_phase(&vehicle.corridor, vehicle.position);
            let decision = decisions
                .entry(at)
                .or_insert_with(|| SignalDecision::new(at, phase));
            decision.phase = phase;
            decision.priority = true;
        }
    }

    /// Moves each vehicle one corridor position forward if the approach
    /// queue at the next intersection is within the clearance threshold,
    /// else holds it (the override is simply re-applied next tick).
    ///
    /// `now` is the tick boundary being crossed; a vehicle stepping past the
    /// end of its corridor arrives at `now`. Returns the vehicles that
    /// arrived this tick.
    pub fn advance_vehicles(
        &mut self,
        now: u64,
        network: &TrafficNetwork,
        clearance_threshold: u32,
    ) -> Vec<EmergencyVehicle> {
        let mut arrived = Vec::new();
        for vehicle in &mut self.active {
            let next = vehicle.position + 1;
            if next < vehicle.corridor.len() {
                let next_id = vehicle.corridor[next];
                let approach = approach_into(vehicle.corridor[vehicle.position], next_id);
                let queue_ahead = network
                    .get(&next_id)
                    .map(|i| i.queue(approach))
                    .unwrap_or(0);
                if queue_ahead > clearance_threshold {
                    // Backpressure: wait a tick, the override re-applies.
                    log::debug!(
                        "vehicle {} held at {:?}: queue {} ahead at {:?}",
                        vehicle.id,
                        vehicle.corridor[vehicle.position],
                        queue_ahead,
                        next_id
                    );
                    continue;
                }
                vehicle.position = next;
            } else {
                vehicle.position = vehicle.corridor.len();
                vehicle.status = VehicleStatus::Arrived;
                vehicle.arrived_at = Some(now);
                log::info!(
                    "emergency vehicle {} arrived at tick {} ({} ticks in transit)",
                    vehicle.id,
                    now,
                    now - vehicle.dispatched_at
                );
                arrived.push(vehicle.clone());
            }
        }
        self.active.retain(|v| v.status == VehicleStatus::EnRoute);
        self.completed.extend(arrived.iter().cloned());
        arrived
    }
}

/// The phase an override must force at corridor position `pos`: the one
/// serving the vehicle's travel axis. The origin uses the outgoing hop since
/// there is no incoming one.
fn required_phase(corridor: &[IntersectionId], pos: usize) -> SignalPhase {
    let (from, to) = if pos == 0 {
        match corridor.get(1) {
            Some(&next) => (corridor[0], next),
            None => return SignalPhase::NsGreen,
        }
    } else {
        (corridor[pos - 1], corridor[pos])
    };
    if from.0 != to.0 {
        SignalPhase::NsGreen
    } else {
        SignalPhase::EwGreen
    }
}

/// The approach an arriving vehicle occupies at `to` when coming from
/// `from`: the compass direction of `from` relative to `to`.
fn approach_into(from: IntersectionId, to: IntersectionId) -> Approach {
    if from.0 < to.0 {
        Approach::North
    } else if from.0 > to.0 {
        Approach::South
    } else if from.1 < to.1 {
        Approach::West
    } else {
        Approach::East
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn dispatch_unknown_destination_fails_without_mutation() {
        let network = TrafficNetwork::grid(1, 2, 2);
        let mut agent = EmergencyResponseAgent::new();
        let err = agent
            .dispatch(0, IntersectionId(0, 0), IntersectionId(9, 9), &network)
            .unwrap_err();
        assert!(matches!(err, SimulationError::InvalidRoute(id) if id == IntersectionId(9, 9)));
        assert!(agent.active_vehicles().is_empty());
        assert!(agent.completed_vehicles().is_empty());
    }

    #[test]
    fn dispatch_unknown_origin_fails() {
        let network = TrafficNetwork::grid(1, 2, 2);
        let mut agent = EmergencyResponseAgent::new();
        assert!(agent
            .dispatch(0, IntersectionId(-3, 0), IntersectionId(1, 1), &network)
            .is_err());
    }

    #[test]
    fn dispatch_validation_is_idempotent() {
        let network = TrafficNetwork::grid(1, 2, 2);
        let mut agent = EmergencyResponseAgent::new();
        for _ in 0..3 {
            assert!(agent
                .dispatch(0, IntersectionId(0, 0), IntersectionId(9, 9), &network)
                .is_err());
        }
        assert!(agent.active_vehicles().is_empty());
        // Ids are not burned on failed dispatches.
        let id = agent
            .dispatch(0, IntersectionId(0, 0), IntersectionId(1, 1), &network)
            .unwrap();
        assert_eq!(id, 0);
    }

    #[test]
    fn override_forces_travel_axis_phase() {
        let network = TrafficNetwork::grid(1, 1, 3);
        let mut agent = EmergencyResponseAgent::new();
        agent
            .dispatch(0, IntersectionId(0, 0), IntersectionId(0, 2), &network)
            .unwrap();

        let mut decisions: HashMap<IntersectionId, SignalDecision> = network
            .intersection_ids()
            .into_iter()
            .map(|id| (id, SignalDecision::new(id, SignalPhase::NsGreen)))
            .collect();
        agent.apply_overrides(&mut decisions);

        let at_origin = decisions[&IntersectionId(0, 0)];
        assert_eq!(at_origin.phase, SignalPhase::EwGreen);
        assert!(at_origin.priority);
        // Other intersections untouched.
        assert!(!decisions[&IntersectionId(0, 1)].priority);
    }

    #[test]
    fn vehicle_advances_one_hop_per_tick_when_clear() {
        let network = TrafficNetwork::grid(1, 1, 3);
        let mut agent = EmergencyResponseAgent::new();
        agent
            .dispatch(0, IntersectionId(0, 0), IntersectionId(0, 2), &network)
            .unwrap();

        assert!(agent.advance_vehicles(1, &network, 0).is_empty());
        assert_eq!(agent.active_vehicles()[0].position, 1);
        assert!(agent.advance_vehicles(2, &network, 0).is_empty());
        let arrived = agent.advance_vehicles(3, &network, 0);
        assert_eq!(arrived.len(), 1);
        assert_eq!(arrived[0].status, VehicleStatus::Arrived);
        assert_eq!(arrived[0].transit_ticks(), Some(3));
        assert!(agent.active_vehicles().is_empty());
        assert_eq!(agent.completed_vehicles().len(), 1);
    }

    #[test]
    fn congested_approach_holds_the_vehicle() {
        let mut network = TrafficNetwork::grid(1, 1, 3);
        let mut agent = EmergencyResponseAgent::new();
        agent
            .dispatch(0, IntersectionId(0, 0), IntersectionId(0, 2), &network)
            .unwrap();

        // Pile up the west approach at the next corridor intersection.
        let arrivals: HashMap<Approach, u32> = [(Approach::West, 10)].into_iter().collect();
        network
            .get_mut(&IntersectionId(0, 1))
            .unwrap()
            .advance(&arrivals);

        agent.advance_vehicles(1, &network, 4);
        assert_eq!(agent.active_vehicles()[0].position, 0);

        // Queue drained below the threshold: the vehicle moves again.
        network
            .get_mut(&IntersectionId(0, 1))
            .unwrap()
            .apply_phase(SignalPhase::EwGreen, 8);
        agent.advance_vehicles(2, &network, 4);
        assert_eq!(agent.active_vehicles()[0].position, 1);
    }

    #[test]
    fn approach_into_matches_compass() {
        assert_eq!(
            approach_into(IntersectionId(0, 0), IntersectionId(1, 0)),
            Approach::North
        );
        assert_eq!(
            approach_into(IntersectionId(1, 0), IntersectionId(0, 0)),
            Approach::South
        );
        assert_eq!(
            approach_into(IntersectionId(0, 0), IntersectionId(0, 1)),
            Approach::West
        );
        assert_eq!(
            approach_into(IntersectionId(0, 1), IntersectionId(0, 0)),
            Approach::East
        );
    }
}
