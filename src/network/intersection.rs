use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::network::zone::ZoneId;

/// Grid coordinate identifier for an intersection (row, col).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct IntersectionId(pub i8, pub i8);

/// Incoming lane identifier: the compass direction traffic arrives from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Approach {
    North,
    South,
    East,
    West,
}

impl Approach {
    pub const ALL: [Approach; 4] = [
        Approach::North,
        Approach::South,
        Approach::East,
        Approach::West,
    ];

    /// Parses the lane column of a dataset row.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "north" | "n" => Some(Approach::North),
            "south" | "s" => Some(Approach::South),
            "east" | "e" => Some(Approach::East),
            "west" | "w" => Some(Approach::West),
            _ => None,
        }
    }
}

/// The set of approaches currently granted green at an intersection.
/// Exactly one phase is active at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalPhase {
    NsGreen,
    EwGreen,
    AllRed,
}

impl SignalPhase {
    /// Whether this phase grants green to the given approach.
    pub fn serves(&self, approach: Approach) -> bool {
        match self {
            SignalPhase::NsGreen => matches!(approach, Approach::North | Approach::South),
            SignalPhase::EwGreen => matches!(approach, Approach::East | Approach::West),
            SignalPhase::AllRed => false,
        }
    }
}

/// One intersection: static identity plus the mutable per-tick traffic state.
///
/// Queues are vehicle counts per incoming approach. Only the simulation
/// engine mutates this struct; agents get read-only views.
#[derive(Debug, Clone)]
pub struct Intersection {
    pub id: IntersectionId,
    /// Zone this intersection belongs to. Back-reference only; the zone does
    /// not own the intersection.
    pub zone: ZoneId,
    /// Queue length per incoming approach.
    queues: HashMap<Approach, u32>,
    /// Currently active phase.
    phase: SignalPhase,
    /// Ticks the current phase has been active.
    phase_elapsed: u64,
    /// Adjacent intersections (graph edges for corridor planning).
    pub connected: Vec<IntersectionId>,
}

impl Intersection {
    pub fn new(id: IntersectionId, zone: ZoneId, connected: Vec<IntersectionId>) -> Self {
        let queues = Approach::ALL.iter().map(|&a| (a, 0)).collect();
        Self {
            id,
            zone,
            queues,
            phase: SignalPhase::AllRed,
            phase_elapsed: 0,
            connected,
        }
    }

    pub fn phase(&self) -> SignalPhase {
        self.phase
    }

    pub fn phase_elapsed(&self) -> u64 {
        self.phase_elapsed
    }

    pub fn queue(&self, approach: Approach) -> u32 {
        self.queues.get(&approach).copied().unwrap_or(0)
    }

    /// Total queued vehicles across all approaches; the per-tick proxy for
    /// aggregate wait time at this intersection.
    pub fn wait_time_snapshot(&self) -> u32 {
        self.queues.values().sum()
    }

    /// Demand for a phase: sum of queues on the approaches it serves.
    pub fn demand(&self, phase: SignalPhase) -> u32 {
        Approach::ALL
            .iter()
            .filter(|&&a| phase.serves(a))
            .map(|&a| self.queue(a))
            .sum()
    }

    /// Adds this tick's arrivals to the approach queues.
    pub fn advance(&mut self, arrivals: &HashMap<Approach, u32>) {
        for (&approach, &count) in arrivals {
            *self.queues.entry(approach).or_insert(0) += count;
        }
    }

    /// Applies the final phase for this tick and drains green approaches by
    /// up to `drain_rate` vehicles each. Queues never go negative.
    ///
    /// Switching phases resets the elapsed counter to 1 (the new phase has
    /// been active for this tick); repeating increments it.
    pub fn apply_phase(&mut self, phase: SignalPhase, drain_rate: u32) {
        if phase == self.phase {
            self.phase_elapsed += 1;
        } else {
            self.phase = phase;
            self.phase_elapsed = 1;
        }
        for approach in Approach::ALL {
            if phase.serves(approach) {
                if let Some(q) = self.queues.get_mut(&approach) {
                    *q = q.saturating_sub(drain_rate);
                }
            }
        }
    }
}
