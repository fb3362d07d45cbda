use crate::agents::{Decide, SignalDecision};
use crate::network::intersection::{Intersection, SignalPhase};

/// Per-intersection signal policy. Purely local: it sees only its own
/// intersection's queues and phase.
///
/// Picks the phase with higher demand, but never switches before the
/// configured minimum green duration has elapsed, and keeps the current
/// phase on ties so the signal does not flap under symmetric load.
#[derive(Debug, Clone, Copy)]
pub struct SignalControlAgent {
    min_green_ticks: u64,
}

impl SignalControlAgent {
    pub fn new(min_green_ticks: u64) -> Self {
        Self { min_green_ticks }
    }
}

impl Decide for SignalControlAgent {
    fn decide(&self, intersection: &Intersection) -> SignalDecision {
        let current = intersection.phase();

        // A green phase younger than the minimum is repeated regardless of
        // demand. AllRed is the cold-start state and is never held.
        if current != SignalPhase::AllRed
            && intersection.phase_elapsed() < self.min_green_ticks
        {
            return SignalDecision::new(intersection.id, current);
        }

        let ns = intersection.demand(SignalPhase::NsGreen);
        let ew = intersection.demand(SignalPhase::EwGreen);

        let phase = if ns > ew {
            SignalPhase::NsGreen
        } else if ew > ns {
            SignalPhase::EwGreen
        } else if current == SignalPhase::EwGreen {
            // Equal demand: stability bias keeps the current phase.
            SignalPhase::EwGreen
        } else {
            SignalPhase::NsGreen
        };

        SignalDecision::new(intersection.id, phase)
    }
}
