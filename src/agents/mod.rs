//! Decision agents: local signal control, zone reconciliation and emergency
//! override. Each runs as a fixed stage of the tick pipeline; none mutates
//! intersection state directly.

pub mod emergency_response;
pub mod signal_control;
pub mod zone_coordinator;

use crate::network::intersection::{Intersection, IntersectionId, SignalPhase};

/// One tick's proposed phase for one intersection.
///
/// Produced by the signal agents, adjusted by zone coordinators, possibly
/// replaced by an emergency override, then consumed by the engine. Never
/// persisted across ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalDecision {
    pub intersection: IntersectionId,
    pub phase: SignalPhase,
    /// Set when an emergency override produced this decision.
    pub priority: bool,
}

impl SignalDecision {
    pub fn new(intersection: IntersectionId, phase: SignalPhase) -> Self {
        Self {
            intersection,
            phase,
            priority: false,
        }
    }
}

/// The shared shape of a per-intersection decision policy.
pub trait Decide {
    fn decide(&self, intersection: &Intersection) -> SignalDecision;
}
