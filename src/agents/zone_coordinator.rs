use std::collections::{HashMap, HashSet, VecDeque};

use crate::agents::SignalDecision;
use crate::network::intersection::{IntersectionId, SignalPhase};
use crate::network::zone::Zone;
use crate::network::TrafficNetwork;

/// Rolling window of wait samples kept per zone member.
const HISTORY_CAPACITY: usize = 12;

/// One coordinator per zone. Applies a fairness correction on top of the
/// local signal decisions: a member whose normalized wait runs away from its
/// peers gets its green force-extended for one tick, and the least-loaded
/// peer is penalized for that tick so two members cannot both be extended.
///
/// Runs after local decisions and before emergency override, so emergency
/// priority always wins.
#[derive(Debug)]
pub struct ZoneCoordinator {
    zone: Zone,
    fairness_threshold: f64,
    wait_history: HashMap<IntersectionId, VecDeque<f64>>,
    /// Members that gave way this tick; cleared on the next reconcile.
    penalized: HashSet<IntersectionId>,
}

impl ZoneCoordinator {
    pub fn new(zone: Zone, fairness_threshold: f64) -> Self {
        Self {
            zone,
            fairness_threshold,
            wait_history: HashMap::new(),
            penalized: HashSet::new(),
        }
    }

    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    /// Records this tick's wait snapshot for every member and returns the
    /// zone fairness index. Called once per tick, before `reconcile`.
    pub fn observe(&mut self, network: &TrafficNetwork) -> f64 {
        for member in &self.zone.members {
            let wait = network
                .get(member)
                .map(|i| f64::from(i.wait_time_snapshot()))
                .unwrap_or(0.0);
            let history = self.wait_history.entry(*member).or_default();
            if history.len() == HISTORY_CAPACITY {
                history.pop_front();
            }
            history.push_back(wait);
        }
        self.fairness_index(network)
    }

    /// Adjusts local decisions for fairness. At most one member per zone is
    /// extended per tick, and a member penalized last tick cannot be
    /// extended this tick.
    pub fn reconcile(
        &mut self,
        network: &TrafficNetwork,
        decisions: &mut HashMap<IntersectionId, SignalDecision>,
    ) {
        let blocked = std::mem::take(&mut self.penalized);
        let waits = self.normalized_waits(network);
        if waits.is_empty() {
            return;
        }

        let mean: f64 = waits.iter().map(|(_, w)| w).sum::<f64>() / waits.len() as f64;

        // Worst offender above threshold and above the zone mean.
        let candidate = waits
            .iter()
            .filter(|(id, w)| !blocked.contains(id) && *w > self.fairness_threshold && *w > mean)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| *id);

        let Some(extend_id) = candidate else {
            return;
        };
        let Some(intersection) = network.get(&extend_id) else {
            return;
        };
        let current = intersection.phase();
        if current == SignalPhase::AllRed {
            return;
        }

        if let Some(decision) = decisions.get_mut(&extend_id) {
            if decision.phase != current {
                log::debug!(
                    "zone {:?}: force-extending {:?} phase {:?} for fairness",
                    self.zone.id,
                    extend_id,
                    current
                );
                decision.phase = current;
            }
        }

        // The most favored peer gives way next tick.
        if let Some((favored, _)) = waits
            .iter()
            .filter(|(id, _)| *id != extend_id)
            .min_by(|a, b| a.1.total_cmp(&b.1))
        {
            self.penalized.insert(*favored);
        }
    }

    /// Zone fairness index in [0, 1]: `1 - variance / mean-square` of the
    /// members' normalized waits. Algebraically Jain's fairness index; 1.0
    /// means perfectly even treatment. An idle zone reads as fair.
    pub fn fairness_index(&self, network: &TrafficNetwork) -> f64 {
        let waits = self.normalized_waits(network);
        if waits.is_empty() {
            return 1.0;
        }
        let n = waits.len() as f64;
        let mean = waits.iter().map(|(_, w)| w).sum::<f64>() / n;
        let mean_sq = waits.iter().map(|(_, w)| w * w).sum::<f64>() / n;
        if mean_sq == 0.0 {
            return 1.0;
        }
        let variance = mean_sq - mean * mean;
        (1.0 - variance / mean_sq).clamp(0.0, 1.0)
    }

    /// Current wait divided by the member's rolling average wait. The
    /// average is floored at 1.0 so idle history does not blow the ratio up.
    fn normalized_waits(&self, network: &TrafficNetwork) -> Vec<(IntersectionId, f64)> {
        self.zone
            .members
            .iter()
            .map(|member| {
                let current = network
                    .get(member)
                    .map(|i| f64::from(i.wait_time_snapshot()))
                    .unwrap_or(0.0);
                let avg = self
                    .wait_history
                    .get(member)
                    .filter(|h| !h.is_empty())
                    .map(|h| h.iter().sum::<f64>() / h.len() as f64)
                    .unwrap_or(0.0)
                    .max(1.0);
                (*member, current / avg)
            })
            .collect()
    }
}
