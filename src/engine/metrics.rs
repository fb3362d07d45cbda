use std::collections::BTreeMap;

use serde::Serialize;

use crate::network::intersection::IntersectionId;
use crate::network::zone::ZoneId;

/// Accumulator for one simulation run.
///
/// Owned and written exclusively by the simulation engine; frozen when the
/// run finishes, after which only read access is exposed (the visualization
/// collaborator consumes it, never writes back).
#[derive(Debug, Default, Clone)]
pub struct MetricsLedger {
    wait_per_intersection: BTreeMap<IntersectionId, Vec<u32>>,
    avg_wait_per_tick: Vec<f64>,
    fairness_per_zone: BTreeMap<ZoneId, Vec<f64>>,
    transit_times: Vec<(u64, u64)>,
    frozen: bool,
}

impl MetricsLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one tick's observations.
    pub fn record_tick(&mut self, waits: &[(IntersectionId, u32)], fairness: &[(ZoneId, f64)]) {
        debug_assert!(!self.frozen, "ledger mutated after freeze");
        for &(id, wait) in waits {
            self.wait_per_intersection.entry(id).or_default().push(wait);
        }
        let avg = if waits.is_empty() {
            0.0
        } else {
            waits.iter().map(|&(_, w)| f64::from(w)).sum::<f64>() / waits.len() as f64
        };
        self.avg_wait_per_tick.push(avg);
        for &(zone, idx) in fairness {
            self.fairness_per_zone.entry(zone).or_default().push(idx);
        }
    }

    /// Records a completed emergency transit.
    pub fn record_transit(&mut self, vehicle_id: u64, ticks: u64) {
        debug_assert!(!self.frozen, "ledger mutated after freeze");
        self.transit_times.push((vehicle_id, ticks));
    }

    /// Marks the run finished. Further writes are a bug.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn ticks_recorded(&self) -> usize {
        self.avg_wait_per_tick.len()
    }

    pub fn avg_wait_series(&self) -> &[f64] {
        &self.avg_wait_per_tick
    }

    pub fn intersection_waits(&self) -> &BTreeMap<IntersectionId, Vec<u32>> {
        &self.wait_per_intersection
    }

    pub fn fairness_series(&self, zone: ZoneId) -> Option<&[f64]> {
        self.fairness_per_zone.get(&zone).map(Vec::as_slice)
    }

    pub fn fairness_per_zone(&self) -> &BTreeMap<ZoneId, Vec<f64>> {
        &self.fairness_per_zone
    }

    pub fn transit_times(&self) -> &[(u64, u64)] {
        &self.transit_times
    }

    pub fn average_wait(&self) -> f64 {
        mean(&self.avg_wait_per_tick)
    }

    pub fn average_fairness(&self) -> f64 {
        let per_zone: Vec<f64> = self
            .fairness_per_zone
            .values()
            .map(|series| mean(series))
            .collect();
        if per_zone.is_empty() {
            1.0
        } else {
            mean(&per_zone)
        }
    }

    pub fn average_transit(&self) -> Option<f64> {
        if self.transit_times.is_empty() {
            return None;
        }
        let sum: u64 = self.transit_times.iter().map(|&(_, t)| t).sum();
        Some(sum as f64 / self.transit_times.len() as f64)
    }

    /// Run summary, optionally comparing emergency transit against a
    /// baseline run (fixed timing, no overrides).
    pub fn summary(&self, baseline: Option<&MetricsLedger>) -> RunSummary {
        let average_transit = self.average_transit();
        let transit_improvement_pct =
            match (average_transit, baseline.and_then(|b| b.average_transit())) {
                (Some(ours), Some(base)) if base > 0.0 => Some((base - ours) / base * 100.0),
                _ => None,
            };
        RunSummary {
            ticks: self.ticks_recorded() as u64,
            average_wait: self.average_wait(),
            average_fairness: self.average_fairness(),
            average_transit,
            transit_improvement_pct,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Aggregate figures for one run, serializable for export.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub average_wait: f64,
    pub average_fairness: f64,
    pub average_transit: Option<f64>,
    /// Percent improvement of emergency transit time over the baseline run.
    pub transit_improvement_pct: Option<f64>,
}
