//! Arrival dataset ingestion.
//!
//! The core consumes tabular traffic records (tick, intersection, lane,
//! count) as a tick-indexed schedule. Rows that cannot be interpreted are
//! logged at warn level and contribute zero arrivals; dataset problems are
//! never fatal to a run.

use std::collections::HashMap;
use std::path::Path;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::error::SimulationError;
use crate::network::intersection::{Approach, IntersectionId};
use crate::network::TrafficNetwork;

/// One dataset row as it appears in the CSV.
#[derive(Debug, Clone, Deserialize)]
pub struct ArrivalRecord {
    pub tick: u64,
    pub row: i8,
    pub col: i8,
    pub lane: String,
    pub count: i64,
}

type TickArrivals = HashMap<IntersectionId, HashMap<Approach, u32>>;

/// Pre-loaded arrivals for a whole run: tick -> intersection -> lane ->
/// count. Built before `run()` starts so no I/O happens inside the tick
/// loop.
#[derive(Debug, Clone, Default)]
pub struct ArrivalSchedule {
    ticks: HashMap<u64, TickArrivals>,
    last_tick: Option<u64>,
}

impl ArrivalSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a CSV dataset with a `tick,row,col,lane,count` header.
    /// An unreadable file errors; unreadable rows and rows for
    /// intersections outside `network` are skipped with a warning.
    pub fn from_csv_path(
        path: impl AsRef<Path>,
        network: &TrafficNetwork,
    ) -> Result<Self, SimulationError> {
        let mut reader = csv::Reader::from_path(path.as_ref()).map_err(|e| match e.kind() {
            csv::ErrorKind::Io(_) => SimulationError::DatasetIo {
                source: std::io::Error::other(e.to_string()),
            },
            _ => SimulationError::MalformedArrivalRecord {
                line: 0,
                reason: e.to_string(),
            },
        })?;

        let mut schedule = Self::new();
        for (idx, result) in reader.deserialize::<ArrivalRecord>().enumerate() {
            let line = idx as u64 + 2; // header is line 1
            match result {
                Ok(record) => schedule.push_record(line, record, network),
                Err(e) => {
                    log::warn!("skipping malformed arrival record at line {}: {}", line, e);
                }
            }
        }
        Ok(schedule)
    }

    pub fn from_records(
        records: impl IntoIterator<Item = ArrivalRecord>,
        network: &TrafficNetwork,
    ) -> Self {
        let mut schedule = Self::new();
        for (idx, record) in records.into_iter().enumerate() {
            schedule.push_record(idx as u64 + 1, record, network);
        }
        schedule
    }

    /// Adds `count` arrivals at one lane.
    pub fn insert(
        &mut self,
        tick: u64,
        intersection: IntersectionId,
        approach: Approach,
        count: u32,
    ) {
        *self
            .ticks
            .entry(tick)
            .or_default()
            .entry(intersection)
            .or_default()
            .entry(approach)
            .or_insert(0) += count;
        self.last_tick = Some(self.last_tick.map_or(tick, |t| t.max(tick)));
    }

    fn push_record(&mut self, line: u64, record: ArrivalRecord, network: &TrafficNetwork) {
        let id = IntersectionId(record.row, record.col);
        if !network.contains(&id) {
            log::warn!(
                "skipping arrival record at line {}: unknown intersection {:?}",
                line,
                id
            );
            return;
        }
        let Some(approach) = Approach::parse(&record.lane) else {
            log::warn!(
                "skipping arrival record at line {}: unknown lane {:?}",
                line,
                record.lane
            );
            return;
        };
        if record.count < 0 {
            log::warn!(
                "skipping arrival record at line {}: negative count {}",
                line,
                record.count
            );
            return;
        }
        self.insert(record.tick, id, approach, record.count as u32);
    }

    /// Arrivals at one intersection for one tick. Missing data reads as no
    /// arrivals.
    pub fn arrivals_for(
        &self,
        tick: u64,
        intersection: IntersectionId,
    ) -> Option<&HashMap<Approach, u32>> {
        self.ticks.get(&tick).and_then(|t| t.get(&intersection))
    }

    /// Highest tick with any data; `None` for an empty schedule.
    pub fn last_tick(&self) -> Option<u64> {
        self.last_tick
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Deterministic synthetic schedule shaped like the original traffic
    /// dataset: one tick per five minutes, rush-hour ramps with directional
    /// bias and light overnight load, plus seeded random variation.
    pub fn synthetic(network: &TrafficNetwork, num_ticks: u64, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut schedule = Self::new();
        let ids = network.intersection_ids();

        for tick in 0..num_ticks {
            let hour = (tick / 12 + 8) % 24; // start the window at 08:00
            for &id in &ids {
                for approach in Approach::ALL {
                    let share = directional_share(hour, approach);
                    let base = base_volume(hour) * share;
                    // +-20% variation, floor at zero.
                    let jitter: f64 = rng.random_range(0.8..1.2);
                    let count = (base * jitter).round().max(0.0) as u32;
                    if count > 0 {
                        schedule.insert(tick, id, approach, count);
                    }
                }
            }
        }
        schedule
    }
}

/// Total vehicles per tick per intersection by hour of day.
fn base_volume(hour: u64) -> f64 {
    match hour {
        7..=9 => 8.0,   // morning rush
        16..=18 => 9.0, // evening rush
        23 | 0..=5 => 1.0,
        _ => 4.0,
    }
}

/// Directional split of arrivals: inbound-heavy mornings, outbound-heavy
/// evenings, even otherwise.
fn directional_share(hour: u64, approach: Approach) -> f64 {
    match (hour, approach) {
        (7..=9, Approach::North) => 0.4,
        (7..=9, Approach::South) => 0.2,
        (7..=9, Approach::East) => 0.3,
        (7..=9, Approach::West) => 0.1,
        (16..=18, Approach::North) => 0.2,
        (16..=18, Approach::South) => 0.4,
        (16..=18, Approach::East) => 0.1,
        (16..=18, Approach::West) => 0.3,
        _ => 0.25,
    }
}
