//! Network topology: intersections, zones and the corridor planner.

pub mod corridor;
pub mod intersection;
pub mod zone;

use std::collections::HashMap;

use crate::network::intersection::{Intersection, IntersectionId};
use crate::network::zone::{Zone, ZoneId};

/// The intersection arena plus zone groupings.
///
/// Intersections are owned here and indexed by id; zones and emergency
/// corridors reference them by id only. The simulation engine is the single
/// writer of the mutable intersection state.
#[derive(Debug, Clone)]
pub struct TrafficNetwork {
    intersections: HashMap<IntersectionId, Intersection>,
    zones: Vec<Zone>,
}

impl TrafficNetwork {
    pub fn new(intersections: Vec<Intersection>, zones: Vec<Zone>) -> Self {
        let intersections = intersections.into_iter().map(|i| (i.id, i)).collect();
        Self {
            intersections,
            zones,
        }
    }

    /// Builds a rows x cols grid with 4-neighbor adjacency, split into
    /// `num_zones` horizontal bands of rows.
    pub fn grid(num_zones: u8, rows: i8, cols: i8) -> Self {
        let num_zones = num_zones.max(1);
        let mut intersections = Vec::new();
        let mut zone_members: HashMap<ZoneId, Vec<IntersectionId>> = HashMap::new();

        for row in 0..rows {
            for col in 0..cols {
                let id = IntersectionId(row, col);
                let mut connected = Vec::new();
                if row > 0 {
                    connected.push(IntersectionId(row - 1, col));
                }
                if row < rows - 1 {
                    connected.push(IntersectionId(row + 1, col));
                }
                if col > 0 {
                    connected.push(IntersectionId(row, col - 1));
                }
                if col < cols - 1 {
                    connected.push(IntersectionId(row, col + 1));
                }
                let zone = ZoneId((row as usize * num_zones as usize / rows as usize) as u8);
                zone_members.entry(zone).or_default().push(id);
                intersections.push(Intersection::new(id, zone, connected));
            }
        }

        let mut zone_ids: Vec<ZoneId> = zone_members.keys().copied().collect();
        zone_ids.sort();
        let zones = zone_ids
            .into_iter()
            .map(|zid| Zone::new(zid, zone_members.remove(&zid).unwrap_or_default()))
            .collect();

        Self::new(intersections, zones)
    }

    pub fn get(&self, id: &IntersectionId) -> Option<&Intersection> {
        self.intersections.get(id)
    }

    pub fn get_mut(&mut self, id: &IntersectionId) -> Option<&mut Intersection> {
        self.intersections.get_mut(id)
    }

    pub fn contains(&self, id: &IntersectionId) -> bool {
        self.intersections.contains_key(id)
    }

    pub fn intersections(&self) -> impl Iterator<Item = &Intersection> {
        self.intersections.values()
    }

    /// Intersection ids in deterministic (row, col) order.
    pub fn intersection_ids(&self) -> Vec<IntersectionId> {
        let mut ids: Vec<IntersectionId> = self.intersections.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.intersections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intersections.is_empty()
    }
}
