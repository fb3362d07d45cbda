use serde::{Deserialize, Serialize};

use crate::network::intersection::IntersectionId;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ZoneId(pub u8);

/// A coordination zone: an ordered group of intersections reconciled
/// together for fairness.
///
/// Member order is insertion order (the geographic ordering the network was
/// built with). The zone holds ids only; the intersections themselves live
/// in the network arena.
#[derive(Debug, Clone)]
pub struct Zone {
    pub id: ZoneId,
    pub members: Vec<IntersectionId>,
}

impl Zone {
    pub fn new(id: ZoneId, members: Vec<IntersectionId>) -> Self {
        Self { id, members }
    }
}
