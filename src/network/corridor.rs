//! Shortest-hop corridor planning over the intersection graph.
//!
//! A plain breadth-first search over the adjacency lists. Kept separate from
//! agent logic so it can be tested without running simulation ticks.

use std::collections::{HashMap, VecDeque};

use crate::network::intersection::IntersectionId;
use crate::network::TrafficNetwork;

/// Finds the shortest hop path from `start` to `target`, both inclusive.
///
/// Neighbors are visited in id order so equal-length paths resolve
/// deterministically. Returns `None` when no path exists.
pub fn shortest_corridor(
    network: &TrafficNetwork,
    start: IntersectionId,
    target: IntersectionId,
) -> Option<Vec<IntersectionId>> {
    let mut queue = VecDeque::new();
    queue.push_back(start);
    let mut came_from: HashMap<IntersectionId, IntersectionId> = HashMap::new();
    came_from.insert(start, start);

    while let Some(current) = queue.pop_front() {
        if current == target {
            // Reconstruct path from target back to start.
            let mut path = Vec::new();
            let mut cur = current;
            while cur != start {
                path.push(cur);
                cur = came_from[&cur];
            }
            path.push(start);
            path.reverse();
            return Some(path);
        }

        if let Some(intersection) = network.get(&current) {
            let mut neighbors = intersection.connected.clone();
            // Id order makes tie-breaks deterministic.
            neighbors.sort();
            for neighbor in neighbors {
                if !came_from.contains_key(&neighbor) {
                    came_from.insert(neighbor, current);
                    queue.push_back(neighbor);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::TrafficNetwork;

    #[test]
    fn straight_line_corridor() {
        let network = TrafficNetwork::grid(1, 3, 3);
        let path =
            shortest_corridor(&network, IntersectionId(0, 0), IntersectionId(0, 2)).unwrap();
        assert_eq!(
            path,
            vec![
                IntersectionId(0, 0),
                IntersectionId(0, 1),
                IntersectionId(0, 2)
            ]
        );
    }

    #[test]
    fn corridor_includes_both_endpoints() {
        let network = TrafficNetwork::grid(3, 3, 3);
        let path =
            shortest_corridor(&network, IntersectionId(0, 0), IntersectionId(2, 2)).unwrap();
        assert_eq!(path.first(), Some(&IntersectionId(0, 0)));
        assert_eq!(path.last(), Some(&IntersectionId(2, 2)));
        // Manhattan distance on a grid: 4 hops, 5 nodes.
        assert_eq!(path.len(), 5);
    }

    #[test]
    fn equal_length_paths_resolve_deterministically() {
        let network = TrafficNetwork::grid(2, 2, 2);
        let a = shortest_corridor(&network, IntersectionId(0, 0), IntersectionId(1, 1)).unwrap();
        let b = shortest_corridor(&network, IntersectionId(0, 0), IntersectionId(1, 1)).unwrap();
        assert_eq!(a, b);
        // Lower id neighbor (0,1) explored before (1,0).
        assert_eq!(a[1], IntersectionId(0, 1));
    }

    #[test]
    fn no_path_returns_none() {
        let mut network = TrafficNetwork::grid(1, 1, 2);
        // Sever the only edge.
        network.get_mut(&IntersectionId(0, 0)).unwrap().connected.clear();
        network.get_mut(&IntersectionId(0, 1)).unwrap().connected.clear();
        assert!(
            shortest_corridor(&network, IntersectionId(0, 0), IntersectionId(0, 1)).is_none()
        );
    }

    #[test]
    fn trivial_corridor_is_single_node() {
        let network = TrafficNetwork::grid(1, 1, 2);
        let path =
            shortest_corridor(&network, IntersectionId(0, 0), IntersectionId(0, 0)).unwrap();
        assert_eq!(path, vec![IntersectionId(0, 0)]);
    }
}
