//! Haversine-weighted Kruskal spanning tree over the houses of a request,
//! plus the single link from the tree to the nearest substation.

use shared::{
    domain::{Edge, GeoPoint, Substation, SubstationConnection},
    protocol::{LayoutReply, LayoutRequest, MIN_HOUSES},
};
use thiserror::Error;

/// Coordinates closer than this on both axes name the same house.
pub const POINT_EPSILON: f64 = 1e-9;

pub const ALGORITHM: &str = "Kruskal";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("Need at least 2 houses")]
    TooFewNodes(usize),
    #[error("No substations provided")]
    NoSubstations,
    #[error("Edge failure disconnects MST")]
    Disconnected,
}

pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    /// Returns false when `a` and `b` were already joined.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }
}

struct Candidate {
    a: usize,
    b: usize,
    distance: f64,
}

/// Index pairs of houses joined by the failed edge, either direction.
fn blocked_pairs(request: &LayoutRequest) -> Vec<(usize, usize)> {
    let Some(fail) = request.fail else {
        return Vec::new();
    };
    let nodes = &request.nodes;
    let mut pairs = Vec::new();
    for i in 0..nodes.len() {
        for j in (i + 1)..nodes.len() {
            let forward = nodes[i].approx_eq(&fail.start, POINT_EPSILON)
                && nodes[j].approx_eq(&fail.end, POINT_EPSILON);
            let reverse = nodes[i].approx_eq(&fail.end, POINT_EPSILON)
                && nodes[j].approx_eq(&fail.start, POINT_EPSILON);
            if forward || reverse {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// Spanning tree over `nodes` skipping `blocked`; fails when the remaining
/// graph cannot reach every node.
pub fn spanning_tree(
    nodes: &[GeoPoint],
    blocked: &[(usize, usize)],
) -> Result<Vec<Edge>, SolveError> {
    if nodes.len() < MIN_HOUSES {
        return Err(SolveError::TooFewNodes(nodes.len()));
    }

    let mut candidates = Vec::with_capacity(nodes.len() * (nodes.len() - 1) / 2);
    for a in 0..nodes.len() {
        for b in (a + 1)..nodes.len() {
            if blocked.contains(&(a, b)) {
                continue;
            }
            candidates.push(Candidate {
                a,
                b,
                distance: nodes[a].haversine_m(&nodes[b]),
            });
        }
    }
    candidates.sort_by(|x, y| x.distance.total_cmp(&y.distance));

    let mut sets = UnionFind::new(nodes.len());
    let mut tree = Vec::with_capacity(nodes.len() - 1);
    for candidate in candidates {
        if sets.union(candidate.a, candidate.b) {
            tree.push(Edge {
                start: nodes[candidate.a],
                end: nodes[candidate.b],
                distance: candidate.distance,
            });
            if tree.len() == nodes.len() - 1 {
                break;
            }
        }
    }

    if tree.len() < nodes.len() - 1 {
        return Err(SolveError::Disconnected);
    }
    Ok(tree)
}

/// Closest house/substation pair across the whole network.
pub fn closest_substation(
    nodes: &[GeoPoint],
    substations: &[Substation],
) -> Option<SubstationConnection> {
    let mut best: Option<SubstationConnection> = None;
    for house in nodes {
        for substation in substations {
            let location = substation.location();
            let distance = house.haversine_m(&location);
            if best.as_ref().map_or(true, |b| distance < b.distance) {
                best = Some(SubstationConnection {
                    house: *house,
                    substation: location,
                    distance,
                    substation_name: Some(substation.name.clone()),
                });
            }
        }
    }
    best
}

pub fn solve(request: &LayoutRequest) -> Result<LayoutReply, SolveError> {
    let blocked = blocked_pairs(request);
    let edges = spanning_tree(&request.nodes, &blocked)?;
    let connection =
        closest_substation(&request.nodes, &request.substations).ok_or(SolveError::NoSubstations)?;

    let mst_length: f64 = edges.iter().map(|edge| edge.distance).sum();
    let total_length = mst_length + connection.distance;
    let failure_mode = request.is_failure_mode();

    Ok(LayoutReply {
        edges,
        substation_distance: Some(connection.distance),
        substation_connection: Some(connection),
        total_length,
        total_cost: total_length * request.cost_per_meter,
        mst_length: Some(mst_length),
        houses_count: Some(request.nodes.len()),
        algorithm: Some(ALGORITHM.to_string()),
        failure_mode: failure_mode.then_some(true),
        blocked_edges_count: failure_mode.then_some(blocked.len()),
        computation_time: None,
    })
}

#[cfg(test)]
#[path = "tests/mst_tests.rs"]
mod tests;
