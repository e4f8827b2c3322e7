use ahash::{HashMap, HashMapExt};
use itertools::Itertools;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{AStarEdge, AStarGraph, Direction, Point, VertexData, VertexId};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdjacentEdge {
    pub vertex: VertexId,
    pub weight: f64,
}

impl AdjacentEdge {
    pub fn new(vertex: VertexId, weight: f64) -> AdjacentEdge {
        AdjacentEdge { vertex, weight }
    }
}

impl AStarEdge<VertexId, f64> for AdjacentEdge {
    fn target(&self) -> VertexId {
        self.vertex
    }

    fn weight(&self) -> f64 {
        self.weight
    }
}

/// Directed graph stored as hash maps of out and in edges.
///
/// Vertices with a position get a euclidean heuristic, which is admissible as
/// long as no edge is shorter than the straight line between its endpoints.
/// Without positions the heuristic is zero.
#[derive(Clone, Default)]
pub struct AdjacencyGraph {
    out_edges: HashMap<VertexId, Vec<AdjacentEdge>>,
    in_edges: HashMap<VertexId, Vec<AdjacentEdge>>,
    positions: HashMap<VertexId, Point>,
    two_threads_ready: bool,
}

impl AdjacencyGraph {
    pub fn new() -> AdjacencyGraph {
        AdjacencyGraph {
            out_edges: HashMap::new(),
            in_edges: HashMap::new(),
            positions: HashMap::new(),
            two_threads_ready: false,
        }
    }

    pub fn add_edge(&mut self, tail: VertexId, head: VertexId, weight: f64) {
        self.out_edges
            .entry(tail)
            .or_default()
            .push(AdjacentEdge::new(head, weight));
        self.in_edges
            .entry(head)
            .or_default()
            .push(AdjacentEdge::new(tail, weight));
    }

    pub fn add_edge_bidirectional(&mut self, tail: VertexId, head: VertexId, weight: f64) {
        self.add_edge(tail, head, weight);
        self.add_edge(head, tail, weight);
    }

    pub fn set_position(&mut self, vertex: VertexId, position: Point) {
        self.positions.insert(vertex, position);
    }

    pub fn position(&self, vertex: VertexId) -> Option<Point> {
        self.positions.get(&vertex).copied()
    }

    pub fn set_two_threads_ready(&mut self, ready: bool) {
        self.two_threads_ready = ready;
    }

    pub fn number_of_vertices(&self) -> u32 {
        self.out_edges
            .keys()
            .chain(self.in_edges.keys())
            .chain(self.positions.keys())
            .unique()
            .count() as u32
    }

    pub fn number_of_edges(&self) -> u32 {
        self.out_edges.values().map(Vec::len).sum::<usize>() as u32
    }

    pub fn out_edges(&self, vertex: VertexId) -> &[AdjacentEdge] {
        self.out_edges
            .get(&vertex)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn in_edges(&self, vertex: VertexId) -> &[AdjacentEdge] {
        self.in_edges
            .get(&vertex)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Weight of the cheapest walk along `vertices`, or `None` if two
    /// consecutive vertices are not connected.
    pub fn path_weight(&self, vertices: &[VertexId]) -> Option<f64> {
        vertices
            .iter()
            .tuple_windows()
            .map(|(&tail, &head)| {
                self.out_edges(tail)
                    .iter()
                    .filter(|edge| edge.vertex == head)
                    .map(|edge| edge.weight)
                    .min_by(f64::total_cmp)
            })
            .sum()
    }

    /// Scatters vertices over a square and connects every vertex to a few
    /// random others in both directions. Edge weights are the euclidean length
    /// stretched by up to half, so the euclidean heuristic stays admissible.
    pub fn random_geometric(
        number_of_vertices: u32,
        edges_per_vertex: u32,
        seed: u64,
    ) -> AdjacencyGraph {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut graph = AdjacencyGraph::new();
        if number_of_vertices == 0 {
            return graph;
        }

        let side = (number_of_vertices as f64).sqrt() * 10.0;
        for vertex in 0..number_of_vertices {
            let position = Point::new(rng.gen_range(0.0..side), rng.gen_range(0.0..side));
            graph.set_position(vertex, position);
        }

        for tail in 0..number_of_vertices {
            for _ in 0..edges_per_vertex {
                let head = rng.gen_range(0..number_of_vertices);
                if head == tail {
                    continue;
                }
                let length = graph.positions[&tail].distance(&graph.positions[&head]);
                let stretch = rng.gen_range(1.0..1.5);
                graph.add_edge_bidirectional(tail, head, length * stretch);
            }
        }

        graph
    }
}

impl AStarGraph for AdjacencyGraph {
    type Vertex = VertexId;
    type Edge = AdjacentEdge;
    type Weight = f64;

    fn outgoing_edges(
        &self,
        vertex_data: &VertexData<VertexId, f64>,
        edges: &mut Vec<AdjacentEdge>,
    ) {
        edges.extend_from_slice(self.out_edges(vertex_data.vertex));
    }

    fn ingoing_edges(
        &self,
        vertex_data: &VertexData<VertexId, f64>,
        edges: &mut Vec<AdjacentEdge>,
    ) {
        edges.extend_from_slice(self.in_edges(vertex_data.vertex));
    }

    fn heuristic_cost_estimate(&self, from: &VertexId, to: &VertexId, _: Direction) -> f64 {
        match (self.positions.get(from), self.positions.get(to)) {
            (Some(from), Some(to)) => from.distance(to),
            _ => 0.0,
        }
    }

    fn is_two_threads_ready(&self) -> bool {
        self.two_threads_ready
    }
}

#[cfg(test)]
mod tests {
    use super::AdjacencyGraph;
    use crate::graphs::{AStarGraph, Direction, Point, VertexData};

    #[test]
    fn in_and_out_edges_mirror_each_other() {
        let mut graph = AdjacencyGraph::new();
        graph.add_edge(0, 1, 2.0);
        graph.add_edge(2, 1, 3.0);

        let mut edges = Vec::new();
        graph.ingoing_edges(&VertexData::new(1, 0.0), &mut edges);
        let mut tails: Vec<u32> = edges.iter().map(|edge| edge.vertex).collect();
        tails.sort();
        assert_eq!(tails, vec![0, 2]);

        edges.clear();
        graph.outgoing_edges(&VertexData::new(1, 0.0), &mut edges);
        assert!(edges.is_empty());
        assert_eq!(graph.number_of_vertices(), 3);
        assert_eq!(graph.number_of_edges(), 2);
    }

    #[test]
    fn path_weight_takes_cheapest_parallel_edge() {
        let mut graph = AdjacencyGraph::new();
        graph.add_edge(0, 1, 5.0);
        graph.add_edge(0, 1, 3.0);
        graph.add_edge(1, 2, 1.0);

        assert_eq!(graph.path_weight(&[0, 1, 2]), Some(4.0));
        assert_eq!(graph.path_weight(&[2, 1]), None);
        assert_eq!(graph.path_weight(&[0]), Some(0.0));
    }

    #[test]
    fn heuristic_is_euclidean_when_positions_are_known() {
        let mut graph = AdjacencyGraph::new();
        graph.set_position(0, Point::new(0.0, 0.0));
        graph.set_position(1, Point::new(3.0, 4.0));

        assert_eq!(graph.heuristic_cost_estimate(&0, &1, Direction::Forward), 5.0);
        assert_eq!(graph.heuristic_cost_estimate(&1, &0, Direction::Backward), 5.0);
        assert_eq!(graph.heuristic_cost_estimate(&0, &7, Direction::Forward), 0.0);
    }

    #[test]
    fn random_geometric_edges_are_not_shorter_than_heuristic() {
        let graph = AdjacencyGraph::random_geometric(200, 3, 7);
        for tail in 0..200 {
            for edge in graph.out_edges(tail) {
                let estimate =
                    graph.heuristic_cost_estimate(&tail, &edge.vertex, Direction::Forward);
                assert!(edge.weight >= estimate);
            }
        }
    }
}
