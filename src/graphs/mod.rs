use std::{
    fmt::Debug,
    hash::Hash,
    ops::{Add, Sub},
};

use serde::{Deserialize, Serialize};

use crate::search::path::Parents;

pub mod adjacency_graph;

pub type VertexId = u32;

/// Cost type the search runs on.
///
/// Distances are compared with a tolerance of [`Weight::epsilon`], so floating
/// point weights are the intended implementors.
pub trait Weight:
    Copy + PartialOrd + Add<Output = Self> + Sub<Output = Self> + Debug + Send + Sync + 'static
{
    fn zero() -> Self;

    /// Distance of a vertex that has not been reached.
    fn infinity() -> Self;

    fn epsilon() -> Self;

    fn half(self) -> Self;
}

impl Weight for f64 {
    fn zero() -> Self {
        0.0
    }

    fn infinity() -> Self {
        f64::INFINITY
    }

    fn epsilon() -> Self {
        1e-6
    }

    fn half(self) -> Self {
        self * 0.5
    }
}

impl Weight for f32 {
    fn zero() -> Self {
        0.0
    }

    fn infinity() -> Self {
        f32::INFINITY
    }

    fn epsilon() -> Self {
        1e-4
    }

    fn half(self) -> Self {
        self * 0.5
    }
}

pub fn max_weight<W: Weight>(a: W, b: W) -> W {
    if a > b {
        a
    } else {
        b
    }
}

/// An edge as seen from the vertex it was enumerated from. For ingoing edges
/// the target is the vertex the edge comes from.
pub trait AStarEdge<V, W> {
    fn target(&self) -> V;

    fn weight(&self) -> W;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn is_forward(self) -> bool {
        self == Direction::Forward
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// A vertex together with the real (not reduced) distance the wave reached it
/// with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexData<V, W> {
    pub vertex: V,
    pub real_distance: W,
}

impl<V, W> VertexData<V, W> {
    pub fn new(vertex: V, real_distance: W) -> Self {
        VertexData {
            vertex,
            real_distance,
        }
    }
}

/// Everything the search needs to know about a graph.
///
/// Edge enumeration may be called from two threads at once when
/// [`AStarGraph::is_two_threads_ready`] returns true.
pub trait AStarGraph: Sync {
    type Vertex: Copy + Eq + Hash + Debug + Send + Sync;
    type Edge: AStarEdge<Self::Vertex, Self::Weight> + Clone + Send + Sync;
    type Weight: Weight;

    /// Appends the edges leaving `vertex_data.vertex` to `edges`.
    fn outgoing_edges(
        &self,
        vertex_data: &VertexData<Self::Vertex, Self::Weight>,
        edges: &mut Vec<Self::Edge>,
    );

    /// Appends the edges entering `vertex_data.vertex` to `edges`.
    fn ingoing_edges(
        &self,
        vertex_data: &VertexData<Self::Vertex, Self::Weight>,
        edges: &mut Vec<Self::Edge>,
    );

    /// Admissible estimate of the distance between two vertices, asked for by
    /// the wave running in `direction`. Bidirectional search evaluates it
    /// towards both endpoints from both waves, and the two waves only agree
    /// on path lengths if both directions describe the same metric.
    fn heuristic_cost_estimate(
        &self,
        from: &Self::Vertex,
        to: &Self::Vertex,
        direction: Direction,
    ) -> Self::Weight;

    /// Called when a wave in `direction` starts recording parents.
    fn set_astar_parents(&self, _direction: Direction) {}

    /// Called when the search recording parents has finished.
    fn drop_astar_parents(&self) {}

    /// Rejects meeting points that can not be traversed end to end.
    fn are_waves_connectible(
        &self,
        _forward_parents: &Parents<Self::Vertex>,
        _vertex: &Self::Vertex,
        _backward_parents: &Parents<Self::Vertex>,
    ) -> bool {
        true
    }

    fn is_two_threads_ready(&self) -> bool {
        false
    }

    fn edges(
        &self,
        direction: Direction,
        vertex_data: &VertexData<Self::Vertex, Self::Weight>,
        edges: &mut Vec<Self::Edge>,
    ) {
        match direction {
            Direction::Forward => self.outgoing_edges(vertex_data, edges),
            Direction::Backward => self.ingoing_edges(vertex_data, edges),
        }
    }
}

/// A position in the plane, used for the euclidean heuristic and for progress
/// estimation.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[cfg(test)]
mod tests {
    use super::{max_weight, Direction, Point, Weight};

    #[test]
    fn directions_flip() {
        assert!(Direction::Forward.is_forward());
        assert!(!Direction::Backward.is_forward());
        assert_eq!(Direction::Forward.opposite(), Direction::Backward);
        assert_eq!(Direction::Backward.opposite().opposite(), Direction::Backward);
    }

    #[test]
    fn single_precision_weights() {
        assert_eq!(<f32 as Weight>::zero(), 0.0);
        assert!(<f32 as Weight>::infinity() > f32::MAX);
        assert!(<f32 as Weight>::epsilon() > <f64 as Weight>::epsilon() as f32);
        assert_eq!(3.0f32.half(), 1.5);
        assert_eq!(max_weight(-1e-5f32, 0.0), 0.0);
    }

    #[test]
    fn point_distance_is_euclidean() {
        assert_eq!(Point::new(1.0, 1.0).distance(&Point::new(4.0, 5.0)), 5.0);
    }
}
