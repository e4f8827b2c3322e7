use std::hash::Hash;

use ahash::HashMap;
use serde::Serialize;

use crate::graphs::Weight;

/// Maps a vertex to the vertex it was reached from. Roots have no entry.
pub type Parents<V> = HashMap<V, V>;

/// Outcome of a successful search: the vertices from start to finish and the
/// real length of the route. An empty path means nothing was found.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RoutingResult<V, W> {
    pub path: Vec<V>,
    pub distance: W,
}

impl<V, W: Weight> Default for RoutingResult<V, W> {
    fn default() -> Self {
        RoutingResult {
            path: Vec::new(),
            distance: W::zero(),
        }
    }
}

impl<V, W: Weight> RoutingResult<V, W> {
    pub fn clear(&mut self) {
        self.path.clear();
        self.distance = W::zero();
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}

/// Walks the parents from `vertex` back to the root and returns the vertices
/// in root to `vertex` order.
pub fn reconstruct_path<V: Copy + Eq + Hash>(vertex: V, parents: &Parents<V>) -> Vec<V> {
    let mut vertices = vec![vertex];

    let mut current = vertex;
    while let Some(&parent) = parents.get(&current) {
        current = parent;
        vertices.push(current);
    }

    vertices.reverse();
    vertices
}

/// Joins the path to `forward_vertex` with the reversed path to
/// `backward_vertex`. The two vertices have to be adjacent.
pub fn reconstruct_path_bidirectional<V: Copy + Eq + Hash>(
    forward_vertex: V,
    backward_vertex: V,
    forward_parents: &Parents<V>,
    backward_parents: &Parents<V>,
) -> Vec<V> {
    // start -> forward_vertex
    let mut vertices = reconstruct_path(forward_vertex, forward_parents);
    // finish -> backward_vertex
    let backward_vertices = reconstruct_path(backward_vertex, backward_parents);

    vertices.reserve(backward_vertices.len());
    vertices.extend(backward_vertices.into_iter().rev()); // (start -> finish)
    vertices
}
