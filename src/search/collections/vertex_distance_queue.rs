use std::{cmp::Ordering, collections::BinaryHeap};

use crate::graphs::Weight;

/// An entry of the priority queue: a vertex and the reduced distance it was
/// pushed with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct State<V, W> {
    pub vertex: V,
    pub distance: W,
}

impl<V, W> State<V, W> {
    pub fn new(vertex: V, distance: W) -> State<V, W> {
        State { vertex, distance }
    }
}

impl<V: PartialEq, W: Weight> Eq for State<V, W> {}

// `BinaryHeap` is a max-heap, so the ordering on distances is flipped to pop
// the closest state first.
impl<V: PartialEq, W: Weight> Ord for State<V, W> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .partial_cmp(&self.distance)
            .unwrap_or(Ordering::Equal)
    }
}

impl<V: PartialEq, W: Weight> PartialOrd for State<V, W> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-queue of states. There is no decrease key, stale entries have to be
/// skipped by the caller.
pub type VertexDistanceQueue<V, W> = BinaryHeap<State<V, W>>;
