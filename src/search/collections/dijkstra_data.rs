use std::hash::Hash;

use ahash::{HashMap, HashMapExt};

use crate::{
    graphs::Weight,
    search::path::{reconstruct_path, Parents},
};

/// Distances and parents of one unidirectional wave.
///
/// A vertex has a parent iff its distance was improved at least once, so the
/// start vertex never has one.
pub struct Context<V, W> {
    distances: HashMap<V, W>,
    parents: Parents<V>,
}

impl<V: Copy + Eq + Hash, W: Weight> Default for Context<V, W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Copy + Eq + Hash, W: Weight> Context<V, W> {
    pub fn new() -> Context<V, W> {
        Context {
            distances: HashMap::new(),
            parents: Parents::default(),
        }
    }

    /// Clears all stored data, preparing for a new search.
    pub fn clear(&mut self) {
        self.distances.clear();
        self.parents.clear();
    }

    pub fn has_distance(&self, vertex: &V) -> bool {
        self.distances.contains_key(vertex)
    }

    /// Retrieves the distance to a given vertex, infinity if it was not
    /// reached.
    pub fn get_distance(&self, vertex: &V) -> W {
        self.distances
            .get(vertex)
            .copied()
            .unwrap_or_else(W::infinity)
    }

    pub fn set_distance(&mut self, vertex: V, distance: W) {
        self.distances.insert(vertex, distance);
    }

    pub fn get_predecessor(&self, vertex: &V) -> Option<V> {
        self.parents.get(vertex).copied()
    }

    pub fn set_predecessor(&mut self, vertex: V, predecessor: V) {
        self.parents.insert(vertex, predecessor);
    }

    pub fn number_of_reached_vertices(&self) -> usize {
        self.distances.len()
    }

    /// Vertices from the wave's start to `target`.
    pub fn get_path(&self, target: V) -> Vec<V> {
        reconstruct_path(target, &self.parents)
    }
}

#[cfg(test)]
mod tests {
    use super::Context;

    #[test]
    fn unreached_vertex_is_infinitely_far() {
        let mut context: Context<u32, f64> = Context::new();
        assert_eq!(context.get_distance(&3), f64::INFINITY);
        assert!(!context.has_distance(&3));

        context.set_distance(3, 1.5);
        assert_eq!(context.get_distance(&3), 1.5);

        context.clear();
        assert!(!context.has_distance(&3));
    }

    #[test]
    fn path_follows_predecessors() {
        let mut context: Context<u32, f64> = Context::new();
        context.set_distance(0, 0.0);
        context.set_distance(1, 1.0);
        context.set_predecessor(1, 0);
        context.set_distance(2, 2.0);
        context.set_predecessor(2, 1);

        assert_eq!(context.get_predecessor(&0), None);
        assert_eq!(context.get_path(2), vec![0, 1, 2]);
    }
}
