use crate::{
    graphs::{AStarGraph, Direction},
    search::cancellable::Cancellable,
};

/// Called for every expanded vertex with the vertex and the vertex the wave
/// is heading to.
pub type OnVisitedVertex<'a, V> = dyn Fn(&V, &V, Direction) + Sync + 'a;

/// Decides whether a real length is still acceptable.
pub type CheckLength<'a, W> = dyn Fn(W, Direction) -> bool + Sync + 'a;

static NEVER_CANCELLED: Cancellable = Cancellable::new();

/// Everything a single search needs.
pub struct Params<'a, G: AStarGraph> {
    pub graph: &'a G,
    pub start: G::Vertex,
    pub finish: G::Vertex,
    /// Route to adjust, as the sequence of edges it was driven along.
    pub prev_route: Option<&'a [G::Edge]>,
    pub cancellable: &'a Cancellable,
    on_visited_vertex: Option<Box<OnVisitedVertex<'a, G::Vertex>>>,
    check_length: Option<Box<CheckLength<'a, G::Weight>>>,
}

impl<'a, G: AStarGraph> Params<'a, G> {
    pub fn new(
        graph: &'a G,
        start: G::Vertex,
        finish: G::Vertex,
        cancellable: &'a Cancellable,
    ) -> Params<'a, G> {
        Params {
            graph,
            start,
            finish,
            prev_route: None,
            cancellable,
            on_visited_vertex: None,
            check_length: None,
        }
    }

    /// Parameters that can never be cancelled.
    pub fn for_tests(
        graph: &'a G,
        start: G::Vertex,
        finish: G::Vertex,
        prev_route: Option<&'a [G::Edge]>,
        check_length: impl Fn(G::Weight, Direction) -> bool + Sync + 'a,
    ) -> Params<'a, G> {
        let mut params = Params::new(graph, start, finish, &NEVER_CANCELLED)
            .with_length_checker(check_length);
        params.prev_route = prev_route;
        params
    }

    pub fn with_prev_route(mut self, prev_route: &'a [G::Edge]) -> Self {
        self.prev_route = Some(prev_route);
        self
    }

    pub fn with_visitor(
        mut self,
        visitor: impl Fn(&G::Vertex, &G::Vertex, Direction) + Sync + 'a,
    ) -> Self {
        self.on_visited_vertex = Some(Box::new(visitor));
        self
    }

    pub fn with_length_checker(
        mut self,
        check_length: impl Fn(G::Weight, Direction) -> bool + Sync + 'a,
    ) -> Self {
        self.check_length = Some(Box::new(check_length));
        self
    }

    pub fn has_length_checker(&self) -> bool {
        self.check_length.is_some()
    }

    pub fn visit_vertex(&self, from: &G::Vertex, to: &G::Vertex, direction: Direction) {
        if let Some(visitor) = &self.on_visited_vertex {
            visitor(from, to, direction);
        }
    }

    /// True if no checker was given.
    pub fn check_length(&self, weight: G::Weight, direction: Direction) -> bool {
        self.check_length
            .as_ref()
            .map_or(true, |check_length| check_length(weight, direction))
    }
}
