use ahash::{HashMap, HashMapExt};
use log::debug;

use super::{
    cancellable::PeriodicPollCancellable,
    collections::{dijkstra_data::Context, vertex_distance_queue::State},
    config::AStarConfig,
    dijkstra::propagate_wave,
    params::Params,
    path::RoutingResult,
    SearchResult,
};
use crate::graphs::{AStarEdge, AStarGraph, Direction, Weight};

/// Shortest path searches over any [`AStarGraph`].
///
/// A* is run as Dijkstra's algorithm on reduced edge weights: an edge (v, w)
/// of length l gets the weight l + π(w) - π(v), where π is the graph's
/// heuristic towards the finish. Admissible heuristics keep these weights
/// non-negative.
#[derive(Clone, Debug, Default)]
pub struct AStarAlgorithm {
    config: AStarConfig,
}

/// Tells the graph parents are recorded for as long as it lives.
pub(crate) struct ParentsGuard<'a, G: AStarGraph> {
    graph: &'a G,
}

impl<'a, G: AStarGraph> ParentsGuard<'a, G> {
    pub(crate) fn new(graph: &'a G, directions: &[Direction]) -> ParentsGuard<'a, G> {
        for &direction in directions {
            graph.set_astar_parents(direction);
        }
        ParentsGuard { graph }
    }
}

impl<'a, G: AStarGraph> Drop for ParentsGuard<'a, G> {
    fn drop(&mut self) {
        self.graph.drop_astar_parents();
    }
}

impl AStarAlgorithm {
    pub fn new() -> AStarAlgorithm {
        AStarAlgorithm::default()
    }

    pub fn with_config(config: AStarConfig) -> AStarAlgorithm {
        AStarAlgorithm { config }
    }

    pub fn config(&self) -> &AStarConfig {
        &self.config
    }

    /// Unidirectional A* from `params.start` to `params.finish`.
    ///
    /// States whose real length fails the length checker are never queued and
    /// the found route is checked once more before it is returned.
    pub fn find_path<G: AStarGraph>(
        &self,
        params: &Params<G>,
    ) -> (SearchResult, RoutingResult<G::Vertex, G::Weight>) {
        let graph = params.graph;
        let finish = params.finish;

        let mut result = RoutingResult::default();
        let mut context = Context::new();
        let mut periodic_cancellable =
            PeriodicPollCancellable::new(params.cancellable, self.config.cancellation_poll_period);
        let mut result_code = SearchResult::NoPath;
        let mut visited = 0u64;

        let heuristic = |vertex: &G::Vertex| {
            graph.heuristic_cost_estimate(vertex, &finish, Direction::Forward)
        };
        let start_to_finish = heuristic(&params.start);

        let reduced_to_real = |state: &State<G::Vertex, G::Weight>| {
            state.distance + start_to_finish - heuristic(&state.vertex)
        };

        let visit_vertex = |state: &State<G::Vertex, G::Weight>| {
            if periodic_cancellable.is_cancelled() {
                result_code = SearchResult::Cancelled;
                return false;
            }

            visited += 1;
            params.visit_vertex(&state.vertex, &finish, Direction::Forward);

            if state.vertex == finish {
                result_code = SearchResult::Ok;
                return false;
            }

            true
        };

        let adjust_edge_weight = |vertex: &G::Vertex, edge: &G::Edge| {
            let pi_v = heuristic(vertex);
            let pi_w = heuristic(&edge.target());
            edge.weight() + pi_w - pi_v
        };

        let filter_states = |state: &State<G::Vertex, G::Weight>| {
            params.check_length(reduced_to_real(state), Direction::Forward)
        };

        {
            let _parents = ParentsGuard::new(graph, &[Direction::Forward]);
            propagate_wave(
                graph,
                params.start,
                visit_vertex,
                adjust_edge_weight,
                filter_states,
                &reduced_to_real,
                &mut context,
            );
        }

        if result_code == SearchResult::Ok {
            result.path = context.get_path(finish);
            result.distance = reduced_to_real(&State::new(finish, context.get_distance(&finish)));

            if !params.check_length(result.distance, Direction::Forward) {
                result.clear();
                result_code = SearchResult::NoPath;
            }
        }

        debug!(
            "find_path {:?} -> {:?}: {} after {} visited vertices",
            params.start, finish, result_code, visited
        );

        (result_code, result)
    }

    /// Reconnects `params.start` to the previous route.
    ///
    /// A single forward wave, bounded by the length checker, looks for the
    /// route vertex that minimises the distance to it plus the remaining
    /// length of the previous route. The result is the new path up to that
    /// vertex followed by the unchanged rest of the previous route.
    ///
    /// # Panics
    ///
    /// Panics without a length checker or without a non-empty previous route,
    /// since the wave would otherwise flood the whole graph.
    pub fn adjust_route<G: AStarGraph>(
        &self,
        params: &Params<G>,
    ) -> (SearchResult, RoutingResult<G::Vertex, G::Weight>) {
        assert!(
            params.has_length_checker(),
            "adjusting a route needs a length checker"
        );
        let prev_route = params
            .prev_route
            .unwrap_or_else(|| panic!("adjusting a route needs a previous route"));
        assert!(!prev_route.is_empty(), "previous route is empty");

        let graph = params.graph;
        let start = params.start;

        let mut result = RoutingResult::default();

        // Remaining length of the previous route from each of its vertices.
        let mut remaining_distances: HashMap<G::Vertex, G::Weight> = HashMap::new();
        let mut remaining_distance = G::Weight::zero();
        for edge in prev_route.iter().rev() {
            remaining_distances.insert(edge.target(), remaining_distance);
            remaining_distance = remaining_distance + edge.weight();
        }

        let mut context = Context::new();
        let mut periodic_cancellable =
            PeriodicPollCancellable::new(params.cancellable, self.config.cancellation_poll_period);
        let mut was_cancelled = false;
        let mut min_distance = G::Weight::infinity();
        let mut return_vertex = None;

        let visit_vertex = |state: &State<G::Vertex, G::Weight>| {
            if periodic_cancellable.is_cancelled() {
                was_cancelled = true;
                return false;
            }

            params.visit_vertex(&start, &state.vertex, Direction::Forward);

            if let Some(&remaining) = remaining_distances.get(&state.vertex) {
                let full_distance = state.distance + remaining;
                if full_distance < min_distance {
                    min_distance = full_distance;
                    return_vertex = Some(state.vertex);
                }
            }

            true
        };

        propagate_wave(
            graph,
            start,
            visit_vertex,
            |_, edge: &G::Edge| edge.weight(),
            |state: &State<G::Vertex, G::Weight>| {
                params.check_length(state.distance, Direction::Forward)
            },
            |state: &State<G::Vertex, G::Weight>| state.distance,
            &mut context,
        );

        if was_cancelled {
            debug!("adjust_route from {:?}: cancelled", start);
            return (SearchResult::Cancelled, result);
        }

        let Some(return_vertex) = return_vertex else {
            debug!(
                "adjust_route from {:?}: no route vertex within {} reached vertices",
                start,
                context.number_of_reached_vertices()
            );
            return (SearchResult::NoPath, result);
        };

        result.path = context.get_path(return_vertex);

        let rejoin_index = prev_route
            .iter()
            .position(|edge| edge.target() == return_vertex)
            .unwrap_or_else(|| panic!("rejoin vertex {:?} is not on the route", return_vertex));
        result
            .path
            .extend(prev_route[rejoin_index + 1..].iter().map(|edge| edge.target()));

        result.distance =
            context.get_distance(&return_vertex) + remaining_distances[&return_vertex];

        debug!(
            "adjust_route from {:?}: rejoined at {:?}, {} vertices",
            start,
            return_vertex,
            result.path.len()
        );

        (SearchResult::Ok, result)
    }
}
