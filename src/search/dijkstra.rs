use crate::{
    graphs::{max_weight, AStarEdge, AStarGraph, VertexData, Weight},
    search::collections::{
        dijkstra_data::Context,
        vertex_distance_queue::{State, VertexDistanceQueue},
    },
};

/// Dijkstra's algorithm over reduced edge weights, starting at `start`.
///
/// * `visit_vertex` sees every settled state and stops the wave by returning
///   false.
/// * `adjust_edge_weight` turns an edge leaving a vertex into its reduced
///   weight. Reduced weights below `-epsilon` mean the heuristic is not
///   admissible and abort the search.
/// * `filter_states` decides whether an improved state may enter the queue.
/// * `reduced_to_real` converts a state's distance back into a real one for
///   the graph's edge enumeration.
///
/// The context is cleared first and holds the distances and parents of the
/// wave when this returns.
pub fn propagate_wave<G, VisitVertex, AdjustEdgeWeight, FilterStates, ReducedToReal>(
    graph: &G,
    start: G::Vertex,
    mut visit_vertex: VisitVertex,
    mut adjust_edge_weight: AdjustEdgeWeight,
    mut filter_states: FilterStates,
    reduced_to_real: ReducedToReal,
    context: &mut Context<G::Vertex, G::Weight>,
) where
    G: AStarGraph,
    VisitVertex: FnMut(&State<G::Vertex, G::Weight>) -> bool,
    AdjustEdgeWeight: FnMut(&G::Vertex, &G::Edge) -> G::Weight,
    FilterStates: FnMut(&State<G::Vertex, G::Weight>) -> bool,
    ReducedToReal: Fn(&State<G::Vertex, G::Weight>) -> G::Weight,
{
    let zero = G::Weight::zero();
    let epsilon = G::Weight::epsilon();

    context.clear();

    let mut queue = VertexDistanceQueue::new();
    context.set_distance(start, zero);
    queue.push(State::new(start, zero));

    let mut edges = Vec::new();

    while let Some(state_v) = queue.pop() {
        // There is no decrease key, so outdated entries are skipped here.
        if state_v.distance > context.get_distance(&state_v.vertex) {
            continue;
        }

        if !visit_vertex(&state_v) {
            return;
        }

        edges.clear();
        let vertex_data = VertexData::new(state_v.vertex, reduced_to_real(&state_v));
        graph.outgoing_edges(&vertex_data, &mut edges);

        for edge in edges.iter() {
            let head = edge.target();
            if head == state_v.vertex {
                continue;
            }

            let reduced_weight = adjust_edge_weight(&state_v.vertex, edge);
            assert!(
                reduced_weight >= zero - epsilon,
                "invariant violated: reduced weight {:?} of edge {:?} -> {:?} is negative",
                reduced_weight,
                state_v.vertex,
                head
            );

            let alternative_distance_head = state_v.distance + max_weight(reduced_weight, zero);
            if alternative_distance_head >= context.get_distance(&head) - epsilon {
                continue;
            }

            let state_w = State::new(head, alternative_distance_head);
            if !filter_states(&state_w) {
                continue;
            }

            context.set_distance(head, alternative_distance_head);
            context.set_predecessor(head, state_v.vertex);
            queue.push(state_w);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::propagate_wave;
    use crate::{
        graphs::{adjacency_graph::AdjacencyGraph, AStarEdge},
        search::collections::dijkstra_data::Context,
    };

    fn chain() -> AdjacencyGraph {
        let mut graph = AdjacencyGraph::new();
        graph.add_edge_bidirectional(0, 1, 1.0);
        graph.add_edge_bidirectional(1, 2, 2.0);
        graph.add_edge_bidirectional(2, 3, 3.0);
        graph.add_edge_bidirectional(0, 3, 10.0);
        graph
    }

    #[test]
    fn settles_vertices_in_distance_order() {
        let graph = chain();
        let mut context = Context::new();
        let mut settled = Vec::new();

        propagate_wave(
            &graph,
            0,
            |state| {
                settled.push((state.vertex, state.distance));
                true
            },
            |_, edge| edge.weight(),
            |_| true,
            |state| state.distance,
            &mut context,
        );

        assert_eq!(settled, vec![(0, 0.0), (1, 1.0), (2, 3.0), (3, 6.0)]);
        assert_eq!(context.get_path(3), vec![0, 1, 2, 3]);
    }

    #[test]
    fn visitor_stops_the_wave() {
        let graph = chain();
        let mut context = Context::new();
        let mut visited = 0;

        propagate_wave(
            &graph,
            0,
            |_| {
                visited += 1;
                visited < 2
            },
            |_, edge| edge.weight(),
            |_| true,
            |state| state.distance,
            &mut context,
        );

        assert_eq!(visited, 2);
        assert!(!context.has_distance(&2));
    }

    #[test]
    fn filtered_states_are_never_reached() {
        let graph = chain();
        let mut context = Context::new();

        propagate_wave(
            &graph,
            0,
            |_| true,
            |_, edge| edge.weight(),
            |state| state.distance <= 3.0,
            |state| state.distance,
            &mut context,
        );

        assert!(context.has_distance(&2));
        assert!(!context.has_distance(&3));
    }

    #[test]
    #[should_panic(expected = "invariant violated")]
    fn negative_reduced_weight_is_fatal() {
        let graph = chain();
        let mut context = Context::new();

        propagate_wave(
            &graph,
            0,
            |_| true,
            |_, edge| -edge.weight(),
            |_| true,
            |state| state.distance,
            &mut context,
        );
    }
}
