use std::{
    mem,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
};

use ahash::{HashMap, HashMapExt};
use log::{debug, trace};

use super::{
    astar::{AStarAlgorithm, ParentsGuard},
    cancellable::PeriodicPollCancellable,
    collections::vertex_distance_queue::{State, VertexDistanceQueue},
    params::Params,
    path::{reconstruct_path_bidirectional, Parents, RoutingResult},
    SearchResult,
};
use crate::graphs::{max_weight, AStarEdge, AStarGraph, Direction, VertexData, Weight};

type Distances<G> = HashMap<<G as AStarGraph>::Vertex, <G as AStarGraph>::Weight>;

/// A popped state whose edges were only partly relaxed when the two-thread
/// phase stopped.
struct PendingState<G: AStarGraph> {
    state: State<G::Vertex, G::Weight>,
    edges: Vec<G::Edge>,
    next_edge: usize,
}

/// Everything one direction of the bidirectional search owns.
///
/// The potentials p_f(v) = ½(π_f(v) - π_r(v) + π_r(s)) and
/// p_r(v) = ½(π_r(v) - π_f(v) + π_f(t)) sum up to a constant, which keeps the
/// reduced weights of both directions compatible.
struct BidirectionalStepContext<'a, G: AStarGraph> {
    direction: Direction,
    start: G::Vertex,
    finish: G::Vertex,
    graph: &'a G,
    pi_rt: G::Weight,
    pi_fs: G::Weight,

    queue: VertexDistanceQueue<G::Vertex, G::Weight>,
    best_distance: Distances<G>,
    parents: Parents<G::Vertex>,
    best_vertex: G::Vertex,
    /// Potential of the vertex this direction starts from.
    ps: G::Weight,

    pending: Option<PendingState<G>>,
    edges: Vec<G::Edge>,
}

impl<'a, G: AStarGraph> BidirectionalStepContext<'a, G> {
    fn new(
        direction: Direction,
        start: G::Vertex,
        finish: G::Vertex,
        graph: &'a G,
    ) -> BidirectionalStepContext<'a, G> {
        let root = if direction.is_forward() { start } else { finish };

        let mut context = BidirectionalStepContext {
            direction,
            start,
            finish,
            graph,
            pi_rt: graph.heuristic_cost_estimate(&finish, &start, direction),
            pi_fs: graph.heuristic_cost_estimate(&start, &finish, direction),
            queue: VertexDistanceQueue::new(),
            best_distance: HashMap::new(),
            parents: Parents::default(),
            best_vertex: root,
            ps: G::Weight::zero(),
            pending: None,
            edges: Vec::new(),
        };

        context.ps = context.consistent_heuristic(&root);
        context.best_distance.insert(root, G::Weight::zero());
        context.queue.push(State::new(root, G::Weight::zero()));
        context
    }

    fn consistent_heuristic(&self, vertex: &G::Vertex) -> G::Weight {
        let pi_f = self
            .graph
            .heuristic_cost_estimate(vertex, &self.finish, self.direction);
        let pi_r = self
            .graph
            .heuristic_cost_estimate(vertex, &self.start, self.direction);
        match self.direction {
            Direction::Forward => (pi_f - pi_r + self.pi_rt).half(),
            Direction::Backward => (pi_r - pi_f + self.pi_fs).half(),
        }
    }

    /// The vertex this direction is heading to.
    fn target(&self) -> G::Vertex {
        match self.direction {
            Direction::Forward => self.finish,
            Direction::Backward => self.start,
        }
    }

    fn best_distance(&self, vertex: &G::Vertex) -> G::Weight {
        self.best_distance
            .get(vertex)
            .copied()
            .unwrap_or_else(G::Weight::infinity)
    }

    fn top_distance(&self) -> Option<G::Weight> {
        self.queue
            .peek()
            .map(|state| self.best_distance(&state.vertex))
    }

    fn reduced_to_real(&self, vertex: &G::Vertex, reduced: G::Weight) -> G::Weight {
        reduced - self.consistent_heuristic(vertex) + self.ps
    }

    /// Fills `self.edges` with the edges leaving `state` in this direction.
    fn load_edges(&mut self, state: &State<G::Vertex, G::Weight>) {
        let vertex_data = VertexData::new(
            state.vertex,
            self.reduced_to_real(&state.vertex, state.distance),
        );
        self.edges.clear();
        self.graph
            .edges(self.direction, &vertex_data, &mut self.edges);
    }

    /// Reduced weight of `edge` leaving `vertex`, whose potential is `p_v`.
    fn reduced_weight(&self, p_v: G::Weight, edge: &G::Edge) -> (G::Weight, G::Weight) {
        let p_w = self.consistent_heuristic(&edge.target());
        let reduced = edge.weight() + p_w - p_v;
        assert!(
            reduced >= G::Weight::zero() - G::Weight::epsilon(),
            "invariant violated: reduced weight {:?} < -epsilon",
            reduced
        );
        (max_weight(reduced, G::Weight::zero()), p_w)
    }
}

/// Shortest meeting found so far.
#[derive(Clone, Copy)]
struct Meeting<W> {
    reduced_length: W,
    real_length: W,
}

/// Relaxes one edge of `state_v` in the single-thread phase and records a
/// meeting if the edge reaches a vertex already known to the other direction.
fn relax_edge<G: AStarGraph>(
    cur: &mut BidirectionalStepContext<G>,
    nxt: &mut BidirectionalStepContext<G>,
    state_v: &State<G::Vertex, G::Weight>,
    p_v: G::Weight,
    edge: &G::Edge,
    params: &Params<G>,
    best: &mut Option<Meeting<G::Weight>>,
) {
    let head = edge.target();
    if head == state_v.vertex {
        return;
    }

    let (reduced_weight, p_w) = cur.reduced_weight(p_v, edge);
    let new_reduced_distance = state_v.distance + reduced_weight;

    if let Some(&current) = cur.best_distance.get(&head) {
        if new_reduced_distance >= current - G::Weight::epsilon() {
            return;
        }
    }

    let real_distance = new_reduced_distance - p_w + cur.ps;
    if !params.check_length(real_distance, cur.direction) {
        return;
    }

    cur.best_distance.insert(head, new_reduced_distance);
    cur.parents.insert(head, state_v.vertex);
    cur.queue.push(State::new(head, new_reduced_distance));

    let Some(&distance_w) = nxt.best_distance.get(&head) else {
        return;
    };

    // Reduced length of the path through this edge. No epsilon here, it is
    // fine to overshoot slightly.
    let path_reduced_length = new_reduced_distance + distance_w;
    if best.is_some_and(|meeting| meeting.reduced_length <= path_reduced_length) {
        return;
    }

    let path_real_length = state_v.distance + edge.weight() + distance_w + (cur.ps - p_v)
        + (nxt.ps - nxt.consistent_heuristic(&head));
    if !params.check_length(path_real_length, Direction::Forward) {
        return;
    }

    let (forward_parents, backward_parents) = match cur.direction {
        Direction::Forward => (&cur.parents, &nxt.parents),
        Direction::Backward => (&nxt.parents, &cur.parents),
    };
    if !params
        .graph
        .are_waves_connectible(forward_parents, &head, backward_parents)
    {
        return;
    }

    trace!(
        "meeting at {:?} -> {:?} with real length {:?}",
        state_v.vertex,
        head,
        path_real_length
    );
    *best = Some(Meeting {
        reduced_length: path_reduced_length,
        real_length: path_real_length,
    });
    cur.best_vertex = state_v.vertex;
    nxt.best_vertex = head;
}

/// Best distances of both directions while the waves run on two threads.
struct SharedDistances<G: AStarGraph> {
    forward: Distances<G>,
    backward: Distances<G>,
}

impl<G: AStarGraph> SharedDistances<G> {
    /// Returns the maps of `direction` and of the opposite direction.
    fn split(&mut self, direction: Direction) -> (&mut Distances<G>, &Distances<G>) {
        match direction {
            Direction::Forward => (&mut self.forward, &self.backward),
            Direction::Backward => (&mut self.backward, &self.forward),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs one direction until any wave reaches a vertex the other one has
/// already reached. The edge that found the intersection and all edges after
/// it are stashed in `context.pending`. Returns the number of settled states.
fn wave_worker<G: AStarGraph>(
    context: &mut BidirectionalStepContext<G>,
    shared: &Mutex<SharedDistances<G>>,
    exit: &AtomicBool,
    cancelled: &AtomicBool,
    params: &Params<G>,
    cancellation_poll_period: u32,
) -> u64 {
    let mut periodic_cancellable =
        PeriodicPollCancellable::new(params.cancellable, cancellation_poll_period);
    let mut settled = 0;

    while !exit.load(Ordering::Acquire) {
        if periodic_cancellable.is_cancelled() {
            cancelled.store(true, Ordering::Release);
            exit.store(true, Ordering::Release);
            break;
        }

        let Some(state_v) = context.queue.pop() else {
            exit.store(true, Ordering::Release);
            break;
        };

        {
            let mut distances = lock(shared);
            let (own, _) = distances.split(context.direction);
            let best = own
                .get(&state_v.vertex)
                .copied()
                .unwrap_or_else(G::Weight::infinity);
            if state_v.distance > best {
                continue;
            }
        }

        settled += 1;
        params.visit_vertex(&state_v.vertex, &context.target(), context.direction);

        context.load_edges(&state_v);
        let edges = mem::take(&mut context.edges);
        let p_v = context.consistent_heuristic(&state_v.vertex);

        for index in 0..edges.len() {
            let head = edges[index].target();
            if head == state_v.vertex {
                continue;
            }

            let (reduced_weight, p_w) = context.reduced_weight(p_v, &edges[index]);
            let new_reduced_distance = state_v.distance + reduced_weight;
            let real_distance = new_reduced_distance - p_w + context.ps;

            let mut distances = lock(shared);
            let (own, other) = distances.split(context.direction);

            if let Some(&current) = own.get(&head) {
                if new_reduced_distance >= current - G::Weight::epsilon() {
                    continue;
                }
            }

            if other.contains_key(&head) {
                drop(distances);
                debug!(
                    "{:?} wave intersected the other one at {:?} after {} states",
                    context.direction, head, settled
                );
                context.pending = Some(PendingState {
                    state: state_v,
                    edges,
                    next_edge: index,
                });
                exit.store(true, Ordering::Release);
                return settled;
            }

            if !params.check_length(real_distance, context.direction) {
                continue;
            }

            own.insert(head, new_reduced_distance);
            drop(distances);

            context.parents.insert(head, state_v.vertex);
            context.queue.push(State::new(head, new_reduced_distance));
        }

        context.edges = edges;
    }

    settled
}

impl AStarAlgorithm {
    /// Bidirectional A* from `params.start` to `params.finish`.
    ///
    /// The forward wave runs on outgoing edges from the start, the backward
    /// wave on ingoing edges from the finish, switching every
    /// `queue_switch_period` states. The search stops once the tops of both
    /// queues can not beat the best meeting found so far.
    ///
    /// If the graph allows it, both waves first run concurrently until they
    /// touch; the single-thread loop then resumes exactly where they stopped.
    pub fn find_path_bidirectional<G: AStarGraph>(
        &self,
        params: &Params<G>,
    ) -> (SearchResult, RoutingResult<G::Vertex, G::Weight>) {
        let graph = params.graph;
        let mut result = RoutingResult::default();

        // Meetings are only detected while relaxing edges, which never happens
        // for an empty route.
        if params.start == params.finish {
            if params.cancellable.is_cancelled() {
                return (SearchResult::Cancelled, result);
            }
            if !params.check_length(G::Weight::zero(), Direction::Forward) {
                return (SearchResult::NoPath, result);
            }
            result.path.push(params.start);
            return (SearchResult::Ok, result);
        }

        let _parents = ParentsGuard::new(graph, &[Direction::Forward, Direction::Backward]);

        let mut forward =
            BidirectionalStepContext::new(Direction::Forward, params.start, params.finish, graph);
        let mut backward =
            BidirectionalStepContext::new(Direction::Backward, params.start, params.finish, graph);

        let two_threads = self.config().allow_two_threads && graph.is_two_threads_ready();
        if two_threads && self.run_two_threads(&mut forward, &mut backward, params) {
            debug!(
                "find_path_bidirectional {:?} -> {:?}: cancelled while running on two threads",
                params.start, params.finish
            );
            return (SearchResult::Cancelled, result);
        }

        let mut best = None;

        // Finish the states the two-thread phase stopped in the middle of.
        for direction in [Direction::Forward, Direction::Backward] {
            let (cur, nxt) = if direction.is_forward() {
                (&mut forward, &mut backward)
            } else {
                (&mut backward, &mut forward)
            };
            if let Some(pending) = cur.pending.take() {
                let p_v = cur.consistent_heuristic(&pending.state.vertex);
                for edge in &pending.edges[pending.next_edge..] {
                    relax_edge(cur, nxt, &pending.state, p_v, edge, params, &mut best);
                }
            }
        }

        let mut periodic_cancellable = PeriodicPollCancellable::new(
            params.cancellable,
            self.config().cancellation_poll_period,
        );
        let queue_switch_period = self.config().queue_switch_period.max(1);
        let mut cur_direction = Direction::Forward;
        let mut steps = 0u32;

        loop {
            steps = steps.wrapping_add(1);

            if periodic_cancellable.is_cancelled() {
                debug!(
                    "find_path_bidirectional {:?} -> {:?}: cancelled after {} steps",
                    params.start, params.finish, steps
                );
                return (SearchResult::Cancelled, result);
            }

            if steps % queue_switch_period == 0 {
                cur_direction = cur_direction.opposite();
                trace!("switching wave after {} steps", steps);
            }

            let (cur, nxt) = if cur_direction.is_forward() {
                (&mut forward, &mut backward)
            } else {
                (&mut backward, &mut forward)
            };

            if let Some(meeting) = best {
                let cur_top = cur.top_distance().unwrap_or_else(G::Weight::infinity);
                let nxt_top = nxt.top_distance().unwrap_or_else(G::Weight::infinity);

                // Every path still to be found is at least as long as the sum of
                // the tops. Comparing reduced lengths is sound because the
                // potentials are consistent.
                if cur_top + nxt_top >= meeting.reduced_length - G::Weight::epsilon() {
                    result.path = reconstruct_path_bidirectional(
                        forward.best_vertex,
                        backward.best_vertex,
                        &forward.parents,
                        &backward.parents,
                    );
                    result.distance = meeting.real_length;
                    break;
                }
            } else if cur.queue.is_empty() || nxt.queue.is_empty() {
                // An exhausted wave never touched the other one.
                break;
            }

            let Some(state_v) = cur.queue.pop() else {
                break;
            };

            if state_v.distance > cur.best_distance(&state_v.vertex) {
                continue;
            }

            params.visit_vertex(&state_v.vertex, &cur.target(), cur.direction);

            cur.load_edges(&state_v);
            let edges = mem::take(&mut cur.edges);
            let p_v = cur.consistent_heuristic(&state_v.vertex);
            for edge in edges.iter() {
                relax_edge(cur, nxt, &state_v, p_v, edge, params, &mut best);
            }
            cur.edges = edges;
        }

        let result_code = if result.is_empty() {
            SearchResult::NoPath
        } else if !params.check_length(result.distance, Direction::Forward) {
            result.clear();
            SearchResult::NoPath
        } else {
            SearchResult::Ok
        };

        debug!(
            "find_path_bidirectional {:?} -> {:?}: {} after {} steps",
            params.start, params.finish, result_code, steps
        );

        (result_code, result)
    }

    /// Runs both waves on two threads until they touch. Returns true if the
    /// search was cancelled meanwhile.
    fn run_two_threads<G: AStarGraph>(
        &self,
        forward: &mut BidirectionalStepContext<G>,
        backward: &mut BidirectionalStepContext<G>,
        params: &Params<G>,
    ) -> bool {
        let shared = Mutex::new(SharedDistances::<G> {
            forward: mem::take(&mut forward.best_distance),
            backward: mem::take(&mut backward.best_distance),
        });
        let exit = AtomicBool::new(false);
        let cancelled = AtomicBool::new(false);
        let poll_period = self.config().cancellation_poll_period;

        let (forward_settled, backward_settled) = rayon::join(
            || wave_worker(forward, &shared, &exit, &cancelled, params, poll_period),
            || wave_worker(backward, &shared, &exit, &cancelled, params, poll_period),
        );

        let shared = shared.into_inner().unwrap_or_else(PoisonError::into_inner);
        forward.best_distance = shared.forward;
        backward.best_distance = shared.backward;

        debug!(
            "two-thread phase settled {} forward and {} backward states",
            forward_settled, backward_settled
        );

        cancelled.load(Ordering::Acquire)
    }
}
