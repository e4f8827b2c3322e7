//! Weighted A* searches over caller supplied graphs: unidirectional,
//! bidirectional and the reconnection of a previous route.

pub mod graphs;
pub mod search;
pub mod utility;

pub use graphs::{AStarEdge, AStarGraph, Direction, VertexData, Weight};
pub use search::{
    astar::AStarAlgorithm, cancellable::Cancellable, config::AStarConfig, params::Params,
    path::RoutingResult, SearchResult,
};
