use std::fmt;

use serde::{Deserialize, Serialize};

pub mod astar;
pub mod bidirectional;
pub mod cancellable;
pub mod collections;
pub mod config;
pub mod dijkstra;
pub mod params;
pub mod path;
pub mod progress;

/// How a search ended. Only `Ok` comes with a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchResult {
    Ok,
    NoPath,
    Cancelled,
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchResult::Ok => "OK",
            SearchResult::NoPath => "NoPath",
            SearchResult::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::SearchResult;

    #[test]
    fn display_names() {
        assert_eq!(SearchResult::Ok.to_string(), "OK");
        assert_eq!(SearchResult::NoPath.to_string(), "NoPath");
        assert_eq!(SearchResult::Cancelled.to_string(), "Cancelled");
    }
}
