use serde::{Deserialize, Serialize};

/// Number of states popped from one queue before bidirectional search turns
/// to the other one.
pub const QUEUE_SWITCH_PERIOD: u32 = 128;

/// Number of visited vertices between two looks at the cancellation flag.
pub const CANCELLATION_POLL_PERIOD: u32 = 128;

/// Tunables of [`AStarAlgorithm`](crate::search::astar::AStarAlgorithm).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AStarConfig {
    pub queue_switch_period: u32,
    pub cancellation_poll_period: u32,
    /// Lets bidirectional search warm up both waves on two threads if the
    /// graph reports it is safe.
    pub allow_two_threads: bool,
}

impl Default for AStarConfig {
    fn default() -> Self {
        AStarConfig {
            queue_switch_period: QUEUE_SWITCH_PERIOD,
            cancellation_poll_period: CANCELLATION_POLL_PERIOD,
            allow_two_threads: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AStarConfig;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: AStarConfig = serde_json::from_str(r#"{"allow_two_threads": false}"#).unwrap();
        assert_eq!(config.queue_switch_period, 128);
        assert_eq!(config.cancellation_poll_period, 128);
        assert!(!config.allow_two_threads);
    }
}
