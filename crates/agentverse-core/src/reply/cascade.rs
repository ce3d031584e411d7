//! Cascade guard for agent-to-agent reply chains.
//!
//! Two layers keep agents from talking to each other forever:
//! - Depth: how many agent hops separate an event from the original human content
//! - Pair rate: how many times one agent may answer another per time window

use std::time::{Duration, Instant};

use dashmap::DashMap;

use agentverse_types::agent::AgentId;
use agentverse_types::config::CascadeConfig;

/// Why the guard refused a cascaded event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CascadeRejection {
    #[error("cascade depth {depth} exceeds maximum {max}")]
    DepthExceeded { depth: u32, max: u32 },

    #[error("agent {responder} already replied to {author} {count} times in {window:?}")]
    RateExceeded {
        author: AgentId,
        responder: AgentId,
        count: u32,
        window: Duration,
    },
}

struct PairCounter {
    count: u32,
    window_start: Instant,
}

/// Depth and pair-rate limits for cascaded replies.
pub struct CascadeGuard {
    max_depth: u32,
    max_pair_rate: u32,
    window: Duration,
    /// (author, responder) -> replies in the current window.
    pair_counters: DashMap<(AgentId, AgentId), PairCounter>,
}

impl CascadeGuard {
    pub fn new(max_depth: u32, max_pair_rate: u32, window: Duration) -> Self {
        Self {
            max_depth,
            max_pair_rate,
            window,
            pair_counters: DashMap::new(),
        }
    }

    pub fn from_config(config: &CascadeConfig) -> Self {
        Self::new(
            config.max_depth,
            config.max_pair_rate,
            Duration::from_secs(config.window_secs),
        )
    }

    /// Reject events more than `max_depth` agent hops from human content.
    pub fn check_depth(&self, depth: u32) -> Result<(), CascadeRejection> {
        if depth > self.max_depth {
            return Err(CascadeRejection::DepthExceeded {
                depth,
                max: self.max_depth,
            });
        }
        Ok(())
    }

    /// Check and count one reply from `responder` to content by `author`.
    pub fn check_pair(&self, author: AgentId, responder: AgentId) -> Result<(), CascadeRejection> {
        // Must run before `entry` takes a shard lock.
        self.evict_expired();

        let mut entry = self
            .pair_counters
            .entry((author, responder))
            .or_insert_with(|| PairCounter {
                count: 0,
                window_start: Instant::now(),
            });
        let counter = entry.value_mut();

        if counter.window_start.elapsed() >= self.window {
            counter.count = 0;
            counter.window_start = Instant::now();
        }

        if counter.count >= self.max_pair_rate {
            return Err(CascadeRejection::RateExceeded {
                author,
                responder,
                count: counter.count,
                window: self.window,
            });
        }

        counter.count += 1;
        Ok(())
    }

    /// Drop counters whose window has elapsed.
    fn evict_expired(&self) {
        let window = self.window;
        self.pair_counters
            .retain(|_, counter| counter.window_start.elapsed() < window);
    }

    /// Number of (author, responder) pairs with a live window.
    pub fn active_pairs(&self) -> usize {
        self.pair_counters.len()
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }
}

impl Default for CascadeGuard {
    fn default() -> Self {
        Self::from_config(&CascadeConfig::default())
    }
}

impl std::fmt::Debug for CascadeGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CascadeGuard")
            .field("max_depth", &self.max_depth)
            .field("max_pair_rate", &self.max_pair_rate)
            .field("window", &self.window)
            .field("active_pairs", &self.active_pairs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_limit() {
        let guard = CascadeGuard::default();
        assert!(guard.check_depth(0).is_ok());
        assert!(guard.check_depth(2).is_ok());
        assert_eq!(
            guard.check_depth(3),
            Err(CascadeRejection::DepthExceeded { depth: 3, max: 2 })
        );
    }

    #[test]
    fn pair_rate_limit_is_directional() {
        let guard = CascadeGuard::new(2, 2, Duration::from_secs(300));
        let (a, b) = (AgentId::new(), AgentId::new());
        assert!(guard.check_pair(a, b).is_ok());
        assert!(guard.check_pair(a, b).is_ok());
        assert!(matches!(
            guard.check_pair(a, b),
            Err(CascadeRejection::RateExceeded { count: 2, .. })
        ));
        assert!(guard.check_pair(b, a).is_ok());
    }

    #[test]
    fn window_expiry_resets_counter() {
        let guard = CascadeGuard::new(2, 1, Duration::from_millis(20));
        let (a, b) = (AgentId::new(), AgentId::new());
        assert!(guard.check_pair(a, b).is_ok());
        assert!(guard.check_pair(a, b).is_err());
        std::thread::sleep(Duration::from_millis(30));
        assert!(guard.check_pair(a, b).is_ok());
    }

    #[test]
    fn expired_pairs_are_evicted() {
        let guard = CascadeGuard::new(2, 1, Duration::from_millis(20));
        let (a, b, c) = (AgentId::new(), AgentId::new(), AgentId::new());
        assert!(guard.check_pair(a, b).is_ok());
        assert!(guard.check_pair(b, c).is_ok());
        assert_eq!(guard.active_pairs(), 2);
        std::thread::sleep(Duration::from_millis(30));
        assert!(guard.check_pair(c, a).is_ok());
        assert_eq!(guard.active_pairs(), 1);
    }
}
