//! Pool events that flow through the shared bus.
//!
//! The round engine's components are decoupled through these events rather
//! than direct calls: the block poller announces round transitions, the
//! submission pipeline announces accepted nonces, the reward engine
//! announces won/lost blocks, and so on. Periodic jobs do not publish here —
//! per the concurrency model they interact only through storage.

use serde::{Deserialize, Serialize};

/// Events published onto the shared bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PoolEvent {
    /// The block poller committed a new round (§4.7, step 8).
    NewRound {
        height: u64,
        base_target: u64,
        scoop: u32,
    },

    /// The submission pipeline accepted and persisted a nonce submission.
    /// Consumed by the forging loop.
    NonceSubmissionAccepted {
        miner_id: u64,
        height: u64,
        deadline: u64,
        nonce: u64,
    },

    /// The forging loop forwarded a nonce to the wallet.
    NonceForwarded { height: u64, deadline: u64 },

    /// The reward engine confirmed the pool won a block.
    BlockWon {
        height: u64,
        winner_id: u64,
        reward: i64,
    },

    /// The reward engine confirmed the pool did not win a block.
    BlockLost { height: u64 },

    /// The payout engine sent a batch of payments.
    PayoutSent { recipient_count: usize, total: i64 },

    /// Message-driven config applied a per-miner setting change.
    ConfigMessageApplied { miner_id: u64, setting: String },

    /// Critical error requiring operator attention.
    CriticalError { component: &'static str, error: String },
}

impl PoolEvent {
    /// The topic this event is published under (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::NewRound { .. } => EventTopic::Round,
            Self::NonceSubmissionAccepted { .. } => EventTopic::Submission,
            Self::NonceForwarded { .. } => EventTopic::Forging,
            Self::BlockWon { .. } | Self::BlockLost { .. } => EventTopic::Reward,
            Self::PayoutSent { .. } => EventTopic::Payout,
            Self::ConfigMessageApplied { .. } => EventTopic::Config,
            Self::CriticalError { .. } => EventTopic::Critical,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    Round,
    Submission,
    Forging,
    Reward,
    Payout,
    Config,
    Critical,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &PoolEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_topic_mapping() {
        let event = PoolEvent::NewRound {
            height: 100,
            base_target: 1,
            scoop: 0,
        };
        assert_eq!(event.topic(), EventTopic::Round);
    }

    #[test]
    fn test_filter_all() {
        let filter = EventFilter::all();
        let event = PoolEvent::BlockLost { height: 1 };
        assert!(filter.matches(&event));
    }

    #[test]
    fn test_filter_by_topic() {
        let filter = EventFilter::topics(vec![EventTopic::Reward]);

        let reward_event = PoolEvent::BlockLost { height: 1 };
        assert!(filter.matches(&reward_event));

        let round_event = PoolEvent::NewRound {
            height: 1,
            base_target: 1,
            scoop: 0,
        };
        assert!(!filter.matches(&round_event));
    }
}
