//! Domain layer: the pure, storage-agnostic model of a mining round.

pub mod alpha;
pub mod message_config;
pub mod miner;
pub mod reward;
pub mod round_state;
pub mod window_cache;

pub use alpha::AlphaTable;
pub use miner::{round_away_from_zero, DeadlineParams, Miner, SubmissionOutcome};
pub use reward::{split_reward, RewardSplit};
pub use round_state::{BestSubmission, RoundInfo, RoundState};
pub use window_cache::BlockWindowCache;
