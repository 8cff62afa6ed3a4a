//! Service layer: the stateful components wired together by [`crate::PoolCore`].
//!
//! Each submodule owns one of the long-lived roles from the component
//! table: block poller, submission pipeline, forging loop, reward engine,
//! payout engine, message-driven config, and the periodic job tickers.
//! They share a [`PoolContext`](crate::context::PoolContext) and talk to
//! each other only through storage and the event bus, never by holding
//! references to one another.

pub mod block_poller;
pub mod forging;
pub mod message_config;
pub mod payout_engine;
pub mod periodic;
pub mod reward_engine;
pub mod submission;

pub use block_poller::BlockPoller;
pub use forging::ForgingLoop;
pub use message_config::MessageConfigService;
pub use payout_engine::PayoutEngine;
pub use periodic::PeriodicJobs;
pub use reward_engine::RewardEngine;
pub use submission::{MiningInfoReply, SubmissionPipeline, SubmitReply};
