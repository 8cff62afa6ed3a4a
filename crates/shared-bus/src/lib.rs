//! # Shared Bus - In-Process Event Bus
//!
//! The round engine's components (block poller, submission pipeline, forging
//! loop, reward engine, payout engine, message-driven config) run as tasks
//! within a single process and are decoupled through this bus rather than
//! direct calls between one another.
//!
//! ## Pattern
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │  Component A │                    │  Component B │
//! │              │    publish()       │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! Built on `tokio::sync::broadcast`: single process, no envelope signing or
//! replay protection needed since there is no untrusted transport in between.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, PoolEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, EventSubscriber, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before backpressure.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
